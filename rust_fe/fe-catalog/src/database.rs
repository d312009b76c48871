// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Database definition and operations

use crate::table::FsTable;
use dashmap::DashMap;
use fe_common::{FeError, Result};
use std::sync::Arc;

/// Database metadata
#[derive(Debug)]
pub struct Database {
    /// Database name
    pub name: String,

    /// Comment
    pub comment: Option<String>,

    /// Published table snapshots (table_name -> table)
    tables: DashMap<String, Arc<FsTable>>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            tables: DashMap::new(),
        }
    }

    /// Add a table to this database
    pub fn add_table(&self, table_name: String, table: Arc<FsTable>) -> Result<()> {
        if self.tables.contains_key(&table_name) {
            return Err(FeError::AlreadyExists(format!(
                "Table {} already exists in database {}",
                table_name, self.name
            )));
        }
        self.tables.insert(table_name, table);
        Ok(())
    }

    /// Remove a table from this database
    pub fn remove_table(&self, table_name: &str) -> Result<Arc<FsTable>> {
        self.tables
            .remove(table_name)
            .map(|(_, table)| table)
            .ok_or_else(|| {
                FeError::NotFound(format!(
                    "Table {} not found in database {}",
                    table_name, self.name
                ))
            })
    }

    /// Current snapshot of a table
    pub fn get_table(&self, table_name: &str) -> Option<Arc<FsTable>> {
        self.tables.get(table_name).map(|entry| entry.value().clone())
    }

    /// Publish a new snapshot of an existing table
    pub(crate) fn replace_table(&self, table_name: &str, table: Arc<FsTable>) -> Result<()> {
        match self.tables.get_mut(table_name) {
            Some(mut entry) => {
                *entry.value_mut() = table;
                Ok(())
            }
            None => Err(FeError::NotFound(format!(
                "Table {} not found in database {}",
                table_name, self.name
            ))),
        }
    }

    /// Get all table names, sorted
    pub fn get_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Get table count
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
