// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Main catalog manager

use crate::database::Database;
use crate::table::{FsTable, Table};
use dashmap::DashMap;
use fe_common::{FeError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Catalog - the root of all metadata.
///
/// Tables are immutable once published. Writers clone the current table,
/// mutate the clone and publish it as a new `Arc`; planners holding the old
/// `Arc` keep a consistent view for the rest of their query.
pub struct Catalog {
    /// Databases (db_name -> database)
    databases: DashMap<String, Arc<Database>>,

    /// Serialises table updates so concurrent writers do not lose changes
    update_lock: Mutex<()>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            databases: DashMap::new(),
            update_lock: Mutex::new(()),
        }
    }

    /// Create a database
    pub fn create_database(&self, db_name: &str) -> Result<()> {
        if self.databases.contains_key(db_name) {
            return Err(FeError::AlreadyExists(format!(
                "Database {} already exists",
                db_name
            )));
        }
        self.databases
            .insert(db_name.to_string(), Arc::new(Database::new(db_name)));
        Ok(())
    }

    /// Drop an empty database
    pub fn drop_database(&self, db_name: &str) -> Result<()> {
        let db = self.get_database(db_name)?;
        if db.table_count() > 0 {
            return Err(FeError::InvalidArgument(format!(
                "Database {} is not empty",
                db_name
            )));
        }
        self.databases.remove(db_name);
        Ok(())
    }

    /// Get database by name
    pub fn get_database(&self, db_name: &str) -> Result<Arc<Database>> {
        self.databases
            .get(db_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FeError::NotFound(format!("Database {} not found", db_name)))
    }

    /// List all database names, sorted
    pub fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Register a loaded table under its database
    pub fn add_table(&self, table: FsTable) -> Result<Arc<FsTable>> {
        let db = self.get_database(table.db_name())?;
        let table = Arc::new(table);
        db.add_table(table.name().to_string(), table.clone())?;
        Ok(table)
    }

    /// Drop a table
    pub fn drop_table(&self, db_name: &str, table_name: &str) -> Result<()> {
        let _guard = self.update_lock.lock();
        self.get_database(db_name)?.remove_table(table_name)?;
        Ok(())
    }

    /// Current snapshot of a table
    pub fn get_table(&self, db_name: &str, table_name: &str) -> Result<Arc<FsTable>> {
        self.get_database(db_name)?
            .get_table(table_name)
            .ok_or_else(|| FeError::NotFound(format!("Table {}.{} not found", db_name, table_name)))
    }

    /// Applies `update` to a copy of the table and publishes the copy.
    ///
    /// On error nothing is published and readers keep seeing the previous
    /// snapshot.
    pub fn update_table<R>(
        &self,
        db_name: &str,
        table_name: &str,
        update: impl FnOnce(&mut FsTable) -> Result<R>,
    ) -> Result<R> {
        let _guard = self.update_lock.lock();
        let db = self.get_database(db_name)?;
        let current = db
            .get_table(table_name)
            .ok_or_else(|| FeError::NotFound(format!("Table {}.{} not found", db_name, table_name)))?;

        let mut updated = FsTable::clone(&current);
        let result = update(&mut updated)?;
        db.replace_table(table_name, Arc::new(updated))?;
        debug!(table = %current.full_name(), "published new table snapshot");
        Ok(result)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
