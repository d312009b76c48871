// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Column definition

use fe_common::DataType;
use serde::{Deserialize, Serialize};

/// Column statistics, maintained incrementally for clustering columns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnStats {
    /// Number of NULL values (-1 = unknown)
    pub num_nulls: i64,

    /// Number of distinct values (-1 = unknown)
    pub num_distinct_values: i64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            num_nulls: -1,
            num_distinct_values: -1,
        }
    }
}

impl ColumnStats {
    /// Stats of a clustering column of an empty table
    pub fn zeroed() -> Self {
        Self {
            num_nulls: 0,
            num_distinct_values: 0,
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Data type
    pub data_type: DataType,

    /// Column position
    pub position: usize,

    /// Comment
    pub comment: Option<String>,

    pub stats: ColumnStats,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, position: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            position,
            comment: None,
            stats: ColumnStats::default(),
        }
    }

    /// Set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
