// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Partition definition

use crate::column::Column;
use crate::literal::PartitionValue;
use crate::replica::FileBlock;
use fe_common::constants::DEFAULT_PARTITION_ID;
use fe_common::{AccessLevel, Compression, FileFormat, Id, PartitionId};
use serde::{Deserialize, Serialize};

/// Data file of a partition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name, relative to the partition location
    pub file_name: String,

    /// File length (bytes)
    pub file_length: i64,

    /// Last modification time (milliseconds)
    pub modification_time: i64,

    pub compression: Compression,

    /// Blocks ordered by offset
    pub blocks: Vec<FileBlock>,
}

impl FileDescriptor {
    pub fn new(
        file_name: impl Into<String>,
        file_length: i64,
        modification_time: i64,
        blocks: Vec<FileBlock>,
    ) -> Self {
        let file_name = file_name.into();
        let compression = Compression::from_file_name(&file_name);
        Self {
            file_name,
            file_length,
            modification_time,
            compression,
            blocks,
        }
    }

    /// Bytes held in cached blocks
    pub fn cached_bytes(&self) -> i64 {
        self.blocks
            .iter()
            .filter(|b| b.is_cached())
            .map(|b| b.length)
            .sum()
    }
}

/// Named partition key value, as in `PARTITION (year=2024, month=1)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionKeyValue {
    pub name: String,
    pub value: PartitionValue,
}

impl PartitionKeyValue {
    pub fn new(name: impl Into<String>, value: impl Into<PartitionValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Partition of a file-system backed table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    /// Partition ID
    pub id: PartitionId,

    /// One value per clustering column, in column order
    pub values: Vec<PartitionValue>,

    /// Directory holding the data files
    pub location: String,

    pub file_format: FileFormat,

    pub access_level: AccessLevel,

    /// Partition is marked for caching in the storage layer
    pub is_cached: bool,

    /// Row count (-1 = unknown)
    pub num_rows: i64,

    pub files: Vec<FileDescriptor>,
}

impl Partition {
    pub fn new(
        id: PartitionId,
        values: Vec<PartitionValue>,
        location: impl Into<String>,
        file_format: FileFormat,
    ) -> Self {
        Self {
            id,
            values,
            location: location.into(),
            file_format,
            access_level: AccessLevel::ReadWrite,
            is_cached: false,
            num_rows: -1,
            files: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<FileDescriptor>) -> Self {
        self.files = files;
        self
    }

    pub fn with_num_rows(mut self, num_rows: i64) -> Self {
        self.num_rows = num_rows;
        self
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn with_cached(mut self, is_cached: bool) -> Self {
        self.is_cached = is_cached;
        self
    }

    pub fn is_default(&self) -> bool {
        self.id.as_int() == DEFAULT_PARTITION_ID
    }

    pub fn num_files(&self) -> i64 {
        self.files.len() as i64
    }

    /// Total bytes of all data files
    pub fn size(&self) -> i64 {
        self.files.iter().map(|f| f.file_length).sum()
    }

    pub fn cached_bytes(&self) -> i64 {
        self.files.iter().map(|f| f.cached_bytes()).sum()
    }

    /// `k1=v1/k2=v2` over the given clustering columns
    pub fn partition_name(&self, clustering_cols: &[Column], null_partition_key_value: &str) -> String {
        clustering_cols
            .iter()
            .zip(self.values.iter())
            .map(|(col, value)| {
                format!(
                    "{}={}",
                    col.name,
                    value.to_partition_key_string(null_partition_key_value)
                )
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
