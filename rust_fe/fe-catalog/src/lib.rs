// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Catalog module for file-system backed table metadata
//!
//! This module handles:
//! - Column definitions and statistics
//! - Partition key literals
//! - Partitions, data files, blocks and replicas
//! - The per-column partition value index
//! - Table definitions, table stats and file listings
//! - Databases and the copy-on-write catalog

pub mod column;
pub mod literal;
pub mod replica;
pub mod partition;
pub mod host_index;
pub mod partition_index;
pub mod table;
pub mod table_stats;
pub mod database;
pub mod catalog;

pub use column::{Column, ColumnStats};
pub use literal::PartitionValue;
pub use replica::{BlockReplica, FileBlock};
pub use partition::{FileDescriptor, Partition, PartitionKeyValue};
pub use host_index::HostIndex;
pub use partition_index::{PartitionIndex, PartitionValueMap};
pub use table::{FsTable, Table};
pub use table_stats::ResultSet;
pub use database::Database;
pub use catalog::Catalog;
