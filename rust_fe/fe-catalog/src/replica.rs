// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Block and replica definitions

use serde::{Deserialize, Serialize};

/// Copy of a file block on one storage host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockReplica {
    /// Index into the owning table's host index
    pub host_idx: usize,

    /// Replica is held in the storage layer's in-memory cache
    pub is_cached: bool,
}

impl BlockReplica {
    pub fn new(host_idx: usize, is_cached: bool) -> Self {
        Self { host_idx, is_cached }
    }
}

/// Contiguous byte range of a data file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileBlock {
    /// Offset within the file (bytes)
    pub offset: i64,

    /// Length (bytes)
    pub length: i64,

    pub replicas: Vec<BlockReplica>,
}

impl FileBlock {
    pub fn new(offset: i64, length: i64, replicas: Vec<BlockReplica>) -> Self {
        Self {
            offset,
            length,
            replicas,
        }
    }

    /// At least one replica is cached
    pub fn is_cached(&self) -> bool {
        self.replicas.iter().any(|r| r.is_cached)
    }
}
