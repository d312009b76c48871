// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Scan Range Builder - split table files into located scan ranges
//!
//! Every block of every scanned file becomes one or more scan ranges. Each
//! range carries the hosts holding a replica of its block, numbered through
//! the per-query host index so that executors can be matched to data.

use crate::membership::MembershipSnapshot;
use fe_catalog::{FileBlock, FileDescriptor, FsTable, HostIndex, Partition, Table};
use fe_common::{check_state, Compression, FeError, PartitionId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Byte range of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSplit {
    /// Path relative to the partition location
    pub file_name: String,
    pub partition_id: PartitionId,
    pub offset: i64,
    pub length: i64,
    pub file_length: i64,
    pub compression: Compression,
    pub modification_time: i64,
}

/// Replica host of a scan range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRangeLocation {
    /// Index into the per-query host index
    pub host_idx: usize,
    pub is_cached: bool,
}

/// Scan range with all its replica locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRangeLocations {
    pub scan_range: FileSplit,
    pub locations: Vec<ScanRangeLocation>,
}

pub struct ScanRangeBuilder;

impl ScanRangeBuilder {
    /// Builds the scan ranges of `partitions`.
    ///
    /// Ranges are at most `max_scan_range_length` bytes long (0 = one range
    /// per block). Blocks without replicas cannot be scheduled and are
    /// skipped.
    pub fn build(
        table: &FsTable,
        partitions: &[&Partition],
        max_scan_range_length: i64,
        global_hosts: &mut HostIndex,
    ) -> Result<Vec<ScanRangeLocations>> {
        let mut result = Vec::new();
        let mut skipped_blocks = 0usize;
        for partition in partitions {
            check_state!(
                !partition.is_default(),
                "default partition of {} cannot be scanned",
                table.full_name()
            );
            for file in &partition.files {
                for block in &file.blocks {
                    if block.replicas.is_empty() {
                        skipped_blocks += 1;
                        continue;
                    }
                    let locations = Self::block_locations(table, block, global_hosts)?;
                    Self::split_block(partition.id, file, block, max_scan_range_length, &locations, &mut result);
                }
            }
        }
        if skipped_blocks > 0 {
            warn!(
                table = %table.full_name(),
                skipped_blocks,
                "skipped file blocks without replicas; scan results will be incomplete"
            );
        }
        debug!(
            table = %table.full_name(),
            num_partitions = partitions.len(),
            num_ranges = result.len(),
            "built scan ranges"
        );
        Ok(result)
    }

    fn block_locations(
        table: &FsTable,
        block: &FileBlock,
        global_hosts: &mut HostIndex,
    ) -> Result<Vec<ScanRangeLocation>> {
        block
            .replicas
            .iter()
            .map(|replica| {
                let address = table.host_index().entry(replica.host_idx).ok_or_else(|| {
                    FeError::InternalError(format!(
                        "host index {} of table {} has no entry",
                        replica.host_idx,
                        table.full_name()
                    ))
                })?;
                Ok(ScanRangeLocation {
                    host_idx: global_hosts.index_of(address),
                    is_cached: replica.is_cached,
                })
            })
            .collect()
    }

    fn split_block(
        partition_id: PartitionId,
        file: &FileDescriptor,
        block: &FileBlock,
        max_scan_range_length: i64,
        locations: &[ScanRangeLocation],
        result: &mut Vec<ScanRangeLocations>,
    ) {
        let mut offset = block.offset;
        let mut remaining = block.length;
        while remaining > 0 {
            let length = if max_scan_range_length > 0 && remaining > max_scan_range_length {
                max_scan_range_length
            } else {
                remaining
            };
            result.push(ScanRangeLocations {
                scan_range: FileSplit {
                    file_name: file.file_name.clone(),
                    partition_id,
                    offset,
                    length,
                    file_length: file.file_length,
                    compression: file.compression,
                    modification_time: file.modification_time,
                },
                locations: locations.to_vec(),
            });
            remaining -= length;
            offset += length;
        }
    }

    /// Estimates how many hosts execute a scan over `ranges`.
    ///
    /// Ranges with a replica on a cluster member run on one of those local
    /// hosts; the rest may run anywhere in the cluster.
    pub fn compute_num_nodes(
        ranges: &[ScanRangeLocations],
        global_hosts: &HostIndex,
        cluster: &MembershipSnapshot,
        cardinality: i64,
    ) -> Result<i32> {
        let cluster_size = cluster.num_nodes();
        let mut local_hosts = HashSet::new();
        let mut num_local_ranges = 0usize;
        let mut num_remote_ranges = 0usize;
        let mut total_nodes = 0usize;
        for range in ranges {
            let mut any_local = false;
            for location in &range.locations {
                let address = global_hosts.entry(location.host_idx).ok_or_else(|| {
                    FeError::InternalError(format!("unknown scan range host {}", location.host_idx))
                })?;
                if cluster.contains(address) {
                    any_local = true;
                    local_hosts.insert(address);
                }
            }
            if any_local {
                num_local_ranges += 1;
            } else {
                num_remote_ranges += 1;
            }
            total_nodes = num_local_ranges.min(local_hosts.len()) + num_remote_ranges.min(cluster_size);
            if total_nodes >= cluster_size {
                break;
            }
        }
        let total_nodes = total_nodes.min(cluster_size);
        if cardinality == 0 || total_nodes == 0 {
            return Ok(1);
        }
        Ok(total_nodes as i32)
    }

    pub fn to_json(ranges: &[ScanRangeLocations]) -> Result<String> {
        serde_json::to_string_pretty(ranges)
            .map_err(|e| FeError::SerializationError(format!("scan ranges: {}", e)))
    }
}
