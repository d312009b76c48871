// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Scan of a file-system table
//!
//! Planning a scan prunes partitions, builds located scan ranges, derives
//! row and byte statistics from partition metadata and estimates the number
//! of hosts and the per-host memory the scan needs.

use crate::context::{PlannerContext, QueryOptions};
use crate::partition_pruner::{PartitionPredicate, PartitionPruner};
use crate::plan_node::PlanNodeKind;
use crate::scan_range_builder::{ScanRangeBuilder, ScanRangeLocations};
use fe_catalog::{FsTable, Partition, Table};
use fe_common::constants::{
    IO_MGR_BUFFER_SIZE, MAX_IO_BUFFERS_PER_THREAD, SCAN_RANGE_SKEW_FACTOR, THREADS_PER_CORE,
};
use fe_common::utils::{div_ceil, format_bytes};
use fe_common::{FeError, FileFormat, PartitionId, PlanNodeId, Result};
use std::sync::Arc;
use tracing::{trace, warn};

/// Statistics of the partitions a scan reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows before predicates and limits (-1 = unknown)
    pub cardinality: i64,
    pub partitions_missing_stats: usize,
    pub total_files: i64,
    pub total_bytes: i64,

    /// A row count below -1, or zero rows in a non-empty partition
    pub has_corrupt_stats: bool,
}

impl ScanStats {
    pub fn compute(table: &FsTable, partitions: &[&Partition]) -> Self {
        let mut stats = ScanStats::default();
        if table.num_clustering_cols() == 0 {
            stats.cardinality = table.num_rows();
            if stats.cardinality < -1 || (stats.cardinality == 0 && table.total_bytes() > 0) {
                stats.has_corrupt_stats = true;
            }
            if partitions.is_empty() {
                stats.cardinality = 0;
            }
            for partition in partitions {
                stats.total_files += partition.num_files();
                stats.total_bytes += partition.size();
            }
        } else {
            let mut has_valid_cardinality = false;
            for partition in partitions {
                if partition.num_rows < -1 || (partition.num_rows == 0 && partition.size() > 0) {
                    stats.has_corrupt_stats = true;
                }
                if partition.num_rows > -1 {
                    stats.cardinality = stats.cardinality.saturating_add(partition.num_rows);
                    has_valid_cardinality = true;
                } else {
                    stats.partitions_missing_stats += 1;
                }
                stats.total_files += partition.num_files();
                stats.total_bytes += partition.size();
            }
            if !partitions.is_empty() && !has_valid_cardinality {
                stats.cardinality = table.num_rows();
            }
        }
        if stats.cardinality < -1 {
            stats.has_corrupt_stats = true;
            stats.cardinality = -1;
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct ScanNode {
    pub table: Arc<FsTable>,

    /// Partitions left after pruning, ascending
    pub partition_ids: Vec<PartitionId>,
    pub predicates: Vec<PartitionPredicate>,

    /// Reads a collection-typed column; collection sizes are unknown
    pub reads_collection: bool,

    /// Non-partition columns read
    pub num_scanned_columns: usize,

    pub scan_ranges: Vec<ScanRangeLocations>,
    pub stats: ScanStats,

    /// -1 until computed
    pub per_host_mem_cost: i64,
}

impl ScanNode {
    /// Plans a scan of `table` and adds it to the context.
    ///
    /// `limit` is -1 for no limit.
    pub fn plan(
        ctx: &mut PlannerContext,
        table: Arc<FsTable>,
        predicates: Vec<PartitionPredicate>,
        num_scanned_columns: usize,
        limit: i64,
    ) -> Result<PlanNodeId> {
        let pruning = PartitionPruner::prune(&table, &predicates)?;
        let partitions = pruning
            .retained_partitions
            .iter()
            .map(|id| {
                table.get_partition(*id).ok_or_else(|| {
                    FeError::InternalError(format!("partition {} of {} vanished", id, table.full_name()))
                })
            })
            .collect::<Result<Vec<&Partition>>>()?;

        let max_len = ctx.options().max_scan_range_length;
        let scan_ranges = ScanRangeBuilder::build(&table, &partitions, max_len, ctx.host_index_mut())?;
        let stats = ScanStats::compute(&table, &partitions);
        let reads_collection = table.columns().iter().any(|c| c.data_type.is_complex());

        let mut cardinality = stats.cardinality;
        if limit > -1 && (cardinality == -1 || cardinality > limit) {
            cardinality = limit;
        }
        let mut num_nodes =
            ScanRangeBuilder::compute_num_nodes(&scan_ranges, ctx.host_index(), &ctx.cluster(), cardinality)?;
        if ctx.options().num_nodes > 0 {
            num_nodes = num_nodes.min(ctx.options().num_nodes);
        }
        trace!(
            table = %table.full_name(),
            cardinality,
            num_nodes,
            "scan stats computed"
        );

        let mut scan = ScanNode {
            table,
            partition_ids: pruning.retained_partitions,
            predicates,
            reads_collection,
            num_scanned_columns,
            scan_ranges,
            stats,
            per_host_mem_cost: -1,
        };
        scan.compute_costs(ctx.options(), num_nodes);

        let input_cardinality = scan.stats.cardinality;
        let id = ctx.add_node(PlanNodeKind::Scan(Box::new(scan)), Vec::new());
        let node = ctx.node_mut(id);
        node.cardinality = cardinality;
        node.input_cardinality = input_cardinality;
        node.limit = limit;
        node.num_nodes = num_nodes;
        Ok(id)
    }

    pub fn is_table_missing_stats(&self) -> bool {
        self.table.num_rows() == -1
    }

    /// Upper bound of scan memory on one host
    pub fn per_host_mem_upper_bound(num_cores: i32) -> i64 {
        i64::from(num_cores.max(1)) * THREADS_PER_CORE * MAX_IO_BUFFERS_PER_THREAD * IO_MGR_BUFFER_SIZE
    }

    /// Estimates the I/O buffer memory of the scan on one host
    pub fn compute_costs(&mut self, options: &QueryOptions, num_nodes: i32) {
        if self.scan_ranges.is_empty() {
            self.per_host_mem_cost = 0;
            return;
        }
        let num_ranges = self.scan_ranges.len() as i64;
        let per_host_scan_ranges = if self.table.majority_format() == FileFormat::Parquet {
            self.num_scanned_columns as i64
        } else {
            (num_ranges as f64 / f64::from(num_nodes.max(1)) * SCAN_RANGE_SKEW_FACTOR).ceil() as i64
        };

        let mut max_scanner_threads =
            per_host_scan_ranges.min(i64::from(options.num_cores.max(1)) * THREADS_PER_CORE);
        if options.num_scanner_threads > 0 {
            max_scanner_threads = max_scanner_threads.min(i64::from(options.num_scanner_threads));
        }

        let avg_scan_range_bytes = div_ceil(self.stats.total_bytes, num_ranges);
        let per_thread_io_buffers =
            div_ceil(avg_scan_range_bytes, IO_MGR_BUFFER_SIZE).min(MAX_IO_BUFFERS_PER_THREAD) + 1;
        let mut cost = max_scanner_threads * per_thread_io_buffers * IO_MGR_BUFFER_SIZE;

        let upper_bound = Self::per_host_mem_upper_bound(options.num_cores);
        if cost > upper_bound {
            warn!(
                "per-host mem cost {} exceeded per-host upper bound {}",
                format_bytes(cost as u64),
                format_bytes(upper_bound as u64)
            );
            cost = upper_bound;
        }
        self.per_host_mem_cost = cost;
    }
}
