// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Tabular summaries of a file-system table (`SHOW TABLE STATS`, `SHOW FILES`)

use crate::partition::{Partition, PartitionKeyValue};
use crate::table::{FsTable, Table};
use fe_common::utils::format_bytes;
use serde::{Deserialize, Serialize};

const NOT_CACHED: &str = "NOT CACHED";

/// String result set with named columns
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }
}

fn cached_string(is_cached: bool, cached_bytes: i64) -> String {
    if is_cached {
        format_bytes(cached_bytes.max(0) as u64)
    } else {
        NOT_CACHED.to_string()
    }
}

impl FsTable {
    /// Per-partition row, file and size counts ordered by partition values,
    /// followed by a `Total` row for partitioned tables.
    pub fn table_stats(&self) -> ResultSet {
        let mut columns: Vec<String> = self
            .clustering_columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        columns.extend(
            ["#Rows", "#Files", "Size", "Bytes Cached", "Format", "Location"]
                .iter()
                .map(|s| s.to_string()),
        );
        let mut result = ResultSet::new(columns);

        if !self.is_partitioned() {
            result.rows.push(vec![
                self.num_rows().to_string(),
                self.num_files().to_string(),
                format_bytes(self.total_bytes().max(0) as u64),
                cached_string(self.is_cached(), self.partitions().map(|p| p.cached_bytes()).sum()),
                self.majority_format().to_string(),
                self.base_dir().to_string(),
            ]);
            return result;
        }

        let mut total_cached = 0;
        let mut any_cached = false;
        for partition in self.sorted_partitions() {
            let mut row: Vec<String> = partition
                .values
                .iter()
                .map(|v| v.to_partition_key_string(self.null_partition_key_value()))
                .collect();
            row.push(partition.num_rows.to_string());
            row.push(partition.num_files().to_string());
            row.push(format_bytes(partition.size().max(0) as u64));
            row.push(cached_string(partition.is_cached, partition.cached_bytes()));
            row.push(partition.file_format.to_string());
            row.push(partition.location.clone());
            if partition.is_cached {
                any_cached = true;
                total_cached += partition.cached_bytes();
            }
            result.rows.push(row);
        }

        let mut total = vec!["Total".to_string()];
        total.extend((1..self.num_clustering_cols()).map(|_| String::new()));
        total.push(self.num_rows().to_string());
        total.push(self.num_files().to_string());
        total.push(format_bytes(self.total_bytes().max(0) as u64));
        total.push(cached_string(any_cached, total_cached));
        total.push(String::new());
        total.push(String::new());
        result.rows.push(total);
        result
    }

    /// Data files of the given partitions (all partitions when `None`),
    /// ordered by partition values, then file name.
    pub fn files(&self, partition_set: Option<&[Vec<PartitionKeyValue>]>) -> ResultSet {
        let mut result = ResultSet::new(vec![
            "Path".to_string(),
            "Size".to_string(),
            "Partition".to_string(),
        ]);

        let mut partitions: Vec<&Partition> = match partition_set {
            Some(set) => self.get_partitions_from_partition_set(set),
            None => self.sorted_partitions(),
        };
        partitions.sort_by(|a, b| a.values.cmp(&b.values).then(a.id.cmp(&b.id)));
        partitions.dedup_by_key(|p| p.id);

        for partition in partitions {
            let partition_name =
                partition.partition_name(self.clustering_columns(), self.null_partition_key_value());
            let mut files: Vec<_> = partition.files.iter().collect();
            files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
            for file in files {
                result.rows.push(vec![
                    format!("{}/{}", partition.location.trim_end_matches('/'), file.file_name),
                    format_bytes(file.file_length.max(0) as u64),
                    partition_name.clone(),
                ]);
            }
        }
        result
    }
}
