// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Table definitions

use crate::column::{Column, ColumnStats};
use crate::host_index::HostIndex;
use crate::literal::PartitionValue;
use crate::partition::{FileDescriptor, Partition, PartitionKeyValue};
use crate::partition_index::{PartitionIndex, PartitionValueMap};
use fe_common::constants::{DEFAULT_NULL_COLUMN_VALUE, DEFAULT_NULL_PARTITION_KEY_VALUE};
use fe_common::{DataType, FeError, FileFormat, Id, IdGenerator, PartitionId, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Base table trait
pub trait Table: Send + Sync {
    fn name(&self) -> &str;
    fn db_name(&self) -> &str;
    fn columns(&self) -> &[Column];
    fn num_clustering_cols(&self) -> usize;

    /// Row count (-1 = unknown)
    fn num_rows(&self) -> i64;

    fn full_name(&self) -> String {
        format!("{}.{}", self.db_name(), self.name())
    }

    fn clustering_columns(&self) -> &[Column] {
        &self.columns()[..self.num_clustering_cols()]
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Table whose data lives in partition directories of a distributed file
/// system.
///
/// Not internally synchronised; shared copies are published by the catalog.
#[derive(Debug, Clone)]
pub struct FsTable {
    db_name: String,
    name: String,

    /// Clustering columns first
    columns: Vec<Column>,
    num_clustering_cols: usize,

    base_dir: String,
    null_partition_key_value: String,
    null_column_value: String,

    /// Schema/format holder, never indexed or scanned
    default_partition: Partition,

    partitions: HashMap<PartitionId, Partition>,
    name_to_partition: HashMap<String, PartitionId>,
    index: PartitionIndex,
    host_index: HostIndex,

    num_files: i64,
    total_bytes: i64,

    /// Row count (-1 = unknown)
    num_rows: i64,
    is_cached: bool,

    partition_id_gen: IdGenerator<PartitionId>,
    /// Highest id ever added, dropped ids stay retired below it
    max_partition_id: i64,
}

impl FsTable {
    pub fn new(
        db_name: impl Into<String>,
        name: impl Into<String>,
        mut columns: Vec<Column>,
        num_clustering_cols: usize,
        base_dir: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if num_clustering_cols > columns.len() {
            return Err(FeError::TableLoadingError(format!(
                "table {} declares {} clustering columns but has {} columns",
                name,
                num_clustering_cols,
                columns.len()
            )));
        }
        for col in &mut columns[..num_clustering_cols] {
            if !col.data_type.supports_table_partitioning() {
                return Err(FeError::TableLoadingError(format!(
                    "failed to load table {}: partition column '{}' has type {} which is not supported as a partition key",
                    name, col.name, col.data_type
                )));
            }
            col.stats = ColumnStats::zeroed();
        }

        let base_dir = base_dir.into();
        let mut partition_id_gen = IdGenerator::new();
        let default_id: PartitionId = partition_id_gen.get_next_id();
        let default_partition = Partition::new(
            default_id,
            Vec::new(),
            base_dir.clone(),
            FileFormat::Text,
        );

        Ok(Self {
            db_name: db_name.into(),
            name,
            columns,
            num_clustering_cols,
            base_dir,
            null_partition_key_value: DEFAULT_NULL_PARTITION_KEY_VALUE.to_string(),
            null_column_value: DEFAULT_NULL_COLUMN_VALUE.to_string(),
            default_partition,
            partitions: HashMap::new(),
            name_to_partition: HashMap::new(),
            index: PartitionIndex::new(num_clustering_cols),
            host_index: HostIndex::new(),
            num_files: 0,
            total_bytes: 0,
            num_rows: -1,
            is_cached: false,
            partition_id_gen,
            max_partition_id: default_id.as_int(),
        })
    }

    pub fn with_null_values(
        mut self,
        null_partition_key_value: impl Into<String>,
        null_column_value: impl Into<String>,
    ) -> Self {
        self.null_partition_key_value = null_partition_key_value.into();
        self.null_column_value = null_column_value.into();
        self
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn null_partition_key_value(&self) -> &str {
        &self.null_partition_key_value
    }

    pub fn null_column_value(&self) -> &str {
        &self.null_column_value
    }

    pub fn is_cached(&self) -> bool {
        self.is_cached
    }

    pub fn set_cached(&mut self, is_cached: bool) {
        self.is_cached = is_cached;
    }

    pub fn set_num_rows(&mut self, num_rows: i64) {
        self.num_rows = num_rows;
    }

    pub fn num_files(&self) -> i64 {
        self.num_files
    }

    pub fn total_bytes(&self) -> i64 {
        self.total_bytes
    }

    pub fn is_partitioned(&self) -> bool {
        self.num_clustering_cols > 0
    }

    pub fn host_index(&self) -> &HostIndex {
        &self.host_index
    }

    pub fn host_index_mut(&mut self) -> &mut HostIndex {
        &mut self.host_index
    }

    pub fn default_partition(&self) -> &Partition {
        &self.default_partition
    }

    /// Allocates a partition id that has never been handed out by this table
    pub fn next_partition_id(&mut self) -> PartitionId {
        self.partition_id_gen.get_next_id()
    }

    /// Adds a partition built with an id from `next_partition_id`.
    ///
    /// Ids must increase across adds. An id at or below the highest one
    /// this table has held is rejected even after that partition is
    /// dropped. Ids taken from outside the generator move it forward.
    ///
    /// Decimal keys are stored at the clustering column's scale.
    pub fn add_partition(&mut self, partition: Partition) -> Result<()> {
        let partition = self.scale_decimal_keys(partition)?;
        self.check_new_partition(&partition)?;
        self.insert_partition(partition);
        Ok(())
    }

    fn scale_decimal_keys(&self, mut partition: Partition) -> Result<Partition> {
        for (value, col) in partition.values.iter_mut().zip(self.clustering_columns()) {
            let DataType::Decimal { scale, .. } = &col.data_type else {
                continue;
            };
            if !matches!(value, PartitionValue::Decimal { .. }) {
                continue;
            }
            *value = value.with_scale(*scale).ok_or_else(|| {
                FeError::InvalidArgument(format!(
                    "partition key {} does not fit column '{}' of type {}",
                    value, col.name, col.data_type
                ))
            })?;
        }
        Ok(partition)
    }

    fn check_new_partition(&self, partition: &Partition) -> Result<()> {
        if partition.is_default() {
            return Err(FeError::InvalidArgument(format!(
                "the default partition of {} is set through add_default_partition",
                self.name
            )));
        }
        if self.partitions.contains_key(&partition.id) {
            return Err(FeError::AlreadyExists(format!(
                "partition {} already exists in table {}",
                partition.id, self.name
            )));
        }
        if partition.id.as_int() <= self.max_partition_id {
            return Err(FeError::AlreadyExists(format!(
                "partition id {} was already used in table {} (highest id {})",
                partition.id, self.name, self.max_partition_id
            )));
        }
        if partition.values.len() != self.num_clustering_cols {
            return Err(FeError::InvalidArgument(format!(
                "partition {} has {} key values, table {} has {} clustering columns",
                partition.id,
                partition.values.len(),
                self.name,
                self.num_clustering_cols
            )));
        }
        Ok(())
    }

    fn insert_partition(&mut self, partition: Partition) {
        let id = partition.id.as_int();
        self.max_partition_id = id;
        if id >= self.partition_id_gen.peek_next_id().as_int() {
            self.partition_id_gen = IdGenerator::starting_at(id + 1);
        }

        let partition_name =
            partition.partition_name(self.clustering_columns(), &self.null_partition_key_value);
        self.name_to_partition.insert(partition_name, partition.id);
        self.index.add(
            partition.id,
            &partition.values,
            &mut self.columns[..self.num_clustering_cols],
        );
        self.num_files += partition.num_files();
        self.total_bytes += partition.size();
        debug!(
            table = %self.name,
            partition_id = %partition.id,
            num_files = partition.num_files(),
            "added partition"
        );
        self.partitions.insert(partition.id, partition);
    }

    pub fn drop_partition(&mut self, id: PartitionId) -> Option<Partition> {
        let partition = self.partitions.remove(&id)?;
        let partition_name =
            partition.partition_name(self.clustering_columns(), &self.null_partition_key_value);
        self.name_to_partition.remove(&partition_name);
        self.index.remove(
            partition.id,
            &partition.values,
            &mut self.columns[..self.num_clustering_cols],
        );
        self.num_files -= partition.num_files();
        self.total_bytes -= partition.size();
        debug!(table = %self.name, partition_id = %id, "dropped partition");
        Some(partition)
    }

    pub fn drop_partition_by_spec(&mut self, spec: &[PartitionKeyValue]) -> Option<Partition> {
        let id = self.get_partition_by_spec(spec)?.id;
        self.drop_partition(id)
    }

    /// Drops every listed partition that exists, returning the dropped ones
    pub fn drop_partitions(&mut self, ids: &[PartitionId]) -> Vec<Partition> {
        ids.iter().filter_map(|id| self.drop_partition(*id)).collect()
    }

    /// Removes all non-default partitions along with the index, stats and totals
    pub fn reset_partitions(&mut self) {
        self.partitions.clear();
        self.name_to_partition.clear();
        self.index.clear();
        for col in &mut self.columns[..self.num_clustering_cols] {
            col.stats = ColumnStats::zeroed();
        }
        self.num_files = 0;
        self.total_bytes = 0;
    }

    /// Adds or replaces the default partition
    pub fn add_default_partition(&mut self, location: impl Into<String>, file_format: FileFormat) {
        let id = self.default_partition.id;
        self.default_partition = Partition::new(id, Vec::new(), location, file_format);
    }

    /// Builds a partition with a fresh id and adds it
    pub fn create_partition(
        &mut self,
        values: Vec<PartitionValue>,
        location: impl Into<String>,
        file_format: FileFormat,
        files: Vec<FileDescriptor>,
    ) -> Result<PartitionId> {
        let id = self.next_partition_id();
        let partition = Partition::new(id, values, location, file_format).with_files(files);
        self.add_partition(partition)?;
        Ok(id)
    }

    /// Replaces partition `old_id` with `partition`, which needs a fresh id.
    /// The table is unchanged when either side is rejected.
    pub fn reload_partition(&mut self, old_id: PartitionId, partition: Partition) -> Result<()> {
        if !self.partitions.contains_key(&old_id) {
            return Err(FeError::NotFound(format!(
                "partition {} not found in table {}",
                old_id, self.name
            )));
        }
        let partition = self.scale_decimal_keys(partition)?;
        self.check_new_partition(&partition)?;
        self.drop_partition(old_id);
        self.insert_partition(partition);
        Ok(())
    }

    pub fn get_partition(&self, id: PartitionId) -> Option<&Partition> {
        self.partitions.get(&id)
    }

    pub fn get_partition_by_name(&self, partition_name: &str) -> Option<&Partition> {
        self.name_to_partition
            .get(partition_name)
            .and_then(|id| self.partitions.get(id))
    }

    /// Partition whose key values exactly match `spec`.
    ///
    /// Key names match clustering columns case-insensitively; a column named
    /// twice, or a spec that does not name every clustering column, matches
    /// nothing. NULL and the empty string both compare as the NULL partition
    /// key value.
    pub fn get_partition_by_spec(&self, spec: &[PartitionKeyValue]) -> Option<&Partition> {
        let mut target_values = Vec::with_capacity(self.num_clustering_cols);
        for col in self.clustering_columns() {
            let mut matched = spec.iter().filter(|kv| kv.name.eq_ignore_ascii_case(&col.name));
            let kv = match matched.next() {
                Some(kv) => kv,
                None => break,
            };
            if matched.next().is_some() {
                return None;
            }
            target_values.push(self.key_string(&kv.value));
        }
        if target_values.is_empty() || target_values.len() != self.num_clustering_cols {
            return None;
        }

        self.partitions.values().find(|partition| {
            partition
                .values
                .iter()
                .zip(target_values.iter())
                .all(|(value, target)| self.key_string(value) == *target)
        })
    }

    fn key_string(&self, value: &PartitionValue) -> String {
        match value {
            PartitionValue::String(s) if s.is_empty() => self.null_partition_key_value.clone(),
            other => other.to_partition_key_string(&self.null_partition_key_value),
        }
    }

    /// Partitions matching each spec of the set; specs with no match are skipped
    pub fn get_partitions_from_partition_set(
        &self,
        partition_set: &[Vec<PartitionKeyValue>],
    ) -> Vec<&Partition> {
        partition_set
            .iter()
            .filter_map(|spec| self.get_partition_by_spec(spec))
            .collect()
    }

    /// Non-default partitions, unordered
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    /// Non-default partitions ordered by key values, then id
    pub fn sorted_partitions(&self) -> Vec<&Partition> {
        let mut partitions: Vec<&Partition> = self.partitions.values().collect();
        partitions.sort_by(|a, b| a.values.cmp(&b.values).then(a.id.cmp(&b.id)));
        partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition_value_map(&self, col_idx: usize) -> Option<&PartitionValueMap> {
        self.index.value_map(col_idx)
    }

    pub fn null_partition_ids(&self, col_idx: usize) -> Option<&HashSet<PartitionId>> {
        self.index.null_ids(col_idx)
    }

    pub fn partition_ids(&self) -> &HashSet<PartitionId> {
        self.index.partition_ids()
    }

    pub fn partition_index(&self) -> &PartitionIndex {
        &self.index
    }

    /// Most common file format among partitions; ties go to the format that
    /// sorts first. Falls back to the default partition's format.
    pub fn majority_format(&self) -> FileFormat {
        let mut counts: BTreeMap<FileFormat, usize> = BTreeMap::new();
        for partition in self.partitions.values() {
            *counts.entry(partition.file_format).or_insert(0) += 1;
        }
        let mut majority: Option<(FileFormat, usize)> = None;
        for (format, count) in counts {
            if majority.map_or(true, |(_, best)| count > best) {
                majority = Some((format, count));
            }
        }
        majority
            .map(|(format, _)| format)
            .unwrap_or(self.default_partition.file_format)
    }

    fn all_partitions(&self) -> impl Iterator<Item = &Partition> {
        std::iter::once(&self.default_partition).chain(self.partitions.values())
    }

    pub fn has_write_access(&self) -> bool {
        self.all_partitions()
            .all(|p| p.access_level.implies_write_access())
    }

    /// Location of some partition the frontend cannot write to
    pub fn first_location_without_write_access(&self) -> Option<&str> {
        self.all_partitions()
            .find(|p| !p.access_level.implies_write_access())
            .map(|p| p.location.as_str())
    }
}

impl Table for FsTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn db_name(&self) -> &str {
        &self.db_name
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn num_clustering_cols(&self) -> usize {
        self.num_clustering_cols
    }

    fn num_rows(&self) -> i64 {
        self.num_rows
    }
}
