// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Per-column partition value index
//!
//! For each clustering column the index keeps an ordered map from partition
//! value to the ids of partitions holding that value, plus the set of ids
//! whose value is NULL. Every indexed id sits in exactly one of the two per
//! column. Column stats (`num_nulls`, `num_distinct_values`) of the clustering
//! columns are maintained alongside.

use crate::column::Column;
use crate::literal::PartitionValue;
use fe_common::PartitionId;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

pub type PartitionValueMap = BTreeMap<PartitionValue, HashSet<PartitionId>>;

#[derive(Debug, Clone, Default)]
pub struct PartitionIndex {
    value_maps: Vec<PartitionValueMap>,
    null_ids: Vec<HashSet<PartitionId>>,
    partition_ids: HashSet<PartitionId>,
}

impl PartitionIndex {
    pub fn new(num_clustering_cols: usize) -> Self {
        Self {
            value_maps: vec![BTreeMap::new(); num_clustering_cols],
            null_ids: vec![HashSet::new(); num_clustering_cols],
            partition_ids: HashSet::new(),
        }
    }

    pub fn num_clustering_cols(&self) -> usize {
        self.value_maps.len()
    }

    /// Indexes `id` under `values`; `cols` are the clustering columns whose
    /// stats track the index.
    pub fn add(&mut self, id: PartitionId, values: &[PartitionValue], cols: &mut [Column]) {
        for (i, value) in values.iter().enumerate().take(self.value_maps.len()) {
            let stats = &mut cols[i].stats;
            if value.is_null() {
                if self.null_ids[i].is_empty() {
                    stats.num_distinct_values += 1;
                }
                self.null_ids[i].insert(id);
                stats.num_nulls += 1;
            } else {
                let bucket = self.value_maps[i].entry(value.clone()).or_insert_with(|| {
                    stats.num_distinct_values += 1;
                    HashSet::new()
                });
                bucket.insert(id);
            }
        }
        self.partition_ids.insert(id);
    }

    /// Exact inverse of `add`
    pub fn remove(&mut self, id: PartitionId, values: &[PartitionValue], cols: &mut [Column]) {
        for (i, value) in values.iter().enumerate().take(self.value_maps.len()) {
            let stats = &mut cols[i].stats;
            if value.is_null() {
                if self.null_ids[i].remove(&id) {
                    stats.num_nulls -= 1;
                    if self.null_ids[i].is_empty() {
                        stats.num_distinct_values -= 1;
                    }
                }
            } else if let Some(bucket) = self.value_maps[i].get_mut(value) {
                bucket.remove(&id);
                if bucket.is_empty() {
                    self.value_maps[i].remove(value);
                    stats.num_distinct_values -= 1;
                }
            }
        }
        self.partition_ids.remove(&id);
    }

    pub fn clear(&mut self) {
        for map in &mut self.value_maps {
            map.clear();
        }
        for ids in &mut self.null_ids {
            ids.clear();
        }
        self.partition_ids.clear();
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        self.partition_ids.contains(&id)
    }

    pub fn value_map(&self, col_idx: usize) -> Option<&PartitionValueMap> {
        self.value_maps.get(col_idx)
    }

    pub fn null_ids(&self, col_idx: usize) -> Option<&HashSet<PartitionId>> {
        self.null_ids.get(col_idx)
    }

    pub fn partition_ids(&self) -> &HashSet<PartitionId> {
        &self.partition_ids
    }

    /// Ids of partitions whose value of column `col_idx` is `value`
    pub fn ids_with_value(&self, col_idx: usize, value: &PartitionValue) -> HashSet<PartitionId> {
        if value.is_null() {
            return self.null_ids.get(col_idx).cloned().unwrap_or_default();
        }
        self.value_maps
            .get(col_idx)
            .and_then(|map| map.get(value))
            .cloned()
            .unwrap_or_default()
    }

    /// Ids of partitions whose non-NULL value of column `col_idx` falls
    /// within the bounds
    pub fn ids_in_range(
        &self,
        col_idx: usize,
        lower: Bound<&PartitionValue>,
        upper: Bound<&PartitionValue>,
    ) -> HashSet<PartitionId> {
        let mut result = HashSet::new();
        let map = match self.value_maps.get(col_idx) {
            Some(map) => map,
            None => return result,
        };
        if is_empty_range(lower, upper) {
            return result;
        }
        for ids in map.range::<PartitionValue, _>((lower, upper)).map(|(_, ids)| ids) {
            result.extend(ids.iter().copied());
        }
        result
    }
}

fn is_empty_range(lower: Bound<&PartitionValue>, upper: Bound<&PartitionValue>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u))
        | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnStats;
    use fe_common::DataType;

    fn cols() -> Vec<Column> {
        let mut cols = vec![Column::new("k", DataType::Int, 0)];
        cols[0].stats = ColumnStats::zeroed();
        cols
    }

    #[test]
    fn test_null_bucket() {
        let mut cols = cols();
        let mut index = PartitionIndex::new(1);
        index.add(PartitionId::new(1), &[PartitionValue::Null], &mut cols);
        index.add(PartitionId::new(2), &[PartitionValue::Null], &mut cols);
        assert_eq!(cols[0].stats.num_nulls, 2);
        assert_eq!(cols[0].stats.num_distinct_values, 1);
        assert!(index.value_map(0).unwrap().is_empty());

        index.remove(PartitionId::new(1), &[PartitionValue::Null], &mut cols);
        assert_eq!(cols[0].stats.num_distinct_values, 1);
        index.remove(PartitionId::new(2), &[PartitionValue::Null], &mut cols);
        assert_eq!(cols[0].stats, ColumnStats::zeroed());
        assert!(index.partition_ids().is_empty());
    }

    #[test]
    fn test_range_lookup() {
        let mut cols = cols();
        let mut index = PartitionIndex::new(1);
        for v in 1..=5 {
            index.add(PartitionId::new(v), &[PartitionValue::Integer(v * 10)], &mut cols);
        }
        let ids = index.ids_in_range(
            0,
            Bound::Included(&PartitionValue::Integer(20)),
            Bound::Excluded(&PartitionValue::Integer(40)),
        );
        assert_eq!(ids, [PartitionId::new(2), PartitionId::new(3)].into_iter().collect());
        let empty = index.ids_in_range(
            0,
            Bound::Excluded(&PartitionValue::Integer(40)),
            Bound::Excluded(&PartitionValue::Integer(40)),
        );
        assert!(empty.is_empty());
    }
}
