// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Partition pruning
//!
//! Evaluates conjunctive predicates on clustering columns against the
//! partition value index of a table, keeping only partitions that may hold
//! matching rows.

use fe_catalog::{FsTable, PartitionValue, Table};
use fe_common::{FeError, PartitionId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Bound;
use tracing::debug;

/// One end of a range predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub value: PartitionValue,
    #[serde(default)]
    pub inclusive: bool,
}

impl RangeBound {
    pub fn inclusive(value: impl Into<PartitionValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(value: impl Into<PartitionValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: false,
        }
    }

    fn as_bound(&self) -> Bound<&PartitionValue> {
        if self.inclusive {
            Bound::Included(&self.value)
        } else {
            Bound::Excluded(&self.value)
        }
    }
}

fn as_bound(bound: &Option<RangeBound>) -> Bound<&PartitionValue> {
    bound.as_ref().map_or(Bound::Unbounded, RangeBound::as_bound)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateOp {
    /// `col = v`; a NULL literal matches the NULL partition
    Eq { value: PartitionValue },
    In { values: Vec<PartitionValue> },
    /// NULL partitions never match a range
    Range {
        #[serde(default)]
        lower: Option<RangeBound>,
        #[serde(default)]
        upper: Option<RangeBound>,
    },
    IsNull,
    IsNotNull,
}

/// Predicate on a single clustering column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionPredicate {
    pub column: String,
    pub op: PredicateOp,
}

impl PartitionPredicate {
    pub fn equals(column: &str, value: impl Into<PartitionValue>) -> Self {
        Self {
            column: column.to_string(),
            op: PredicateOp::Eq { value: value.into() },
        }
    }

    pub fn in_list(column: &str, values: Vec<PartitionValue>) -> Self {
        Self {
            column: column.to_string(),
            op: PredicateOp::In { values },
        }
    }

    pub fn range(column: &str, lower: Option<RangeBound>, upper: Option<RangeBound>) -> Self {
        Self {
            column: column.to_string(),
            op: PredicateOp::Range { lower, upper },
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            op: PredicateOp::IsNull,
        }
    }

    pub fn is_not_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            op: PredicateOp::IsNotNull,
        }
    }
}

impl fmt::Display for PartitionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            PredicateOp::Eq { value } => write!(f, "{} = {}", self.column, value),
            PredicateOp::In { values } => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", self.column, values.join(", "))
            }
            PredicateOp::Range { lower, upper } => {
                let mut parts = Vec::new();
                if let Some(lower) = lower {
                    let op = if lower.inclusive { ">=" } else { ">" };
                    parts.push(format!("{} {} {}", self.column, op, lower.value));
                }
                if let Some(upper) = upper {
                    let op = if upper.inclusive { "<=" } else { "<" };
                    parts.push(format!("{} {} {}", self.column, op, upper.value));
                }
                if parts.is_empty() {
                    return write!(f, "TRUE");
                }
                write!(f, "{}", parts.join(" AND "))
            }
            PredicateOp::IsNull => write!(f, "{} IS NULL", self.column),
            PredicateOp::IsNotNull => write!(f, "{} IS NOT NULL", self.column),
        }
    }
}

/// Partition pruning result
#[derive(Debug, Clone, PartialEq)]
pub struct PruningResult {
    /// Ascending
    pub retained_partitions: Vec<PartitionId>,
    /// Ascending
    pub pruned_partitions: Vec<PartitionId>,
    pub pruning_ratio: f64,
}

impl PruningResult {
    pub fn new(mut retained: Vec<PartitionId>, mut pruned: Vec<PartitionId>) -> Self {
        retained.sort();
        pruned.sort();
        let total = retained.len() + pruned.len();
        let pruning_ratio = if total > 0 {
            pruned.len() as f64 / total as f64
        } else {
            0.0
        };
        Self {
            retained_partitions: retained,
            pruned_partitions: pruned,
            pruning_ratio,
        }
    }
}

pub struct PartitionPruner;

impl PartitionPruner {
    pub fn prune(table: &FsTable, predicates: &[PartitionPredicate]) -> Result<PruningResult> {
        let index = table.partition_index();
        let all_ids = index.partition_ids();
        let mut retained: HashSet<PartitionId> = all_ids.clone();

        for predicate in predicates {
            let col_idx = table
                .clustering_columns()
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(&predicate.column))
                .ok_or_else(|| {
                    FeError::AnalysisError(format!(
                        "'{}' is not a partition column of {}",
                        predicate.column,
                        table.full_name()
                    ))
                })?;
            let matching = match &predicate.op {
                PredicateOp::Eq { value } => index.ids_with_value(col_idx, value),
                PredicateOp::In { values } => values
                    .iter()
                    .flat_map(|v| index.ids_with_value(col_idx, v))
                    .collect(),
                PredicateOp::Range { lower, upper } => {
                    index.ids_in_range(col_idx, as_bound(lower), as_bound(upper))
                }
                PredicateOp::IsNull => index.null_ids(col_idx).cloned().unwrap_or_default(),
                PredicateOp::IsNotNull => {
                    let nulls = index.null_ids(col_idx).cloned().unwrap_or_default();
                    all_ids.difference(&nulls).copied().collect()
                }
            };
            retained.retain(|id| matching.contains(id));
        }

        let pruned: Vec<PartitionId> = all_ids
            .iter()
            .filter(|id| !retained.contains(id))
            .copied()
            .collect();
        let result = PruningResult::new(retained.into_iter().collect(), pruned);
        debug!(
            table = %table.full_name(),
            retained = result.retained_partitions.len(),
            pruned = result.pruned_partitions.len(),
            "partition pruning: {}% reduction",
            (result.pruning_ratio * 100.0) as i32
        );
        Ok(result)
    }
}
