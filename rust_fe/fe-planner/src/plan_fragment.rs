// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan fragments - the unit of distributed execution

use crate::data_sink::DataSink;
use crate::expr::{to_sql_list, Expr};
use fe_common::{CohortId, FragmentId, PlanId, PlanNodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the rows of a fragment's output (or input) are spread across hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "exprs", rename_all = "snake_case")]
pub enum DataPartition {
    Unpartitioned,
    Random,
    Hash(Vec<Expr>),
    Range(Vec<Expr>),
}

impl DataPartition {
    pub fn is_partitioned(&self) -> bool {
        !matches!(self, DataPartition::Unpartitioned)
    }
}

impl Default for DataPartition {
    fn default() -> Self {
        DataPartition::Unpartitioned
    }
}

impl fmt::Display for DataPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPartition::Unpartitioned => write!(f, "UNPARTITIONED"),
            DataPartition::Random => write!(f, "RANDOM"),
            DataPartition::Hash(exprs) => write!(f, "HASH({})", to_sql_list(exprs)),
            DataPartition::Range(exprs) => write!(f, "RANGE({})", to_sql_list(exprs)),
        }
    }
}

/// Fragment of a distributed plan: a subtree of plan nodes bounded by
/// exchange nodes, executed on one or more hosts.
#[derive(Debug, Clone)]
pub struct PlanFragment {
    pub id: FragmentId,
    pub plan_root: PlanNodeId,

    /// Exchange node in the parent fragment receiving this fragment's output
    pub dest_node: Option<PlanNodeId>,

    pub parent: Option<FragmentId>,
    pub children: Vec<FragmentId>,
    pub sink: Option<DataSink>,
    pub data_partition: DataPartition,

    /// Both invalid until the fragment is assigned to a plan
    pub plan_id: PlanId,
    pub cohort_id: CohortId,
}

impl PlanFragment {
    pub fn new(id: FragmentId, plan_root: PlanNodeId, data_partition: DataPartition) -> Self {
        Self {
            id,
            plan_root,
            dest_node: None,
            parent: None,
            children: Vec::new(),
            sink: None,
            data_partition,
            plan_id: PlanId::default(),
            cohort_id: CohortId::default(),
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.data_partition.is_partitioned()
    }

    /// Removes `child` from the children, returning whether it was present
    pub fn remove_child(&mut self, child: FragmentId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }
}
