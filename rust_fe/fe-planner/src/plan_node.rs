// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan nodes of a distributed plan
//!
//! Nodes live in the `PlannerContext` arena and refer to each other by id.
//! The kind of a node is a closed sum type; planning passes match on it
//! instead of testing node types at runtime.

use crate::expr::Expr;
use crate::scan_node::ScanNode;
use fe_common::{check_state, FeError, FragmentId, Id, JoinTableId, PlanNodeId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOp {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    RightSemi,
    LeftAnti,
    RightAnti,
    Cross,
}

impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinOp::Inner => "INNER JOIN",
            JoinOp::LeftOuter => "LEFT OUTER JOIN",
            JoinOp::RightOuter => "RIGHT OUTER JOIN",
            JoinOp::FullOuter => "FULL OUTER JOIN",
            JoinOp::LeftSemi => "LEFT SEMI JOIN",
            JoinOp::RightSemi => "RIGHT SEMI JOIN",
            JoinOp::LeftAnti => "LEFT ANTI JOIN",
            JoinOp::RightAnti => "RIGHT ANTI JOIN",
            JoinOp::Cross => "CROSS JOIN",
        };
        write!(f, "{}", name)
    }
}

/// How the two join inputs are distributed across hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    None,
    Broadcast,
    Partitioned,
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionMode::None => "NONE",
            DistributionMode::Broadcast => "BROADCAST",
            DistributionMode::Partitioned => "PARTITIONED",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinAlgorithm {
    Hash,
    NestedLoop,
}

/// Join of child 0 (probe side) with child 1 (build side)
#[derive(Debug, Clone)]
pub struct JoinNode {
    pub op: JoinOp,
    pub algorithm: JoinAlgorithm,
    pub distribution: DistributionMode,

    /// Equi-join conjuncts, each a binary predicate `probe_expr = build_expr`
    pub eq_join_conjuncts: Vec<Expr>,
    pub other_join_conjuncts: Vec<Expr>,

    join_table_id: JoinTableId,
}

impl JoinNode {
    pub fn new(
        op: JoinOp,
        algorithm: JoinAlgorithm,
        distribution: DistributionMode,
        eq_join_conjuncts: Vec<Expr>,
        other_join_conjuncts: Vec<Expr>,
    ) -> Self {
        Self {
            op,
            algorithm,
            distribution,
            eq_join_conjuncts,
            other_join_conjuncts,
            join_table_id: JoinTableId::default(),
        }
    }

    pub fn join_table_id(&self) -> JoinTableId {
        self.join_table_id
    }

    /// Records the join-table slot of the build side; assigned at most once.
    pub fn set_join_table_id(&mut self, id: JoinTableId) -> Result<()> {
        check_state!(id.is_valid(), "invalid join table id {}", id);
        check_state!(
            !self.join_table_id.is_valid(),
            "join table id already assigned: {}",
            self.join_table_id
        );
        self.join_table_id = id;
        Ok(())
    }

    /// Build-side exprs: the right operand of every equi-join conjunct.
    /// Nested-loop joins have none.
    pub fn build_exprs(&self) -> Result<Vec<Expr>> {
        if self.algorithm == JoinAlgorithm::NestedLoop {
            return Ok(Vec::new());
        }
        self.eq_join_conjuncts
            .iter()
            .map(|conjunct| {
                conjunct.child(1).cloned().ok_or_else(|| {
                    FeError::InternalError(format!(
                        "equi-join conjunct is not a binary predicate: {}",
                        conjunct
                    ))
                })
            })
            .collect()
    }
}

/// Receives the output of another fragment; marks a fragment boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeNode {
    pub input: FragmentId,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationNode {
    pub grouping_exprs: Vec<Expr>,
    pub aggregate_exprs: Vec<Expr>,
    pub needs_finalize: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SortNode {
    pub ordering_exprs: Vec<Expr>,
    pub is_asc_order: Vec<bool>,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct UnnestNode {
    pub collection_expr: Expr,
}

#[derive(Debug, Clone)]
pub enum PlanNodeKind {
    Scan(Box<ScanNode>),
    Join(JoinNode),
    Exchange(ExchangeNode),
    /// Evaluates child 1 once per row of child 0
    Subplan,
    Aggregation(AggregationNode),
    Select,
    Sort(SortNode),
    Union,
    Unnest(UnnestNode),
    SingularRowSrc,
    EmptySet,
}

#[derive(Debug, Clone)]
pub struct PlanNode {
    pub id: PlanNodeId,
    pub kind: PlanNodeKind,
    pub children: Vec<PlanNodeId>,

    /// Fragment executing this node
    pub fragment: FragmentId,

    /// Output rows (-1 = unknown)
    pub cardinality: i64,

    /// Rows consumed (-1 = unknown)
    pub input_cardinality: i64,

    /// Average output row size in bytes (-1 = unknown)
    pub avg_row_size: f64,

    /// -1 = no limit
    pub limit: i64,

    pub num_nodes: i32,

    pub conjuncts: Vec<Expr>,
}

impl PlanNode {
    pub fn new(id: PlanNodeId, kind: PlanNodeKind, children: Vec<PlanNodeId>) -> Self {
        Self {
            id,
            kind,
            children,
            fragment: FragmentId::default(),
            cardinality: -1,
            input_cardinality: -1,
            avg_row_size: -1.0,
            limit: -1,
            num_nodes: 1,
            conjuncts: Vec::new(),
        }
    }

    pub fn has_limit(&self) -> bool {
        self.limit > -1
    }

    pub fn child(&self, idx: usize) -> Option<PlanNodeId> {
        self.children.get(idx).copied()
    }

    pub fn as_join(&self) -> Option<&JoinNode> {
        match &self.kind {
            PlanNodeKind::Join(join) => Some(join),
            _ => None,
        }
    }

    pub fn as_join_mut(&mut self) -> Option<&mut JoinNode> {
        match &mut self.kind {
            PlanNodeKind::Join(join) => Some(join),
            _ => None,
        }
    }

    pub fn as_exchange(&self) -> Option<&ExchangeNode> {
        match &self.kind {
            PlanNodeKind::Exchange(exchange) => Some(exchange),
            _ => None,
        }
    }

    pub fn as_scan(&self) -> Option<&ScanNode> {
        match &self.kind {
            PlanNodeKind::Scan(scan) => Some(scan),
            _ => None,
        }
    }

    pub fn is_exchange(&self) -> bool {
        matches!(self.kind, PlanNodeKind::Exchange(_))
    }

    /// Label used in explain output
    pub fn display_name(&self) -> String {
        match &self.kind {
            PlanNodeKind::Scan(_) => "SCAN HDFS".to_string(),
            PlanNodeKind::Join(join) => match join.algorithm {
                JoinAlgorithm::Hash => "HASH JOIN".to_string(),
                JoinAlgorithm::NestedLoop => "NESTED LOOP JOIN".to_string(),
            },
            PlanNodeKind::Exchange(_) => "EXCHANGE".to_string(),
            PlanNodeKind::Subplan => "SUBPLAN".to_string(),
            PlanNodeKind::Aggregation(_) => "AGGREGATE".to_string(),
            PlanNodeKind::Select => "SELECT".to_string(),
            PlanNodeKind::Sort(_) if self.has_limit() => "TOP-N".to_string(),
            PlanNodeKind::Sort(_) => "SORT".to_string(),
            PlanNodeKind::Union => "UNION".to_string(),
            PlanNodeKind::Unnest(_) => "UNNEST".to_string(),
            PlanNodeKind::SingularRowSrc => "SINGULAR ROW SRC".to_string(),
            PlanNodeKind::EmptySet => "EMPTYSET".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_join() -> JoinNode {
        JoinNode::new(
            JoinOp::Inner,
            JoinAlgorithm::Hash,
            DistributionMode::Broadcast,
            vec![
                Expr::equals(Expr::slot("a", "id"), Expr::slot("b", "id")),
                Expr::equals(Expr::slot("a", "k"), Expr::slot("b", "k")),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_build_exprs_are_rhs() {
        let join = hash_join();
        assert_eq!(
            join.build_exprs().unwrap(),
            vec![Expr::slot("b", "id"), Expr::slot("b", "k")]
        );

        let mut nlj = hash_join();
        nlj.algorithm = JoinAlgorithm::NestedLoop;
        assert!(nlj.build_exprs().unwrap().is_empty());
    }

    #[test]
    fn test_join_table_id_assigned_once() {
        let mut join = hash_join();
        assert!(!join.join_table_id().is_valid());
        join.set_join_table_id(JoinTableId::new(0)).unwrap();
        let err = join.set_join_table_id(JoinTableId::new(1)).unwrap_err();
        assert!(err.is_internal());
        assert_eq!(join.join_table_id(), JoinTableId::new(0));
    }
}
