// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Distributed Planner
//!
//! Turns an exchange-annotated distributed plan into plans that can run in
//! parallel: join build sides become separate plans grouped in cohorts.
//! Also plans file-system table scans (pruning, scan ranges, host and
//! memory estimates) and renders plans as text.

pub mod context;
pub mod data_sink;
pub mod explain;
pub mod expr;
pub mod membership;
pub mod parallel_planner;
pub mod partition_pruner;
pub mod plan_fragment;
pub mod plan_node;
pub mod plan_spec;
pub mod scan_node;
pub mod scan_range_builder;
pub mod visitor;

pub use context::{PlannerContext, QueryOptions};
pub use data_sink::{DataSink, JoinBuildSink, SinkInput, SinkKind, TableSink, TableSinkOp};
pub use explain::{explain_plans, ExplainLevel, PlanExplain};
pub use expr::{BinaryOp, Expr};
pub use membership::{ClusterMembership, MembershipSnapshot, MembershipUpdate};
pub use parallel_planner::ParallelPlanner;
pub use partition_pruner::{PartitionPredicate, PartitionPruner, PredicateOp, PruningResult, RangeBound};
pub use plan_fragment::{DataPartition, PlanFragment};
pub use plan_node::{
    AggregationNode, DistributionMode, ExchangeNode, JoinAlgorithm, JoinNode, JoinOp, PlanNode,
    PlanNodeKind, SortNode, UnnestNode,
};
pub use plan_spec::{build_plan, plan_parallel, summarize, BuiltPlan, PlanSpec, PlanSummary};
pub use scan_node::{ScanNode, ScanStats};
pub use scan_range_builder::{FileSplit, ScanRangeBuilder, ScanRangeLocation, ScanRangeLocations};
pub use visitor::{max_rows_processed, MaxRowsProcessedVisitor, PlanNodeVisitor};
