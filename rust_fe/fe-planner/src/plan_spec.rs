// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! JSON description of a distributed plan
//!
//! A plan spec lists the tables a plan reads (with partitions, files, blocks
//! and replica hosts), an optional cluster membership and an
//! exchange-annotated node tree. `build_plan` registers the tables in a
//! catalog and materializes the tree into a planner context, cutting
//! fragments at the exchanges.

use crate::context::{PlannerContext, QueryOptions};
use crate::data_sink::{SinkKind, TableSink, TableSinkOp};
use crate::expr::Expr;
use crate::membership::{ClusterMembership, MembershipUpdate};
use crate::parallel_planner::ParallelPlanner;
use crate::partition_pruner::PartitionPredicate;
use crate::plan_fragment::DataPartition;
use crate::plan_node::{
    AggregationNode, DistributionMode, JoinAlgorithm, JoinNode, JoinOp, PlanNodeKind, SortNode,
    UnnestNode,
};
use crate::scan_node::ScanNode;
use crate::visitor::max_rows_processed;
use fe_catalog::{
    BlockReplica, Catalog, Column, FileBlock, FileDescriptor, FsTable, Partition, PartitionValue,
};
use fe_common::{DataType, FeError, FileFormat, FragmentId, Id, NetworkAddress, PlanNodeId, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanSpec {
    #[serde(default)]
    pub membership: Option<MembershipUpdate>,
    #[serde(default)]
    pub tables: Vec<TableSpec>,

    /// Data partition of the root fragment
    #[serde(default)]
    pub root_partition: DataPartition,
    pub root: NodeSpec,

    /// Writes the result into a table instead of returning it
    #[serde(default)]
    pub table_sink: Option<TableSinkSpec>,
}

impl PlanSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FeError::SerializationError(format!("plan spec: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub db: String,
    pub name: String,
    /// Clustering columns first
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub num_clustering_cols: usize,
    pub base_dir: String,
    #[serde(default)]
    pub num_rows: Option<i64>,

    /// Storage hosts; replicas refer to them by position
    #[serde(default)]
    pub hosts: Vec<NetworkAddress>,

    /// An unpartitioned table lists one partition with no values
    #[serde(default)]
    pub partitions: Vec<PartitionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionSpec {
    pub values: Vec<PartitionValue>,
    pub location: String,
    pub format: FileFormat,
    #[serde(default)]
    pub num_rows: Option<i64>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSpec {
    pub name: String,
    pub length: i64,
    #[serde(default)]
    pub modification_time: i64,

    /// Defaults to one block spanning the file
    #[serde(default)]
    pub block_size: Option<i64>,
    #[serde(default)]
    pub replicas: Vec<ReplicaSpec>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReplicaSpec {
    pub host: usize,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSinkSpec {
    pub table: String,
    #[serde(default)]
    pub partition_keys: Vec<Expr>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub clustered: bool,
    #[serde(default)]
    pub num_partitions: Option<i64>,
}

fn default_limit() -> i64 {
    -1
}

fn default_scanned_columns() -> usize {
    1
}

fn default_join_op() -> JoinOp {
    JoinOp::Inner
}

fn default_algorithm() -> JoinAlgorithm {
    JoinAlgorithm::Hash
}

fn default_distribution() -> DistributionMode {
    DistributionMode::Broadcast
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    Scan {
        /// `db.table`
        table: String,
        #[serde(default)]
        predicates: Vec<PartitionPredicate>,
        #[serde(default = "default_scanned_columns")]
        num_scanned_columns: usize,
        #[serde(default = "default_limit")]
        limit: i64,
    },
    Join {
        #[serde(default = "default_join_op")]
        op: JoinOp,
        #[serde(default = "default_algorithm")]
        algorithm: JoinAlgorithm,
        #[serde(default = "default_distribution")]
        distribution: DistributionMode,
        #[serde(default)]
        eq_conjuncts: Vec<Expr>,
        #[serde(default)]
        other_conjuncts: Vec<Expr>,
        probe: Box<NodeSpec>,
        build: Box<NodeSpec>,
    },
    /// Fragment boundary; `input` becomes its own fragment
    Exchange {
        #[serde(default)]
        partition: DataPartition,
        #[serde(default)]
        input_partition: DataPartition,
        input: Box<NodeSpec>,
    },
    Subplan {
        input: Box<NodeSpec>,
        subplan: Box<NodeSpec>,
    },
    Aggregation {
        #[serde(default)]
        grouping: Vec<Expr>,
        #[serde(default)]
        aggregates: Vec<Expr>,
        input: Box<NodeSpec>,
    },
    Select {
        conjuncts: Vec<Expr>,
        input: Box<NodeSpec>,
    },
    Sort {
        ordering: Vec<Expr>,
        #[serde(default)]
        asc: Vec<bool>,
        #[serde(default = "default_limit")]
        limit: i64,
        input: Box<NodeSpec>,
    },
    Union {
        inputs: Vec<NodeSpec>,
    },
    Unnest {
        collection: Expr,
    },
    SingularRowSrc,
    EmptySet,
}

/// Loads the tables of a spec into `catalog`
pub fn register_tables(catalog: &Catalog, tables: &[TableSpec]) -> Result<()> {
    for spec in tables {
        if catalog.get_database(&spec.db).is_err() {
            catalog.create_database(&spec.db)?;
        }
        catalog.add_table(load_table(spec)?)?;
    }
    Ok(())
}

fn load_table(spec: &TableSpec) -> Result<FsTable> {
    let columns = spec
        .columns
        .iter()
        .enumerate()
        .map(|(pos, c)| Column::new(c.name.clone(), c.data_type.clone(), pos))
        .collect();
    let mut table = FsTable::new(
        spec.db.clone(),
        spec.name.clone(),
        columns,
        spec.num_clustering_cols,
        spec.base_dir.clone(),
    )?;
    if let Some(num_rows) = spec.num_rows {
        table.set_num_rows(num_rows);
    }
    let host_indices: Vec<usize> = spec
        .hosts
        .iter()
        .map(|host| table.host_index_mut().index_of(host))
        .collect();

    for partition_spec in &spec.partitions {
        let files = partition_spec
            .files
            .iter()
            .map(|f| file_descriptor(f, &host_indices))
            .collect::<Result<Vec<_>>>()?;
        let id = table.next_partition_id();
        let mut partition = Partition::new(
            id,
            partition_spec.values.clone(),
            partition_spec.location.clone(),
            partition_spec.format,
        )
        .with_files(files);
        if let Some(num_rows) = partition_spec.num_rows {
            partition = partition.with_num_rows(num_rows);
        }
        table.add_partition(partition)?;
    }
    Ok(table)
}

fn file_descriptor(spec: &FileSpec, host_indices: &[usize]) -> Result<FileDescriptor> {
    let replicas = spec
        .replicas
        .iter()
        .map(|r| {
            host_indices
                .get(r.host)
                .map(|idx| BlockReplica::new(*idx, r.cached))
                .ok_or_else(|| {
                    FeError::TableLoadingError(format!("file {} names unknown host {}", spec.name, r.host))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    let block_size = spec.block_size.filter(|s| *s > 0).unwrap_or(spec.length);
    let mut blocks = Vec::new();
    let mut offset = 0;
    while offset < spec.length {
        let length = block_size.min(spec.length - offset);
        blocks.push(FileBlock::new(offset, length, replicas.clone()));
        offset += length;
    }
    Ok(FileDescriptor::new(spec.name.clone(), spec.length, spec.modification_time, blocks))
}

/// A distributed plan materialized from a spec
pub struct BuiltPlan {
    pub ctx: PlannerContext,
    pub root: FragmentId,
}

/// Registers the spec's tables and membership, then builds its plan tree.
pub fn build_plan(
    spec: &PlanSpec,
    catalog: &Catalog,
    membership: &Arc<ClusterMembership>,
    options: QueryOptions,
) -> Result<BuiltPlan> {
    if let Some(update) = &spec.membership {
        membership.update(update.clone());
    }
    register_tables(catalog, &spec.tables)?;

    let mut ctx = PlannerContext::new(options, membership.clone());
    let root_node = build_node(&mut ctx, catalog, &spec.root)?;
    let root = ctx.create_fragment(root_node, spec.root_partition.clone());
    if !spec.root_partition.is_partitioned() {
        ctx.node_mut(root_node).num_nodes = 1;
    }

    match &spec.table_sink {
        Some(sink_spec) => {
            let (db, name) = split_table_name(&sink_spec.table)?;
            let table = catalog.get_table(db, name)?;
            let mut sink = TableSink::create(
                &table,
                TableSinkOp::Insert,
                sink_spec.partition_keys.clone(),
                sink_spec.overwrite,
                sink_spec.clustered,
            )?;
            if let Some(num_partitions) = sink_spec.num_partitions {
                sink = sink.with_num_partitions(num_partitions);
            }
            ctx.set_sink(root, SinkKind::Table(sink));
        }
        None => ctx.set_sink(root, SinkKind::PlanRoot),
    }
    debug!(num_fragments = ctx.num_fragments(), "built plan from spec");
    Ok(BuiltPlan { ctx, root })
}

fn split_table_name(full_name: &str) -> Result<(&str, &str)> {
    full_name
        .split_once('.')
        .ok_or_else(|| FeError::InvalidArgument(format!("table name '{}' is not db.table", full_name)))
}

fn build_node(ctx: &mut PlannerContext, catalog: &Catalog, spec: &NodeSpec) -> Result<PlanNodeId> {
    let id = match spec {
        NodeSpec::Scan {
            table,
            predicates,
            num_scanned_columns,
            limit,
        } => {
            let (db, name) = split_table_name(table)?;
            let table = catalog.get_table(db, name)?;
            return ScanNode::plan(ctx, table, predicates.clone(), *num_scanned_columns, *limit);
        }
        NodeSpec::Join {
            op,
            algorithm,
            distribution,
            eq_conjuncts,
            other_conjuncts,
            probe,
            build,
        } => {
            let probe = build_node(ctx, catalog, probe)?;
            let build = build_node(ctx, catalog, build)?;
            let join = JoinNode::new(*op, *algorithm, *distribution, eq_conjuncts.clone(), other_conjuncts.clone());
            let id = ctx.add_node(PlanNodeKind::Join(join), vec![probe, build]);
            let (probe_cardinality, num_nodes) = {
                let probe = ctx.node(probe);
                (probe.cardinality, probe.num_nodes)
            };
            let node = ctx.node_mut(id);
            node.input_cardinality = probe_cardinality;
            node.cardinality = probe_cardinality;
            node.num_nodes = num_nodes;
            id
        }
        NodeSpec::Exchange {
            partition,
            input_partition,
            input,
        } => {
            let input_root = build_node(ctx, catalog, input)?;
            let fragment = ctx.create_fragment(input_root, input_partition.clone());
            if !input_partition.is_partitioned() {
                ctx.node_mut(input_root).num_nodes = 1;
            }
            let id = ctx.add_exchange(fragment, partition.clone())?;
            let num_nodes = if partition.is_partitioned() {
                ctx.cluster().num_nodes() as i32
            } else {
                1
            };
            ctx.node_mut(id).num_nodes = num_nodes;
            id
        }
        NodeSpec::Subplan { input, subplan } => {
            let input = build_node(ctx, catalog, input)?;
            let subplan = build_node(ctx, catalog, subplan)?;
            unary(ctx, PlanNodeKind::Subplan, vec![input, subplan], -1)
        }
        NodeSpec::Aggregation {
            grouping,
            aggregates,
            input,
        } => {
            let input = build_node(ctx, catalog, input)?;
            let kind = PlanNodeKind::Aggregation(AggregationNode {
                grouping_exprs: grouping.clone(),
                aggregate_exprs: aggregates.clone(),
                needs_finalize: true,
            });
            unary(ctx, kind, vec![input], -1)
        }
        NodeSpec::Select { conjuncts, input } => {
            let input = build_node(ctx, catalog, input)?;
            let id = unary(ctx, PlanNodeKind::Select, vec![input], -1);
            ctx.node_mut(id).conjuncts = conjuncts.clone();
            id
        }
        NodeSpec::Sort {
            ordering,
            asc,
            limit,
            input,
        } => {
            let input = build_node(ctx, catalog, input)?;
            let kind = PlanNodeKind::Sort(SortNode {
                ordering_exprs: ordering.clone(),
                is_asc_order: asc.clone(),
                offset: 0,
            });
            unary(ctx, kind, vec![input], *limit)
        }
        NodeSpec::Union { inputs } => {
            let children = inputs
                .iter()
                .map(|input| build_node(ctx, catalog, input))
                .collect::<Result<Vec<_>>>()?;
            let id = ctx.add_node(PlanNodeKind::Union, children.clone());
            let cardinalities: Vec<i64> = children.iter().map(|c| ctx.node(*c).cardinality).collect();
            let total = if cardinalities.iter().any(|c| *c == -1) {
                -1
            } else {
                cardinalities.iter().sum()
            };
            let num_nodes = children.iter().map(|c| ctx.node(*c).num_nodes).max().unwrap_or(1);
            let node = ctx.node_mut(id);
            node.input_cardinality = total;
            node.cardinality = total;
            node.num_nodes = num_nodes;
            id
        }
        NodeSpec::Unnest { collection } => ctx.add_node(
            PlanNodeKind::Unnest(UnnestNode {
                collection_expr: collection.clone(),
            }),
            Vec::new(),
        ),
        NodeSpec::SingularRowSrc => {
            let id = ctx.add_node(PlanNodeKind::SingularRowSrc, Vec::new());
            let node = ctx.node_mut(id);
            node.cardinality = 1;
            node.input_cardinality = 1;
            id
        }
        NodeSpec::EmptySet => {
            let id = ctx.add_node(PlanNodeKind::EmptySet, Vec::new());
            let node = ctx.node_mut(id);
            node.cardinality = 0;
            node.input_cardinality = 0;
            id
        }
    };
    Ok(id)
}

/// Adds a node whose output is bounded by its first child's output
fn unary(ctx: &mut PlannerContext, kind: PlanNodeKind, children: Vec<PlanNodeId>, limit: i64) -> PlanNodeId {
    let (input_cardinality, num_nodes) = children
        .first()
        .map_or((-1, 1), |c| (ctx.node(*c).cardinality, ctx.node(*c).num_nodes));
    let id = ctx.add_node(kind, children);
    let node = ctx.node_mut(id);
    node.input_cardinality = input_cardinality;
    node.num_nodes = num_nodes;
    node.cardinality = if limit > -1 && (input_cardinality == -1 || input_cardinality > limit) {
        limit
    } else {
        input_cardinality
    };
    node.limit = limit;
    id
}

/// One plan of a parallel plan set
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub plan_id: i64,
    pub cohort_id: i64,
    pub root_fragment: i64,
    pub fragments: Vec<i64>,
    pub sink: String,
    pub max_rows_processed: i64,
}

/// Splits the built plan into parallel plans and computes sink costs
pub fn plan_parallel(built: &mut BuiltPlan) -> Result<Vec<FragmentId>> {
    let roots = ParallelPlanner::new(&mut built.ctx).create_plans(built.root)?;
    for root in &roots {
        for fragment in built.ctx.fragment_tree(*root) {
            built.ctx.compute_sink_costs(fragment)?;
        }
    }
    Ok(roots)
}

pub fn summarize(ctx: &PlannerContext, roots: &[FragmentId]) -> Vec<PlanSummary> {
    roots
        .iter()
        .map(|root| {
            let fragment = ctx.fragment(*root);
            let sink = match fragment.sink.as_ref().map(|s| &s.kind) {
                Some(SinkKind::PlanRoot) => "plan_root".to_string(),
                Some(SinkKind::DataStream { .. }) => "data_stream".to_string(),
                Some(SinkKind::JoinBuild(b)) => format!("join_build({})", b.join_table_id),
                Some(SinkKind::Table(t)) => format!("table({})", t.table_name),
                None => "none".to_string(),
            };
            PlanSummary {
                plan_id: fragment.plan_id.as_int(),
                cohort_id: fragment.cohort_id.as_int(),
                root_fragment: root.as_int(),
                fragments: ctx.fragment_tree(*root).iter().map(|f| f.as_int()).collect(),
                sink,
                max_rows_processed: max_rows_processed(ctx, *root),
            }
        })
        .collect()
}
