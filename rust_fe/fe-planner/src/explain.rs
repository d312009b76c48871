// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Text rendering of parallel plans

use crate::context::PlannerContext;
use crate::data_sink::{DataSink, SinkKind};
use crate::expr::to_sql_list;
use crate::plan_node::{PlanNode, PlanNodeKind};
use fe_catalog::Table;
use fe_common::utils::format_bytes;
use fe_common::{FeError, FragmentId, PlanNodeId};
use std::fmt::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExplainLevel {
    Minimal,
    Standard,
    Extended,
    Verbose,
}

impl FromStr for ExplainLevel {
    type Err = FeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "minimal" => Ok(ExplainLevel::Minimal),
            "1" | "standard" => Ok(ExplainLevel::Standard),
            "2" | "extended" => Ok(ExplainLevel::Extended),
            "3" | "verbose" => Ok(ExplainLevel::Verbose),
            other => Err(FeError::InvalidArgument(format!("unknown explain level '{}'", other))),
        }
    }
}

impl fmt::Display for ExplainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExplainLevel::Minimal => "MINIMAL",
            ExplainLevel::Standard => "STANDARD",
            ExplainLevel::Extended => "EXTENDED",
            ExplainLevel::Verbose => "VERBOSE",
        };
        write!(f, "{}", name)
    }
}

/// Text form of a set of parallel plans: each plan's fragments in pre-order,
/// each with its sink and node tree.
pub struct PlanExplain<'a> {
    ctx: &'a PlannerContext,
    roots: &'a [FragmentId],
    level: ExplainLevel,
}

impl<'a> PlanExplain<'a> {
    pub fn new(ctx: &'a PlannerContext, roots: &'a [FragmentId], level: ExplainLevel) -> Self {
        Self { ctx, roots, level }
    }
}

impl fmt::Display for PlanExplain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx;
        for (i, root) in self.roots.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(
                f,
                "PLAN {} [cohort-id={}]",
                ctx.fragment(*root).plan_id,
                ctx.fragment(*root).cohort_id
            )?;
            for fragment in ctx.fragment_tree(*root) {
                explain_fragment(ctx, fragment, self.level, f)?;
            }
        }
        Ok(())
    }
}

pub fn explain_plans(ctx: &PlannerContext, roots: &[FragmentId], level: ExplainLevel) -> String {
    PlanExplain::new(ctx, roots, level).to_string()
}

fn explain_fragment(
    ctx: &PlannerContext,
    id: FragmentId,
    level: ExplainLevel,
    out: &mut impl Write,
) -> fmt::Result {
    let fragment = ctx.fragment(id);
    write!(out, "F{}:PLAN FRAGMENT [{}]", fragment.id, fragment.data_partition)?;
    if level >= ExplainLevel::Extended {
        write!(out, " hosts={}", ctx.fragment_num_nodes(id))?;
    }
    writeln!(out)?;
    if let Some(sink) = &fragment.sink {
        explain_sink(ctx, sink, level, out)?;
    }
    explain_node(ctx, fragment.plan_root, level, "  ", "  ", out)
}

fn explain_sink(
    ctx: &PlannerContext,
    sink: &DataSink,
    level: ExplainLevel,
    out: &mut impl Write,
) -> fmt::Result {
    let detail = "  |  ";
    match &sink.kind {
        SinkKind::PlanRoot => writeln!(out, "  PLAN-ROOT SINK")?,
        SinkKind::DataStream {
            exchange,
            output_partition,
        } => writeln!(
            out,
            "  DATASTREAM SINK [FRAGMENT=F{}, EXCHANGE={}, {}]",
            ctx.node(*exchange).fragment,
            exchange,
            output_partition
        )?,
        SinkKind::JoinBuild(build) => {
            writeln!(out, "  JOIN BUILD")?;
            if level > ExplainLevel::Minimal {
                let fragment = ctx.fragment(sink.fragment);
                writeln!(
                    out,
                    "{}join-table-id={} plan-id={} cohort-id={}",
                    detail, build.join_table_id, fragment.plan_id, fragment.cohort_id
                )?;
                writeln!(out, "{}build expressions: {}", detail, to_sql_list(&build.build_exprs))?;
            }
        }
        SinkKind::Table(table) => {
            write!(
                out,
                "  WRITE TO FS [{}, OVERWRITE={}",
                table.table_name, table.overwrite
            )?;
            if !table.partition_key_exprs.is_empty() {
                write!(out, ", PARTITION-KEYS=({})", to_sql_list(&table.partition_key_exprs))?;
            }
            writeln!(out, "]")?;
            if level >= ExplainLevel::Extended {
                writeln!(out, "{}format={}", detail, table.majority_format)?;
            }
        }
    }
    if level >= ExplainLevel::Extended && sink.per_host_mem_cost >= 0 {
        writeln!(
            out,
            "  |  mem-estimate={}",
            format_bytes(sink.per_host_mem_cost as u64)
        )?;
    }
    writeln!(out, "  |")
}

/// Writes the subtree of `id` that belongs to the node's own fragment
fn explain_node(
    ctx: &PlannerContext,
    id: PlanNodeId,
    level: ExplainLevel,
    first_prefix: &str,
    prefix: &str,
    out: &mut impl Write,
) -> fmt::Result {
    let node = ctx.node(id);
    let children: Vec<PlanNodeId> = node
        .children
        .iter()
        .copied()
        .filter(|c| !node.is_exchange() && ctx.node(*c).fragment == node.fragment)
        .collect();

    writeln!(out, "{}{}:{}{}", first_prefix, node.id, node.display_name(), node_header(ctx, node))?;
    let detail_prefix = if children.is_empty() {
        format!("{}   ", prefix)
    } else {
        format!("{}|  ", prefix)
    };
    for line in node_details(node, level) {
        writeln!(out, "{}{}", detail_prefix, line)?;
    }

    if let Some((first, rest)) = children.split_first() {
        writeln!(out, "{}|", prefix)?;
        for child in rest {
            let child_first = format!("{}|--", prefix);
            let child_prefix = format!("{}|  ", prefix);
            explain_node(ctx, *child, level, &child_first, &child_prefix, out)?;
            writeln!(out, "{}|", prefix)?;
        }
        explain_node(ctx, *first, level, prefix, prefix, out)?;
    }
    Ok(())
}

fn node_header(ctx: &PlannerContext, node: &PlanNode) -> String {
    match &node.kind {
        PlanNodeKind::Scan(scan) => format!(" [{}]", scan.table.full_name()),
        PlanNodeKind::Join(join) => format!(" [{}, {}]", join.op, join.distribution),
        PlanNodeKind::Exchange(exchange) => match ctx.fragment(exchange.input).sink.as_ref().map(|s| &s.kind) {
            Some(SinkKind::DataStream { output_partition, .. }) => format!(" [{}]", output_partition),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn node_details(node: &PlanNode, level: ExplainLevel) -> Vec<String> {
    let mut lines = Vec::new();
    if level == ExplainLevel::Minimal {
        return lines;
    }
    match &node.kind {
        PlanNodeKind::Scan(scan) => {
            if !scan.predicates.is_empty() {
                let predicates: Vec<String> = scan.predicates.iter().map(|p| p.to_string()).collect();
                lines.push(format!("partition predicates: {}", predicates.join(", ")));
            }
            lines.push(format!(
                "partitions={}/{} files={} size={}",
                scan.partition_ids.len(),
                scan.table.num_partitions(),
                scan.stats.total_files,
                format_bytes(scan.stats.total_bytes.max(0) as u64)
            ));
            if level >= ExplainLevel::Extended {
                let rows = if scan.stats.cardinality == -1 {
                    "unavailable".to_string()
                } else {
                    scan.stats.cardinality.to_string()
                };
                lines.push(format!("table stats: {} rows total", rows));
                if scan.stats.partitions_missing_stats > 0 {
                    lines.push(format!(
                        "partitions missing stats: {}",
                        scan.stats.partitions_missing_stats
                    ));
                }
                lines.push(format!(
                    "scan ranges={} mem-estimate={}",
                    scan.scan_ranges.len(),
                    format_bytes(scan.per_host_mem_cost.max(0) as u64)
                ));
            }
        }
        PlanNodeKind::Join(join) => {
            if !join.eq_join_conjuncts.is_empty() {
                lines.push(format!("hash predicates: {}", to_sql_list(&join.eq_join_conjuncts)));
            }
            if !join.other_join_conjuncts.is_empty() {
                lines.push(format!("other join predicates: {}", to_sql_list(&join.other_join_conjuncts)));
            }
        }
        PlanNodeKind::Aggregation(agg) => {
            if !agg.aggregate_exprs.is_empty() {
                lines.push(format!("output: {}", to_sql_list(&agg.aggregate_exprs)));
            }
            if !agg.grouping_exprs.is_empty() {
                lines.push(format!("group by: {}", to_sql_list(&agg.grouping_exprs)));
            }
        }
        PlanNodeKind::Sort(sort) => {
            let order: Vec<String> = sort
                .ordering_exprs
                .iter()
                .zip(sort.is_asc_order.iter().chain(std::iter::repeat(&true)))
                .map(|(e, asc)| format!("{} {}", e, if *asc { "ASC" } else { "DESC" }))
                .collect();
            lines.push(format!("order by: {}", order.join(", ")));
        }
        PlanNodeKind::Unnest(unnest) => {
            lines.push(format!("collection: {}", unnest.collection_expr));
        }
        _ => {}
    }
    if !node.conjuncts.is_empty() {
        lines.push(format!("predicates: {}", to_sql_list(&node.conjuncts)));
    }
    if node.has_limit() {
        lines.push(format!("limit: {}", node.limit));
    }
    if level >= ExplainLevel::Extended {
        let cardinality = if node.cardinality == -1 {
            "unavailable".to_string()
        } else {
            node.cardinality.to_string()
        };
        lines.push(format!("cardinality={} hosts={}", cardinality, node.num_nodes));
    }
    lines
}
