// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan node visitors

use crate::context::PlannerContext;
use crate::plan_node::{PlanNode, PlanNodeKind};
use fe_common::{FragmentId, PlanNodeId};

/// Visits nodes in pre-order; returning `false` stops the walk
pub trait PlanNodeVisitor {
    fn visit(&mut self, node: &PlanNode) -> bool;
}

/// Walks all nodes of the fragment tree rooted at `root`
pub fn walk_fragment_tree(ctx: &PlannerContext, root: FragmentId, visitor: &mut dyn PlanNodeVisitor) {
    for fragment in ctx.fragment_tree(root) {
        if !walk_nodes(ctx, ctx.fragment(fragment).plan_root, fragment, visitor) {
            return;
        }
    }
}

fn walk_nodes(
    ctx: &PlannerContext,
    id: PlanNodeId,
    fragment: FragmentId,
    visitor: &mut dyn PlanNodeVisitor,
) -> bool {
    let node = ctx.node(id);
    if node.fragment != fragment {
        return true;
    }
    if !visitor.visit(node) {
        return false;
    }
    if node.is_exchange() {
        return true;
    }
    node.children
        .iter()
        .all(|child| walk_nodes(ctx, *child, fragment, visitor))
}

/// Maximum number of rows processed by any node
#[derive(Debug)]
pub struct MaxRowsProcessedVisitor {
    abort: bool,
    result: i64,
}

impl Default for MaxRowsProcessedVisitor {
    fn default() -> Self {
        Self {
            abort: false,
            result: -1,
        }
    }
}

impl MaxRowsProcessedVisitor {
    /// -1 when unknown
    pub fn get(&self) -> i64 {
        if self.abort {
            -1
        } else {
            self.result
        }
    }
}

impl PlanNodeVisitor for MaxRowsProcessedVisitor {
    fn visit(&mut self, node: &PlanNode) -> bool {
        match &node.kind {
            PlanNodeKind::Scan(scan) => {
                let missing_stats = scan.is_table_missing_stats() || scan.stats.has_corrupt_stats;
                // Collection sizes are unknown, so such scans count as unlimited
                if scan.reads_collection || (missing_stats && !node.has_limit()) {
                    self.abort = true;
                    return false;
                }
                self.result = self.result.max(node.input_cardinality);
            }
            PlanNodeKind::Join(_) => {
                self.abort = true;
                return false;
            }
            _ => {
                if node.input_cardinality == -1 || node.cardinality == -1 {
                    self.abort = true;
                    return false;
                }
                self.result = self.result.max(node.input_cardinality.max(node.cardinality));
            }
        }
        true
    }
}

/// Rows processed by the busiest node of the fragment tree, or -1 when that
/// cannot be bounded
pub fn max_rows_processed(ctx: &PlannerContext, root: FragmentId) -> i64 {
    let mut visitor = MaxRowsProcessedVisitor::default();
    walk_fragment_tree(ctx, root, &mut visitor);
    visitor.get()
}
