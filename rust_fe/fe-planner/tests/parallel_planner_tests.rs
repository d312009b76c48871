// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

use fe_common::{CohortId, FragmentId, Id, JoinTableId, PlanNodeId};
use fe_planner::{
    ClusterMembership, DataPartition, DistributionMode, Expr, JoinAlgorithm, JoinNode, JoinOp,
    ParallelPlanner, PlanNodeKind, PlannerContext, QueryOptions, SinkKind,
};
use std::collections::HashSet;
use std::sync::Arc;

fn context() -> PlannerContext {
    PlannerContext::new(QueryOptions::default(), Arc::new(ClusterMembership::new()))
}

fn leaf(ctx: &mut PlannerContext) -> PlanNodeId {
    ctx.add_node(PlanNodeKind::EmptySet, Vec::new())
}

/// Puts `input_root` into its own fragment and returns the exchange reading it
fn exchange(ctx: &mut PlannerContext, input_root: PlanNodeId) -> PlanNodeId {
    let fragment = ctx.create_fragment(input_root, DataPartition::Random);
    ctx.add_exchange(fragment, DataPartition::Unpartitioned).unwrap()
}

fn join(ctx: &mut PlannerContext, probe: PlanNodeId, build: PlanNodeId) -> PlanNodeId {
    let kind = PlanNodeKind::Join(JoinNode::new(
        JoinOp::Inner,
        JoinAlgorithm::Hash,
        DistributionMode::Broadcast,
        vec![Expr::equals(Expr::slot("p", "k"), Expr::slot("b", "k"))],
        Vec::new(),
    ));
    ctx.add_node(kind, vec![probe, build])
}

fn input_fragment(ctx: &PlannerContext, exchange: PlanNodeId) -> FragmentId {
    ctx.node(exchange).as_exchange().unwrap().input
}

/// Every fragment belongs to exactly one plan and carries that plan's ids
fn assert_plans_cover_fragments(ctx: &PlannerContext, roots: &[FragmentId]) {
    let mut seen = HashSet::new();
    for root in roots {
        let plan_id = ctx.fragment(*root).plan_id;
        assert!(plan_id.is_valid());
        assert!(ctx.fragment(*root).cohort_id.is_valid());
        for fragment in ctx.fragment_tree(*root) {
            assert!(seen.insert(fragment), "fragment {} in two plans", fragment);
            assert_eq!(ctx.fragment(fragment).plan_id, plan_id);
            assert!(ctx.fragment(fragment).cohort_id.is_valid());
            for child in &ctx.fragment(fragment).children {
                assert_eq!(ctx.fragment(*child).parent, Some(fragment));
            }
        }
    }
    assert_eq!(seen.len(), ctx.num_fragments());
    let plan_ids: HashSet<_> = roots.iter().map(|r| ctx.fragment(*r).plan_id).collect();
    assert_eq!(plan_ids.len(), roots.len());
}

#[test]
fn test_two_way_join() {
    let mut ctx = context();
    let build_leaf = leaf(&mut ctx);
    let build = exchange(&mut ctx, build_leaf);
    let build_input = input_fragment(&ctx, build);
    let probe = leaf(&mut ctx);
    let join_id = join(&mut ctx, probe, build);
    let root = ctx.create_fragment(join_id, DataPartition::Unpartitioned);
    ctx.set_sink(root, SinkKind::PlanRoot);
    let fragments_before = ctx.num_fragments();

    let roots = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap();

    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0], root);
    assert_eq!(ctx.num_fragments(), fragments_before + 1);
    assert_plans_cover_fragments(&ctx, &roots);

    let build_fragment = ctx.fragment(roots[1]);
    assert_eq!(build_fragment.plan_root, build);
    assert_eq!(build_fragment.data_partition, DataPartition::Unpartitioned);
    assert_ne!(build_fragment.cohort_id, ctx.fragment(root).cohort_id);
    assert_eq!(ctx.fragment(root).plan_id.as_int(), 0);
    assert_eq!(ctx.fragment(root).cohort_id, CohortId::new(0));
    assert_eq!(build_fragment.cohort_id, CohortId::new(1));

    // The build input moved out of the root fragment
    assert!(!ctx.fragment(root).children.contains(&build_input));
    assert_eq!(ctx.fragment(build_input).parent, Some(roots[1]));

    match &build_fragment.sink.as_ref().unwrap().kind {
        SinkKind::JoinBuild(sink) => {
            assert_eq!(sink.join_table_id, JoinTableId::new(0));
            assert_eq!(sink.build_exprs, vec![Expr::slot("b", "k")]);
        }
        other => panic!("unexpected sink {:?}", other),
    }
    assert_eq!(ctx.node(join_id).as_join().unwrap().join_table_id(), JoinTableId::new(0));
    assert_eq!(ctx.node(build).fragment, roots[1]);
}

#[test]
fn test_joins_in_one_fragment_share_cohort() {
    let mut ctx = context();
    let b1 = leaf(&mut ctx);
    let ex1 = exchange(&mut ctx, b1);
    let b2 = leaf(&mut ctx);
    let ex2 = exchange(&mut ctx, b2);
    let probe = leaf(&mut ctx);
    let inner = join(&mut ctx, probe, ex1);
    let outer = join(&mut ctx, inner, ex2);
    let root = ctx.create_fragment(outer, DataPartition::Unpartitioned);

    let roots = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap();

    assert_eq!(roots.len(), 3);
    assert_plans_cover_fragments(&ctx, &roots);
    // Pre-order discovery: the outer join is extracted first
    assert_eq!(ctx.fragment(roots[1]).plan_root, ex2);
    assert_eq!(ctx.fragment(roots[2]).plan_root, ex1);
    assert_eq!(ctx.fragment(roots[1]).cohort_id, ctx.fragment(roots[2]).cohort_id);
    assert_ne!(ctx.fragment(roots[1]).cohort_id, ctx.fragment(root).cohort_id);
    assert_eq!(ctx.node(outer).as_join().unwrap().join_table_id(), JoinTableId::new(0));
    assert_eq!(ctx.node(inner).as_join().unwrap().join_table_id(), JoinTableId::new(1));
    assert!(ctx.fragment(root).children.is_empty());
}

#[test]
fn test_build_of_build_gets_new_cohort() {
    let mut ctx = context();
    // Inner join lives in its own fragment below the outer join's build side
    let d = leaf(&mut ctx);
    let ex_d = exchange(&mut ctx, d);
    let c = leaf(&mut ctx);
    let inner = join(&mut ctx, c, ex_d);
    let ex_b = exchange(&mut ctx, inner);
    let inner_fragment = input_fragment(&ctx, ex_b);
    let a = leaf(&mut ctx);
    let outer = join(&mut ctx, a, ex_b);
    let root = ctx.create_fragment(outer, DataPartition::Unpartitioned);

    let roots = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap();

    assert_eq!(roots.len(), 3);
    assert_plans_cover_fragments(&ctx, &roots);
    let cohorts: HashSet<CohortId> = roots.iter().map(|r| ctx.fragment(*r).cohort_id).collect();
    assert_eq!(cohorts.len(), 3);

    // The inner join's fragment travels with the outer build plan
    assert_eq!(ctx.fragment(inner_fragment).parent, Some(roots[1]));
    assert_eq!(ctx.fragment(inner_fragment).plan_id, ctx.fragment(roots[1]).plan_id);
    assert_eq!(ctx.fragment(roots[2]).plan_root, ex_d);
    assert!(ctx.fragment(inner_fragment).children.is_empty());
}

#[test]
fn test_subplan_right_side_not_extracted() {
    let mut ctx = context();
    let b = leaf(&mut ctx);
    let ex_b = exchange(&mut ctx, b);
    let a = leaf(&mut ctx);
    let probe_join = join(&mut ctx, a, ex_b);

    let y = leaf(&mut ctx);
    let ex_y = exchange(&mut ctx, y);
    let x = ctx.add_node(PlanNodeKind::SingularRowSrc, Vec::new());
    let nested_join = join(&mut ctx, x, ex_y);

    let subplan = ctx.add_node(PlanNodeKind::Subplan, vec![probe_join, nested_join]);
    let root = ctx.create_fragment(subplan, DataPartition::Unpartitioned);

    let roots = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap();

    assert_eq!(roots.len(), 2);
    assert_plans_cover_fragments(&ctx, &roots);
    assert!(ctx.node(probe_join).as_join().unwrap().join_table_id().is_valid());
    assert!(!ctx.node(nested_join).as_join().unwrap().join_table_id().is_valid());
    // The subplan's exchange input stays in the root plan
    let y_fragment = input_fragment(&ctx, ex_y);
    assert_eq!(ctx.fragment(y_fragment).parent, Some(root));
    assert_eq!(ctx.fragment(y_fragment).plan_id, ctx.fragment(root).plan_id);
}

#[test]
fn test_no_joins_single_plan() {
    let mut ctx = context();
    let a = leaf(&mut ctx);
    let ex = exchange(&mut ctx, a);
    let select = ctx.add_node(PlanNodeKind::Select, vec![ex]);
    let root = ctx.create_fragment(select, DataPartition::Unpartitioned);

    let roots = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap();
    assert_eq!(roots, vec![root]);
    assert_plans_cover_fragments(&ctx, &roots);
}

#[test]
fn test_preassigned_join_table_id_is_fatal() {
    let mut ctx = context();
    let b = leaf(&mut ctx);
    let ex = exchange(&mut ctx, b);
    let a = leaf(&mut ctx);
    let join_id = join(&mut ctx, a, ex);
    ctx.node_mut(join_id)
        .as_join_mut()
        .unwrap()
        .set_join_table_id(JoinTableId::new(7))
        .unwrap();
    let root = ctx.create_fragment(join_id, DataPartition::Unpartitioned);

    let err = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_missing_input_fragment_is_fatal() {
    let mut ctx = context();
    let b = leaf(&mut ctx);
    let ex = exchange(&mut ctx, b);
    let detached = input_fragment(&ctx, ex);
    let a = leaf(&mut ctx);
    let join_id = join(&mut ctx, a, ex);
    let root = ctx.create_fragment(join_id, DataPartition::Unpartitioned);
    ctx.fragment_mut(root).remove_child(detached);
    ctx.fragment_mut(detached).parent = None;

    let err = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_join_without_build_side_is_fatal() {
    let mut ctx = context();
    let a = leaf(&mut ctx);
    let kind = PlanNodeKind::Join(JoinNode::new(
        JoinOp::Cross,
        JoinAlgorithm::NestedLoop,
        DistributionMode::None,
        Vec::new(),
        Vec::new(),
    ));
    let join_id = ctx.add_node(kind, vec![a]);
    let root = ctx.create_fragment(join_id, DataPartition::Unpartitioned);
    let err = ParallelPlanner::new(&mut ctx).create_plans(root).unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_non_root_fragment_rejected() {
    let mut ctx = context();
    let b = leaf(&mut ctx);
    let ex = exchange(&mut ctx, b);
    let child = input_fragment(&ctx, ex);
    let select = ctx.add_node(PlanNodeKind::Select, vec![ex]);
    ctx.create_fragment(select, DataPartition::Unpartitioned);
    let err = ParallelPlanner::new(&mut ctx).create_plans(child).unwrap_err();
    assert!(err.is_internal());
}
