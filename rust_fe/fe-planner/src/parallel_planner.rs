// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Parallel Planner - split a distributed plan into independently executable plans
//!
//! The build side of every join is moved into its own plan whose root
//! fragment ends in a join build sink. The fragments feeding the build side
//! move along with it, so each resulting plan is a self-contained fragment
//! tree. Build plans that belong to the joins of one plan share a cohort id
//! and can run concurrently; builds of builds start a new cohort.
//!
//! The first plan returned is the input plan, which materializes the query
//! result. Every fragment ends up with a valid plan id and cohort id.

use crate::context::PlannerContext;
use crate::data_sink::{JoinBuildSink, SinkKind};
use crate::plan_fragment::PlanFragment;
use crate::plan_node::{JoinNode, PlanNodeKind};
use fe_common::{
    check_state, CohortId, FeError, FragmentId, IdGenerator, JoinTableId, PlanId, PlanNodeId,
    Result,
};
use tracing::{debug, trace};

pub struct ParallelPlanner<'a> {
    ctx: &'a mut PlannerContext,
    join_table_id_gen: IdGenerator<JoinTableId>,
    plan_id_gen: IdGenerator<PlanId>,
    cohort_id_gen: IdGenerator<CohortId>,
    plan_roots: Vec<FragmentId>,
}

impl<'a> ParallelPlanner<'a> {
    pub fn new(ctx: &'a mut PlannerContext) -> Self {
        Self {
            ctx,
            join_table_id_gen: IdGenerator::new(),
            plan_id_gen: IdGenerator::new(),
            cohort_id_gen: IdGenerator::new(),
            plan_roots: Vec::new(),
        }
    }

    /// Returns the roots of the plans ready for parallel execution, the input
    /// plan first followed by one plan per extracted join build side.
    pub fn create_plans(mut self, root: FragmentId) -> Result<Vec<FragmentId>> {
        check_state!(
            self.ctx.fragment(root).parent.is_none(),
            "fragment {} is not a plan root",
            root
        );
        let plan_id = self.plan_id_gen.get_next_id();
        let cohort_id = self.cohort_id_gen.get_next_id();
        let fragment = self.ctx.fragment_mut(root);
        fragment.plan_id = plan_id;
        fragment.cohort_id = cohort_id;
        self.plan_roots.push(root);
        self.create_build_plans(root, None)?;
        debug!(num_plans = self.plan_roots.len(), "created parallel plans");
        Ok(self.plan_roots)
    }

    /// Moves the build inputs of all joins in `fragment` and its descendants
    /// into separate plans. `build_cohort` is the cohort of the build plans of
    /// the plan `fragment` belongs to, if one was allocated yet.
    fn create_build_plans(&mut self, fragment: FragmentId, build_cohort: Option<CohortId>) -> Result<()> {
        let mut build_cohort = build_cohort;
        let mut joins = Vec::new();
        self.collect_joins(self.ctx.fragment(fragment).plan_root, &mut joins);
        if !joins.is_empty() {
            let cohort = *build_cohort.get_or_insert_with(|| self.cohort_id_gen.get_next_id());
            for join in joins {
                self.create_build_plan(join, cohort)?;
            }
        }

        let (plan_id, cohort_id) = {
            let f = self.ctx.fragment(fragment);
            (f.plan_id, f.cohort_id)
        };
        let children = self.ctx.fragment(fragment).children.clone();
        for child in children {
            let f = self.ctx.fragment_mut(child);
            f.plan_id = plan_id;
            f.cohort_id = cohort_id;
            self.create_build_plans(child, build_cohort)?;
        }
        Ok(())
    }

    /// Joins that are neither on the build side of another join in this
    /// fragment nor on the right side of a subplan, pre-order
    fn collect_joins(&self, node_id: PlanNodeId, result: &mut Vec<PlanNodeId>) {
        let node = self.ctx.node(node_id);
        match &node.kind {
            PlanNodeKind::Join(_) => {
                result.push(node_id);
                if let Some(probe) = node.child(0) {
                    self.collect_joins(probe, result);
                }
            }
            PlanNodeKind::Exchange(_) => {}
            PlanNodeKind::Subplan => {
                if let Some(input) = node.child(0) {
                    self.collect_joins(input, result);
                }
            }
            _ => {
                for child in &node.children {
                    self.collect_joins(*child, result);
                }
            }
        }
    }

    /// Exchanges at the leaves of the subtree rooted at `node_id`
    fn collect_exchange_nodes(&self, node_id: PlanNodeId, result: &mut Vec<PlanNodeId>) {
        let node = self.ctx.node(node_id);
        if node.is_exchange() {
            result.push(node_id);
            return;
        }
        for child in &node.children {
            self.collect_exchange_nodes(*child, result);
        }
    }

    /// Creates a plan materializing the build side of `join_id` in cohort
    /// `cohort`, moving the fragments it needs out of the join's fragment tree.
    fn create_build_plan(&mut self, join_id: PlanNodeId, cohort: CohortId) -> Result<()> {
        let (build_root, join_fragment) = {
            let node = self.ctx.node(join_id);
            let build_root = node.child(1).ok_or_else(|| {
                FeError::InternalError(format!("join {} has no build side", join_id))
            })?;
            (build_root, node.fragment)
        };

        let mut exchanges = Vec::new();
        self.collect_exchange_nodes(build_root, &mut exchanges);
        let input_fragments = self.ctx.collect_fragments(join_fragment, &|f: &PlanFragment| {
            f.dest_node.map_or(false, |dest| exchanges.contains(&dest))
        });
        check_state!(
            exchanges.len() == input_fragments.len(),
            "join {}: {} build-side exchanges but {} input fragments",
            join_id,
            exchanges.len(),
            input_fragments.len()
        );

        let join_table_id = self.join_table_id_gen.get_next_id();
        let build_sink = {
            let join = self.join_mut(join_id)?;
            let sink = JoinBuildSink::new(join_table_id, join)?;
            join.set_join_table_id(join_table_id)?;
            sink
        };

        let data_partition = self.ctx.fragment(join_fragment).data_partition.clone();
        let build_fragment = self.ctx.create_fragment(build_root, data_partition);
        self.ctx.set_sink(build_fragment, SinkKind::JoinBuild(build_sink));

        for exchange in &exchanges {
            check_state!(
                self.ctx.node(*exchange).fragment == build_fragment,
                "exchange {} not in build fragment {}",
                exchange,
                build_fragment
            );
        }
        for input in input_fragments {
            let parent = self.ctx.fragment(input).parent.ok_or_else(|| {
                FeError::InternalError(format!("input fragment {} has no parent", input))
            })?;
            self.ctx.move_child(input, parent, build_fragment)?;
        }

        let plan_id = self.plan_id_gen.get_next_id();
        let fragment = self.ctx.fragment_mut(build_fragment);
        fragment.plan_id = plan_id;
        fragment.cohort_id = cohort;
        self.plan_roots.push(build_fragment);
        trace!(
            fragment = %build_fragment,
            cohort = %cohort,
            join = %join_id,
            "new build fragment"
        );
        self.create_build_plans(build_fragment, None)
    }

    fn join_mut(&mut self, join_id: PlanNodeId) -> Result<&mut JoinNode> {
        self.ctx
            .node_mut(join_id)
            .as_join_mut()
            .ok_or_else(|| FeError::InternalError(format!("plan node {} is not a join", join_id)))
    }
}
