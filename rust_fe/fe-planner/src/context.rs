// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Planning session state
//!
//! The context owns every plan node and fragment of one query in index
//! arenas. Nodes and fragments refer to each other by id, so moving a
//! fragment under a new parent is an edit of two child lists and one parent
//! field.

use crate::data_sink::{DataSink, SinkInput, SinkKind};
use crate::explain::ExplainLevel;
use crate::membership::{ClusterMembership, MembershipSnapshot};
use crate::plan_fragment::{DataPartition, PlanFragment};
use crate::plan_node::{ExchangeNode, PlanNode, PlanNodeKind};
use fe_catalog::HostIndex;
use fe_common::{check_state, Config, FragmentId, IdGenerator, PlanNodeId, Result};
use std::sync::Arc;

/// Per-query planner options
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Upper bound of a scan range in bytes (0 = unlimited)
    pub max_scan_range_length: i64,

    /// 0 = use all nodes
    pub num_nodes: i32,

    /// 0 = derive from cores
    pub num_scanner_threads: i32,

    /// Cores per worker host
    pub num_cores: i32,

    pub explain_level: ExplainLevel,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_scan_range_length: 0,
            num_nodes: 0,
            num_scanner_threads: 0,
            num_cores: 1,
            explain_level: ExplainLevel::Standard,
        }
    }
}

impl QueryOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            max_scan_range_length: config.max_scan_range_length_bytes()? as i64,
            num_nodes: config.num_nodes as i32,
            num_scanner_threads: config.num_scanner_threads as i32,
            num_cores: config.num_cores.max(1) as i32,
            explain_level: config.explain_level.parse()?,
        })
    }
}

pub struct PlannerContext {
    options: QueryOptions,
    nodes: Vec<PlanNode>,
    fragments: Vec<PlanFragment>,
    node_id_gen: IdGenerator<PlanNodeId>,
    fragment_id_gen: IdGenerator<FragmentId>,

    /// Hosts referenced by this query's scan ranges
    host_index: HostIndex,

    membership: Arc<ClusterMembership>,
}

impl PlannerContext {
    pub fn new(options: QueryOptions, membership: Arc<ClusterMembership>) -> Self {
        Self {
            options,
            nodes: Vec::new(),
            fragments: Vec::new(),
            node_id_gen: IdGenerator::new(),
            fragment_id_gen: IdGenerator::new(),
            host_index: HostIndex::new(),
            membership,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn host_index(&self) -> &HostIndex {
        &self.host_index
    }

    pub fn host_index_mut(&mut self) -> &mut HostIndex {
        &mut self.host_index
    }

    /// Membership snapshot to plan against
    pub fn cluster(&self) -> Arc<MembershipSnapshot> {
        self.membership.current()
    }

    pub fn next_fragment_id(&mut self) -> FragmentId {
        self.fragment_id_gen.get_next_id()
    }

    pub fn add_node(&mut self, kind: PlanNodeKind, children: Vec<PlanNodeId>) -> PlanNodeId {
        let id = self.node_id_gen.get_next_id();
        self.nodes.push(PlanNode::new(id, kind, children));
        id
    }

    pub fn node(&self, id: PlanNodeId) -> &PlanNode {
        &self.nodes[id.as_usize()]
    }

    pub fn node_mut(&mut self, id: PlanNodeId) -> &mut PlanNode {
        &mut self.nodes[id.as_usize()]
    }

    pub fn fragment(&self, id: FragmentId) -> &PlanFragment {
        &self.fragments[id.as_usize()]
    }

    pub fn fragment_mut(&mut self, id: FragmentId) -> &mut PlanFragment {
        &mut self.fragments[id.as_usize()]
    }

    pub fn num_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Creates a fragment rooted at `root` with a fresh id.
    ///
    /// Every node reachable from `root` without descending below an exchange
    /// is assigned to the new fragment. Fragments feeding those exchanges that
    /// do not have a parent yet become its children.
    pub fn create_fragment(&mut self, root: PlanNodeId, data_partition: DataPartition) -> FragmentId {
        let id = self.next_fragment_id();
        self.fragments.push(PlanFragment::new(id, root, data_partition));
        let mut exchanges = Vec::new();
        self.set_fragment_in_plan_tree(root, id, &mut exchanges);
        for input in exchanges {
            if self.fragment(input).parent.is_none() {
                self.fragment_mut(input).parent = Some(id);
                self.fragment_mut(id).children.push(input);
            }
        }
        id
    }

    fn set_fragment_in_plan_tree(
        &mut self,
        node_id: PlanNodeId,
        fragment: FragmentId,
        exchanges: &mut Vec<FragmentId>,
    ) {
        let node = self.node_mut(node_id);
        node.fragment = fragment;
        if let PlanNodeKind::Exchange(exchange) = &node.kind {
            exchanges.push(exchange.input);
            return;
        }
        let children = node.children.clone();
        for child in children {
            self.set_fragment_in_plan_tree(child, fragment, exchanges);
        }
    }

    /// Adds an exchange receiving the output of `input`, which gets a
    /// data stream sink sending to it.
    pub fn add_exchange(&mut self, input: FragmentId, output_partition: DataPartition) -> Result<PlanNodeId> {
        check_state!(
            self.fragment(input).dest_node.is_none(),
            "fragment {} already feeds an exchange",
            input
        );
        let input_root = self.fragment(input).plan_root;
        let exchange = self.add_node(PlanNodeKind::Exchange(ExchangeNode { input }), vec![input_root]);
        let (cardinality, avg_row_size) = {
            let root = self.node(input_root);
            (root.cardinality, root.avg_row_size)
        };
        let node = self.node_mut(exchange);
        node.cardinality = cardinality;
        node.input_cardinality = cardinality;
        node.avg_row_size = avg_row_size;

        let fragment = self.fragment_mut(input);
        fragment.dest_node = Some(exchange);
        fragment.sink = Some(DataSink::new(
            input,
            SinkKind::DataStream {
                exchange,
                output_partition,
            },
        ));
        Ok(exchange)
    }

    pub fn set_sink(&mut self, fragment: FragmentId, kind: SinkKind) {
        self.fragment_mut(fragment).sink = Some(DataSink::new(fragment, kind));
    }

    /// Moves `child` from the children of `from` to the children of `to`
    pub fn move_child(&mut self, child: FragmentId, from: FragmentId, to: FragmentId) -> Result<()> {
        check_state!(
            self.fragment_mut(from).remove_child(child),
            "fragment {} is not a child of fragment {}",
            child,
            from
        );
        self.fragment_mut(to).children.push(child);
        self.fragment_mut(child).parent = Some(to);
        Ok(())
    }

    /// Pre-order collection over the fragment tree rooted at `root`; a
    /// matching fragment is collected and its subtree skipped.
    pub fn collect_fragments(
        &self,
        root: FragmentId,
        predicate: &dyn Fn(&PlanFragment) -> bool,
    ) -> Vec<FragmentId> {
        let mut result = Vec::new();
        self.collect_fragments_into(root, predicate, &mut result);
        result
    }

    fn collect_fragments_into(
        &self,
        id: FragmentId,
        predicate: &dyn Fn(&PlanFragment) -> bool,
        result: &mut Vec<FragmentId>,
    ) {
        let fragment = self.fragment(id);
        if predicate(fragment) {
            if !result.contains(&id) {
                result.push(id);
            }
            return;
        }
        for child in &fragment.children {
            self.collect_fragments_into(*child, predicate, result);
        }
    }

    /// All fragments of the tree rooted at `root`, pre-order
    pub fn fragment_tree(&self, root: FragmentId) -> Vec<FragmentId> {
        let mut result = vec![root];
        let mut idx = 0;
        while idx < result.len() {
            let children = &self.fragment(result[idx]).children;
            result.splice(idx + 1..idx + 1, children.iter().copied());
            idx += 1;
        }
        result
    }

    /// Hosts the fragment runs on, as estimated for its root node
    pub fn fragment_num_nodes(&self, fragment: FragmentId) -> i32 {
        self.node(self.fragment(fragment).plan_root).num_nodes
    }

    pub fn compute_sink_costs(&mut self, fragment: FragmentId) -> Result<()> {
        let root = self.node(self.fragment(fragment).plan_root);
        let input = SinkInput {
            cardinality: root.cardinality,
            avg_row_size: root.avg_row_size,
            num_nodes: root.num_nodes,
        };
        if let Some(sink) = self.fragment_mut(fragment).sink.as_mut() {
            sink.compute_costs(&input)?;
        }
        Ok(())
    }
}
