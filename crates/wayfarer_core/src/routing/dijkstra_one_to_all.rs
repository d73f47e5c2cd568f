use std::collections::BinaryHeap;

use crate::{
    constants::{INVALID_NODE, MAX_WEIGHT},
    edge_direction::SearchDirection,
    graph::Graph,
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::HeapItem;

/// Dijkstra without a target, over dense per-node arrays. The arrays are
/// reused between runs and only the touched slots are reset.
pub struct DijkstraOneToAll<'a, G: Graph, W: Weighting> {
    graph: &'a G,
    weighting: &'a W,
    direction: SearchDirection,
    weights: Vec<Weight>,
    settled: Vec<bool>,
    changed: Vec<NodeId>,
    heap: BinaryHeap<HeapItem>,
    sequence: usize,
    last_settled: NodeId,
    visited_nodes: usize,
}

impl<'a, G: Graph, W: Weighting> DijkstraOneToAll<'a, G, W> {
    pub fn new(graph: &'a G, weighting: &'a W, direction: SearchDirection) -> Self {
        let node_count = graph.node_count();
        Self {
            graph,
            weighting,
            direction,
            weights: vec![MAX_WEIGHT; node_count],
            settled: vec![false; node_count],
            changed: Vec::new(),
            heap: BinaryHeap::new(),
            sequence: 0,
            last_settled: INVALID_NODE,
            visited_nodes: 0,
        }
    }

    fn reset(&mut self) {
        for &node in &self.changed {
            self.weights[node] = MAX_WEIGHT;
            self.settled[node] = false;
        }
        self.changed.clear();
        self.heap.clear();
        self.sequence = 0;
        self.last_settled = INVALID_NODE;
        self.visited_nodes = 0;
    }

    fn update(&mut self, node: NodeId, weight: Weight) {
        if self.weights[node] == MAX_WEIGHT {
            self.changed.push(node);
        }
        self.weights[node] = weight;
        self.heap.push(HeapItem {
            priority: weight,
            sequence: self.sequence,
            index: node,
        });
        self.sequence += 1;
    }

    /// Settles every node reachable from `sources`
    pub fn run(&mut self, sources: &[NodeId]) {
        self.reset();
        for &source in sources {
            if self.weights[source] != 0.0 {
                self.update(source, 0.0);
            }
        }

        let reverse = self.direction.is_backward();
        while let Some(HeapItem {
            priority: weight,
            index: node,
            ..
        }) = self.heap.pop()
        {
            if self.settled[node] || weight > self.weights[node] {
                continue;
            }
            self.settled[node] = true;
            self.visited_nodes += 1;
            self.last_settled = node;

            for state in self.graph.node_edges(node) {
                if self.settled[state.adj] {
                    continue;
                }

                let edge_weight = self.weighting.calc_edge_weight(&state, reverse);
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let next_weight = weight + edge_weight;
                if next_weight < self.weights[state.adj] {
                    self.update(state.adj, next_weight);
                }
            }
        }
    }

    /// Weight of the last run to `node`, [`MAX_WEIGHT`] when unreachable
    #[inline]
    pub fn weight(&self, node: NodeId) -> Weight {
        self.weights[node]
    }

    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    /// Nodes reached by the last run
    pub fn reached_nodes(&self) -> &[NodeId] {
        &self.changed
    }

    /// Node settled last, the farthest from the sources
    pub fn last_settled(&self) -> Option<NodeId> {
        (self.last_settled != INVALID_NODE).then_some(self.last_settled)
    }

    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }
}
