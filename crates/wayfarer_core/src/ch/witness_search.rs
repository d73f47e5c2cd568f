use std::collections::BinaryHeap;

use fxhash::FxHashMap;

use crate::{
    constants::{INVALID_NODE, MAX_WEIGHT},
    routing::HeapItem,
    types::NodeId,
    weighting::Weight,
};

use super::preparation_graph::CHPreparationGraph;

struct NodeData {
    settled: bool,
    weight: Weight,
}

impl NodeData {
    fn new() -> Self {
        NodeData {
            settled: false,
            weight: MAX_WEIGHT,
        }
    }
}

/// Dijkstra from one node that never passes through the node being
/// contracted. The search is resumed for every target of the same start.
pub(crate) struct WitnessSearch {
    heap: BinaryHeap<HeapItem>,
    data: FxHashMap<NodeId, NodeData>,
    start_node: NodeId,
    avoid_node: NodeId,
    settled_nodes: usize,
    sequence: usize,
}

impl WitnessSearch {
    pub fn new() -> Self {
        WitnessSearch {
            heap: BinaryHeap::default(),
            data: FxHashMap::default(),
            settled_nodes: 0,
            avoid_node: INVALID_NODE,
            start_node: INVALID_NODE,
            sequence: 0,
        }
    }

    pub fn init(&mut self, start_node: NodeId, avoid_node: NodeId) {
        self.heap.clear();
        self.data.clear();

        self.start_node = start_node;
        self.avoid_node = avoid_node;
        self.settled_nodes = 0;
        self.sequence = 0;

        self.update_node_data(start_node, 0.0);
        self.push(start_node, 0.0);
    }

    fn push(&mut self, node: NodeId, weight: Weight) {
        self.heap.push(HeapItem {
            priority: weight,
            sequence: self.sequence,
            index: node,
        });
        self.sequence += 1;
    }

    fn update_node_data(&mut self, node: NodeId, weight: Weight) {
        let data = self.data.entry(node).or_insert_with(NodeData::new);
        data.weight = weight;
        data.settled = false;
    }

    #[inline(always)]
    fn is_settled(&self, node: NodeId) -> bool {
        self.data.get(&node).is_some_and(|data| data.settled)
    }

    #[inline(always)]
    fn current_shortest_weight(&self, node: NodeId) -> Weight {
        self.data.get(&node).map_or(MAX_WEIGHT, |data| data.weight)
    }

    /// Weight of the lightest path found from the start to `target`, or
    /// [`MAX_WEIGHT`]. Stops once every path left is heavier than
    /// `max_weight` or `max_settled_nodes` nodes were settled.
    pub fn find_max_weight(
        &mut self,
        graph: &CHPreparationGraph,
        target: NodeId,
        max_weight: Weight,
        max_settled_nodes: usize,
    ) -> Weight {
        if self.start_node == target {
            return 0.0;
        }

        if self.is_settled(target) {
            return self.current_shortest_weight(target);
        }

        while let Some(&HeapItem {
            priority: weight,
            index: node,
            ..
        }) = self.heap.peek()
        {
            if self.settled_nodes >= max_settled_nodes || weight > max_weight {
                break;
            }

            self.heap.pop();
            if self.is_settled(node) {
                continue;
            }

            for arc in graph.out_arcs(node) {
                if arc.adj == self.avoid_node || self.is_settled(arc.adj) {
                    continue;
                }

                let next_weight = weight + arc.weight;
                if next_weight < self.current_shortest_weight(arc.adj) {
                    self.update_node_data(arc.adj, next_weight);
                    self.push(arc.adj, next_weight);
                }
            }

            self.settled_nodes += 1;
            if let Some(data) = self.data.get_mut(&node) {
                data.settled = true;
            }

            if node == target {
                break;
            }
        }

        self.current_shortest_weight(target)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_graph_utils::{create_romania_graph, romania_weighting};

    use super::*;

    #[test]
    fn test_witness_avoids_node() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let prep_graph = CHPreparationGraph::new(&graph, &weighting);

        // Rimnicu Vilcea to Bucharest
        let mut witness_search = WitnessSearch::new();
        witness_search.init(15, INVALID_NODE);
        assert_eq!(
            witness_search.find_max_weight(&prep_graph, 2, MAX_WEIGHT, usize::MAX),
            198_000.0
        );

        // Avoiding Pitesti leaves the way through Sibiu and Fagaras
        witness_search.init(15, 14);
        assert_eq!(
            witness_search.find_max_weight(&prep_graph, 2, MAX_WEIGHT, usize::MAX),
            390_000.0
        );
    }

    #[test]
    fn test_witness_bounded_by_weight() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let prep_graph = CHPreparationGraph::new(&graph, &weighting);

        let mut witness_search = WitnessSearch::new();
        witness_search.init(15, 14);
        let weight = witness_search.find_max_weight(&prep_graph, 2, 198_000.0, usize::MAX);
        assert!(weight > 198_000.0);

        // Resuming with a larger bound finds the detour
        let weight = witness_search.find_max_weight(&prep_graph, 2, 400_000.0, usize::MAX);
        assert_eq!(weight, 390_000.0);
    }

    #[test]
    fn test_witness_settled_limit() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let prep_graph = CHPreparationGraph::new(&graph, &weighting);

        let mut witness_search = WitnessSearch::new();
        witness_search.init(15, 14);
        assert_eq!(
            witness_search.find_max_weight(&prep_graph, 2, MAX_WEIGHT, 1),
            MAX_WEIGHT
        );
    }
}
