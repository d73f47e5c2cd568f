use std::collections::BinaryHeap;

use fxhash::{FxHashMap, FxHashSet};

use crate::{
    constants::MAX_WEIGHT,
    edge_direction::SearchDirection,
    error::RoutingError,
    graph::Graph,
    types::{EdgeId, NodeId},
    weighting::{Weight, Weighting},
};

use super::{HeapItem, Path, SearchLimits, ShortestPathTree, SptEntry};

/// Lower bound of the weight left from a node to the goal of the search
pub trait Heuristic {
    fn estimate(&self, node: NodeId) -> Weight;
}

pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    #[inline(always)]
    fn estimate(&self, _node: NodeId) -> Weight {
        0.0
    }
}

impl<H: Heuristic + ?Sized> Heuristic for &H {
    fn estimate(&self, node: NodeId) -> Weight {
        (**self).estimate(node)
    }
}

/// A* over a [`Graph`]. Nodes are reopened when a cheaper path is found after
/// they were settled, so heuristics only need to be admissible.
pub struct AStar<'a, G: Graph, W: Weighting, H: Heuristic> {
    graph: &'a G,
    weighting: &'a W,
    heuristic: H,
    direction: SearchDirection,
    limits: SearchLimits,

    heap: BinaryHeap<HeapItem>,
    tree: ShortestPathTree,
    /// Best tree entry per node
    best: FxHashMap<NodeId, usize>,
    settled: FxHashSet<NodeId>,
    sequence: usize,
    pops: usize,
}

pub type Dijkstra<'a, G, W> = AStar<'a, G, W, ZeroHeuristic>;

impl<'a, G: Graph, W: Weighting> AStar<'a, G, W, ZeroHeuristic> {
    /// Dijkstra is A* with a zero heuristic
    pub fn dijkstra(graph: &'a G, weighting: &'a W) -> Self {
        AStar::with_heuristic(graph, weighting, ZeroHeuristic)
    }
}

impl<'a, G: Graph, W: Weighting, H: Heuristic> AStar<'a, G, W, H> {
    pub fn with_heuristic(graph: &'a G, weighting: &'a W, heuristic: H) -> Self {
        Self {
            graph,
            weighting,
            heuristic,
            direction: SearchDirection::Forward,
            limits: SearchLimits::none(),
            heap: BinaryHeap::with_capacity(1024),
            tree: ShortestPathTree::new(),
            best: FxHashMap::default(),
            settled: FxHashSet::default(),
            sequence: 0,
            pops: 0,
        }
    }

    /// A backward search starts at the targets and walks edges against their
    /// travel direction
    pub fn with_direction(mut self, direction: SearchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Distinct nodes settled by the last search
    pub fn visited_nodes(&self) -> usize {
        self.settled.len()
    }

    pub fn tree(&self) -> &ShortestPathTree {
        &self.tree
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.tree.clear();
        self.best.clear();
        self.settled.clear();
        self.sequence = 0;
        self.pops = 0;
    }

    fn push(&mut self, entry: SptEntry) {
        let node = entry.node;
        let priority = entry.weight + self.heuristic.estimate(node);
        let index = self.tree.push(entry);
        self.best.insert(node, index);
        self.heap.push(HeapItem {
            priority,
            sequence: self.sequence,
            index,
        });
        self.sequence += 1;
    }

    fn check_node(&self, node: NodeId) -> Result<(), RoutingError> {
        if node >= self.graph.node_count() {
            return Err(RoutingError::InvalidNode(node));
        }
        Ok(())
    }

    /// Searches from `starts` until one of `goals` is settled and returns its
    /// tree entry. Starts are seeded with an initial weight.
    pub fn search(
        &mut self,
        starts: &[(NodeId, Weight)],
        goals: &[NodeId],
    ) -> Result<usize, RoutingError> {
        self.clear();

        let (Some(&(first_start, _)), Some(&first_goal)) = (starts.first(), goals.first()) else {
            return Err(RoutingError::EmptyQuery);
        };

        for &(node, _) in starts {
            self.check_node(node)?;
        }
        for &node in goals {
            self.check_node(node)?;
        }

        for &(node, weight) in starts {
            let improves = self
                .best
                .get(&node)
                .is_none_or(|&index| weight < self.tree.entry(index).weight);
            if improves {
                self.push(SptEntry::root(node, weight));
            }
        }

        let goals: FxHashSet<NodeId> = goals.iter().copied().collect();
        let reverse = self.direction.is_backward();

        while let Some(HeapItem { index, .. }) = self.heap.pop() {
            let entry = *self.tree.entry(index);
            if self.best.get(&entry.node) != Some(&index) {
                // A cheaper entry for this node was queued after this one
                continue;
            }

            self.pops += 1;
            self.limits.check(self.pops)?;
            self.settled.insert(entry.node);

            if goals.contains(&entry.node) {
                return Ok(index);
            }

            for state in self.graph.node_edges(entry.node) {
                if state.edge == entry.edge {
                    continue;
                }

                let edge_weight = self.weighting.calc_edge_weight(&state, reverse);
                if edge_weight == MAX_WEIGHT {
                    continue;
                }

                let weight = entry.weight + edge_weight;
                let improves = self
                    .best
                    .get(&state.adj)
                    .is_none_or(|&current| weight < self.tree.entry(current).weight);
                if improves {
                    self.push(SptEntry {
                        node: state.adj,
                        edge: state.edge,
                        incoming_edge_key: state.edge_key(),
                        parent: Some(index),
                        weight,
                    });
                }
            }
        }

        Err(RoutingError::ConnectionNotFound {
            from: first_start,
            to: first_goal,
        })
    }

    /// Shortest path from `from` to `to`, searched in the configured direction
    pub fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, RoutingError> {
        match self.direction {
            SearchDirection::Forward => self.calc_path_multi(&[(from, 0.0)], &[to]),
            SearchDirection::Backward => self
                .search(&[(to, 0.0)], &[from])
                .map(|index| self.extract_path(index))
                .map_err(|error| match error {
                    RoutingError::ConnectionNotFound { .. } => {
                        RoutingError::ConnectionNotFound { from, to }
                    }
                    other => other,
                }),
        }
    }

    /// Best path from any of `sources` to any of `targets`
    pub fn calc_path_multi(
        &mut self,
        sources: &[(NodeId, Weight)],
        targets: &[NodeId],
    ) -> Result<Path, RoutingError> {
        let index = self.search(sources, targets)?;
        Ok(self.extract_path(index))
    }

    /// Path in travel direction through the tree entry at `index`
    pub fn extract_path(&self, index: usize) -> Path {
        let entries: Vec<&SptEntry> = self.tree.walk(index).collect();
        let (start, hops): (NodeId, Vec<(EdgeId, NodeId)>) = match self.direction {
            SearchDirection::Forward => {
                let start = entries[entries.len() - 1].node;
                let hops = entries
                    .iter()
                    .rev()
                    .filter(|entry| !entry.is_root())
                    .map(|entry| (entry.edge, entry.node))
                    .collect();
                (start, hops)
            }
            SearchDirection::Backward => {
                let start = entries[0].node;
                let hops = entries
                    .windows(2)
                    .map(|pair| (pair[0].edge, pair[1].node))
                    .collect();
                (start, hops)
            }
        };

        Path::from_hops(self.graph, self.weighting, start, &hops)
    }
}
