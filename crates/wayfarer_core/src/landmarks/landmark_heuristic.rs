use std::collections::BinaryHeap;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    constants::MAX_WEIGHT,
    edge_direction::SearchDirection,
    graph::Graph,
    routing::{HeapItem, Heuristic},
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::lm_storage::{LandmarkStorage, is_exact};

/// Closest real node of a virtual node over virtual edges, with the weight of
/// the connection. `reverse` gives the weight of traveling from the real node
/// to `node` instead of the other way round.
fn find_anchor<G: Graph, W: Weighting>(
    graph: &G,
    weighting: &W,
    node: NodeId,
    reverse: bool,
) -> Option<(NodeId, Weight)> {
    if !graph.is_virtual_node(node) {
        return Some((node, 0.0));
    }

    let mut weights: FxHashMap<NodeId, Weight> = FxHashMap::default();
    let mut heap = BinaryHeap::new();
    weights.insert(node, 0.0);
    heap.push(HeapItem {
        priority: 0.0,
        sequence: 0,
        index: node,
    });
    let mut sequence = 1;

    while let Some(HeapItem {
        priority: weight,
        index: current,
        ..
    }) = heap.pop()
    {
        if weights.get(&current).is_some_and(|&best| weight > best) {
            continue;
        }
        if !graph.is_virtual_node(current) {
            return Some((current, weight));
        }

        for state in graph.node_edges(current) {
            let edge_weight = weighting.calc_edge_weight(&state, reverse);
            if edge_weight == MAX_WEIGHT {
                continue;
            }

            let next = weight + edge_weight;
            if weights.get(&state.adj).is_none_or(|&best| next < best) {
                weights.insert(state.adj, next);
                heap.push(HeapItem {
                    priority: next,
                    sequence,
                    index: state.adj,
                });
                sequence += 1;
            }
        }
    }

    None
}

/// Fixed point lower bound of `a - b`, zero unless both are exact
#[inline]
fn bound(a: u16, b: u16) -> i32 {
    if is_exact(a) && is_exact(b) {
        (a as i32 - b as i32 - 1).max(0)
    } else {
        0
    }
}

/// A* heuristic from the triangle inequality over landmarks.
///
/// A forward search estimates the weight from a node to the target, a
/// backward search the weight from the source to a node. Virtual nodes are
/// estimated through their closest real node, minus the weight connecting
/// them.
pub struct LandmarkHeuristic<'a> {
    storage: &'a LandmarkStorage,
    direction: SearchDirection,
    /// Slots of the landmarks in use
    active: SmallVec<[usize; 16]>,
    goal_subnetwork: u32,
    goal_from: SmallVec<[u16; 16]>,
    goal_to: SmallVec<[u16; 16]>,
    goal_offset: Weight,
    anchors: FxHashMap<NodeId, (NodeId, Weight)>,
    disconnected: bool,
}

impl<'a> LandmarkHeuristic<'a> {
    pub fn new<G: Graph, W: Weighting>(
        graph: &G,
        weighting: &W,
        storage: &'a LandmarkStorage,
        from: NodeId,
        to: NodeId,
        direction: SearchDirection,
        active_landmarks: usize,
    ) -> Self {
        let (start, goal) = match direction {
            SearchDirection::Forward => (from, to),
            SearchDirection::Backward => (to, from),
        };
        // Visited nodes connect towards the goal, the goal away from the
        // visited nodes
        let node_reverse = !direction.is_backward();
        let goal_reverse = direction.is_backward();

        let anchors: FxHashMap<NodeId, (NodeId, Weight)> = (graph.base_node_count()
            ..graph.node_count())
            .filter_map(|node| {
                find_anchor(graph, weighting, node, node_reverse).map(|anchor| (node, anchor))
            })
            .collect();
        let start_anchor = find_anchor(graph, weighting, start, node_reverse);
        let goal_anchor = find_anchor(graph, weighting, goal, goal_reverse);

        let mut heuristic = Self {
            storage,
            direction,
            active: SmallVec::new(),
            goal_subnetwork: u32::MAX,
            goal_from: SmallVec::new(),
            goal_to: SmallVec::new(),
            goal_offset: 0.0,
            anchors,
            disconnected: false,
        };

        let (Some((start_real, _)), Some((goal_real, goal_offset))) = (start_anchor, goal_anchor)
        else {
            return heuristic;
        };

        heuristic.goal_subnetwork = storage.subnetwork(goal_real);
        heuristic.goal_offset = goal_offset;
        if storage.subnetwork(start_real) != heuristic.goal_subnetwork {
            heuristic.disconnected = true;
            return heuristic;
        }

        // Ranked by their bound of the weight between both endpoints
        let (source_real, target_real) = match direction {
            SearchDirection::Forward => (start_real, goal_real),
            SearchDirection::Backward => (goal_real, start_real),
        };
        let mut candidates: Vec<(usize, i32)> = (0..storage.landmark_count())
            .filter(|&slot| {
                [source_real, target_real].iter().all(|&node| {
                    is_exact(storage.from_weight(node, slot)) && is_exact(storage.to_weight(node, slot))
                })
            })
            .map(|slot| {
                let source_bound = bound(
                    storage.to_weight(source_real, slot),
                    storage.to_weight(target_real, slot),
                )
                .max(bound(
                    storage.from_weight(target_real, slot),
                    storage.from_weight(source_real, slot),
                ));
                (slot, source_bound)
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        candidates.truncate(active_landmarks);

        for (slot, _) in candidates {
            heuristic.active.push(slot);
            heuristic.goal_from.push(storage.from_weight(goal_real, slot));
            heuristic.goal_to.push(storage.to_weight(goal_real, slot));
        }

        heuristic
    }

    /// Both endpoints are in different subnetworks
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Slots of the landmarks in use, empty when the heuristic is zero
    pub fn active_landmarks(&self) -> &[usize] {
        &self.active
    }

    fn estimate_real(&self, node: NodeId) -> Weight {
        if self.storage.subnetwork(node) != self.goal_subnetwork {
            return 0.0;
        }

        let mut best = 0;
        for (index, &slot) in self.active.iter().enumerate() {
            let node_from = self.storage.from_weight(node, slot);
            let node_to = self.storage.to_weight(node, slot);
            let goal_from = self.goal_from[index];
            let goal_to = self.goal_to[index];

            let landmark_bound = match self.direction {
                // d(v, t) >= d(v, L) - d(t, L) and d(v, t) >= d(L, t) - d(L, v)
                SearchDirection::Forward => {
                    bound(node_to, goal_to).max(bound(goal_from, node_from))
                }
                // d(s, v) >= d(s, L) - d(v, L) and d(s, v) >= d(L, v) - d(L, s)
                SearchDirection::Backward => {
                    bound(goal_to, node_to).max(bound(node_from, goal_from))
                }
            };
            best = best.max(landmark_bound);
        }

        best as f64 * self.storage.factor()
    }
}

impl Heuristic for LandmarkHeuristic<'_> {
    fn estimate(&self, node: NodeId) -> Weight {
        if self.active.is_empty() {
            return 0.0;
        }

        let (real, offset) = if node < self.storage.node_count() {
            (node, 0.0)
        } else {
            match self.anchors.get(&node) {
                Some(&anchor) => anchor,
                None => return 0.0,
            }
        };

        (self.estimate_real(real) - offset - self.goal_offset).max(0.0)
    }
}
