use std::collections::BinaryHeap;

use fxhash::FxHashMap;

use crate::{
    constants::MAX_WEIGHT,
    edge_direction::SearchDirection,
    error::RoutingError,
    graph::Graph,
    routing::{HeapItem, Path, SearchLimits},
    types::{EdgeId, NodeId},
    weighting::{Weight, Weighting},
};

use super::routing_ch_graph::{CHEdgeId, RoutingCHGraph};

/// Node reached by one side of a CH search
#[derive(Copy, Clone, Debug)]
pub struct CHEntry {
    pub node: NodeId,
    /// Edge from the parent, `None` for a root
    pub edge: Option<CHEdgeId>,
    pub parent: Option<usize>,
    pub weight: Weight,
    /// Original edges on the way from the root
    pub original_edges: u32,
}

/// Best meeting point of the forward and backward searches
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CHMeeting {
    pub node: NodeId,
    pub weight: Weight,
    pub forward_entry: usize,
    pub backward_entry: usize,
}

#[derive(Default)]
struct SearchSide {
    heap: BinaryHeap<HeapItem>,
    entries: Vec<CHEntry>,
    best: FxHashMap<NodeId, usize>,
    settled: usize,
}

impl SearchSide {
    fn clear(&mut self) {
        self.heap.clear();
        self.entries.clear();
        self.best.clear();
        self.settled = 0;
    }

    fn weight(&self, node: NodeId) -> Weight {
        self.best
            .get(&node)
            .map_or(MAX_WEIGHT, |&index| self.entries[index].weight)
    }

    fn min_priority(&self) -> Option<Weight> {
        self.heap.peek().map(|item| item.priority)
    }

    /// Pushes `entry` if it improves the weight of its node
    fn relax(&mut self, entry: CHEntry, sequence: &mut usize) -> Option<usize> {
        if entry.weight >= self.weight(entry.node) {
            return None;
        }

        let index = self.entries.len();
        debug_assert!(entry.parent.is_none_or(|parent| parent < index));
        self.entries.push(entry);
        self.best.insert(entry.node, index);
        self.heap.push(HeapItem {
            priority: entry.weight,
            sequence: *sequence,
            index,
        });
        *sequence += 1;
        Some(index)
    }
}

/// Bidirectional Dijkstra over the upward edges of a [`RoutingCHGraph`]
pub struct CHQuery<'a, G: Graph, W: Weighting> {
    graph: &'a RoutingCHGraph<'a, G, W>,
    stall_on_demand: bool,
    limits: SearchLimits,
    forward: SearchSide,
    backward: SearchSide,
    sequence: usize,
    pops: usize,
    stalled: usize,
}

impl<'a, G: Graph, W: Weighting> CHQuery<'a, G, W> {
    pub fn new(graph: &'a RoutingCHGraph<'a, G, W>) -> Self {
        Self {
            graph,
            stall_on_demand: true,
            limits: SearchLimits::none(),
            forward: SearchSide::default(),
            backward: SearchSide::default(),
            sequence: 0,
            pops: 0,
            stalled: 0,
        }
    }

    pub fn with_stall_on_demand(mut self, stall_on_demand: bool) -> Self {
        self.stall_on_demand = stall_on_demand;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Nodes settled by both sides of the last search
    pub fn visited_nodes(&self) -> usize {
        self.forward.settled + self.backward.settled
    }

    /// Nodes of the last search that were not expanded because a shorter
    /// path through a higher node exists
    pub fn stalled_nodes(&self) -> usize {
        self.stalled
    }

    pub fn entry(&self, direction: SearchDirection, index: usize) -> &CHEntry {
        match direction {
            SearchDirection::Forward => &self.forward.entries[index],
            SearchDirection::Backward => &self.backward.entries[index],
        }
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
        self.sequence = 0;
        self.pops = 0;
        self.stalled = 0;
    }

    pub fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, RoutingError> {
        self.calc_path_multi(&[(from, 0.0)], &[(to, 0.0)])
    }

    /// Best path from any of `sources` to any of `targets`, each seeded with
    /// an initial weight
    pub fn calc_path_multi(
        &mut self,
        sources: &[(NodeId, Weight)],
        targets: &[(NodeId, Weight)],
    ) -> Result<Path, RoutingError> {
        let meeting = self.search(sources, targets)?;
        self.extract_path(&meeting)
    }

    pub fn search(
        &mut self,
        sources: &[(NodeId, Weight)],
        targets: &[(NodeId, Weight)],
    ) -> Result<CHMeeting, RoutingError> {
        self.clear();

        let (Some(&(first_source, _)), Some(&(first_target, _))) = (sources.first(), targets.first())
        else {
            return Err(RoutingError::EmptyQuery);
        };

        let node_count = self.graph.node_count();
        for &(node, _) in sources.iter().chain(targets) {
            if node >= node_count {
                return Err(RoutingError::InvalidNode(node));
            }
        }

        let mut meeting: Option<CHMeeting> = None;

        for &(node, weight) in sources {
            self.forward.relax(root(node, weight), &mut self.sequence);
        }
        for &(node, weight) in targets {
            if let Some(index) = self.backward.relax(root(node, weight), &mut self.sequence) {
                update_meeting(&mut meeting, &self.backward, index, &self.forward, SearchDirection::Backward);
            }
        }

        loop {
            let best = meeting.map_or(MAX_WEIGHT, |meeting| meeting.weight);
            let forward_min = self.forward.min_priority().filter(|&min| min < best);
            let backward_min = self.backward.min_priority().filter(|&min| min < best);

            let direction = match (forward_min, backward_min) {
                (None, None) => break,
                (Some(_), None) => SearchDirection::Forward,
                (None, Some(_)) => SearchDirection::Backward,
                (Some(forward), Some(backward)) if forward <= backward => SearchDirection::Forward,
                _ => SearchDirection::Backward,
            };

            self.step(direction, &mut meeting)?;
        }

        meeting.ok_or(RoutingError::ConnectionNotFound {
            from: first_source,
            to: first_target,
        })
    }

    fn step(
        &mut self,
        direction: SearchDirection,
        meeting: &mut Option<CHMeeting>,
    ) -> Result<(), RoutingError> {
        let (side, other) = match direction {
            SearchDirection::Forward => (&mut self.forward, &self.backward),
            SearchDirection::Backward => (&mut self.backward, &self.forward),
        };

        let Some(HeapItem { index, .. }) = side.heap.pop() else {
            return Ok(());
        };
        let entry = side.entries[index];
        if side.best.get(&entry.node) != Some(&index) {
            return Ok(());
        }

        self.pops += 1;
        self.limits.check(self.pops)?;
        side.settled += 1;

        if self.stall_on_demand && is_stallable(self.graph, direction, side, &entry) {
            self.stalled += 1;
            return Ok(());
        }

        for edge in self.graph.upward_edges(entry.node) {
            if entry.edge == Some(edge.id) {
                continue;
            }

            let edge_weight = match direction {
                SearchDirection::Forward => edge.weight_fwd,
                SearchDirection::Backward => edge.weight_bwd,
            };
            if edge_weight == MAX_WEIGHT {
                continue;
            }

            let next = CHEntry {
                node: edge.adj,
                edge: Some(edge.id),
                parent: Some(index),
                weight: entry.weight + edge_weight,
                original_edges: entry.original_edges + edge.orig_count,
            };
            if let Some(next_index) = side.relax(next, &mut self.sequence) {
                update_meeting(meeting, side, next_index, other, direction);
            }
        }

        Ok(())
    }

    /// Original edges from the source to the target through `meeting`
    pub fn extract_path(&self, meeting: &CHMeeting) -> Result<Path, RoutingError> {
        let forward_entries = walk(&self.forward.entries, meeting.forward_entry);
        let start = forward_entries
            .last()
            .map_or(meeting.node, |entry| entry.node);

        let mut hops: Vec<(EdgeId, NodeId)> = Vec::new();
        for pair in forward_entries.windows(2).rev() {
            let (entry, parent) = (pair[0], pair[1]);
            if let Some(edge) = entry.edge {
                self.graph.unpack(edge, parent.node, entry.node, &mut hops)?;
            }
        }

        let backward_entries = walk(&self.backward.entries, meeting.backward_entry);
        for pair in backward_entries.windows(2) {
            let (entry, parent) = (pair[0], pair[1]);
            if let Some(edge) = entry.edge {
                self.graph.unpack(edge, entry.node, parent.node, &mut hops)?;
            }
        }

        Ok(Path::from_hops(
            self.graph.graph(),
            self.graph.weighting(),
            start,
            &hops,
        ))
    }
}

fn root(node: NodeId, weight: Weight) -> CHEntry {
    CHEntry {
        node,
        edge: None,
        parent: None,
        weight,
        original_edges: 0,
    }
}

/// Entries from `index` up to its root
fn walk(entries: &[CHEntry], index: usize) -> Vec<CHEntry> {
    let mut walked = Vec::new();
    let mut current = Some(index);
    while let Some(index) = current {
        walked.push(entries[index]);
        current = entries[index].parent;
    }
    walked
}

fn update_meeting(
    meeting: &mut Option<CHMeeting>,
    side: &SearchSide,
    index: usize,
    other: &SearchSide,
    direction: SearchDirection,
) {
    let entry = &side.entries[index];
    let Some(&other_index) = other.best.get(&entry.node) else {
        return;
    };

    let weight = entry.weight + other.entries[other_index].weight;
    if meeting.is_some_and(|meeting| meeting.weight <= weight) {
        return;
    }

    let (forward_entry, backward_entry) = match direction {
        SearchDirection::Forward => (index, other_index),
        SearchDirection::Backward => (other_index, index),
    };
    *meeting = Some(CHMeeting {
        node: entry.node,
        weight,
        forward_entry,
        backward_entry,
    });
}

/// A node is stallable when a higher neighbor already reached by this side
/// offers a cheaper way down to it
fn is_stallable<G: Graph, W: Weighting>(
    graph: &RoutingCHGraph<'_, G, W>,
    direction: SearchDirection,
    side: &SearchSide,
    entry: &CHEntry,
) -> bool {
    for edge in graph.upward_edges(entry.node) {
        let edge_weight = match direction {
            SearchDirection::Forward => edge.weight_bwd,
            SearchDirection::Backward => edge.weight_fwd,
        };
        if edge_weight == MAX_WEIGHT {
            continue;
        }

        let adj_weight = side.weight(edge.adj);
        if adj_weight != MAX_WEIGHT && adj_weight + edge_weight < entry.weight {
            return true;
        }
    }

    false
}
