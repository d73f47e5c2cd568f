use std::cmp::Ordering;

use crate::{
    constants::INVALID_EDGE,
    types::{EdgeId, EdgeKey, NodeId},
    weighting::Weight,
};

/// Node reached by a search. Entries live in a [`ShortestPathTree`] arena and
/// only link to entries created before them.
#[derive(Copy, Clone, Debug)]
pub struct SptEntry {
    pub node: NodeId,
    /// Edge used to reach `node`, [`INVALID_EDGE`] for a root
    pub edge: EdgeId,
    pub incoming_edge_key: EdgeKey,
    pub parent: Option<usize>,
    /// Weight of the path from the root
    pub weight: Weight,
}

impl SptEntry {
    pub fn root(node: NodeId, weight: Weight) -> Self {
        Self {
            node,
            edge: INVALID_EDGE,
            incoming_edge_key: INVALID_EDGE,
            parent: None,
            weight,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Default)]
pub struct ShortestPathTree {
    entries: Vec<SptEntry>,
}

impl ShortestPathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SptEntry) -> usize {
        debug_assert!(entry.parent.is_none_or(|parent| parent < self.entries.len()));
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn entry(&self, index: usize) -> &SptEntry {
        &self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries from `index` up to its root
    pub fn walk(&self, index: usize) -> impl Iterator<Item = &SptEntry> {
        let mut current = Some(index);
        std::iter::from_fn(move || {
            let entry = &self.entries[current?];
            current = entry.parent;
            Some(entry)
        })
    }
}

/// Queue element ordered by smallest priority first, then by insertion order
#[derive(Copy, Clone, Debug)]
pub(crate) struct HeapItem {
    pub priority: Weight,
    pub sequence: usize,
    /// Tree entry or node, depending on the search
    pub index: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &HeapItem) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &HeapItem) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flip weight to make this a min-heap
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
