use crate::{
    constants::MAX_WEIGHT,
    error::{PreparationError, RoutingError},
    graph::{BaseGraph, Graph, QueryGraph},
    types::{EdgeId, NodeId},
    weighting::{Weight, Weighting},
};

use super::ch_storage::CHStorage;

/// Edge of the hierarchy, either an edge of the underlying graph (virtual
/// edges included) or a stored shortcut
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CHEdgeId {
    Original(EdgeId),
    Shortcut(usize),
}

/// Edge leaving `base` towards a node of higher level
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CHEdge {
    pub id: CHEdgeId,
    pub base: NodeId,
    pub adj: NodeId,
    /// Weight from `base` to `adj`
    pub weight_fwd: Weight,
    /// Weight from `adj` to `base`
    pub weight_bwd: Weight,
    pub orig_count: u32,
}

/// Base graph, or query graph on top of it, seen through a contraction
/// hierarchy. Virtual nodes rank above every real node.
pub struct RoutingCHGraph<'a, G: Graph, W: Weighting> {
    graph: &'a G,
    storage: &'a CHStorage,
    weighting: &'a W,
}

pub type QueryRoutingCHGraph<'a, 'b, W> = RoutingCHGraph<'a, QueryGraph<'b, BaseGraph>, W>;

impl<'a, G: Graph, W: Weighting> RoutingCHGraph<'a, G, W> {
    /// `weighting` must be the weighting the hierarchy was prepared with
    pub fn new(
        graph: &'a G,
        storage: &'a CHStorage,
        weighting: &'a W,
    ) -> Result<Self, PreparationError> {
        if weighting.name() != storage.weighting_name() {
            return Err(PreparationError::ProfileMismatch {
                stored: storage.weighting_name().to_string(),
                requested: weighting.name().to_string(),
            });
        }

        if graph.base_node_count() != storage.node_count() {
            return Err(PreparationError::InvalidConfig(format!(
                "hierarchy has {} nodes, the graph {}",
                storage.node_count(),
                graph.base_node_count()
            )));
        }

        Ok(Self {
            graph,
            storage,
            weighting,
        })
    }

    pub fn graph(&self) -> &'a G {
        self.graph
    }

    pub fn weighting(&self) -> &'a W {
        self.weighting
    }

    pub fn storage(&self) -> &'a CHStorage {
        self.storage
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn is_virtual(&self, node: NodeId) -> bool {
        node >= self.storage.node_count()
    }

    pub fn level(&self, node: NodeId) -> usize {
        if self.is_virtual(node) {
            usize::MAX
        } else {
            self.storage.level(node)
        }
    }

    /// Original edges to higher level nodes and shortcuts starting at `node`.
    /// Every edge of a virtual node is returned.
    pub fn upward_edges(&self, node: NodeId) -> impl Iterator<Item = CHEdge> + '_ {
        let virtual_node = self.is_virtual(node);
        let level = self.level(node);

        let originals = self.graph.node_edges(node).filter_map(move |state| {
            if state.adj == node {
                return None;
            }
            if !virtual_node && self.level(state.adj) < level {
                return None;
            }

            let weight_fwd = self.weighting.calc_edge_weight(&state, false);
            let weight_bwd = self.weighting.calc_edge_weight(&state, true);
            if weight_fwd == MAX_WEIGHT && weight_bwd == MAX_WEIGHT {
                return None;
            }

            Some(CHEdge {
                id: CHEdgeId::Original(state.edge),
                base: node,
                adj: state.adj,
                weight_fwd,
                weight_bwd,
                orig_count: 1,
            })
        });

        let shortcuts = if virtual_node {
            0..0
        } else {
            self.storage.shortcut_range(node)
        };

        originals.chain(shortcuts.map(move |index| {
            let shortcut = self.storage.shortcut(index);
            CHEdge {
                id: CHEdgeId::Shortcut(index),
                base: node,
                adj: shortcut.node_b,
                weight_fwd: if shortcut.is_forward() {
                    shortcut.weight
                } else {
                    MAX_WEIGHT
                },
                weight_bwd: if shortcut.is_backward() {
                    shortcut.weight
                } else {
                    MAX_WEIGHT
                },
                orig_count: shortcut.orig_count,
            }
        }))
    }

    fn reference(&self, reference: EdgeId) -> CHEdgeId {
        match self.storage.shortcut_index(reference) {
            Some(index) => CHEdgeId::Shortcut(index),
            None => CHEdgeId::Original(reference),
        }
    }

    fn other_node(&self, edge: CHEdgeId, node: NodeId) -> NodeId {
        let (node_a, node_b) = match edge {
            CHEdgeId::Original(edge) => self.graph.edge_nodes(edge),
            CHEdgeId::Shortcut(index) => {
                let shortcut = self.storage.shortcut(index);
                (shortcut.node_a, shortcut.node_b)
            }
        };
        if node_a == node { node_b } else { node_a }
    }

    fn checked_skip(&self, root: usize, reference: EdgeId) -> Result<CHEdgeId, RoutingError> {
        match self.reference(reference) {
            CHEdgeId::Shortcut(index) if index >= self.storage.shortcut_count() => {
                Err(RoutingError::InvalidShortcut(root))
            }
            skip => Ok(skip),
        }
    }

    /// Appends the original edges of `edge` traveled from `from` to `to`,
    /// each with the node it leads to. Fails on a shortcut whose skips do
    /// not resolve into exactly `orig_count` original edges.
    pub fn unpack(
        &self,
        edge: CHEdgeId,
        from: NodeId,
        to: NodeId,
        hops: &mut Vec<(EdgeId, NodeId)>,
    ) -> Result<(), RoutingError> {
        let root = match edge {
            CHEdgeId::Original(edge) => {
                hops.push((edge, to));
                return Ok(());
            }
            CHEdgeId::Shortcut(index) => index,
        };
        if root >= self.storage.shortcut_count() {
            return Err(RoutingError::InvalidShortcut(root));
        }

        let expected = self.storage.shortcut(root).orig_count.max(1) as usize;
        let first_hop = hops.len();
        // Binary tree with `expected` leaves
        let mut remaining = 2 * expected - 1;
        let mut stack = vec![(edge, from, to)];

        while let Some((edge, from, to)) = stack.pop() {
            if remaining == 0 {
                return Err(RoutingError::InvalidShortcut(root));
            }
            remaining -= 1;

            match edge {
                CHEdgeId::Original(edge) => hops.push((edge, to)),
                CHEdgeId::Shortcut(index) => {
                    let shortcut = self.storage.shortcut(index);
                    let skip1 = self.checked_skip(root, shortcut.skip1)?;
                    let skip2 = self.checked_skip(root, shortcut.skip2)?;
                    let middle = self.other_node(skip1, shortcut.node_a);

                    // Pushed in reverse, the first half is unpacked first
                    if from == shortcut.node_a {
                        stack.push((skip2, middle, shortcut.node_b));
                        stack.push((skip1, shortcut.node_a, middle));
                    } else {
                        stack.push((skip1, middle, shortcut.node_a));
                        stack.push((skip2, shortcut.node_b, middle));
                    }
                }
            }
        }

        if hops.len() - first_hop != expected {
            return Err(RoutingError::InvalidShortcut(root));
        }
        Ok(())
    }

    /// Original edges of `edge`, in travel order from `from`
    pub fn original_edges(&self, edge: CHEdgeId, from: NodeId) -> Result<Vec<EdgeId>, RoutingError> {
        if let CHEdgeId::Shortcut(index) = edge {
            if index >= self.storage.shortcut_count() {
                return Err(RoutingError::InvalidShortcut(index));
            }
        }
        let to = self.other_node(edge, from);
        let mut hops = Vec::new();
        self.unpack(edge, from, to, &mut hops)?;
        Ok(hops.into_iter().map(|(edge, _)| edge).collect())
    }
}
