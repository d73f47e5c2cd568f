use crate::{
    constants::MAX_WEIGHT,
    graph::Graph,
    types::NodeId,
    weighting::{Weight, Weighting},
};

/// Directed arc of the preparation graph.
///
/// `id` below the original edge count is an original edge, above it the
/// shortcut `id - edge_count` of the preparation arena.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct PrepArc {
    pub adj: NodeId,
    pub weight: Weight,
    pub id: usize,
    pub orig_count: u32,
}

/// Shortcut `from -> to` replacing two arcs through a contracted node
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct PrepShortcut {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: Weight,
    /// Arc into the contracted node
    pub skip_in: usize,
    /// Arc out of the contracted node
    pub skip_out: usize,
    pub orig_count: u32,
}

/// Mutable directed adjacency of the nodes left to contract
pub(crate) struct CHPreparationGraph {
    out_arcs: Vec<Vec<PrepArc>>,
    in_arcs: Vec<Vec<PrepArc>>,
    shortcuts: Vec<PrepShortcut>,
    edge_count: usize,
    arc_count: usize,
}

impl CHPreparationGraph {
    /// Arcs of every finite direction of every edge. Loops are left out.
    pub fn new<G: Graph, W: Weighting>(graph: &G, weighting: &W) -> Self {
        let node_count = graph.node_count();
        let mut prep_graph = Self {
            out_arcs: vec![Vec::new(); node_count],
            in_arcs: vec![Vec::new(); node_count],
            shortcuts: Vec::new(),
            edge_count: graph.edge_count(),
            arc_count: 0,
        };

        for edge in 0..graph.edge_count() {
            let (node_a, node_b) = graph.edge_nodes(edge);
            if node_a == node_b {
                continue;
            }

            let state = graph.edge_state(edge, node_b);
            let forward = weighting.calc_edge_weight(&state, false);
            let backward = weighting.calc_edge_weight(&state, true);

            if forward != MAX_WEIGHT {
                prep_graph.add_arc(node_a, node_b, forward, edge, 1);
            }
            if backward != MAX_WEIGHT {
                prep_graph.add_arc(node_b, node_a, backward, edge, 1);
            }
        }

        prep_graph
    }

    fn add_arc(&mut self, from: NodeId, to: NodeId, weight: Weight, id: usize, orig_count: u32) {
        self.out_arcs[from].push(PrepArc {
            adj: to,
            weight,
            id,
            orig_count,
        });
        self.in_arcs[to].push(PrepArc {
            adj: from,
            weight,
            id,
            orig_count,
        });
        self.arc_count += 1;
    }

    pub fn node_count(&self) -> usize {
        self.out_arcs.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn out_arcs(&self, node: NodeId) -> &[PrepArc] {
        &self.out_arcs[node]
    }

    pub fn in_arcs(&self, node: NodeId) -> &[PrepArc] {
        &self.in_arcs[node]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.out_arcs[node].len() + self.in_arcs[node].len()
    }

    /// Mean number of arcs per node still in the graph
    pub fn mean_degree(&self) -> f64 {
        if self.out_arcs.is_empty() {
            return 0.0;
        }
        self.arc_count as f64 / self.out_arcs.len() as f64
    }

    pub fn shortcuts(&self) -> &[PrepShortcut] {
        &self.shortcuts
    }

    pub fn into_shortcuts(self) -> Vec<PrepShortcut> {
        self.shortcuts
    }

    pub fn is_shortcut(&self, id: usize) -> bool {
        id >= self.edge_count
    }

    /// Adds `shortcut`, or lowers the weight of the existing shortcut between
    /// the same nodes. Returns false when an existing shortcut is not heavier.
    pub fn add_or_update_shortcut(&mut self, shortcut: PrepShortcut) -> bool {
        let existing = self.out_arcs[shortcut.from]
            .iter()
            .find(|arc| arc.adj == shortcut.to && self.is_shortcut(arc.id))
            .copied();

        match existing {
            Some(arc) if arc.weight <= shortcut.weight => false,
            Some(arc) => {
                let index = arc.id - self.edge_count;
                self.shortcuts[index] = shortcut;
                let updated = |candidate: &mut PrepArc| {
                    if candidate.id == arc.id {
                        candidate.weight = shortcut.weight;
                        candidate.orig_count = shortcut.orig_count;
                    }
                };
                self.out_arcs[shortcut.from].iter_mut().for_each(updated);
                self.in_arcs[shortcut.to].iter_mut().for_each(updated);
                true
            }
            None => {
                let id = self.edge_count + self.shortcuts.len();
                self.shortcuts.push(shortcut);
                self.add_arc(
                    shortcut.from,
                    shortcut.to,
                    shortcut.weight,
                    id,
                    shortcut.orig_count,
                );
                true
            }
        }
    }

    /// Removes every arc of `node` from its neighbors and returns the
    /// neighbors, deduplicated
    pub fn disconnect(&mut self, node: NodeId) -> Vec<NodeId> {
        let out_arcs = std::mem::take(&mut self.out_arcs[node]);
        let in_arcs = std::mem::take(&mut self.in_arcs[node]);
        self.arc_count -= out_arcs.len() + in_arcs.len();

        let mut neighbors = Vec::with_capacity(out_arcs.len() + in_arcs.len());
        for arc in &out_arcs {
            self.in_arcs[arc.adj].retain(|candidate| candidate.adj != node);
            neighbors.push(arc.adj);
        }
        for arc in &in_arcs {
            self.out_arcs[arc.adj].retain(|candidate| candidate.adj != node);
            neighbors.push(arc.adj);
        }

        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    #[cfg(test)]
    pub fn arc_count(&self) -> usize {
        self.arc_count
    }
}

#[cfg(test)]
mod tests {
    use crate::test_graph_utils::{create_romania_graph, romania_weighting};

    use super::*;

    #[test]
    fn test_build_from_graph() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let prep_graph = CHPreparationGraph::new(&graph, &weighting);

        assert_eq!(prep_graph.node_count(), 21);
        // Every road is two-way
        assert_eq!(prep_graph.arc_count(), 2 * graph.edge_count());
        assert_eq!(prep_graph.degree(0), 0);

        // Pitesti: Craiova, Rimnicu Vilcea and Bucharest
        assert_eq!(prep_graph.out_arcs(14).len(), 3);
        assert_eq!(prep_graph.in_arcs(14).len(), 3);
    }

    #[test]
    fn test_shortcut_update() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let mut prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let edge_count = prep_graph.edge_count();

        let shortcut = PrepShortcut {
            from: 1,
            to: 13,
            weight: 300_000.0,
            skip_in: 0,
            skip_out: 1,
            orig_count: 2,
        };
        assert!(prep_graph.add_or_update_shortcut(shortcut));
        assert!(!prep_graph.add_or_update_shortcut(PrepShortcut {
            weight: 300_000.0,
            ..shortcut
        }));
        assert!(prep_graph.add_or_update_shortcut(PrepShortcut {
            weight: 146_000.0,
            ..shortcut
        }));

        assert_eq!(prep_graph.shortcuts().len(), 1);
        let arc = prep_graph
            .out_arcs(1)
            .iter()
            .find(|arc| arc.id == edge_count)
            .unwrap();
        assert_eq!(arc.weight, 146_000.0);
        let arc = prep_graph
            .in_arcs(13)
            .iter()
            .find(|arc| arc.id == edge_count)
            .unwrap();
        assert_eq!(arc.weight, 146_000.0);
    }

    #[test]
    fn test_disconnect() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let mut prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let arcs = prep_graph.arc_count();

        // Pitesti
        let neighbors = prep_graph.disconnect(14);
        assert_eq!(neighbors, vec![2, 3, 15]);
        assert_eq!(prep_graph.degree(14), 0);
        assert_eq!(prep_graph.arc_count(), arcs - 6);
        for neighbor in neighbors {
            assert!(prep_graph.out_arcs(neighbor).iter().all(|arc| arc.adj != 14));
            assert!(prep_graph.in_arcs(neighbor).iter().all(|arc| arc.adj != 14));
        }
    }
}
