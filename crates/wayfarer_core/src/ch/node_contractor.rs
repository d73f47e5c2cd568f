use crate::types::NodeId;

use super::{
    ch_config::CHConfig,
    ch_storage::round_up_weight,
    preparation_graph::{CHPreparationGraph, PrepShortcut},
    witness_search::WitnessSearch,
};

pub(crate) struct NodeContractor {
    witness_search: WitnessSearch,
    edge_difference_weight: f64,
    original_edges_count_weight: f64,
    max_poll_factor_heuristic: f64,
    max_poll_factor_contraction: f64,
}

impl NodeContractor {
    pub fn new(config: &CHConfig) -> Self {
        Self {
            witness_search: WitnessSearch::new(),
            edge_difference_weight: config.edge_difference_weight,
            original_edges_count_weight: config.original_edges_count_weight,
            max_poll_factor_heuristic: config.max_poll_factor_heuristic,
            max_poll_factor_contraction: config.max_poll_factor_contraction,
        }
    }

    /// Edge difference of contracting `node`, lower is contracted first
    pub fn calc_priority(&mut self, graph: &CHPreparationGraph, node: NodeId) -> f64 {
        let max_settled_nodes = max_settled_nodes(graph, self.max_poll_factor_heuristic);
        let shortcuts = self.find_shortcuts(graph, node, max_settled_nodes);

        let removed_arcs = graph.degree(node);
        let removed_orig_edges: u32 = graph
            .in_arcs(node)
            .iter()
            .chain(graph.out_arcs(node))
            .map(|arc| arc.orig_count)
            .sum();
        let added_orig_edges: u32 = shortcuts.iter().map(|shortcut| shortcut.orig_count).sum();

        self.edge_difference_weight * (shortcuts.len() as f64 - removed_arcs as f64)
            + self.original_edges_count_weight
                * (added_orig_edges as f64 - removed_orig_edges as f64)
    }

    /// Adds the shortcuts needed to bypass `node` and removes it from the
    /// graph. Returns its former neighbors and the shortcuts added or improved.
    pub fn contract_node(
        &mut self,
        graph: &mut CHPreparationGraph,
        node: NodeId,
    ) -> (Vec<NodeId>, usize) {
        let max_settled_nodes = max_settled_nodes(graph, self.max_poll_factor_contraction);
        let shortcuts = self.find_shortcuts(graph, node, max_settled_nodes);

        let mut added = 0;
        for shortcut in shortcuts {
            if graph.add_or_update_shortcut(shortcut) {
                added += 1;
            }
        }

        (graph.disconnect(node), added)
    }

    fn find_shortcuts(
        &mut self,
        graph: &CHPreparationGraph,
        node: NodeId,
        max_settled_nodes: usize,
    ) -> Vec<PrepShortcut> {
        let mut shortcuts: Vec<PrepShortcut> = Vec::new();

        for incoming in graph.in_arcs(node) {
            self.witness_search.init(incoming.adj, node);

            for outgoing in graph.out_arcs(node) {
                // We ignore the way back, no shortcut is needed
                if incoming.adj == outgoing.adj {
                    continue;
                }

                let weight = round_up_weight(incoming.weight + outgoing.weight);
                let witness_weight = self.witness_search.find_max_weight(
                    graph,
                    outgoing.adj,
                    weight,
                    max_settled_nodes,
                );

                if witness_weight <= weight {
                    continue;
                }

                let shortcut = PrepShortcut {
                    from: incoming.adj,
                    to: outgoing.adj,
                    weight,
                    skip_in: incoming.id,
                    skip_out: outgoing.id,
                    orig_count: incoming.orig_count + outgoing.orig_count,
                };

                // Parallel arcs give several candidates for the same pair
                match shortcuts
                    .iter_mut()
                    .find(|candidate| candidate.from == shortcut.from && candidate.to == shortcut.to)
                {
                    Some(candidate) if shortcut.weight < candidate.weight => *candidate = shortcut,
                    Some(_) => {}
                    None => shortcuts.push(shortcut),
                }
            }
        }

        shortcuts
    }
}

fn max_settled_nodes(graph: &CHPreparationGraph, factor: f64) -> usize {
    ((factor * graph.mean_degree()) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use crate::test_graph_utils::{create_romania_graph, romania_weighting};

    use super::*;

    #[test]
    fn test_contract_leaf() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let mut prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let mut contractor = NodeContractor::new(&CHConfig::default());

        // Eforie only connects to Hirsova
        let (neighbors, added) = contractor.contract_node(&mut prep_graph, 5);
        assert_eq!(neighbors, vec![8]);
        assert_eq!(added, 0);
        assert!(prep_graph.shortcuts().is_empty());
    }

    #[test]
    fn test_contract_adds_shortcut() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let mut prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let mut contractor = NodeContractor::new(&CHConfig::default());

        // Vaslui lies on the only road between Urziceni and Iasi
        let (neighbors, added) = contractor.contract_node(&mut prep_graph, 19);
        assert_eq!(neighbors, vec![9, 18]);
        assert_eq!(added, 2);

        let shortcuts = prep_graph.shortcuts();
        assert!(shortcuts.iter().all(|shortcut| shortcut.weight == 234_000.0));
        assert!(shortcuts.iter().all(|shortcut| shortcut.orig_count == 2));
        assert!(
            shortcuts
                .iter()
                .any(|shortcut| shortcut.from == 18 && shortcut.to == 9)
        );
        assert!(
            shortcuts
                .iter()
                .any(|shortcut| shortcut.from == 9 && shortcut.to == 18)
        );
    }

    #[test]
    fn test_witness_prevents_shortcut() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let mut prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let mut contractor = NodeContractor::new(&CHConfig::default());

        // Pitesti: Craiova - Rimnicu Vilcea is shorter on its direct road
        let (_, added) = contractor.contract_node(&mut prep_graph, 14);
        assert_eq!(added, 4);
        assert!(prep_graph.shortcuts().iter().all(|shortcut| {
            let pair = (shortcut.from.min(shortcut.to), shortcut.from.max(shortcut.to));
            pair != (3, 15)
        }));
    }

    #[test]
    fn test_priority() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let prep_graph = CHPreparationGraph::new(&graph, &weighting);
        let mut contractor = NodeContractor::new(&CHConfig::default());

        // Eforie removes two arcs and needs no shortcut
        assert_eq!(contractor.calc_priority(&prep_graph, 5), -22.0);
        // Vaslui removes four arcs and needs two shortcuts of two edges each
        assert_eq!(contractor.calc_priority(&prep_graph, 19), -20.0);
        assert_eq!(contractor.calc_priority(&prep_graph, 0), 0.0);
    }
}
