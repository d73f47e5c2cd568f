use crate::{graph::Graph, types::NodeId, weighting::Weighting};

// Disjoint set union
struct Dsu {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Dsu {
    fn new(count: usize) -> Self {
        Dsu {
            parent: (0..count).collect(),
            size: vec![1; count],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            // Path halving
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, i: usize, j: usize) {
        let mut root_i = self.find(i);
        let mut root_j = self.find(j);
        if root_i == root_j {
            return;
        }
        if self.size[root_i] < self.size[root_j] {
            std::mem::swap(&mut root_i, &mut root_j);
        }
        self.parent[root_j] = root_i;
        self.size[root_i] += self.size[root_j];
    }
}

/// Weakly connected components of the edges accessible under a weighting.
/// Component ids are dense and numbered in the order of their lowest node.
pub(crate) struct Subnetworks {
    ids: Vec<u32>,
    sizes: Vec<usize>,
    /// Lowest node of every component
    first_nodes: Vec<NodeId>,
}

impl Subnetworks {
    pub fn find<G: Graph, W: Weighting>(graph: &G, weighting: &W) -> Self {
        let node_count = graph.node_count();
        let mut dsu = Dsu::new(node_count);

        for node in 0..node_count {
            for state in graph.node_edges(node) {
                // Each edge shows up from both of its nodes
                if state.adj > node && weighting.can_access_edge(&state) {
                    dsu.union(node, state.adj);
                }
            }
        }

        let mut root_ids = vec![u32::MAX; node_count];
        let mut ids = vec![0; node_count];
        let mut sizes = Vec::new();
        let mut first_nodes = Vec::new();
        for node in 0..node_count {
            let root = dsu.find(node);
            if root_ids[root] == u32::MAX {
                root_ids[root] = sizes.len() as u32;
                sizes.push(0);
                first_nodes.push(node);
            }
            ids[node] = root_ids[root];
            sizes[root_ids[root] as usize] += 1;
        }

        Self {
            ids,
            sizes,
            first_nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn id(&self, node: NodeId) -> u32 {
        self.ids[node]
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn size(&self, subnetwork: u32) -> usize {
        self.sizes[subnetwork as usize]
    }

    pub fn first_node(&self, subnetwork: u32) -> NodeId {
        self.first_nodes[subnetwork as usize]
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graph::BaseGraph,
        test_graph_utils::{
            RomaniaGraphCity, car_encoding, create_romania_graph, random_graph, romania_weighting,
            set_car_speed,
        },
    };

    use super::*;

    #[test]
    fn test_romania_subnetworks() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let subnetworks = Subnetworks::find(&graph, &weighting);

        // The isolated node 0 and the whole map
        assert_eq!(subnetworks.len(), 2);
        assert_eq!(subnetworks.id(0), 0);
        assert_eq!(subnetworks.size(0), 1);
        assert_eq!(subnetworks.id(RomaniaGraphCity::Arad.into()), 1);
        assert_eq!(subnetworks.id(RomaniaGraphCity::Neamt.into()), 1);
        assert_eq!(subnetworks.size(1), 20);
        assert_eq!(subnetworks.first_node(1), 1);
    }

    #[test]
    fn test_closed_edge_splits_subnetwork() {
        let mut graph = BaseGraph::in_memory(car_encoding()).unwrap();
        for node in 0..4 {
            graph.set_node(node, 0.0, node as f64 * 0.01, None).unwrap();
        }
        for node in 0..3 {
            let edge = graph.add_edge(node, node + 1, 1000.0).unwrap();
            if node == 1 {
                set_car_speed(&mut graph, edge, 0.0, 0.0);
            } else {
                // One way edges still connect their nodes
                set_car_speed(&mut graph, edge, 50.0, 0.0);
            }
        }
        graph.freeze();

        let weighting = romania_weighting(&graph);
        let subnetworks = Subnetworks::find(&graph, &weighting);
        assert_eq!(subnetworks.len(), 2);
        assert_eq!(subnetworks.id(0), subnetworks.id(1));
        assert_eq!(subnetworks.id(2), subnetworks.id(3));
        assert_ne!(subnetworks.id(1), subnetworks.id(2));
    }

    #[test]
    fn test_random_graph_is_connected() {
        let graph = random_graph(300, 200, 3);
        let weighting = romania_weighting(&graph);
        let subnetworks = Subnetworks::find(&graph, &weighting);
        assert_eq!(subnetworks.len(), 1);
        assert!(subnetworks.ids().iter().all(|&id| id == 0));
    }
}
