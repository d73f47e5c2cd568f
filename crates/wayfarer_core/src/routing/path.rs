use crate::{
    geopoint::GeoPoint,
    graph::{FetchMode, Graph},
    types::{EdgeId, NodeId},
    weighting::{Milliseconds, Weight, Weighting},
};

/// Route as a sequence of edges of the searched graph
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub weight: Weight,
    /// Meters
    pub distance: f64,
    pub time: Milliseconds,
}

impl Path {
    /// Path starting at `start` and following `hops`, each hop being an edge
    /// and the node it leads to
    pub fn from_hops<G: Graph, W: Weighting>(
        graph: &G,
        weighting: &W,
        start: NodeId,
        hops: &[(EdgeId, NodeId)],
    ) -> Path {
        let mut path = Path {
            nodes: Vec::with_capacity(hops.len() + 1),
            edges: Vec::with_capacity(hops.len()),
            ..Path::default()
        };
        path.nodes.push(start);

        for &(edge, adj) in hops {
            let state = graph.edge_state(edge, adj);
            path.weight += weighting.calc_edge_weight(&state, false);
            path.time = path
                .time
                .saturating_add(weighting.calc_edge_millis(&state, false));
            path.distance += state.distance;
            path.edges.push(edge);
            path.nodes.push(adj);
        }

        path
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn end(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Full geometry, tower and pillar points in travel order
    pub fn points<G: Graph>(&self, graph: &G) -> Vec<GeoPoint> {
        let Some(start) = self.start() else {
            return Vec::new();
        };

        let mut points = vec![graph.node_point(start)];
        for (index, &edge) in self.edges.iter().enumerate() {
            let state = graph.edge_state(edge, self.nodes[index + 1]);
            points.extend(graph.fetch_way_geometry(&state, FetchMode::PillarAndAdj));
        }
        points
    }
}
