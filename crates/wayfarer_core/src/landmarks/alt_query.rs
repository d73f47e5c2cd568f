use tracing::trace;

use crate::{
    edge_direction::SearchDirection,
    error::{PreparationError, RoutingError},
    graph::Graph,
    routing::{AStar, Path, SearchLimits},
    types::NodeId,
    weighting::Weighting,
};

use super::{landmark_heuristic::LandmarkHeuristic, lm_storage::LandmarkStorage};

/// A* guided by landmarks.
///
/// The query weighting may differ from the one the landmarks were prepared
/// with, as long as it never makes an edge cheaper.
pub struct AltQuery<'a, G: Graph, W: Weighting> {
    graph: &'a G,
    weighting: &'a W,
    storage: &'a LandmarkStorage,
    active_landmarks: usize,
    direction: SearchDirection,
    limits: SearchLimits,
    visited_nodes: usize,
}

impl<'a, G: Graph, W: Weighting> AltQuery<'a, G, W> {
    pub fn new(
        graph: &'a G,
        weighting: &'a W,
        storage: &'a LandmarkStorage,
    ) -> Result<Self, PreparationError> {
        if graph.base_node_count() != storage.node_count() {
            return Err(PreparationError::InvalidConfig(format!(
                "landmarks were prepared for {} nodes, the graph has {}",
                storage.node_count(),
                graph.base_node_count()
            )));
        }

        Ok(Self {
            graph,
            weighting,
            storage,
            active_landmarks: storage.active_landmarks(),
            direction: SearchDirection::Forward,
            limits: SearchLimits::none(),
            visited_nodes: 0,
        })
    }

    pub fn with_active_landmarks(mut self, active_landmarks: usize) -> Self {
        self.active_landmarks = active_landmarks;
        self
    }

    pub fn with_direction(mut self, direction: SearchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    pub fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, RoutingError> {
        self.visited_nodes = 0;
        for node in [from, to] {
            if node >= self.graph.node_count() {
                return Err(RoutingError::InvalidNode(node));
            }
        }

        let heuristic = LandmarkHeuristic::new(
            self.graph,
            self.weighting,
            self.storage,
            from,
            to,
            self.direction,
            self.active_landmarks,
        );
        if heuristic.is_disconnected() {
            return Err(RoutingError::Disconnected { from, to });
        }

        trace!(
            from,
            to,
            active = ?heuristic.active_landmarks(),
            "Starting landmark search"
        );

        let mut astar = AStar::with_heuristic(self.graph, self.weighting, &heuristic)
            .with_direction(self.direction)
            .with_limits(self.limits.clone());
        let result = astar.calc_path(from, to);
        self.visited_nodes = astar.visited_nodes();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, atomic::AtomicBool};

    use crate::{
        landmarks::{LMConfig, LMPreparation},
        routing::Dijkstra,
        test_graph_utils::{
            RomaniaGraphCity, car_weighting, create_romania_graph, random_graph, romania_weighting,
        },
    };

    use super::*;

    #[test]
    fn test_romania() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let config = LMConfig {
            landmarks: 4,
            active_landmarks: 2,
            minimum_nodes: 5,
            ..LMConfig::default()
        };
        let storage = LMPreparation::new(&graph, &weighting, "car", config)
            .unwrap()
            .prepare()
            .unwrap();

        let mut query = AltQuery::new(&graph, &weighting, &storage).unwrap();
        let path = query
            .calc_path(RomaniaGraphCity::Oradea.into(), RomaniaGraphCity::Bucharest.into())
            .unwrap();
        assert_eq!(path.weight, 429_000.0);
        assert_eq!(path.nodes, vec![13, 16, 15, 14, 2]);
        assert!(query.visited_nodes() > 0);
    }

    #[test]
    fn test_disconnected_fails_before_search() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let config = LMConfig {
            landmarks: 2,
            active_landmarks: 2,
            minimum_nodes: 5,
            ..LMConfig::default()
        };
        let storage = LMPreparation::new(&graph, &weighting, "car", config)
            .unwrap()
            .prepare()
            .unwrap();

        let mut query = AltQuery::new(&graph, &weighting, &storage).unwrap();
        assert_eq!(
            query.calc_path(0, 2),
            Err(RoutingError::Disconnected { from: 0, to: 2 })
        );
        assert_eq!(query.visited_nodes(), 0);
        assert_eq!(query.calc_path(1, 99), Err(RoutingError::InvalidNode(99)));
    }

    #[test]
    fn test_matches_dijkstra_and_settles_less() {
        let graph = random_graph(400, 300, 21);
        let weighting = car_weighting(&graph);
        let config = LMConfig {
            landmarks: 8,
            active_landmarks: 4,
            minimum_nodes: 50,
            ..LMConfig::default()
        };
        let storage = LMPreparation::new(&graph, &weighting, "car", config)
            .unwrap()
            .prepare()
            .unwrap();

        let mut alt_visited = 0;
        let mut dijkstra_visited = 0;
        for (from, to) in [(0, 399), (12, 300), (250, 7), (333, 111), (42, 43), (5, 5)] {
            let mut dijkstra = Dijkstra::dijkstra(&graph, &weighting);
            let expected = dijkstra.calc_path(from, to).unwrap();
            dijkstra_visited += dijkstra.visited_nodes();

            for direction in [SearchDirection::Forward, SearchDirection::Backward] {
                let mut query = AltQuery::new(&graph, &weighting, &storage)
                    .unwrap()
                    .with_direction(direction);
                let path = query.calc_path(from, to).unwrap();
                assert!((path.weight - expected.weight).abs() < 1e-6);
                assert_eq!(path.start(), Some(from));
                assert_eq!(path.end(), Some(to));
                if direction == SearchDirection::Forward {
                    alt_visited += query.visited_nodes();
                }
            }
        }
        assert!(alt_visited <= dijkstra_visited);
    }

    #[test]
    fn test_no_landmarks_is_dijkstra() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        // Too few nodes everywhere, the heuristic stays zero
        let storage = LMPreparation::new(&graph, &weighting, "car", LMConfig::default())
            .unwrap()
            .prepare()
            .unwrap();
        assert_eq!(storage.prepared_subnetworks(), 0);

        let mut query = AltQuery::new(&graph, &weighting, &storage).unwrap();
        let path = query.calc_path(13, 2).unwrap();
        let mut dijkstra = Dijkstra::dijkstra(&graph, &weighting);
        dijkstra.calc_path(13, 2).unwrap();

        assert_eq!(path.weight, 429_000.0);
        assert_eq!(query.visited_nodes(), dijkstra.visited_nodes());
    }

    #[test]
    fn test_cancelled() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let storage = LMPreparation::new(&graph, &weighting, "car", LMConfig::default())
            .unwrap()
            .prepare()
            .unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let mut query = AltQuery::new(&graph, &weighting, &storage)
            .unwrap()
            .with_limits(SearchLimits::none().with_cancel_flag(cancel));
        assert_eq!(query.calc_path(13, 2), Err(RoutingError::Cancelled));
    }
}
