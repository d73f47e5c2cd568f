use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, warn};

use crate::{
    edge_direction::SearchDirection,
    error::PreparationError,
    graph::{BaseGraph, Graph},
    routing::DijkstraOneToAll,
    stopwatch::Stopwatch,
    types::NodeId,
    weighting::{Weight, Weighting},
};

use super::{
    lm_config::LMConfig,
    lm_storage::{LM_CLAMPED, LandmarkStorage, encode_weight},
    subnetworks::Subnetworks,
    suggestions::LandmarkSuggestion,
};

/// Fixed point distances of every node reached from one landmark
struct LandmarkColumn {
    from: Vec<(NodeId, u16)>,
    to: Vec<(NodeId, u16)>,
}

/// Selects the landmarks of every large enough subnetwork and computes the
/// distances of all nodes from and to them
pub struct LMPreparation<'a, W: Weighting> {
    graph: &'a BaseGraph,
    weighting: &'a W,
    profile: String,
    config: LMConfig,
    suggestions: Vec<LandmarkSuggestion>,
}

impl<'a, W: Weighting> LMPreparation<'a, W> {
    pub fn new(
        graph: &'a BaseGraph,
        weighting: &'a W,
        profile: &str,
        config: LMConfig,
    ) -> Result<Self, PreparationError> {
        config.validate()?;

        if !graph.is_frozen() {
            return Err(PreparationError::NotFrozen);
        }

        if graph.node_count() == 0 {
            return Err(PreparationError::EmptyGraph);
        }

        Ok(Self {
            graph,
            weighting,
            profile: profile.to_string(),
            config,
            suggestions: Vec::new(),
        })
    }

    pub fn with_suggestions(mut self, suggestions: Vec<LandmarkSuggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn prepare(&self) -> Result<LandmarkStorage, PreparationError> {
        let stopwatch = Stopwatch::new("lm/prepare");
        let subnetworks = Subnetworks::find(self.graph, self.weighting);

        info!(
            profile = %self.profile,
            subnetworks = subnetworks.len(),
            "Found subnetworks in {:?}",
            stopwatch.elapsed()
        );

        let mut search = DijkstraOneToAll::new(self.graph, self.weighting, SearchDirection::Forward);
        let mut max_weight: Weight = 0.0;
        let mut selected: Vec<(u32, Vec<NodeId>)> = Vec::new();

        for subnetwork in 0..subnetworks.len() as u32 {
            let size = subnetworks.size(subnetwork);
            if size < self.config.minimum_nodes {
                continue;
            }

            let start = subnetworks.first_node(subnetwork);
            let landmarks = match self.suggestion_for(start) {
                Some(suggestion) => {
                    let landmarks = self.suggested_landmarks(suggestion, &subnetworks, subnetwork)?;
                    search.run(&landmarks[..1]);
                    max_weight = max_weight.max(max_reached_weight(&search));
                    landmarks
                }
                None => self.select_landmarks(start, &mut search, &mut max_weight),
            };

            if self.config.log_details {
                info!(
                    profile = %self.profile,
                    subnetwork,
                    nodes = size,
                    ?landmarks,
                    "Selected landmarks"
                );
            }
            selected.push((subnetwork, landmarks));
        }

        if selected.is_empty() {
            warn!(
                profile = %self.profile,
                minimum_nodes = self.config.minimum_nodes,
                "No subnetwork is large enough for landmarks"
            );
        }

        let factor = match self.config.maximum_weight {
            Some(maximum_weight) => maximum_weight / LM_CLAMPED as f64,
            None => estimate_factor(max_weight),
        };

        let mut storage = LandmarkStorage::create(
            self.graph.directory(),
            &self.profile,
            self.weighting.name(),
            factor,
            self.config.landmarks,
            self.config.active_landmarks,
            subnetworks.ids(),
        )?;

        for (subnetwork, landmarks) in &selected {
            storage.set_landmarks(*subnetwork, landmarks);

            let columns: Vec<LandmarkColumn> = landmarks
                .par_iter()
                .map(|&landmark| self.compute_column(landmark, factor))
                .collect();

            for (slot, column) in columns.iter().enumerate() {
                for &(node, value) in &column.from {
                    storage.set_from_weight(node, slot, value);
                }
                for &(node, value) in &column.to {
                    storage.set_to_weight(node, slot, value);
                }
            }
        }

        info!(
            profile = %self.profile,
            prepared_subnetworks = selected.len(),
            factor,
            "Finished landmark preparation in {:?}",
            stopwatch.elapsed()
        );

        Ok(storage)
    }

    fn suggestion_for(&self, start: NodeId) -> Option<&LandmarkSuggestion> {
        let point = self.graph.node_point(start);
        self.suggestions
            .iter()
            .find(|suggestion| suggestion.bbox.contains(&point))
    }

    fn suggested_landmarks(
        &self,
        suggestion: &LandmarkSuggestion,
        subnetworks: &Subnetworks,
        subnetwork: u32,
    ) -> Result<Vec<NodeId>, PreparationError> {
        let nodes: Vec<NodeId> = suggestion
            .nodes
            .iter()
            .copied()
            .filter(|&node| node < self.graph.node_count() && subnetworks.id(node) == subnetwork)
            .collect();

        if nodes.len() < self.config.landmarks {
            return Err(PreparationError::TooFewSuggestions {
                suggestions: nodes.len(),
                landmarks: self.config.landmarks,
            });
        }

        Ok(nodes[..self.config.landmarks].to_vec())
    }

    /// Greedy farthest point selection, every landmark is the node farthest
    /// from the ones already chosen
    fn select_landmarks(
        &self,
        start: NodeId,
        search: &mut DijkstraOneToAll<'_, BaseGraph, W>,
        max_weight: &mut Weight,
    ) -> Vec<NodeId> {
        let count = self.config.landmarks;
        let mut landmarks = Vec::with_capacity(count);

        search.run(&[start]);
        *max_weight = max_weight.max(max_reached_weight(search));
        landmarks.push(search.last_settled().unwrap_or(start));

        while landmarks.len() < count {
            search.run(&landmarks);
            *max_weight = max_weight.max(max_reached_weight(search));

            let farthest = search
                .last_settled()
                .filter(|node| !landmarks.contains(node))
                .or_else(|| farthest_unselected(&*search, &landmarks));
            match farthest {
                Some(node) => landmarks.push(node),
                None => break,
            }
        }

        // Fewer reachable nodes than landmarks, the slots repeat the chosen ones
        let distinct = landmarks.len();
        while landmarks.len() < count {
            landmarks.push(landmarks[landmarks.len() % distinct]);
        }

        landmarks
    }

    fn compute_column(&self, landmark: NodeId, factor: f64) -> LandmarkColumn {
        let encode = |search: &DijkstraOneToAll<'_, BaseGraph, W>| -> Vec<(NodeId, u16)> {
            search
                .reached_nodes()
                .iter()
                .map(|&node| (node, encode_weight(search.weight(node), factor)))
                .collect()
        };

        let mut forward = DijkstraOneToAll::new(self.graph, self.weighting, SearchDirection::Forward);
        forward.run(&[landmark]);
        let from = encode(&forward);

        let mut backward =
            DijkstraOneToAll::new(self.graph, self.weighting, SearchDirection::Backward);
        backward.run(&[landmark]);
        let to = encode(&backward);

        LandmarkColumn { from, to }
    }
}

fn max_reached_weight<G: Graph, W: Weighting>(search: &DijkstraOneToAll<'_, G, W>) -> Weight {
    search
        .reached_nodes()
        .iter()
        .map(|&node| search.weight(node))
        .filter(|weight| weight.is_finite())
        .fold(0.0, Weight::max)
}

fn farthest_unselected<G: Graph, W: Weighting>(
    search: &DijkstraOneToAll<'_, G, W>,
    landmarks: &[NodeId],
) -> Option<NodeId> {
    search
        .reached_nodes()
        .iter()
        .copied()
        .filter(|node| !landmarks.contains(node))
        .max_by(|&a, &b| search.weight(a).total_cmp(&search.weight(b)))
}

/// Weight of one fixed point unit so that twice the largest distance seen
/// still fits
fn estimate_factor(max_weight: Weight) -> f64 {
    let factor = 2.0 * max_weight / LM_CLAMPED as f64;
    if factor > 0.0 { factor } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use crate::{
        geopoint::BBox,
        landmarks::lm_storage::{LM_INFINITY, is_exact},
        test_graph_utils::{
            RomaniaGraphCity, car_encoding, car_weighting, create_romania_graph, random_graph,
            romania_weighting,
        },
    };

    use super::*;

    fn romania_config(landmarks: usize) -> LMConfig {
        LMConfig {
            landmarks,
            active_landmarks: landmarks.min(2),
            minimum_nodes: 5,
            ..LMConfig::default()
        }
    }

    #[test]
    fn test_greedy_selection() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let preparation = LMPreparation::new(&graph, &weighting, "car", romania_config(2)).unwrap();
        let storage = preparation.prepare().unwrap();

        // Arad is the start node, Neamt is the farthest from it and Timisoara
        // the farthest from Neamt
        let subnetwork = storage.subnetwork(RomaniaGraphCity::Arad.into());
        assert_eq!(
            storage.landmarks(subnetwork),
            vec![RomaniaGraphCity::Neamt as NodeId, RomaniaGraphCity::Timisoara as NodeId]
        );
        assert_eq!(storage.factor(), 2.0 * 942_000.0 / LM_CLAMPED as f64);

        // The isolated node 0 is too small
        assert!(storage.landmarks(storage.subnetwork(0)).is_empty());
        assert_eq!(storage.from_weight(0, 0), LM_INFINITY);
        assert_eq!(storage.prepared_subnetworks(), 1);
    }

    #[test]
    fn test_columns_bound_exact_distances() {
        let graph = random_graph(250, 200, 11);
        let weighting = car_weighting(&graph);
        let config = LMConfig {
            landmarks: 4,
            active_landmarks: 2,
            minimum_nodes: 10,
            ..LMConfig::default()
        };
        let storage = LMPreparation::new(&graph, &weighting, "car", config)
            .unwrap()
            .prepare()
            .unwrap();
        let factor = storage.factor();
        let landmarks = storage.landmarks(0);
        assert_eq!(landmarks.len(), 4);

        for (slot, &landmark) in landmarks.iter().enumerate() {
            let mut forward = DijkstraOneToAll::new(&graph, &weighting, SearchDirection::Forward);
            forward.run(&[landmark]);
            let mut backward = DijkstraOneToAll::new(&graph, &weighting, SearchDirection::Backward);
            backward.run(&[landmark]);

            assert_eq!(storage.from_weight(landmark, slot), 0);
            assert_eq!(storage.to_weight(landmark, slot), 0);
            for node in 0..graph.node_count() {
                check_fixed_point(storage.from_weight(node, slot), forward.weight(node), factor);
                check_fixed_point(storage.to_weight(node, slot), backward.weight(node), factor);
            }
        }
    }

    fn check_fixed_point(value: u16, exact: Weight, factor: f64) {
        assert!(exact.is_finite());
        if is_exact(value) {
            assert!(value as f64 * factor <= exact + 1e-6);
            assert!(exact < (value as f64 + 1.0) * factor + 1e-6);
        } else {
            assert_eq!(value, LM_CLAMPED);
            assert!(exact >= LM_CLAMPED as f64 * factor - 1e-6);
        }
    }

    #[test]
    fn test_clamped_with_small_maximum_weight() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let config = LMConfig {
            maximum_weight: Some(LM_CLAMPED as f64 * 10.0),
            ..romania_config(2)
        };
        let storage = LMPreparation::new(&graph, &weighting, "car", config)
            .unwrap()
            .prepare()
            .unwrap();

        assert_eq!(storage.factor(), 10.0);
        // Neamt is more than 655 km away from Dobreta
        assert_eq!(
            storage.from_weight(RomaniaGraphCity::Dobreta.into(), 0),
            LM_CLAMPED
        );
        assert_eq!(storage.from_weight(RomaniaGraphCity::Iasi.into(), 0), 8_700);
    }

    #[test]
    fn test_suggestions_replace_selection() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let suggestion = LandmarkSuggestion::new(
            vec![
                0,
                RomaniaGraphCity::Giurgiu.into(),
                RomaniaGraphCity::Zerind.into(),
                RomaniaGraphCity::Eforie.into(),
            ],
            graph.bbox(),
        );
        let storage = LMPreparation::new(&graph, &weighting, "car", romania_config(2))
            .unwrap()
            .with_suggestions(vec![suggestion])
            .prepare()
            .unwrap();

        // Node 0 is in another subnetwork
        let subnetwork = storage.subnetwork(RomaniaGraphCity::Arad.into());
        assert_eq!(
            storage.landmarks(subnetwork),
            vec![RomaniaGraphCity::Giurgiu as NodeId, RomaniaGraphCity::Zerind as NodeId]
        );
    }

    #[test]
    fn test_too_few_suggestions() {
        let graph = create_romania_graph();
        let weighting = romania_weighting(&graph);
        let suggestion = LandmarkSuggestion::new(
            vec![RomaniaGraphCity::Giurgiu.into()],
            BBox::new(40.0, 20.0, 50.0, 30.0),
        );
        let result = LMPreparation::new(&graph, &weighting, "car", romania_config(2))
            .unwrap()
            .with_suggestions(vec![suggestion])
            .prepare();

        assert!(matches!(
            result,
            Err(PreparationError::TooFewSuggestions {
                suggestions: 1,
                landmarks: 2
            })
        ));
    }

    #[test]
    fn test_unfrozen_graph() {
        let graph = BaseGraph::in_memory(car_encoding()).unwrap();
        let weighting = car_weighting(&graph);
        assert!(matches!(
            LMPreparation::new(&graph, &weighting, "car", LMConfig::default()),
            Err(PreparationError::NotFrozen)
        ));
    }
}
