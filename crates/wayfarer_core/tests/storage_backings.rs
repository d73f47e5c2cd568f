mod common;

use common::{assert_same_weight, car_weighting, encoding, road_network};
use wayfarer_core::{
    ch::{CHConfig, CHPreparation, CHQuery, CHStorage, RoutingCHGraph},
    graph::{BaseGraph, Graph},
    landmarks::{AltQuery, LMConfig, LMPreparation, LandmarkStorage},
    routing::Dijkstra,
    storage::{DataAccessKind, GraphDirectory, StorageConfig},
};

const NODES: usize = 250;
const PAIRS: [(usize, usize); 5] = [(0, 249), (17, 203), (140, 3), (88, 89), (66, 66)];

fn lm_config() -> LMConfig {
    LMConfig {
        landmarks: 6,
        active_landmarks: 3,
        minimum_nodes: 50,
        ..LMConfig::default()
    }
}

/// Weights of `PAIRS` on the in-memory reference graph
fn reference_weights() -> Vec<f64> {
    let graph = road_network(GraphDirectory::in_memory(), NODES, 200, 77);
    let weighting = car_weighting(&graph);
    let mut dijkstra = Dijkstra::dijkstra(&graph, &weighting);
    PAIRS
        .iter()
        .map(|&(from, to)| dijkstra.calc_path(from, to).unwrap().weight)
        .collect()
}

fn prepare_and_close(directory: GraphDirectory) {
    let mut graph = road_network(directory, NODES, 200, 77);
    let weighting = car_weighting(&graph);

    let mut ch = CHPreparation::new(&graph, &weighting, "car", CHConfig::default())
        .unwrap()
        .prepare()
        .unwrap();
    ch.flush().unwrap();
    ch.close().unwrap();

    let mut landmarks = LMPreparation::new(&graph, &weighting, "car", lm_config())
        .unwrap()
        .prepare()
        .unwrap();
    landmarks.flush().unwrap();
    landmarks.close().unwrap();

    graph.flush().unwrap();
    graph.close().unwrap();
}

fn check_reloaded(directory: GraphDirectory, expected: &[f64]) {
    let graph = BaseGraph::load(directory.clone(), encoding()).unwrap();
    assert_eq!(graph.node_count(), NODES);
    assert!(graph.is_frozen());

    let weighting = car_weighting(&graph);
    let ch = CHStorage::load(&directory, "car").unwrap();
    let landmarks = LandmarkStorage::load(&directory, "car").unwrap();
    assert_eq!(landmarks.landmark_count(), 6);
    assert_eq!(landmarks.node_count(), NODES);

    let ch_graph = RoutingCHGraph::new(&graph, &ch, &weighting).unwrap();
    let mut ch_query = CHQuery::new(&ch_graph);
    let mut alt_query = AltQuery::new(&graph, &weighting, &landmarks).unwrap();

    for (&(from, to), &weight) in PAIRS.iter().zip(expected) {
        assert_same_weight(ch_query.calc_path(from, to).unwrap().weight, weight);
        assert_same_weight(alt_query.calc_path(from, to).unwrap().weight, weight);
    }
}

fn check_kind(kind: DataAccessKind) {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        kind,
        segment_size: 1 << 12,
        ..StorageConfig::default()
    };
    let directory = GraphDirectory::new(dir.path(), config);

    prepare_and_close(directory.clone());
    check_reloaded(directory, &reference_weights());
}

#[test]
fn ram_store_round_trips_graph_and_preparations() {
    check_kind(DataAccessKind::RamStore);
}

#[test]
fn mmap_round_trips_graph_and_preparations() {
    check_kind(DataAccessKind::Mmap);
}

#[test]
fn mixed_kinds_per_data_access() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StorageConfig::default();
    config
        .kinds
        .insert(String::from("landmarks_car"), DataAccessKind::Mmap);
    let directory = GraphDirectory::new(dir.path(), config);

    prepare_and_close(directory.clone());
    check_reloaded(directory, &reference_weights());
}

#[test]
fn loading_missing_preparation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let directory = GraphDirectory::new(dir.path(), StorageConfig::default());
    let mut graph = road_network(directory.clone(), 20, 10, 1);
    graph.flush().unwrap();

    assert!(CHStorage::load(&directory, "car").is_err());
    assert!(LandmarkStorage::load(&directory, "car").is_err());
}
