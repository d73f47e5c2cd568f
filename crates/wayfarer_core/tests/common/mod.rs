#![allow(dead_code)]

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};
use wayfarer_core::{
    ev::EncodingManager,
    graph::{BaseGraph, Graph},
    storage::GraphDirectory,
    types::{EdgeId, NodeId},
    weighting::FastestWeighting,
};

pub fn encoding() -> Arc<EncodingManager> {
    Arc::new(EncodingManager::builder().add_defaults().build().unwrap())
}

pub fn set_car_speed(graph: &mut BaseGraph, edge: EdgeId, forward_speed: f64, backward_speed: f64) {
    let encoding = graph.encoding().clone();
    let access = encoding.access_enc("car").unwrap();
    let speed = encoding.average_speed_enc("car").unwrap();

    let mut flags = encoding.create_edge_flags();
    access.set_bool(false, &mut flags, forward_speed > 0.0);
    access.set_bool(true, &mut flags, backward_speed > 0.0);
    speed.set_decimal(false, &mut flags, forward_speed).unwrap();
    speed.set_decimal(true, &mut flags, backward_speed).unwrap();
    graph.set_flags(edge, &flags).unwrap();
}

pub fn car_weighting(graph: &BaseGraph) -> FastestWeighting {
    FastestWeighting::for_vehicle(graph.encoding(), "car").unwrap()
}

/// Road network of `nodes` nodes around (0, 0). A two-way spanning tree keeps
/// every node reachable, extra roads may be one-way.
pub fn road_network(directory: GraphDirectory, nodes: usize, extra_roads: usize, seed: u64) -> BaseGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = BaseGraph::create(directory, encoding(), false, 1 << 12).unwrap();

    for node in 0..nodes {
        let lat = rng.random_range(-0.05..0.05);
        let lng = rng.random_range(-0.05..0.05);
        graph.set_node(node, lat, lng, None).unwrap();
    }

    for node in 1..nodes {
        let parent = rng.random_range(0..node);
        let straight = straight_distance(&graph, parent, node);
        let edge = graph.add_edge(parent, node, straight + 1.0).unwrap();
        set_car_speed(&mut graph, edge, 50.0, 50.0);
    }

    for _ in 0..extra_roads {
        let from = rng.random_range(0..nodes);
        let to = rng.random_range(0..nodes);
        if from == to {
            continue;
        }

        let distance = straight_distance(&graph, from, to) * rng.random_range(1.0..1.4) + 1.0;
        let edge = graph.add_edge(from, to, distance).unwrap();
        let forward_speed = 5.0 * rng.random_range(2..=24) as f64;
        let backward_speed = if rng.random_bool(0.15) {
            0.0
        } else {
            5.0 * rng.random_range(2..=24) as f64
        };
        set_car_speed(&mut graph, edge, forward_speed, backward_speed);
    }

    graph.freeze();
    graph
}

/// Grid of `rows` x `cols` nodes, `spacing` degrees apart
pub fn grid(rows: usize, cols: usize, spacing: f64) -> BaseGraph {
    let mut graph = BaseGraph::in_memory(encoding()).unwrap();
    for row in 0..rows {
        for col in 0..cols {
            graph
                .set_node(row * cols + col, row as f64 * spacing, col as f64 * spacing, None)
                .unwrap();
        }
    }

    let connect = |graph: &mut BaseGraph, from: NodeId, to: NodeId| {
        let distance = straight_distance(graph, from, to);
        let edge = graph.add_edge(from, to, distance).unwrap();
        set_car_speed(graph, edge, 50.0, 50.0);
    };
    for row in 0..rows {
        for col in 0..cols - 1 {
            connect(&mut graph, row * cols + col, row * cols + col + 1);
        }
    }
    for row in 0..rows - 1 {
        for col in 0..cols {
            connect(&mut graph, row * cols + col, (row + 1) * cols + col);
        }
    }

    graph.freeze();
    graph
}

fn straight_distance(graph: &BaseGraph, from: NodeId, to: NodeId) -> f64 {
    graph.node_point(from).haversine_distance(&graph.node_point(to))
}

pub fn assert_same_weight(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6 * expected.max(1.0),
        "{} != {}",
        actual,
        expected
    );
}
