use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    ev::EncodingManager,
    graph::{BaseGraph, Graph},
    storage::GraphDirectory,
    types::{EdgeId, NodeId},
    weighting::{FastestWeighting, ShortestWeighting},
};

pub enum RomaniaGraphCity {
    Arad = 1,
    Bucharest = 2,
    Craiova = 3,
    Dobreta = 4,
    Eforie = 5,
    Fagaras = 6,
    Giurgiu = 7,
    Hirsova = 8,
    Iasi = 9,
    Lugoj = 10,
    Mehadia = 11,
    Neamt = 12,
    Oradea = 13,
    Pitesti = 14,
    RimnicuVilcea = 15,
    Sibiu = 16,
    Timisoara = 17,
    Urziceni = 18,
    Vaslui = 19,
    Zerind = 20,
}

impl From<RomaniaGraphCity> for usize {
    fn from(value: RomaniaGraphCity) -> Self {
        value as usize
    }
}

pub fn car_encoding() -> Arc<EncodingManager> {
    Arc::new(
        EncodingManager::builder()
            .add_defaults()
            .build()
            .expect("default encoding is valid"),
    )
}

/// Sets car access and speed, a speed of 0 closes that direction
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

/// Weight equals the distance in meters
pub fn romania_weighting(graph: &BaseGraph) -> ShortestWeighting {
    ShortestWeighting::for_vehicle(graph.encoding(), "car").unwrap()
}

fn romania_cities() -> Vec<(RomaniaGraphCity, f64, f64)> {
    vec![
        (RomaniaGraphCity::Arad, 46.1866, 21.3123),
        (RomaniaGraphCity::Bucharest, 44.4268, 26.1025),
        (RomaniaGraphCity::Craiova, 44.3302, 23.7949),
        (RomaniaGraphCity::Dobreta, 44.6369, 22.6597),
        (RomaniaGraphCity::Eforie, 44.0491, 28.6527),
        (RomaniaGraphCity::Fagaras, 45.8416, 24.9731),
        (RomaniaGraphCity::Giurgiu, 43.9037, 25.9699),
        (RomaniaGraphCity::Hirsova, 44.6893, 27.9457),
        (RomaniaGraphCity::Iasi, 47.1585, 27.6014),
        (RomaniaGraphCity::Lugoj, 45.6910, 21.9035),
        (RomaniaGraphCity::Mehadia, 44.9041, 22.3645),
        (RomaniaGraphCity::Neamt, 46.9275, 26.3708),
        (RomaniaGraphCity::Oradea, 47.0465, 21.9189),
        (RomaniaGraphCity::Pitesti, 44.8565, 24.8692),
        (RomaniaGraphCity::RimnicuVilcea, 45.0997, 24.3693),
        (RomaniaGraphCity::Sibiu, 45.7983, 24.1256),
        (RomaniaGraphCity::Timisoara, 45.7489, 21.2087),
        (RomaniaGraphCity::Urziceni, 44.7181, 26.6453),
        (RomaniaGraphCity::Vaslui, 46.6407, 27.7276),
        (RomaniaGraphCity::Zerind, 46.6225, 21.5174),
    ]
}

// https://user-images.githubusercontent.com/43790152/97784960-1a142580-1bc4-11eb-9070-39c03eb16df2.png
fn romania_roads() -> Vec<(RomaniaGraphCity, RomaniaGraphCity, f64)> {
    vec![
        (RomaniaGraphCity::Oradea, RomaniaGraphCity::Zerind, 71.0),
        (RomaniaGraphCity::Oradea, RomaniaGraphCity::Sibiu, 151.0),
        (RomaniaGraphCity::Zerind, RomaniaGraphCity::Arad, 75.0),
        (RomaniaGraphCity::Arad, RomaniaGraphCity::Sibiu, 140.0),
        (RomaniaGraphCity::Arad, RomaniaGraphCity::Timisoara, 118.0),
        (RomaniaGraphCity::Timisoara, RomaniaGraphCity::Lugoj, 111.0),
        (RomaniaGraphCity::Lugoj, RomaniaGraphCity::Mehadia, 70.0),
        (RomaniaGraphCity::Mehadia, RomaniaGraphCity::Dobreta, 75.0),
        (RomaniaGraphCity::Dobreta, RomaniaGraphCity::Craiova, 120.0),
        (RomaniaGraphCity::Craiova, RomaniaGraphCity::RimnicuVilcea, 146.0),
        (RomaniaGraphCity::Craiova, RomaniaGraphCity::Pitesti, 138.0),
        (RomaniaGraphCity::RimnicuVilcea, RomaniaGraphCity::Pitesti, 97.0),
        (RomaniaGraphCity::RimnicuVilcea, RomaniaGraphCity::Sibiu, 80.0),
        (RomaniaGraphCity::Sibiu, RomaniaGraphCity::Fagaras, 99.0),
        (RomaniaGraphCity::Fagaras, RomaniaGraphCity::Bucharest, 211.0),
        (RomaniaGraphCity::Pitesti, RomaniaGraphCity::Bucharest, 101.0),
        (RomaniaGraphCity::Bucharest, RomaniaGraphCity::Giurgiu, 90.0),
        (RomaniaGraphCity::Bucharest, RomaniaGraphCity::Urziceni, 85.0),
        (RomaniaGraphCity::Urziceni, RomaniaGraphCity::Hirsova, 98.0),
        (RomaniaGraphCity::Hirsova, RomaniaGraphCity::Eforie, 86.0),
        (RomaniaGraphCity::Urziceni, RomaniaGraphCity::Vaslui, 142.0),
        (RomaniaGraphCity::Vaslui, RomaniaGraphCity::Iasi, 92.0),
        (RomaniaGraphCity::Iasi, RomaniaGraphCity::Neamt, 87.0),
    ]
}

/// The romania road map, distances in kilometers from the map. Node 0 is
/// isolated.
pub fn create_romania_graph() -> BaseGraph {
    create_romania_graph_in(GraphDirectory::in_memory())
}

/// The romania road map stored in `directory`
pub fn create_romania_graph_in(directory: GraphDirectory) -> BaseGraph {
    let mut graph = BaseGraph::create(directory, car_encoding(), false, 1 << 10).unwrap();
    graph.set_node(0, 0.0, 0.0, None).unwrap();
    for (city, lat, lng) in romania_cities() {
        graph.set_node(city.into(), lat, lng, None).unwrap();
    }

    for (from, to, kilometers) in romania_roads() {
        let edge = graph
            .add_edge(from.into(), to.into(), kilometers * 1000.0)
            .unwrap();
        set_car_speed(&mut graph, edge, 100.0, 100.0);
    }

    graph.freeze();
    graph
}

/// `rows * cols` nodes `spacing` degrees apart, node `row * cols + col`.
/// Horizontal edges are added first, then vertical ones, all at 50 km/h.
pub fn grid_graph(rows: usize, cols: usize, spacing: f64) -> BaseGraph {
    let mut graph = BaseGraph::in_memory(car_encoding()).unwrap();
    for row in 0..rows {
        for col in 0..cols {
            graph
                .set_node(row * cols + col, row as f64 * spacing, col as f64 * spacing, None)
                .unwrap();
        }
    }

    let connect = |graph: &mut BaseGraph, from: NodeId, to: NodeId| {
        let distance = graph.node_point(from).haversine_distance(&graph.node_point(to));
        let edge = graph.add_edge(from, to, distance).unwrap();
        set_car_speed(graph, edge, 50.0, 50.0);
    };

    for row in 0..rows {
        for col in 1..cols {
            connect(&mut graph, row * cols + col - 1, row * cols + col);
        }
    }
    for row in 1..rows {
        for col in 0..cols {
            connect(&mut graph, (row - 1) * cols + col, row * cols + col);
        }
    }

    graph.freeze();
    graph
}

/// Connected random road network around (0, 0), with one-way streets and
/// different speeds per direction
pub fn random_graph(nodes: usize, extra_edges: usize, seed: u64) -> BaseGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = BaseGraph::in_memory(car_encoding()).unwrap();

    for node in 0..nodes {
        let lat = rng.random_range(-0.05..0.05);
        let lng = rng.random_range(-0.05..0.05);
        graph.set_node(node, lat, lng, None).unwrap();
    }

    let add_road = |graph: &mut BaseGraph, rng: &mut StdRng, from: NodeId, to: NodeId| {
        let straight = graph.node_point(from).haversine_distance(&graph.node_point(to));
        let distance = straight * rng.random_range(1.0..1.4) + 1.0;
        let edge = graph.add_edge(from, to, distance).unwrap();

        let forward_speed = 5.0 * rng.random_range(2..=24) as f64;
        let backward_speed = if rng.random_bool(0.15) {
            0.0
        } else {
            5.0 * rng.random_range(2..=24) as f64
        };
        set_car_speed(graph, edge, forward_speed, backward_speed);
    };

    // A two-way spanning tree keeps every node reachable
    for node in 1..nodes {
        let parent = rng.random_range(0..node);
        let straight = graph.node_point(parent).haversine_distance(&graph.node_point(node));
        let edge = graph.add_edge(parent, node, straight + 1.0).unwrap();
        set_car_speed(&mut graph, edge, 50.0, 50.0);
    }

    for _ in 0..extra_edges {
        let from = rng.random_range(0..nodes);
        let to = rng.random_range(0..nodes);
        if from != to {
            add_road(&mut graph, &mut rng, from, to);
        }
    }

    graph.freeze();
    graph
}
