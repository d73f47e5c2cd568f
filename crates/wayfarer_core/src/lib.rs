pub mod ch;
pub mod config;
pub mod constants;
pub mod edge_direction;
pub mod error;
pub mod ev;
pub mod geopoint;
pub mod graph;
pub mod landmarks;
pub mod location_index;
pub mod routing;
pub mod stopwatch;
pub mod storage;
pub mod types;
pub mod weighting;

#[cfg(test)]
mod test_graph_utils;
