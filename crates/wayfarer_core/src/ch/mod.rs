mod ch_config;
mod ch_query;
mod ch_storage;
mod node_contractor;
mod node_ordering;
mod preparation;
mod preparation_graph;
mod priority_queue;
mod routing_ch_graph;
mod witness_search;

pub use ch_config::CHConfig;
pub use ch_query::{CHEntry, CHMeeting, CHQuery};
pub use ch_storage::{CHShortcut, CHStorage, SHORTCUT_BACKWARD, SHORTCUT_FORWARD};
pub use preparation::CHPreparation;
pub use routing_ch_graph::{CHEdge, CHEdgeId, QueryRoutingCHGraph, RoutingCHGraph};
