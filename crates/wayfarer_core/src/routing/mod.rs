mod astar;
mod dijkstra_one_to_all;
mod path;
mod search_limits;
mod shortest_path_tree;

pub use astar::{AStar, Dijkstra, Heuristic, ZeroHeuristic};
pub use dijkstra_one_to_all::DijkstraOneToAll;
pub use path::Path;
pub use search_limits::SearchLimits;
pub use shortest_path_tree::{ShortestPathTree, SptEntry};

pub(crate) use shortest_path_tree::HeapItem;
