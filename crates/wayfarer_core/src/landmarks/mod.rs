mod alt_query;
mod landmark_heuristic;
mod lm_config;
mod lm_preparation;
mod lm_storage;
mod subnetworks;
mod suggestions;

pub use alt_query::AltQuery;
pub use landmark_heuristic::LandmarkHeuristic;
pub use lm_config::LMConfig;
pub use lm_preparation::LMPreparation;
pub use lm_storage::{LM_CLAMPED, LM_INFINITY, LandmarkStorage};
pub use suggestions::{LandmarkSuggestion, NodeLocator, SUGGESTION_MAX_DISTANCE};
