use crate::{
    constants::{DISTANCE_INFLUENCE, MAX_DURATION, MAX_WEIGHT},
    graph::EdgeState,
};

use super::{Milliseconds, Weight, Weighting, travel_millis};

/// Evaluated rules of a custom profile. Rule parsing happens elsewhere, the
/// routing core only needs the resulting priority and speed per edge.
pub trait CustomModel: Send + Sync {
    /// Factor in `[0, 1]`, 0 forbids the edge
    fn priority(&self, edge: &EdgeState, reverse: bool) -> f64;

    /// km/h, 0 forbids the edge
    fn speed(&self, edge: &EdgeState, reverse: bool) -> f64;

    /// Seconds per kilometer added to the weight
    fn distance_influence(&self) -> f64 {
        DISTANCE_INFLUENCE
    }
}

pub struct CustomWeighting<M: CustomModel> {
    name: String,
    model: M,
}

impl<M: CustomModel> CustomWeighting<M> {
    pub fn new(name: &str, model: M) -> Self {
        Self {
            name: name.to_string(),
            model,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: CustomModel> Weighting for CustomWeighting<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        let priority = self.model.priority(edge, reverse);
        let speed = self.model.speed(edge, reverse);
        if !(priority > 0.0) || !(speed > 0.0) {
            return MAX_WEIGHT;
        }

        let seconds = edge.distance / (speed / 3.6);
        seconds / priority + edge.distance * self.model.distance_influence() / 1000.0
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        travel_millis(edge.distance, self.model.speed(edge, reverse)).unwrap_or(MAX_DURATION)
    }
}
