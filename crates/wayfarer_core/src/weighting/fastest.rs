use crate::{
    constants::{DISTANCE_INFLUENCE, MAX_DURATION, MAX_WEIGHT},
    error::EncodingError,
    ev::{BooleanEncodedValue, DecimalEncodedValue, EncodingManager},
    graph::EdgeState,
};

use super::{Milliseconds, Weight, Weighting, travel_millis};

/// Travel time in seconds plus a small cost per kilometer
pub struct FastestWeighting {
    name: String,
    access_enc: BooleanEncodedValue,
    speed_enc: DecimalEncodedValue,
}

impl FastestWeighting {
    pub fn new(access_enc: BooleanEncodedValue, speed_enc: DecimalEncodedValue) -> Self {
        Self {
            name: String::from("fastest"),
            access_enc,
            speed_enc,
        }
    }

    pub fn for_vehicle(encoding: &EncodingManager, vehicle: &str) -> Result<Self, EncodingError> {
        Ok(Self::new(
            encoding.access_enc(vehicle)?,
            encoding.average_speed_enc(vehicle)?,
        ))
    }

    fn speed(&self, edge: &EdgeState, reverse: bool) -> f64 {
        if !edge.get_bool(&self.access_enc, reverse) {
            return 0.0;
        }
        edge.get_decimal(&self.speed_enc, reverse)
    }
}

impl Weighting for FastestWeighting {
    fn name(&self) -> &str {
        &self.name
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        let speed = self.speed(edge, reverse);
        if speed <= 0.0 {
            return MAX_WEIGHT;
        }

        let seconds = edge.distance / (speed / 3.6);
        seconds + edge.distance * DISTANCE_INFLUENCE / 1000.0
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        travel_millis(edge.distance, self.speed(edge, reverse)).unwrap_or(MAX_DURATION)
    }
}
