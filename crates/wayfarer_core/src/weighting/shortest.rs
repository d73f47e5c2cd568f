use crate::{
    constants::{MAX_DURATION, MAX_WEIGHT},
    error::EncodingError,
    ev::{BooleanEncodedValue, DecimalEncodedValue, EncodingManager},
    graph::EdgeState,
};

use super::{Milliseconds, Weight, Weighting, travel_millis};

/// Distance in meters of accessible edges
pub struct ShortestWeighting {
    access_enc: BooleanEncodedValue,
    speed_enc: DecimalEncodedValue,
}

impl ShortestWeighting {
    pub fn new(access_enc: BooleanEncodedValue, speed_enc: DecimalEncodedValue) -> Self {
        Self {
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
}

impl Weighting for ShortestWeighting {
    fn name(&self) -> &str {
        "shortest"
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        if !edge.get_bool(&self.access_enc, reverse) {
            return MAX_WEIGHT;
        }
        edge.distance
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        if !edge.get_bool(&self.access_enc, reverse) {
            return MAX_DURATION;
        }
        travel_millis(edge.distance, edge.get_decimal(&self.speed_enc, reverse)).unwrap_or(MAX_DURATION)
    }
}
