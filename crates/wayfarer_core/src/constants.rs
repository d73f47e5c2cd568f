use crate::weighting::{Milliseconds, Weight};

pub const INVALID_NODE: usize = usize::MAX;
pub const INVALID_EDGE: usize = usize::MAX;

pub const MAX_WEIGHT: Weight = f64::INFINITY;
pub const MAX_DURATION: Milliseconds = u64::MAX;

/// Marker stored in the paged files for "no edge"
pub(crate) const NO_EDGE_REF: i32 = -1;

pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Seconds added to the weight per kilometer, favors shorter routes of equal duration
pub(crate) const DISTANCE_INFLUENCE: f64 = 70.0;
