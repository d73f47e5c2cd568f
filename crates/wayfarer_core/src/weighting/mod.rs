mod block_area;
mod custom;
mod fastest;
mod shortest;

pub use block_area::{BlockArea, BlockAreaWeighting, BlockShape};
pub use custom::{CustomModel, CustomWeighting};
pub use fastest::FastestWeighting;
pub use shortest::ShortestWeighting;

use crate::{constants::MAX_WEIGHT, graph::EdgeState};

pub type Weight = f64;
pub type Milliseconds = u64;

/// Cost model of a profile.
///
/// `reverse == false` evaluates traveling the edge from `edge.base` to
/// `edge.adj`. A weight of [`MAX_WEIGHT`] (infinity) forbids the direction.
pub trait Weighting: Send + Sync {
    fn name(&self) -> &str;

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight;

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds;

    fn can_access_edge(&self, edge: &EdgeState) -> bool {
        self.calc_edge_weight(edge, false) != MAX_WEIGHT
            || self.calc_edge_weight(edge, true) != MAX_WEIGHT
    }
}

impl<W: Weighting + ?Sized> Weighting for &W {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        (**self).calc_edge_weight(edge, reverse)
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        (**self).calc_edge_millis(edge, reverse)
    }
}

impl<W: Weighting + ?Sized> Weighting for Box<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        (**self).calc_edge_weight(edge, reverse)
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        (**self).calc_edge_millis(edge, reverse)
    }
}

/// Travel time in milliseconds, `None` when the speed is not positive
pub(crate) fn travel_millis(distance: f64, speed_kmh: f64) -> Option<Milliseconds> {
    if !(speed_kmh > 0.0) {
        return None;
    }
    let speed_meters_per_second = speed_kmh / 3.6;
    Some((distance / speed_meters_per_second * 1000.0).round() as Milliseconds)
}
