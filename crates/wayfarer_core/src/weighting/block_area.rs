use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{MAX_DURATION, MAX_WEIGHT},
    geopoint::{BBox, GeoPoint},
    graph::EdgeState,
    location_index::LocationIndex,
    types::EdgeId,
};

use super::{Milliseconds, Weight, Weighting};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockShape {
    /// Radius in meters
    Circle { center: GeoPoint, radius: f64 },
    Rect(BBox),
}

/// Set of base graph edges that must not be traveled
#[derive(Clone, Debug, Default)]
pub struct BlockArea {
    edges: FxHashSet<EdgeId>,
}

impl BlockArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shapes(index: &LocationIndex, shapes: &[BlockShape]) -> Self {
        let mut area = Self::new();
        for shape in shapes {
            area.add_shape(index, shape);
        }
        area
    }

    pub fn add_shape(&mut self, index: &LocationIndex, shape: &BlockShape) {
        let edges = match shape {
            BlockShape::Circle { center, radius } => index.edges_in_circle(center, *radius),
            BlockShape::Rect(bbox) => index.edges_in_bbox(bbox),
        };
        self.edges.extend(edges);
    }

    pub fn add_edge(&mut self, edge: EdgeId) {
        self.edges.insert(edge);
    }

    pub fn contains(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Forbids the edges of a [`BlockArea`], virtual edges through the edge they split
pub struct BlockAreaWeighting<W: Weighting> {
    inner: W,
    area: BlockArea,
}

impl<W: Weighting> BlockAreaWeighting<W> {
    pub fn new(inner: W, area: BlockArea) -> Self {
        Self { inner, area }
    }

    pub fn area(&self) -> &BlockArea {
        &self.area
    }
}

impl<W: Weighting> Weighting for BlockAreaWeighting<W> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn calc_edge_weight(&self, edge: &EdgeState, reverse: bool) -> Weight {
        if self.area.contains(edge.original_edge) {
            return MAX_WEIGHT;
        }
        self.inner.calc_edge_weight(edge, reverse)
    }

    fn calc_edge_millis(&self, edge: &EdgeState, reverse: bool) -> Milliseconds {
        if self.area.contains(edge.original_edge) {
            return MAX_DURATION;
        }
        self.inner.calc_edge_millis(edge, reverse)
    }
}
