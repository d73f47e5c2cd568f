use geo::Intersects;
use rstar::primitives::GeomWithData;
use rstar::{AABB, PointDistance, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};
use tracing::info;

use crate::{
    constants::EARTH_RADIUS_METERS,
    geopoint::{BBox, GeoPoint},
    graph::{FetchMode, Graph, Snap},
    landmarks::NodeLocator,
    stopwatch::Stopwatch,
    types::{EdgeId, NodeId},
    weighting::Weighting,
};

struct IndexedLine(geo::Line);

impl IndexedLine {
    fn new(start: &GeoPoint, end: &GeoPoint) -> Self {
        IndexedLine(geo::Line::new(
            geo::coord! { x: start.lng, y: start.lat },
            geo::coord! { x: end.lng, y: end.lat },
        ))
    }

    fn start(&self) -> GeoPoint {
        GeoPoint::new(self.0.start.y, self.0.start.x)
    }

    fn end(&self) -> GeoPoint {
        GeoPoint::new(self.0.end.y, self.0.end.x)
    }
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let line = &self.0;
        AABB::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y])
    }
}

impl PointDistance for IndexedLine {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (x, y) = (point[0], point[1]);
        let (start, end) = (self.0.start, self.0.end);
        let (dx, dy) = (end.x - start.x, end.y - start.y);
        let length_2 = dx * dx + dy * dy;
        let t = if length_2 > 0.0 {
            (((x - start.x) * dx + (y - start.y) * dy) / length_2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (px, py) = (start.x + t * dx - x, start.y + t * dy - y);
        px * px + py * py
    }
}

struct IndexedData {
    edge: EdgeId,
    /// Meters from the first point of the edge to the start of this segment
    offset: f64,
}

type LocationIndexObject = GeomWithData<IndexedLine, IndexedData>;

struct LocationIndexTreeParams;

impl RTreeParams for LocationIndexTreeParams {
    type DefaultInsertionStrategy = RStarInsertionStrategy;

    const MAX_SIZE: usize = 64;
    const MIN_SIZE: usize = 28;
    const REINSERTION_COUNT: usize = 5;
}

struct IndexedEdge {
    node_a: NodeId,
    node_b: NodeId,
    /// Length of the geometry in meters
    length: f64,
}

/// Query point matched to an edge
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocatedSnap {
    pub snap: Snap,
    pub snapped_point: GeoPoint,
    /// Meters between the query point and `snapped_point`
    pub query_distance: f64,
}

/// Spatial index over the segments of every edge geometry
pub struct LocationIndex {
    tree: RTree<LocationIndexObject, LocationIndexTreeParams>,
    edges: Vec<IndexedEdge>,
}

impl LocationIndex {
    pub fn build_from_graph<G: Graph>(graph: &G) -> LocationIndex {
        let stopwatch = Stopwatch::new("location_index/build");

        let mut objects = Vec::new();
        let mut edges = Vec::with_capacity(graph.edge_count());

        for edge in 0..graph.edge_count() {
            let (node_a, node_b) = graph.edge_nodes(edge);
            let state = graph.edge_state(edge, node_b);
            let geometry = graph.fetch_way_geometry(&state, FetchMode::All);

            let mut offset = 0.0;
            for window in geometry.windows(2) {
                objects.push(LocationIndexObject::new(
                    IndexedLine::new(&window[0], &window[1]),
                    IndexedData { edge, offset },
                ));
                offset += window[0].haversine_distance(&window[1]);
            }

            edges.push(IndexedEdge {
                node_a,
                node_b,
                length: offset,
            });
        }

        let segments = objects.len();
        let tree = RTree::bulk_load_with_params(objects);

        info!(
            edges = edges.len(),
            segments,
            "Finished building location index in {:?}",
            stopwatch.elapsed()
        );

        LocationIndex { tree, edges }
    }

    /// Closest edge the weighting can travel in at least one direction
    pub fn snap<G: Graph, W: Weighting>(
        &self,
        graph: &G,
        weighting: &W,
        coordinates: &GeoPoint,
    ) -> Option<LocatedSnap> {
        self.tree
            .nearest_neighbor_iter(&[coordinates.lng, coordinates.lat])
            .find(|nearest_neighbor| {
                let edge = nearest_neighbor.data.edge;
                let node_b = self.edges[edge].node_b;
                weighting.can_access_edge(&graph.edge_state(edge, node_b))
            })
            .map(|nearest_neighbor| self.locate(nearest_neighbor, coordinates))
    }

    fn locate(&self, object: &LocationIndexObject, coordinates: &GeoPoint) -> LocatedSnap {
        let line = object.geom();
        let (start, end) = (line.start(), line.end());
        let t = project(coordinates, &start, &end);
        let snapped_point = start.interpolate(&end, t);

        let edge = &self.edges[object.data.edge];
        let along = object.data.offset + start.haversine_distance(&snapped_point);
        let fraction = if edge.length > 0.0 {
            along / edge.length
        } else {
            0.0
        };

        LocatedSnap {
            snap: Snap::new(object.data.edge, fraction),
            snapped_point,
            query_distance: coordinates.haversine_distance(&snapped_point),
        }
    }

    /// Edges with a segment closer than `radius` meters to `center`
    pub fn edges_in_circle(&self, center: &GeoPoint, radius: f64) -> Vec<EdgeId> {
        let delta_lat = (radius / EARTH_RADIUS_METERS).to_degrees();
        let delta_lng = delta_lat / center.lat.to_radians().cos().abs().max(1e-6);
        let envelope = AABB::from_corners(
            [center.lng - delta_lng, center.lat - delta_lat],
            [center.lng + delta_lng, center.lat + delta_lat],
        );

        let mut edges: Vec<EdgeId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|object| {
                let line = object.geom();
                let (start, end) = (line.start(), line.end());
                let closest = start.interpolate(&end, project(center, &start, &end));
                center.haversine_distance(&closest) <= radius
            })
            .map(|object| object.data.edge)
            .collect();

        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Edges with a segment crossing or inside `bbox`
    pub fn edges_in_bbox(&self, bbox: &BBox) -> Vec<EdgeId> {
        let rect = geo::Rect::new(
            geo::coord! { x: bbox.min_lng, y: bbox.min_lat },
            geo::coord! { x: bbox.max_lng, y: bbox.max_lat },
        );

        let mut edges: Vec<EdgeId> = self
            .tree
            .locate_in_envelope_intersecting(&bbox.aabb())
            .filter(|object| rect.intersects(&object.geom().0))
            .map(|object| object.data.edge)
            .collect();

        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

impl NodeLocator for LocationIndex {
    fn closest_node(&self, point: &GeoPoint, max_distance: f64) -> Option<NodeId> {
        let nearest = self.tree.nearest_neighbor(&[point.lng, point.lat])?;
        let located = self.locate(nearest, point);
        if located.query_distance > max_distance {
            return None;
        }

        let edge = &self.edges[nearest.data.edge];
        if located.snap.fraction <= 0.5 {
            Some(edge.node_a)
        } else {
            Some(edge.node_b)
        }
    }
}

/// Position of the point closest to `point` on the segment, as a fraction of
/// the segment. Longitudes are scaled by the cosine of the latitude.
fn project(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64 {
    let scale = point.lat.to_radians().cos();
    let dx = (end.lng - start.lng) * scale;
    let dy = end.lat - start.lat;
    let length_2 = dx * dx + dy * dy;
    if length_2 == 0.0 {
        return 0.0;
    }

    let px = (point.lng - start.lng) * scale;
    let py = point.lat - start.lat;
    ((px * dx + py * dy) / length_2).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use crate::test_graph_utils::{car_weighting, grid_graph};

    use super::*;

    #[test]
    fn test_snap_to_closest_edge() {
        // 3x3 grid, nodes 0.01 degrees apart
        let graph = grid_graph(3, 3, 0.01);
        let index = LocationIndex::build_from_graph(&graph);
        let weighting = car_weighting(&graph);

        let located = index
            .snap(&graph, &weighting, &GeoPoint::new(0.0001, 0.005))
            .unwrap();

        let (node_a, node_b) = graph.edge_nodes(located.snap.edge);
        assert_eq!((node_a.min(node_b), node_a.max(node_b)), (0, 1));
        assert!((located.snap.fraction - 0.5).abs() < 1e-3);
        assert!((located.query_distance - 11.1).abs() < 0.5);
    }

    #[test]
    fn test_edges_in_circle() {
        let graph = grid_graph(3, 3, 0.01);
        let index = LocationIndex::build_from_graph(&graph);

        // Center node 4 and its 4 incident edges
        let edges = index.edges_in_circle(&GeoPoint::new(0.01, 0.01), 100.0);
        assert_eq!(edges.len(), 4);
        for edge in edges {
            let (node_a, node_b) = graph.edge_nodes(edge);
            assert!(node_a == 4 || node_b == 4);
        }

        assert!(index.edges_in_circle(&GeoPoint::new(0.5, 0.5), 100.0).is_empty());
    }

    #[test]
    fn test_edges_in_bbox() {
        let graph = grid_graph(3, 3, 0.01);
        let index = LocationIndex::build_from_graph(&graph);

        // Crosses the two vertical edges of the bottom row
        let bbox = BBox::new(0.004, -0.001, 0.006, 0.011);
        let edges = index.edges_in_bbox(&bbox);
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_closest_node() {
        let graph = grid_graph(3, 3, 0.01);
        let index = LocationIndex::build_from_graph(&graph);

        assert_eq!(index.closest_node(&GeoPoint::new(0.0001, 0.009), 100.0), Some(1));
        assert_eq!(index.closest_node(&GeoPoint::new(0.0199, 0.0201), 100.0), Some(8));
        assert_eq!(index.closest_node(&GeoPoint::new(1.0, 1.0), 100.0), None);
    }
}
