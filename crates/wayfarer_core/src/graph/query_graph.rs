use fxhash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{
    error::GraphError,
    ev::EdgeFlags,
    geopoint::GeoPoint,
    types::{EdgeId, NodeId},
};

use super::{EdgeState, FetchMode, Graph, select_geometry};

/// Fractions closer than this to an end of the edge snap to the tower node
const SNAP_TOLERANCE: f64 = 1e-9;

/// A point on `edge`, `fraction` of the way along its stored orientation
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snap {
    pub edge: EdgeId,
    pub fraction: f64,
}

impl Snap {
    pub fn new(edge: EdgeId, fraction: f64) -> Self {
        Self {
            edge,
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

struct VirtualEdge {
    original_edge: EdgeId,
    node_a: NodeId,
    node_b: NodeId,
    distance: f64,
    flags: EdgeFlags,
    pillars: Vec<GeoPoint>,
}

/// Overlay of virtual nodes and edges on a frozen graph.
///
/// A snapped edge is hidden from its tower nodes and replaced by a chain of
/// virtual edges through one virtual node per distinct snap fraction. Virtual
/// edges keep the stored orientation and the flags of the edge they split.
pub struct QueryGraph<'a, G: Graph> {
    graph: &'a G,
    base_nodes: usize,
    base_edges: usize,
    virtual_points: Vec<GeoPoint>,
    virtual_edges: Vec<VirtualEdge>,
    /// Virtual edge ids per virtual node
    virtual_adjacency: Vec<SmallVec<[EdgeId; 2]>>,
    /// Virtual edge ids added to tower nodes
    tower_edges: FxHashMap<NodeId, SmallVec<[EdgeId; 2]>>,
    removed_edges: FxHashSet<EdgeId>,
    snapped_nodes: Vec<NodeId>,
}

impl<'a, G: Graph> QueryGraph<'a, G> {
    pub fn new(graph: &'a G, snaps: &[Snap]) -> Result<Self, GraphError> {
        let mut query_graph = Self {
            graph,
            base_nodes: graph.node_count(),
            base_edges: graph.edge_count(),
            virtual_points: Vec::new(),
            virtual_edges: Vec::new(),
            virtual_adjacency: Vec::new(),
            tower_edges: FxHashMap::default(),
            removed_edges: FxHashSet::default(),
            snapped_nodes: vec![0; snaps.len()],
        };

        let mut snaps_by_edge: FxHashMap<EdgeId, Vec<usize>> = FxHashMap::default();
        for (index, snap) in snaps.iter().enumerate() {
            if snap.edge >= query_graph.base_edges {
                return Err(GraphError::UnknownEdge(snap.edge));
            }
            snaps_by_edge.entry(snap.edge).or_default().push(index);
        }

        let mut edges: Vec<EdgeId> = snaps_by_edge.keys().copied().collect();
        edges.sort_unstable();

        for edge in edges {
            let indices = &snaps_by_edge[&edge];
            query_graph.split_edge(edge, snaps, indices);
        }

        Ok(query_graph)
    }

    fn split_edge(&mut self, edge: EdgeId, snaps: &[Snap], indices: &[usize]) {
        let (node_a, node_b) = self.graph.edge_nodes(edge);
        let state = self.graph.edge_state(edge, node_b);
        let polyline = Polyline::new(self.graph.fetch_way_geometry(&state, FetchMode::All));

        let mut fractions: Vec<f64> = indices
            .iter()
            .map(|&index| snaps[index].fraction)
            .filter(|&fraction| fraction > SNAP_TOLERANCE && fraction < 1.0 - SNAP_TOLERANCE)
            .collect();
        fractions.sort_by(|a, b| a.total_cmp(b));
        fractions.dedup_by(|a, b| (*a - *b).abs() <= SNAP_TOLERANCE);

        let first_virtual = self.base_nodes + self.virtual_points.len();
        for &index in indices {
            let fraction = snaps[index].fraction;
            self.snapped_nodes[index] = if fraction <= SNAP_TOLERANCE {
                node_a
            } else if fraction >= 1.0 - SNAP_TOLERANCE {
                node_b
            } else {
                let position = fractions
                    .iter()
                    .position(|f| (f - fraction).abs() <= SNAP_TOLERANCE)
                    .unwrap_or(0);
                first_virtual + position
            };
        }

        if fractions.is_empty() {
            return;
        }

        self.removed_edges.insert(edge);

        let mut chain = Vec::with_capacity(fractions.len() + 2);
        chain.push((node_a, 0.0));
        for (position, &fraction) in fractions.iter().enumerate() {
            self.virtual_points.push(polyline.point_at(fraction));
            self.virtual_adjacency.push(SmallVec::new());
            chain.push((first_virtual + position, fraction));
        }
        chain.push((node_b, 1.0));

        for window in chain.windows(2) {
            let (from, from_fraction) = window[0];
            let (to, to_fraction) = window[1];
            let virtual_edge = self.base_edges + self.virtual_edges.len();

            self.virtual_edges.push(VirtualEdge {
                original_edge: edge,
                node_a: from,
                node_b: to,
                distance: state.distance * (to_fraction - from_fraction),
                flags: state.flags.clone(),
                pillars: polyline.pillars_between(from_fraction, to_fraction),
            });

            for node in [from, to] {
                if node >= self.base_nodes {
                    self.virtual_adjacency[node - self.base_nodes].push(virtual_edge);
                } else {
                    self.tower_edges.entry(node).or_default().push(virtual_edge);
                }
            }
        }
    }

    /// Node for the snap at `index` of the snaps given to [`QueryGraph::new`]
    pub fn snapped_node(&self, index: usize) -> NodeId {
        self.snapped_nodes[index]
    }

    pub fn snapped_nodes(&self) -> &[NodeId] {
        &self.snapped_nodes
    }

    pub fn base_graph(&self) -> &'a G {
        self.graph
    }

    pub fn virtual_node_count(&self) -> usize {
        self.virtual_points.len()
    }

    pub fn original_edge(&self, edge: EdgeId) -> EdgeId {
        if edge >= self.base_edges {
            self.virtual_edges[edge - self.base_edges].original_edge
        } else {
            edge
        }
    }

    fn virtual_edge_state(&self, edge: EdgeId, base: NodeId) -> EdgeState {
        let virtual_edge = &self.virtual_edges[edge - self.base_edges];
        let (adj, reverse) = if virtual_edge.node_a == base {
            (virtual_edge.node_b, false)
        } else {
            (virtual_edge.node_a, true)
        };

        EdgeState {
            edge,
            original_edge: virtual_edge.original_edge,
            base,
            adj,
            reverse,
            distance: virtual_edge.distance,
            flags: virtual_edge.flags.clone(),
        }
    }
}

/// Edge geometry with cumulative lengths, used to place virtual nodes
struct Polyline {
    points: Vec<GeoPoint>,
    /// Length from the first point up to each point, in meters
    lengths: Vec<f64>,
}

impl Polyline {
    fn new(points: Vec<GeoPoint>) -> Self {
        let mut lengths = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (index, point) in points.iter().enumerate() {
            if index > 0 {
                total += points[index - 1].haversine_distance(point);
            }
            lengths.push(total);
        }
        Self { points, lengths }
    }

    fn total(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    fn point_at(&self, fraction: f64) -> GeoPoint {
        let total = self.total();
        if total == 0.0 {
            // Degenerate geometry, interpolate between the tower nodes
            let first = self.points[0];
            let last = self.points[self.points.len() - 1];
            return first.interpolate(&last, fraction);
        }

        let target = total * fraction;
        for index in 1..self.points.len() {
            if self.lengths[index] >= target {
                let segment = self.lengths[index] - self.lengths[index - 1];
                let local = if segment > 0.0 {
                    (target - self.lengths[index - 1]) / segment
                } else {
                    0.0
                };
                return self.points[index - 1].interpolate(&self.points[index], local);
            }
        }
        self.points[self.points.len() - 1]
    }

    /// Geometry points strictly between two fractions
    fn pillars_between(&self, from: f64, to: f64) -> Vec<GeoPoint> {
        let total = self.total();
        if total == 0.0 {
            return Vec::new();
        }

        let last = self.points.len() - 1;
        (1..last)
            .filter(|&index| {
                let fraction = self.lengths[index] / total;
                fraction > from && fraction < to
            })
            .map(|index| self.points[index])
            .collect()
    }
}

pub struct QueryGraphEdgeIterator<'a, G: Graph + 'a> {
    query_graph: &'a QueryGraph<'a, G>,
    node: NodeId,
    base: Option<G::EdgeIterator<'a>>,
    virtual_edges: &'a [EdgeId],
    index: usize,
}

impl<'a, G: Graph + 'a> Iterator for QueryGraphEdgeIterator<'a, G> {
    type Item = EdgeState;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(base) = self.base.as_mut() {
            for state in base.by_ref() {
                if !self.query_graph.removed_edges.contains(&state.edge) {
                    return Some(state);
                }
            }
            self.base = None;
        }

        let edge = *self.virtual_edges.get(self.index)?;
        self.index += 1;
        Some(self.query_graph.virtual_edge_state(edge, self.node))
    }
}

impl<'g, G: Graph> Graph for QueryGraph<'g, G> {
    type EdgeIterator<'a>
        = QueryGraphEdgeIterator<'a, G>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.base_nodes + self.virtual_points.len()
    }

    fn edge_count(&self) -> usize {
        self.base_edges + self.virtual_edges.len()
    }

    fn node_edges(&self, node: NodeId) -> Self::EdgeIterator<'_> {
        if node >= self.base_nodes {
            return QueryGraphEdgeIterator {
                query_graph: self,
                node,
                base: None,
                virtual_edges: &self.virtual_adjacency[node - self.base_nodes],
                index: 0,
            };
        }

        QueryGraphEdgeIterator {
            query_graph: self,
            node,
            base: Some(self.graph.node_edges(node)),
            virtual_edges: self
                .tower_edges
                .get(&node)
                .map(|edges| edges.as_slice())
                .unwrap_or(&[]),
            index: 0,
        }
    }

    fn edge_state(&self, edge: EdgeId, adj_node: NodeId) -> EdgeState {
        if edge < self.base_edges {
            return self.graph.edge_state(edge, adj_node);
        }

        let virtual_edge = &self.virtual_edges[edge - self.base_edges];
        let base = if virtual_edge.node_b == adj_node {
            virtual_edge.node_a
        } else if virtual_edge.node_a == adj_node {
            virtual_edge.node_b
        } else {
            panic!(
                "Node {} is neither the start nor the end of virtual edge {}",
                adj_node, edge
            )
        };
        self.virtual_edge_state(edge, base)
    }

    fn edge_nodes(&self, edge: EdgeId) -> (NodeId, NodeId) {
        if edge < self.base_edges {
            return self.graph.edge_nodes(edge);
        }
        let virtual_edge = &self.virtual_edges[edge - self.base_edges];
        (virtual_edge.node_a, virtual_edge.node_b)
    }

    fn node_point(&self, node: NodeId) -> GeoPoint {
        if node >= self.base_nodes {
            return self.virtual_points[node - self.base_nodes];
        }
        self.graph.node_point(node)
    }

    fn fetch_way_geometry(&self, edge: &EdgeState, mode: FetchMode) -> Vec<GeoPoint> {
        if edge.edge < self.base_edges {
            return self.graph.fetch_way_geometry(edge, mode);
        }

        let mut pillars = self.virtual_edges[edge.edge - self.base_edges].pillars.clone();
        if edge.reverse {
            pillars.reverse();
        }
        let mut points = Vec::with_capacity(pillars.len() + 2);
        points.push(self.node_point(edge.base));
        points.extend(pillars);
        points.push(self.node_point(edge.adj));
        select_geometry(points, mode)
    }

    fn is_virtual_node(&self, node: NodeId) -> bool {
        node >= self.base_nodes
    }

    fn is_virtual_edge(&self, edge: EdgeId) -> bool {
        edge >= self.base_edges
    }

    fn base_node_count(&self) -> usize {
        self.base_nodes
    }
}
