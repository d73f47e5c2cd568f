mod base_graph;
mod edge_filter;
mod query_graph;

pub use base_graph::{BaseGraph, BaseGraphEdgeIterator};
pub use edge_filter::{AccessFilter, EdgeFilter};
pub use query_graph::{QueryGraph, QueryGraphEdgeIterator, Snap};

use crate::{
    ev::{BooleanEncodedValue, DecimalEncodedValue, EdgeFlags, EnumEncodedValue, EnumValue, IntEncodedValue},
    geopoint::GeoPoint,
    types::{EdgeId, EdgeKey, NodeId, create_edge_key},
};

/// Which points of an edge geometry to return
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Base node, pillar nodes and adjacent node
    All,
    PillarOnly,
    TowerOnly,
    BaseAndPillar,
    PillarAndAdj,
}

/// An edge seen from one of its nodes. `reverse` is true when `base` is the
/// second node of the stored orientation.
#[derive(Clone, Debug)]
pub struct EdgeState {
    pub edge: EdgeId,
    /// Edge of the base graph, differs from `edge` for virtual edges
    pub original_edge: EdgeId,
    pub base: NodeId,
    pub adj: NodeId,
    pub reverse: bool,
    /// Meters
    pub distance: f64,
    pub flags: EdgeFlags,
}

impl EdgeState {
    pub fn edge_key(&self) -> EdgeKey {
        create_edge_key(self.edge, self.reverse)
    }

    /// `reverse` is relative to this state: false reads the value for
    /// traveling from `base` to `adj`.
    #[inline]
    pub fn get_bool(&self, enc: &BooleanEncodedValue, reverse: bool) -> bool {
        enc.get_bool(self.reverse != reverse, &self.flags)
    }

    #[inline]
    pub fn get_int(&self, enc: &IntEncodedValue, reverse: bool) -> i32 {
        enc.get_int(self.reverse != reverse, &self.flags)
    }

    #[inline]
    pub fn get_decimal(&self, enc: &DecimalEncodedValue, reverse: bool) -> f64 {
        enc.get_decimal(self.reverse != reverse, &self.flags)
    }

    #[inline]
    pub fn get_enum<E: EnumValue>(&self, enc: &EnumEncodedValue<E>, reverse: bool) -> E {
        enc.get_enum(self.reverse != reverse, &self.flags)
    }
}

pub trait Graph {
    type EdgeIterator<'a>: Iterator<Item = EdgeState>
    where
        Self: 'a;

    /// Number of nodes, virtual nodes included
    fn node_count(&self) -> usize;

    /// Number of edges, virtual edges included
    fn edge_count(&self) -> usize;

    /// Every edge incident to `node`, with `node` as base
    fn node_edges(&self, node: NodeId) -> Self::EdgeIterator<'_>;

    /// The edge oriented so that it leads to `adj_node`.
    ///
    /// Panics if `adj_node` is not a node of `edge`.
    fn edge_state(&self, edge: EdgeId, adj_node: NodeId) -> EdgeState;

    /// First and second node of the stored orientation
    fn edge_nodes(&self, edge: EdgeId) -> (NodeId, NodeId);

    fn node_point(&self, node: NodeId) -> GeoPoint;

    fn fetch_way_geometry(&self, edge: &EdgeState, mode: FetchMode) -> Vec<GeoPoint>;

    fn is_virtual_node(&self, _node: NodeId) -> bool {
        false
    }

    fn is_virtual_edge(&self, _edge: EdgeId) -> bool {
        false
    }

    /// Nodes of the underlying base graph, without virtual nodes
    fn base_node_count(&self) -> usize {
        self.node_count()
    }

    fn filtered_edges<'a, F: EdgeFilter>(
        &'a self,
        node: NodeId,
        filter: &'a F,
    ) -> impl Iterator<Item = EdgeState> + 'a {
        self.node_edges(node).filter(move |edge| filter.accept(edge))
    }
}

/// Orders points of an edge for `mode`. `points` holds the base node, the
/// pillars and the adjacent node in travel direction.
pub(crate) fn select_geometry(mut points: Vec<GeoPoint>, mode: FetchMode) -> Vec<GeoPoint> {
    let len = points.len();
    match mode {
        FetchMode::All => points,
        FetchMode::TowerOnly => {
            if len > 2 {
                let adj = points[len - 1];
                points.truncate(1);
                points.push(adj);
            }
            points
        }
        FetchMode::PillarOnly => {
            if len < 2 {
                return Vec::new();
            }
            points.truncate(len - 1);
            points.remove(0);
            points
        }
        FetchMode::BaseAndPillar => {
            points.truncate(len.saturating_sub(1));
            points
        }
        FetchMode::PillarAndAdj => {
            if !points.is_empty() {
                points.remove(0);
            }
            points
        }
    }
}
