use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    constants::NO_EDGE_REF,
    error::{GraphError, StorageError},
    ev::{EdgeFlags, EncodingManager},
    geopoint::{BBox, ELEVATION_SCALE_FACTOR, GeoPoint},
    storage::{DataAccess, GraphDirectory},
    types::{EdgeId, NodeId},
};

use super::{EdgeState, FetchMode, Graph, select_geometry};

// Node row
const N_EDGE_REF: u64 = 0;
const N_LAT: u64 = 4;
const N_LON: u64 = 8;
const N_ELE: u64 = 12;

// Edge row, followed by the flags ints
const E_NODEA: u64 = 0;
const E_NODEB: u64 = 4;
const E_LINKA: u64 = 8;
const E_LINKB: u64 = 12;
const E_DIST: u64 = 16;
const E_GEO: u64 = 20;
const E_FLAGS: u64 = 28;

// Header slots of the nodes data access
const H_NODE_COUNT: usize = 0;
const H_WITH_ELEVATION: usize = 1;
const H_BBOX: usize = 2;

// Header slots of the edges data access
const H_EDGE_COUNT: usize = 0;
const H_FLAGS_INTS: usize = 1;
const H_FROZEN: usize = 2;
const H_FINGERPRINT_LOW: usize = 3;
const H_FINGERPRINT_HIGH: usize = 4;

// Header slots of the geometry data access
const H_GEO_POINTER_LOW: usize = 0;
const H_GEO_POINTER_HIGH: usize = 1;

const ENCODING_FILE: &str = "encoding";

/// Append-only road graph stored in paged data accesses.
///
/// Each node keeps the id of its most recently added edge, each edge keeps for
/// both of its nodes the next edge of that node, forming one linked list of
/// incident edges per node.
pub struct BaseGraph {
    directory: GraphDirectory,
    encoding: Arc<EncodingManager>,
    nodes: DataAccess,
    edges: DataAccess,
    geometry: DataAccess,
    node_entry_bytes: u64,
    edge_entry_bytes: u64,
    with_elevation: bool,
    node_count: usize,
    edge_count: usize,
    /// Next free byte of the geometry data access, 0 means "no geometry"
    geometry_pointer: u64,
    bbox: BBox,
    frozen: bool,
}

impl BaseGraph {
    pub fn create(
        directory: GraphDirectory,
        encoding: Arc<EncodingManager>,
        with_elevation: bool,
        initial_bytes: u64,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(directory, encoding, with_elevation)?;
        graph.nodes.create(initial_bytes)?;
        graph.edges.create(initial_bytes)?;
        graph.geometry.create(initial_bytes)?;
        // Pointer 0 is reserved for edges without geometry
        graph.geometry_pointer = 4;
        Ok(graph)
    }

    /// In-memory graph, mostly for tests and small imports
    pub fn in_memory(encoding: Arc<EncodingManager>) -> Result<Self, GraphError> {
        Self::create(GraphDirectory::in_memory(), encoding, false, 1 << 10)
    }

    pub fn load(
        directory: GraphDirectory,
        encoding: Arc<EncodingManager>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(directory, encoding, false)?;

        if !graph.nodes.load_existing()?
            || !graph.edges.load_existing()?
            || !graph.geometry.load_existing()?
        {
            return Err(StorageError::Uninitialized(String::from("graph")).into());
        }

        let fingerprint = (graph.edges.header(H_FINGERPRINT_LOW) as u32 as u64)
            | ((graph.edges.header(H_FINGERPRINT_HIGH) as u32 as u64) << 32);
        if fingerprint != graph.encoding.fingerprint()
            || graph.edges.header(H_FLAGS_INTS) as usize != graph.encoding.ints_for_flags()
        {
            return Err(StorageError::IncompatibleEncoding.into());
        }

        match graph.directory.read_file(ENCODING_FILE)? {
            Some(bytes) => graph.encoding.check_compatible(&bytes)?,
            None => return Err(StorageError::IncompatibleEncoding.into()),
        }

        graph.with_elevation = graph.nodes.header(H_WITH_ELEVATION) == 1;
        graph.node_entry_bytes = Self::node_entry_bytes(graph.with_elevation);
        graph.node_count = graph.nodes.header(H_NODE_COUNT) as usize;
        graph.bbox = BBox::new(
            GeoPoint::from_fixed(graph.nodes.header(H_BBOX)),
            GeoPoint::from_fixed(graph.nodes.header(H_BBOX + 1)),
            GeoPoint::from_fixed(graph.nodes.header(H_BBOX + 2)),
            GeoPoint::from_fixed(graph.nodes.header(H_BBOX + 3)),
        );
        graph.edge_count = graph.edges.header(H_EDGE_COUNT) as usize;
        graph.frozen = graph.edges.header(H_FROZEN) == 1;
        graph.geometry_pointer = (graph.geometry.header(H_GEO_POINTER_LOW) as u32 as u64)
            | ((graph.geometry.header(H_GEO_POINTER_HIGH) as u32 as u64) << 32);

        info!(
            "Loaded graph with {} nodes and {} edges",
            graph.node_count, graph.edge_count
        );

        Ok(graph)
    }

    fn new(
        directory: GraphDirectory,
        encoding: Arc<EncodingManager>,
        with_elevation: bool,
    ) -> Result<Self, GraphError> {
        let nodes = directory.create("nodes")?;
        let edges = directory.create("edges")?;
        let geometry = directory.create("geometry")?;
        let edge_entry_bytes = E_FLAGS + encoding.bytes_for_flags() as u64;

        Ok(Self {
            directory,
            encoding,
            nodes,
            edges,
            geometry,
            node_entry_bytes: Self::node_entry_bytes(with_elevation),
            edge_entry_bytes,
            with_elevation,
            node_count: 0,
            edge_count: 0,
            geometry_pointer: 0,
            bbox: BBox::inverse(),
            frozen: false,
        })
    }

    fn node_entry_bytes(with_elevation: bool) -> u64 {
        if with_elevation { N_ELE + 4 } else { N_ELE }
    }

    pub fn encoding(&self) -> &Arc<EncodingManager> {
        &self.encoding
    }

    pub fn directory(&self) -> &GraphDirectory {
        &self.directory
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn with_elevation(&self) -> bool {
        self.with_elevation
    }

    /// No edges can be added after this. Preparations require a frozen graph.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    fn ensure_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        if node >= i32::MAX as usize {
            return Err(GraphError::NodeOutOfRange {
                node,
                max: i32::MAX as usize,
            });
        }

        if node < self.node_count {
            return Ok(());
        }

        self.nodes
            .ensure_capacity((node as u64 + 1) * self.node_entry_bytes)?;
        for new_node in self.node_count..=node {
            let pointer = new_node as u64 * self.node_entry_bytes;
            self.nodes.set_int(pointer + N_EDGE_REF, NO_EDGE_REF);
        }
        self.node_count = node + 1;
        Ok(())
    }

    pub fn set_node(
        &mut self,
        node: NodeId,
        lat: f64,
        lng: f64,
        elevation: Option<f64>,
    ) -> Result<(), GraphError> {
        self.ensure_node(node)?;
        let pointer = node as u64 * self.node_entry_bytes;
        self.nodes.set_int(pointer + N_LAT, GeoPoint::to_fixed(lat));
        self.nodes.set_int(pointer + N_LON, GeoPoint::to_fixed(lng));
        if self.with_elevation {
            let elevation = (elevation.unwrap_or(0.0) * ELEVATION_SCALE_FACTOR).round() as i32;
            self.nodes.set_int(pointer + N_ELE, elevation);
        }
        self.bbox.extend(&GeoPoint::new(lat, lng));
        Ok(())
    }

    pub fn elevation(&self, node: NodeId) -> Option<f64> {
        if !self.with_elevation {
            return None;
        }
        let pointer = node as u64 * self.node_entry_bytes;
        Some(self.nodes.get_int(pointer + N_ELE) as f64 / ELEVATION_SCALE_FACTOR)
    }

    /// Adds an edge stored in the orientation `from` -> `to`, distance in meters
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, distance: f64) -> Result<EdgeId, GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }

        self.ensure_node(from.max(to))?;

        let edge = self.edge_count;
        let pointer = edge as u64 * self.edge_entry_bytes;
        self.edges
            .ensure_capacity(pointer + self.edge_entry_bytes)?;
        self.edge_count += 1;

        let millimeters = (distance.max(0.0) * 1000.0).round().min(u32::MAX as f64) as u32;

        self.edges.set_int(pointer + E_NODEA, from as i32);
        self.edges.set_int(pointer + E_NODEB, to as i32);
        self.edges.set_int(pointer + E_DIST, millimeters as i32);
        self.edges.set_int(pointer + E_GEO, 0);
        self.edges.set_int(pointer + E_GEO + 4, 0);
        for index in 0..self.encoding.ints_for_flags() as u64 {
            self.edges.set_int(pointer + E_FLAGS + index * 4, 0);
        }

        let from_ref = self.node_edge_ref(from);
        self.edges.set_int(pointer + E_LINKA, from_ref);
        self.set_node_edge_ref(from, edge as i32);

        if from == to {
            // A loop is listed once
            self.edges.set_int(pointer + E_LINKB, from_ref);
        } else {
            let to_ref = self.node_edge_ref(to);
            self.edges.set_int(pointer + E_LINKB, to_ref);
            self.set_node_edge_ref(to, edge as i32);
        }

        Ok(edge)
    }

    pub fn set_flags(&mut self, edge: EdgeId, flags: &[u32]) -> Result<(), GraphError> {
        self.check_edge(edge)?;
        let pointer = edge as u64 * self.edge_entry_bytes;
        for (index, value) in flags
            .iter()
            .take(self.encoding.ints_for_flags())
            .enumerate()
        {
            self.edges
                .set_int(pointer + E_FLAGS + index as u64 * 4, *value as i32);
        }
        Ok(())
    }

    pub fn flags(&self, edge: EdgeId) -> EdgeFlags {
        let pointer = edge as u64 * self.edge_entry_bytes;
        (0..self.encoding.ints_for_flags() as u64)
            .map(|index| self.edges.get_int(pointer + E_FLAGS + index * 4) as u32)
            .collect()
    }

    /// Stores the pillar points of `edge`, ordered from its first to its second node
    pub fn set_way_geometry(&mut self, edge: EdgeId, pillars: &[GeoPoint]) -> Result<(), GraphError> {
        self.check_edge(edge)?;
        let edge_pointer = edge as u64 * self.edge_entry_bytes;

        if pillars.is_empty() {
            self.edges.set_int(edge_pointer + E_GEO, 0);
            self.edges.set_int(edge_pointer + E_GEO + 4, 0);
            return Ok(());
        }

        let point_bytes = if self.with_elevation { 12 } else { 8 };
        let pointer = self.geometry_pointer;
        let bytes = 4 + pillars.len() as u64 * point_bytes;
        self.geometry.ensure_capacity(pointer + bytes)?;

        self.geometry.set_int(pointer, pillars.len() as i32);
        for (index, point) in pillars.iter().enumerate() {
            let point_pointer = pointer + 4 + index as u64 * point_bytes;
            self.geometry
                .set_int(point_pointer, GeoPoint::to_fixed(point.lat));
            self.geometry
                .set_int(point_pointer + 4, GeoPoint::to_fixed(point.lng));
            if self.with_elevation {
                self.geometry.set_int(point_pointer + 8, 0);
            }
        }
        self.geometry_pointer += bytes;

        self.edges
            .set_int(edge_pointer + E_GEO, pointer as u32 as i32);
        self.edges
            .set_int(edge_pointer + E_GEO + 4, (pointer >> 32) as u32 as i32);
        Ok(())
    }

    fn pillars(&self, edge: EdgeId) -> Vec<GeoPoint> {
        let edge_pointer = edge as u64 * self.edge_entry_bytes;
        let pointer = (self.edges.get_int(edge_pointer + E_GEO) as u32 as u64)
            | ((self.edges.get_int(edge_pointer + E_GEO + 4) as u32 as u64) << 32);
        if pointer == 0 {
            return Vec::new();
        }

        let point_bytes = if self.with_elevation { 12 } else { 8 };
        let count = self.geometry.get_int(pointer) as u64;
        (0..count)
            .map(|index| {
                let point_pointer = pointer + 4 + index * point_bytes;
                GeoPoint::new(
                    GeoPoint::from_fixed(self.geometry.get_int(point_pointer)),
                    GeoPoint::from_fixed(self.geometry.get_int(point_pointer + 4)),
                )
            })
            .collect()
    }

    /// Meters
    pub fn edge_distance(&self, edge: EdgeId) -> f64 {
        let pointer = edge as u64 * self.edge_entry_bytes;
        self.edges.get_int(pointer + E_DIST) as u32 as f64 / 1000.0
    }

    fn check_edge(&self, edge: EdgeId) -> Result<(), GraphError> {
        if edge >= self.edge_count {
            return Err(GraphError::UnknownEdge(edge));
        }
        Ok(())
    }

    #[inline]
    fn node_edge_ref(&self, node: NodeId) -> i32 {
        self.nodes
            .get_int(node as u64 * self.node_entry_bytes + N_EDGE_REF)
    }

    fn set_node_edge_ref(&mut self, node: NodeId, edge_ref: i32) {
        self.nodes
            .set_int(node as u64 * self.node_entry_bytes + N_EDGE_REF, edge_ref);
    }

    fn read_edge_state(&self, edge: EdgeId, base: NodeId) -> (EdgeState, i32) {
        let pointer = edge as u64 * self.edge_entry_bytes;
        let node_a = self.edges.get_int(pointer + E_NODEA) as NodeId;
        let node_b = self.edges.get_int(pointer + E_NODEB) as NodeId;

        let (adj, reverse, next) = if node_a == base {
            (node_b, false, self.edges.get_int(pointer + E_LINKA))
        } else {
            (node_a, true, self.edges.get_int(pointer + E_LINKB))
        };

        (
            EdgeState {
                edge,
                original_edge: edge,
                base,
                adj,
                reverse,
                distance: self.edges.get_int(pointer + E_DIST) as u32 as f64 / 1000.0,
                flags: self.flags(edge),
            },
            next,
        )
    }

    pub fn flush(&mut self) -> Result<(), GraphError> {
        self.nodes.set_header(H_NODE_COUNT, self.node_count as i32);
        self.nodes
            .set_header(H_WITH_ELEVATION, self.with_elevation as i32);
        if self.bbox.is_valid() {
            self.nodes
                .set_header(H_BBOX, GeoPoint::to_fixed(self.bbox.min_lat));
            self.nodes
                .set_header(H_BBOX + 1, GeoPoint::to_fixed(self.bbox.min_lng));
            self.nodes
                .set_header(H_BBOX + 2, GeoPoint::to_fixed(self.bbox.max_lat));
            self.nodes
                .set_header(H_BBOX + 3, GeoPoint::to_fixed(self.bbox.max_lng));
        }

        let fingerprint = self.encoding.fingerprint();
        self.edges.set_header(H_EDGE_COUNT, self.edge_count as i32);
        self.edges
            .set_header(H_FLAGS_INTS, self.encoding.ints_for_flags() as i32);
        self.edges.set_header(H_FROZEN, self.frozen as i32);
        self.edges
            .set_header(H_FINGERPRINT_LOW, fingerprint as u32 as i32);
        self.edges
            .set_header(H_FINGERPRINT_HIGH, (fingerprint >> 32) as u32 as i32);

        self.geometry
            .set_header(H_GEO_POINTER_LOW, self.geometry_pointer as u32 as i32);
        self.geometry
            .set_header(H_GEO_POINTER_HIGH, (self.geometry_pointer >> 32) as u32 as i32);

        self.nodes.flush()?;
        self.edges.flush()?;
        self.geometry.flush()?;
        self.directory
            .write_file(ENCODING_FILE, &self.encoding.to_bytes()?)?;

        debug!(
            "Flushed graph with {} nodes and {} edges",
            self.node_count, self.edge_count
        );
        Ok(())
    }

    /// Releases the storage, the graph is unusable afterwards
    pub fn close(self) -> Result<(), GraphError> {
        let nodes = self.nodes.close();
        let edges = self.edges.close();
        let geometry = self.geometry.close();
        nodes.and(edges).and(geometry)?;
        Ok(())
    }
}

pub struct BaseGraphEdgeIterator<'a> {
    graph: &'a BaseGraph,
    node: NodeId,
    next: i32,
}

impl Iterator for BaseGraphEdgeIterator<'_> {
    type Item = EdgeState;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NO_EDGE_REF {
            return None;
        }

        let (state, next) = self.graph.read_edge_state(self.next as EdgeId, self.node);
        self.next = next;
        Some(state)
    }
}

impl Graph for BaseGraph {
    type EdgeIterator<'a> = BaseGraphEdgeIterator<'a>;

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn node_edges(&self, node: NodeId) -> Self::EdgeIterator<'_> {
        BaseGraphEdgeIterator {
            graph: self,
            node,
            next: self.node_edge_ref(node),
        }
    }

    fn edge_state(&self, edge: EdgeId, adj_node: NodeId) -> EdgeState {
        let (node_a, node_b) = self.edge_nodes(edge);
        let base = if node_b == adj_node {
            node_a
        } else if node_a == adj_node {
            node_b
        } else {
            panic!(
                "Node {} is neither the start nor the end of edge {}",
                adj_node, edge
            )
        };
        let (mut state, _) = self.read_edge_state(edge, base);
        // For loops both orientations match, prefer the stored one
        if node_a == node_b {
            state.reverse = false;
        }
        state
    }

    fn edge_nodes(&self, edge: EdgeId) -> (NodeId, NodeId) {
        let pointer = edge as u64 * self.edge_entry_bytes;
        (
            self.edges.get_int(pointer + E_NODEA) as NodeId,
            self.edges.get_int(pointer + E_NODEB) as NodeId,
        )
    }

    fn node_point(&self, node: NodeId) -> GeoPoint {
        let pointer = node as u64 * self.node_entry_bytes;
        GeoPoint::new(
            GeoPoint::from_fixed(self.nodes.get_int(pointer + N_LAT)),
            GeoPoint::from_fixed(self.nodes.get_int(pointer + N_LON)),
        )
    }

    fn fetch_way_geometry(&self, edge: &EdgeState, mode: FetchMode) -> Vec<GeoPoint> {
        let mut pillars = self.pillars(edge.edge);
        if edge.reverse {
            pillars.reverse();
        }

        let mut points = Vec::with_capacity(pillars.len() + 2);
        points.push(self.node_point(edge.base));
        points.extend(pillars);
        points.push(self.node_point(edge.adj));
        select_geometry(points, mode)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ev::EncodedValueDef, graph::AccessFilter};

    use super::*;

    fn encoding() -> Arc<EncodingManager> {
        Arc::new(EncodingManager::builder().add_defaults().build().unwrap())
    }

    #[test]
    fn test_adjacency() {
        let mut graph = BaseGraph::in_memory(encoding()).unwrap();
        let e0 = graph.add_edge(0, 1, 10.0).unwrap();
        let e1 = graph.add_edge(1, 2, 20.0).unwrap();
        let e2 = graph.add_edge(3, 1, 30.5).unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);

        let mut edges: Vec<(EdgeId, NodeId, bool)> = graph
            .node_edges(1)
            .map(|state| (state.edge, state.adj, state.reverse))
            .collect();
        edges.sort();
        assert_eq!(edges, vec![(e0, 0, true), (e1, 2, false), (e2, 3, true)]);

        let state = graph.edge_state(e2, 3);
        assert_eq!(state.base, 1);
        assert!(state.reverse);
        assert_eq!(state.distance, 30.5);
        assert_eq!(state.edge_key(), 5);
    }

    #[test]
    fn test_loop_is_listed_once() {
        let mut graph = BaseGraph::in_memory(encoding()).unwrap();
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.add_edge(1, 1, 1.0).unwrap();
        graph.add_edge(1, 2, 1.0).unwrap();

        assert_eq!(graph.node_edges(1).count(), 3);
        assert_eq!(graph.node_edges(0).count(), 1);
    }

    #[test]
    fn test_frozen_graph_rejects_edges() {
        let mut graph = BaseGraph::in_memory(encoding()).unwrap();
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.freeze();

        assert!(matches!(graph.add_edge(1, 2, 1.0), Err(GraphError::Frozen)));
    }

    #[test]
    fn test_flags_follow_direction() {
        let encoding = encoding();
        let access = encoding.access_enc("car").unwrap();
        let speed = encoding.average_speed_enc("car").unwrap();

        let mut graph = BaseGraph::in_memory(encoding.clone()).unwrap();
        let edge = graph.add_edge(0, 1, 100.0).unwrap();

        let mut flags = encoding.create_edge_flags();
        access.set_bool(false, &mut flags, true);
        speed.set_decimal(false, &mut flags, 50.0).unwrap();
        speed.set_decimal(true, &mut flags, 20.0).unwrap();
        graph.set_flags(edge, &flags).unwrap();

        let forward = graph.edge_state(edge, 1);
        assert!(forward.get_bool(&access, false));
        assert!(!forward.get_bool(&access, true));
        assert_eq!(forward.get_decimal(&speed, false), 50.0);

        let backward = graph.edge_state(edge, 0);
        assert!(!backward.get_bool(&access, false));
        assert!(backward.get_bool(&access, true));
        assert_eq!(backward.get_decimal(&speed, false), 20.0);

        let outgoing = AccessFilter::outgoing(access.clone());
        assert_eq!(graph.filtered_edges(0, &outgoing).count(), 1);
        assert_eq!(graph.filtered_edges(1, &outgoing).count(), 0);
        let incoming = AccessFilter::incoming(access);
        assert_eq!(graph.filtered_edges(1, &incoming).count(), 1);
    }

    #[test]
    fn test_way_geometry() {
        let mut graph = BaseGraph::in_memory(encoding()).unwrap();
        graph.set_node(0, 50.0, 10.0, None).unwrap();
        graph.set_node(1, 50.2, 10.2, None).unwrap();
        let edge = graph.add_edge(0, 1, 1000.0).unwrap();
        graph
            .set_way_geometry(
                edge,
                &[GeoPoint::new(50.05, 10.05), GeoPoint::new(50.1, 10.1)],
            )
            .unwrap();

        let forward = graph.edge_state(edge, 1);
        let all = graph.fetch_way_geometry(&forward, FetchMode::All);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], GeoPoint::new(50.0, 10.0));
        assert_eq!(all[1], GeoPoint::new(50.05, 10.05));

        let backward = graph.edge_state(edge, 0);
        let pillars = graph.fetch_way_geometry(&backward, FetchMode::PillarOnly);
        assert_eq!(
            pillars,
            vec![GeoPoint::new(50.1, 10.1), GeoPoint::new(50.05, 10.05)]
        );
        assert_eq!(
            graph
                .fetch_way_geometry(&backward, FetchMode::TowerOnly)
                .len(),
            2
        );
        assert_eq!(graph.bbox(), BBox::new(50.0, 10.0, 50.2, 10.2));
    }

    #[test]
    fn test_reload_with_other_encoding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let directory = GraphDirectory::new(dir.path(), Default::default());

        let mut graph = BaseGraph::create(directory.clone(), encoding(), false, 1024).unwrap();
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.flush().unwrap();
        graph.close().unwrap();

        let other = Arc::new(
            EncodingManager::builder()
                .add(EncodedValueDef::boolean("bike_access", true))
                .build()
                .unwrap(),
        );
        assert!(matches!(
            BaseGraph::load(directory.clone(), other),
            Err(GraphError::Storage(StorageError::IncompatibleEncoding))
        ));

        let reloaded = BaseGraph::load(directory, encoding()).unwrap();
        assert_eq!(reloaded.edge_count(), 1);
        assert_eq!(reloaded.edge_nodes(0), (0, 1));
    }
}
