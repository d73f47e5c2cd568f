use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EdgeId, NodeId};

#[derive(Error, Debug, PartialEq)]
pub enum EncodingError {
    #[error("Encoded value {name} cannot use {bits} bits, it must be between 1 and 31")]
    InvalidBits { name: String, bits: u32 },
    #[error("Encoded value {0} is registered twice")]
    DuplicateName(String),
    #[error("Encoded value {name} overlaps with {other} in int {int_index}")]
    Overlap {
        name: String,
        other: String,
        int_index: usize,
    },
    #[error("Encoded value {name} cannot be pinned at shift {shift}, {bits} bits do not fit in an int")]
    InvalidPosition { name: String, shift: u32, bits: u32 },
    #[error("Unknown encoded value {0}")]
    UnknownName(String),
    #[error("Encoded value {name} is a {actual}, not a {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Value {value} is out of range [{min}, {max}] for encoded value {name}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data access {0} was not created or loaded")]
    Uninitialized(String),
    #[error("Data access {name} needs a location on disk for kind {kind}")]
    MissingLocation { name: String, kind: &'static str },
    #[error("File {path} is not a valid data access file: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },
    #[error("Segment size {0} must be a power of two and at least 128 bytes")]
    InvalidSegmentSize(usize),
    #[error("Stored encoding does not match the encoding manager, offsets would be stale")]
    IncompatibleEncoding,
    #[error("Failed to (de)serialize {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph is frozen, no edges can be added")]
    Frozen,
    #[error("Node {node} is out of range, the graph can hold up to {max} nodes")]
    NodeOutOfRange { node: NodeId, max: usize },
    #[error("Edge {0} does not exist")]
    UnknownEdge(EdgeId),
    #[error("Edge {edge} is not adjacent to node {node}")]
    NotAdjacent { edge: EdgeId, node: NodeId },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[derive(Error, Debug)]
pub enum PreparationError {
    #[error("Cannot prepare an empty graph")]
    EmptyGraph,
    #[error("Graph must be frozen before preparation")]
    NotFrozen,
    #[error("Unknown profile {0}")]
    UnknownProfile(String),
    #[error("Invalid node ordering: {0}")]
    InvalidNodeOrdering(String),
    #[error("Prepared data was created for profile {stored}, not {requested}")]
    ProfileMismatch { stored: String, requested: String },
    #[error("{suggestions} landmark suggestions are fewer than the {landmarks} required landmarks")]
    TooFewSuggestions {
        suggestions: usize,
        landmarks: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
}

#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("Cannot parse landmark suggestion line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("No node found for the suggested points {0:?}")]
    UnresolvedPoints(Vec<(f64, f64)>),
    #[error("Cannot read landmark suggestions: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Nodes {from} and {to} are in different subnetworks")]
    Disconnected { from: NodeId, to: NodeId },
    #[error("No connection found between {from} and {to}")]
    ConnectionNotFound { from: NodeId, to: NodeId },
    #[error("Search was cancelled")]
    Cancelled,
    #[error("Search exceeded its deadline")]
    Timeout,
    #[error("Search settled more than {0} nodes")]
    MaxVisitedNodesExceeded(usize),
    #[error("Node {0} does not exist")]
    InvalidNode(NodeId),
    #[error("No start or end node given")]
    EmptyQuery,
    #[error("Shortcut {0} does not unpack into its original edges")]
    InvalidShortcut(usize),
}
