//! Error types for diagram operations.

use crate::diagram::{ConnectorId, NodeId};
use std::fmt;
use thiserror::Error;

/// Reference to a diagram entity, used in error reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Node(NodeId),
    Connector(ConnectorId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Node(id) => write!(f, "node {id}"),
            EntityRef::Connector(id) => write!(f, "connector {id}"),
        }
    }
}

/// Why a connector could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConnection {
    #[error("node {0} cannot be connected to itself")]
    SelfLoop(NodeId),
    #[error("endpoint {0} does not resolve to a visible node")]
    Unresolved(NodeId),
}

/// Diagram model errors.
///
/// None of these are fatal: the interaction layer treats every variant as
/// "do nothing".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error("invalid connection: {0}")]
    InvalidConnection(#[from] InvalidConnection),
    #[error("stale reference to {0}")]
    StaleReference(EntityRef),
}

/// Result type for diagram operations.
pub type DiagramResult<T> = Result<T, DiagramError>;

/// Color parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
}
