//! Engine error types

use thiserror::Error;

use crate::structs::ids::{BlockId, NodeId};

#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed input to a public operation. Recoverable: retry with
    /// corrected input.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    /// A mutation left the tree in an inconsistent state. This is an engine
    /// defect, never a consequence of bad input.
    #[error("Structural integrity violation: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Violations reported by the tree integrity validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("map key {key} does not match embedded node id {node_id}")]
    IdMismatch { key: NodeId, node_id: NodeId },

    #[error("node {node_id} references non-existent parent {parent_id}")]
    MissingParent { node_id: NodeId, parent_id: NodeId },

    #[error("node {node_id} has an inconsistent parent reference to {parent_id}")]
    InconsistentParent { node_id: NodeId, parent_id: NodeId },

    #[error("cycle detected at node {node_id}")]
    CycleDetected { node_id: NodeId },

    #[error("node {node_id} has non-contiguous block positions")]
    NonContiguousBlocks { node_id: NodeId },
}

pub type Result<T> = std::result::Result<T, GraphError>;
