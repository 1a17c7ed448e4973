//! Error types for tessel.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during topology construction, editing and queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The input contains no faces or segments.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face (or segment) index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices or fewer than three vertices.
    #[error("face {face} is degenerate (has duplicate or too few vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is claimed by more than one face.
    #[error("edge ({v0}, {v1}) has more than two incident faces or inconsistent winding")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Several separate face fans meet at one vertex.
    #[error("vertex {vertex} is non-manifold ({reached} of {expected} edges reachable by circulation)")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
        /// Edges reached by circulating from the vertex's first half-edge.
        reached: usize,
        /// Edges attached to the vertex during construction.
        expected: usize,
    },

    /// An element id does not address a slot of the store it was used with.
    #[error("{kind} {index} does not belong to this store (capacity {capacity})")]
    ForeignElement {
        /// Element kind ("vertex", "half-edge", "face", ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Slot count of the store.
        capacity: usize,
    },

    /// A handle was issued by a different store, or by this store before
    /// it was compacted.
    #[error("{kind} {index} was issued by store {issuer}, not store {owner}")]
    WrongOwner {
        /// Element kind ("vertex", "half-edge", "face", ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Owner token carried by the handle.
        issuer: u32,
        /// Owner token of the store it was used with.
        owner: u32,
    },

    /// An operation was started from an element already marked removed.
    #[error("{kind} {index} has been removed")]
    RemovedElement {
        /// Element kind ("vertex", "half-edge", "face", ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
    },

    /// Connectivity is inconsistent (broken twin/next chain, unbounded loop).
    #[error("topology corruption at {kind} {index}: {reason}")]
    TopologyCorruption {
        /// Element kind where the inconsistency was detected.
        kind: &'static str,
        /// Index of that element.
        index: usize,
        /// What was found.
        reason: &'static str,
    },

    /// A structural edit was rejected because it would break an invariant.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Buffers passed to a bulk kernel do not have matching sizes.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a corruption error.
    pub(crate) fn corrupt(kind: &'static str, index: usize, reason: &'static str) -> Self {
        MeshError::TopologyCorruption {
            kind,
            index,
            reason,
        }
    }

    /// Check that two buffer lengths agree.
    pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(MeshError::DimensionMismatch { expected, actual })
        }
    }
}
