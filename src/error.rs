//! Error type shared by the store, the query facade and the graph.

use thiserror::Error;

use crate::graph::{EdgeId, VertexId};
use crate::model::{SlotId, ValueKind};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;

/// Everything a store, index, facade or graph operation can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    /// Rejected configuration, such as an empty key attribute or a bad log filter.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A record lacks an attribute it must carry.
    #[error("record is missing indexed attribute '{0}'")]
    MissingAttribute(String),
    /// Lookup or range query on an attribute with no index.
    #[error("attribute '{0}' is not indexed")]
    UnindexedAttribute(String),
    /// Range query whose low bound sorts after its high bound.
    #[error("invalid range on '{attribute}': low bound {low} is greater than high bound {high}")]
    InvalidRange {
        /// Attribute being scanned.
        attribute: String,
        /// Rendered low bound.
        low: String,
        /// Rendered high bound.
        high: String,
    },
    /// Slot id past the end of the store, or one holding a tombstone.
    #[error("slot {0} is out of range or empty")]
    InvalidSlot(SlotId),
    /// An internal structure failed its consistency check.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// A field value disagrees with the kind the schema declares.
    #[error("attribute '{attribute}' expects {expected}, found {found}")]
    TypeMismatch {
        /// Offending field.
        attribute: String,
        /// Kind declared by the schema.
        expected: ValueKind,
        /// Kind of the value supplied.
        found: ValueKind,
    },
    /// A key that must be unique is already taken.
    #[error("duplicate value {value} for unique attribute '{attribute}'")]
    DuplicateKey {
        /// Key attribute.
        attribute: String,
        /// Rendered key value.
        value: String,
    },
    /// Vertex handle that does not belong to this graph.
    #[error("vertex {0} not found")]
    UnknownVertex(VertexId),
    /// Edge handle that does not belong to this graph.
    #[error("edge {0} not found")]
    UnknownEdge(EdgeId),
}
