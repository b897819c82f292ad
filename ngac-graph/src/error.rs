//! Error types for policy graph operations.

use thiserror::Error;

use crate::node::NodeId;

/// Policy graph error types.
///
/// Creating a relation that already exists is not an error: the mutation
/// returns `Ok(None)` instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A node or relation id does not resolve.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing element.
        what: String,
    },

    /// A relation references a missing endpoint, is a self-loop, carries no
    /// operations, or conflicts with an existing grant.
    #[error("Invalid relation: {reason}")]
    InvalidRelation {
        /// Why the relation was rejected.
        reason: String,
    },
}

/// Result type for policy graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Missing node.
    pub fn node_not_found(id: NodeId) -> Self {
        GraphError::NotFound {
            what: format!("node {}", id),
        }
    }

    /// Rejected relation.
    pub fn invalid_relation(reason: impl Into<String>) -> Self {
        GraphError::InvalidRelation {
            reason: reason.into(),
        }
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::NotFound { .. } => "NOT_FOUND",
            GraphError::InvalidRelation { .. } => "INVALID_RELATION",
        }
    }
}
