//! Error types for access decisions.
//!
//! A denial is a successful evaluation that returned [`Decision::Deny`];
//! these errors mean the request could not be evaluated at all.
//!
//! [`Decision::Deny`]: crate::Decision::Deny

use ngac_graph::NodeId;
use thiserror::Error;

/// Decision error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    /// The requesting user does not resolve to a node.
    #[error("User not found: node {id}")]
    UserNotFound {
        /// The unresolved user id.
        id: NodeId,
    },

    /// The caller cancelled the evaluation between stages.
    #[error("Evaluation cancelled")]
    Cancelled,
}

/// Result type for decision operations.
pub type DecisionResult<T> = Result<T, DecisionError>;

impl DecisionError {
    /// Whether the failure is a missing node.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DecisionError::UserNotFound { .. })
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            DecisionError::UserNotFound { .. } => "NOT_FOUND",
            DecisionError::Cancelled => "CANCELLED",
        }
    }
}
