//! Error types for enforcement operations
//!
//! A denial is not an error: it is rendered as a normal response. These errors
//! mean no decision could be reached.

use ngac_decision::DecisionError;
use thiserror::Error;

/// Enforcement error types.
#[derive(Debug, Error)]
pub enum EnforcementError {
    /// The decision point failed to evaluate the request.
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] DecisionError),
}

/// Result type for enforcement operations.
pub type EnforcementResult<T> = Result<T, EnforcementError>;

impl EnforcementError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            EnforcementError::Evaluation(DecisionError::UserNotFound { .. }) => 404,
            EnforcementError::Evaluation(DecisionError::Cancelled) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            EnforcementError::Evaluation(inner) => inner.error_code(),
        }
    }
}
