//! Error types for the information store.

use ngac_graph::GraphError;
use thiserror::Error;

/// Information store error types.
#[derive(Debug, Error)]
pub enum InformationError {
    /// Retrieval before any graph was stored.
    #[error("No policy graph has been stored")]
    NothingStored,

    /// The serialized form could not be parsed or produced.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The serialized form parsed but does not describe a valid graph.
    #[error("Invalid policy graph: {0}")]
    InvalidGraph(#[from] GraphError),
}

/// Result type for information store operations.
pub type InformationResult<T> = Result<T, InformationError>;

impl From<serde_json::Error> for InformationError {
    fn from(err: serde_json::Error) -> Self {
        InformationError::Serialization(err.to_string())
    }
}

impl InformationError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            InformationError::NothingStored => "NOTHING_STORED",
            InformationError::Serialization(_) => "SERIALIZATION_ERROR",
            InformationError::InvalidGraph(_) => "INVALID_GRAPH",
        }
    }
}
