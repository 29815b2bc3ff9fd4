//! Error types for adapter operations.

use crate::id::RecordId;
use recordkit_value::ValueError;
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors that can occur during adapter operations.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The addressed record does not exist.
    #[error("record {id} not found in {model}")]
    NotFound {
        /// Model name.
        model: String,
        /// The missing record.
        id: RecordId,
    },

    /// Stored bytes could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] ValueError),

    /// The backend rejected or failed the request.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },

    /// The backend is not reachable.
    #[error("adapter unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl AdapterError {
    /// Creates a not found error.
    pub fn not_found(model: impl Into<String>, id: RecordId) -> Self {
        Self::NotFound {
            model: model.into(),
            id,
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
