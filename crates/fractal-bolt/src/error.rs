use std::io;
use thiserror::Error;

/// Error types for bolt configuration and mesh export
#[derive(Error, Debug)]
pub enum BoltError {
    /// I/O error while exporting a mesh
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A ray parameter is outside its accepted range
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// Malformed parameter file
    #[cfg(feature = "serde-support")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoltError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type using BoltError
pub type Result<T> = std::result::Result<T, BoltError>;
