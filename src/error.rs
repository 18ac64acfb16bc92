//! # Error Types
//!
//! This module defines error types used throughout the pixxel library.

use thiserror::Error;

use crate::session::ToolId;

/// Main error type for pixxel operations
#[derive(Debug, Error)]
pub enum PixxelError {
    /// No authenticated identity accompanied the call
    #[error("User not authenticated")]
    Unauthenticated,

    /// The caller does not own the requested record
    #[error("Access denied")]
    AccessDenied,

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Plan quota exceeded (project count, monthly exports)
    #[error("{0}")]
    PlanLimit(String),

    /// Tool is reserved for a higher plan
    #[error("The {0} tool requires the Pro plan")]
    UpgradeRequired(ToolId),

    /// Invalid input or an operation that cannot apply to the current state
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The editing session has no ready surface
    #[error("Canvas is not ready")]
    SurfaceNotReady,

    /// Remote collaborator failures (transform service, stock photos, image hosts)
    #[error("Remote error: {0}")]
    Remote(String),

    /// Image decoding, encoding or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Scene blob could not be interpreted
    #[error("Scene error: {0}")]
    Scene(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T, E = PixxelError> = std::result::Result<T, E>;

impl From<image::ImageError> for PixxelError {
    fn from(err: image::ImageError) -> Self {
        PixxelError::Image(err.to_string())
    }
}

impl From<reqwest::Error> for PixxelError {
    fn from(err: reqwest::Error) -> Self {
        PixxelError::Remote(err.to_string())
    }
}
