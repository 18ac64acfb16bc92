//! HTTP handlers for the server.
//!
//! Failures are answered with `{"success": false, "error": "..."}` and a
//! status derived from the [`PixxelError`] variant.

pub mod export;
pub mod media;
pub mod me;
pub mod projects;
pub mod stock;
pub mod upload;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::error::PixxelError;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "success": false, "error": message.into() })))
}

pub fn status_for(err: &PixxelError) -> StatusCode {
    match err {
        PixxelError::Unauthenticated => StatusCode::UNAUTHORIZED,
        PixxelError::AccessDenied => StatusCode::FORBIDDEN,
        PixxelError::NotFound(_) => StatusCode::NOT_FOUND,
        PixxelError::PlanLimit(_) | PixxelError::UpgradeRequired(_) => StatusCode::PAYMENT_REQUIRED,
        PixxelError::Validation(_) | PixxelError::Scene(_) => StatusCode::BAD_REQUEST,
        PixxelError::SurfaceNotReady => StatusCode::CONFLICT,
        PixxelError::Remote(_) => StatusCode::BAD_GATEWAY,
        PixxelError::Image(_) | PixxelError::Io(_) | PixxelError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map a library error onto an API error, logging server-side failures.
pub fn reject(err: PixxelError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "Request rejected");
    }
    error_response(status, err.to_string())
}
