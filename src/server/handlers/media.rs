//! Uploaded file serving.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::server::state::AppState;

/// GET /media/*path - Serve a stored upload.
///
/// The media directory is flat; nested or parent paths are not found.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let name = path.split('?').next().unwrap_or(&path);
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    match tokio::fs::read(state.config.media_dir.join(name)).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(name)
                .first_or_octet_stream()
                .to_string();
            // Upload names are unique, so contents never change.
            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
                ],
                contents,
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}
