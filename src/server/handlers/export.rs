//! Export and preview handlers.
//!
//! Both hydrate a short-lived editing session for the project, render, and
//! tear it down again.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, error_response, reject};
use crate::geometry::Size;
use crate::remote::ImageSource;
use crate::render::{self, ExportFormat};
use crate::server::auth::authenticate;
use crate::server::state::AppState;
use crate::session::EditorSession;
use crate::store::{Identity, ProjectStore};
use crate::tools;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "png".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Container width the preview is fitted into.
    #[serde(default = "default_container")]
    pub width: f64,
    #[serde(default = "default_container")]
    pub height: f64,
}

fn default_container() -> f64 {
    800.0
}

async fn open_session(
    state: &AppState,
    identity: Identity,
    id: &str,
    container: Size,
) -> Result<EditorSession, ApiError> {
    let store: Arc<dyn ProjectStore> = state.store.clone();
    let images: Arc<dyn ImageSource> = state.images.clone();
    let mut session = EditorSession::new(
        state.config.editor.clone(),
        store,
        images,
        Some(identity),
        container,
    );
    session.open_project(id).await.map_err(reject)?;
    Ok(session)
}

/// POST /api/projects/:id/export?format=png|jpeg|jpeg80|webp
pub async fn export(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = ExportFormat::from_name(&query.format).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown export format '{}'", query.format),
        )
    })?;
    let (identity, _) = authenticate(&state, &headers).await?;
    let mut session = open_session(&state, identity, &id, Size::new(1.0, 1.0)).await?;
    let result = tools::export::export(&session, format).await;
    session.teardown().await;
    let exported = result.map_err(reject)?;

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", exported.file_name),
            ),
        ],
        exported.bytes,
    ))
}

/// GET /api/projects/:id/preview?width=&height= - PNG at display size.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    let container = Size::new(query.width.max(1.0), query.height.max(1.0));
    let mut session = open_session(&state, identity, &id, container).await?;
    let raster = match session.surface() {
        Ok(surface) => Ok(surface.lock().await.render_preview()),
        Err(e) => Err(e),
    };
    session.teardown().await;
    let png = raster
        .and_then(|raster| render::encode(&raster, ExportFormat::Png))
        .map_err(reject)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
