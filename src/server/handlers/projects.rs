//! Project CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ApiError, error_response, reject};
use crate::error::PixxelError;
use crate::server::auth::authenticate;
use crate::server::state::AppState;
use crate::store::{NewProject, Project, ProjectPatch, ProjectStore};

/// GET /api/projects - The caller's projects, most recently updated first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Project>>, ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    let projects = state
        .store
        .list_projects(Some(&identity))
        .await
        .map_err(reject)?;
    Ok(Json(projects))
}

/// POST /api/projects - Create a project.
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(project): Json<NewProject>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    if project.title.trim().is_empty() {
        return Err(reject(PixxelError::Validation(
            "title must not be empty".to_string(),
        )));
    }
    let id = state
        .store
        .create_project(Some(&identity), project)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// GET /api/projects/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    state
        .store
        .get_project(Some(&identity), &id)
        .await
        .map_err(reject)?
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Project not found"))
}

/// PATCH /api/projects/:id - Apply a partial update.
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    let project = state
        .store
        .update_project(Some(&identity), &id, patch)
        .await
        .map_err(reject)?;
    Ok(Json(project))
}

/// DELETE /api/projects/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (identity, _) = authenticate(&state, &headers).await?;
    let deleted = state
        .store
        .delete_project(Some(&identity), &id)
        .await
        .map_err(reject)?;
    if !deleted {
        return Err(error_response(StatusCode::NOT_FOUND, "Project not found"));
    }
    Ok(Json(json!({ "success": true })))
}
