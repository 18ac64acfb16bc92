//! Current-user handler.

use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;
use std::sync::Arc;

use super::ApiError;
use crate::plan::{PlanAccess, PlanSummary};
use crate::server::auth::authenticate;
use crate::server::state::AppState;
use crate::store::User;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub access: PlanSummary,
    /// Exports left this month; `None` when unlimited.
    pub exports_remaining: Option<u32>,
}

/// GET /api/me - The caller's record and plan entitlements.
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let (_, user) = authenticate(&state, &headers).await?;
    let access = PlanAccess::new(user.plan).summary();
    let exports_remaining = access
        .export_limit
        .map(|limit| limit.saturating_sub(user.current_exports()));
    Ok(Json(MeResponse {
        user,
        access,
        exports_remaining,
    }))
}
