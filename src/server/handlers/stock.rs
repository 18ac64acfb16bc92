//! Stock-photo search handler.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, reject};
use crate::remote::StockPhoto;
use crate::server::auth::authenticate;
use crate::server::state::AppState;
use crate::tools::background;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/stock/search?query= - Backdrop candidates.
pub async fn search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StockPhoto>>, ApiError> {
    authenticate(&state, &headers).await?;
    let photos = background::search(&state.stock, &query.query)
        .await
        .map_err(reject)?;
    Ok(Json(photos))
}
