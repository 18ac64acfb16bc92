//! # HTTP Service
//!
//! Uploads, project records, exports and the media files behind them.
//!
//! ## Usage
//!
//! ```bash
//! pixxel serve --listen 0.0.0.0:8080 --token secret=Ada:ada@example.com
//! ```
//!
//! Every `/api` route expects `Authorization: Bearer <token>`.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/api/upload` | POST | multipart image upload |
//! | `/api/projects` | GET, POST | list / create |
//! | `/api/projects/:id` | GET, PATCH, DELETE | read / update / delete |
//! | `/api/projects/:id/export` | POST | encoded image, `?format=` |
//! | `/api/projects/:id/preview` | GET | PNG at display size |
//! | `/api/stock/search` | GET | stock backdrops, `?query=` |
//! | `/api/me` | GET | user record and plan |
//! | `/media/*path` | GET | stored uploads |

mod auth;
mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{PixxelError, Result};
use handlers::upload::MAX_UPLOAD_BYTES;

/// Routes over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/upload",
            // Multipart framing needs headroom above the file itself.
            post(handlers::upload::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route(
            "/api/projects",
            get(handlers::projects::list).post(handlers::projects::create),
        )
        .route(
            "/api/projects/:id",
            get(handlers::projects::get)
                .patch(handlers::projects::update)
                .delete(handlers::projects::delete),
        )
        .route("/api/projects/:id/export", post(handlers::export::export))
        .route("/api/projects/:id/preview", get(handlers::export::preview))
        .route("/api/stock/search", get(handlers::stock::search))
        .route("/api/me", get(handlers::me::me))
        .route("/media/*path", get(handlers::media::serve_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use pixxel::config::{EditorConfig, ServerConfig, StockPhotoConfig};
/// use pixxel::server::serve;
///
/// # async fn example() -> pixxel::Result<()> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     public_url: "http://localhost:8080".to_string(),
///     media_dir: "media".into(),
///     data_file: None,
///     tokens: Vec::new(),
///     editor: EditorConfig::default(),
///     stock: StockPhotoConfig::default(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.media_dir).await?;
    let listen_addr = config.listen_addr.clone();
    if config.tokens.is_empty() {
        tracing::warn!("No bearer tokens configured; every API call will be rejected");
    }
    let state = Arc::new(AppState::new(config).await?);

    tracing::info!(
        listen = %listen_addr,
        public_url = %state.config.public_url,
        media_dir = %state.config.media_dir.display(),
        stock_photos = state.stock.is_configured(),
        "pixxel server starting"
    );

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| PixxelError::Remote(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| PixxelError::Remote(format!("Server error: {}", e)))?;

    Ok(())
}
