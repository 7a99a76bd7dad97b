//! # HTTP Server for the Card Designer
//!
//! Exposes the design editor, card and sheet previews, and the export
//! pipeline over JSON/HTTP.
//!
//! ## Usage
//!
//! ```bash
//! carnet serve --listen 0.0.0.0:8080 --roster-file roster.json
//! ```
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/health` | GET | Liveness and exporter state |
//! | `/api/design` | GET, PUT, PATCH | Read, replace or patch the design |
//! | `/api/design/elements/:id` | PATCH | Update one element |
//! | `/api/design/elements/:id/move` | POST | Move one element |
//! | `/api/design/drag` | POST | Drag gesture events |
//! | `/api/design/logo` | POST | Multipart logo upload |
//! | `/api/design/preview` | GET | Card preview PNG (`?layout=true&grid=true` for layout mode) |
//! | `/api/export/settings` | GET, PUT | Export settings |
//! | `/api/export/sheet` | GET | Page preview PNG |
//! | `/api/export` | POST | Run an export, returns the artifact |
//! | `/api/export/cancel` | POST | Cancel the running export |

mod handlers;
mod state;

pub use crate::config::ServerConfig;
pub use state::AppState;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::CarnetError;

/// Largest accepted logo upload.
const MAX_LOGO_BYTES: usize = 10 * 1024 * 1024;

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Design API
        .route(
            "/api/design",
            get(handlers::design::get)
                .put(handlers::design::replace)
                .patch(handlers::design::patch),
        )
        .route(
            "/api/design/elements/:id",
            axum::routing::patch(handlers::design::patch_element),
        )
        .route(
            "/api/design/elements/:id/move",
            post(handlers::design::move_element),
        )
        .route("/api/design/drag", post(handlers::design::drag))
        .route(
            "/api/design/logo",
            post(handlers::design::upload_logo).layer(DefaultBodyLimit::max(MAX_LOGO_BYTES)),
        )
        .route("/api/design/preview", get(handlers::design::preview))
        // Export API
        .route(
            "/api/export/settings",
            get(handlers::export::get_settings).put(handlers::export::put_settings),
        )
        .route("/api/export/sheet", get(handlers::export::sheet))
        .route("/api/export", post(handlers::export::trigger))
        .route("/api/export/cancel", post(handlers::export::cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "exporting": state.exporter.is_exporting(),
    }))
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use carnet::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), carnet::error::CarnetError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CarnetError> {
    let listen_addr = config.listen_addr.clone();
    tracing::info!(roster = ?config.roster, fonts = ?config.font_dir, "Loading server state");
    let app = router(Arc::new(AppState::from_config(config)?));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await.map_err(|e| {
        CarnetError::Config(format!("Failed to bind to {}: {}", listen_addr, e))
    })?;
    tracing::info!(addr = %listen_addr, "Carnet HTTP server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
