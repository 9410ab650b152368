//! # itemdb HTTP API Module
//!
//! This module implements the HTTP server using axum. The server holds one
//! catalogue in memory; archives move in and out as raw zip bodies.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Store counts
//! - `GET /document` - The catalogue document as JSON
//! - `GET /export` - Download the catalogue archive
//! - `POST /import` - Replace the catalogue with an uploaded archive
//!
//! ## Configuration (Environment Variables)
//!
//! - `ITEMDB_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `itemdb::api::*`)
pub use handlers::{
    document_handler, export_handler, health_handler, import_handler, status_for, status_handler,
};
pub use types::{ErrorResponse, HealthResponse, ImportResponse};

use crate::config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use itemdb_core::{ArchiveOptions, ItemDatabase, ItemDbError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Request handling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// Codec options applied to uploads.
    pub options: ArchiveOptions,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
}

impl ApiSettings {
    /// Settings taken from the `[import]` and `[server]` config sections.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            options: config.archive_options(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Shared server state.
///
/// The lock serializes mutation: an import swaps the whole catalogue under
/// the write guard, while status and export share read guards.
#[derive(Clone)]
pub struct AppState {
    /// The catalogue being served.
    pub catalogue: Arc<RwLock<ItemDatabase>>,
    pub settings: ApiSettings,
}

impl AppState {
    /// Create new app state around a catalogue.
    #[must_use]
    pub fn new(catalogue: ItemDatabase, settings: ApiSettings) -> Self {
        Self {
            catalogue: Arc::new(RwLock::new(catalogue)),
            settings,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `ITEMDB_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("ITEMDB_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (ITEMDB_CORS_ORIGINS=*)");
            CorsLayer::permissive().expose_headers([header::CONTENT_DISPOSITION])
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in ITEMDB_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No ITEMDB_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - rejects oversized uploads with 413
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();
    let body_limit = state.settings.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/document", get(handlers::document_handler))
        .route("/export", get(handlers::export_handler))
        .route("/import", post(handlers::import_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    catalogue: ItemDatabase,
    settings: ApiSettings,
) -> Result<(), ItemDbError> {
    let state = AppState::new(catalogue, settings);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ItemDbError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("itemdb HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ItemDbError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
