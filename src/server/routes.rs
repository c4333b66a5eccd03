//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;
use crate::services::MAX_UPLOAD_BYTES;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/process", post(handlers::process_document))
        .route("/ask", get(handlers::ask))
        .route("/files/*path", get(handlers::serve_file))
        // Leave headroom over the application limit so oversize uploads
        // reach the handler and get the structured 413 instead of the
        // framework's.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
