//! HTTP request handlers

mod assets;
mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub use assets::{RefreshRequest, RefreshResponse, UploadResponse, MAX_UPLOAD_BYTES};

/// Builds the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/assets", post(assets::upload_asset))
        .route("/v1/assets/refresh", post(assets::refresh_url))
        .route("/v1/assets/{*key}", delete(assets::delete_asset))
        // Axum caps bodies at 2 MiB by default, below the upload limit.
        // Raise it past the limit so oversized files get a 413 with the
        // API envelope instead of a bare rejection.
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
}
