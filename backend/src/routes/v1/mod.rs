pub mod images;

use axum::{routing::post, Router};

use crate::state::AppState;

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> Router<AppState> {
    Router::new().route("/images/generations", post(images::generate_image))
}
