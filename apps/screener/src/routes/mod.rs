pub mod contact;
pub mod health;
pub mod status;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::config::MAX_UPLOAD_BYTES;
use crate::render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { render::index() }))
        .route("/health", get(health::health_handler))
        .route("/static/style.css", get(|| async { render::stylesheet() }))
        // Screening flow
        .route("/upload", post(upload::handle_upload))
        .route("/status/:session_id", get(status::handle_status))
        .route("/results/:session_id", get(status::handle_results))
        .route("/processing/:session_id", get(status::handle_processing))
        .route("/contact", post(contact::handle_contact))
        .fallback(|| async { render::not_found() })
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
