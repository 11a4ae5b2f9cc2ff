use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Upload hand-off and progress
        .route(
            "/uploads",
            post(handlers::start_upload).get(handlers::list_uploads),
        )
        .route("/uploads/:upload_id", get(handlers::get_upload))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
