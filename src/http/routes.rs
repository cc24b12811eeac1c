use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route(
            "/recordings",
            post(handlers::start_recording).get(handlers::list_recordings),
        )
        .route(
            "/recordings/:session_id",
            get(handlers::get_recording).delete(handlers::delete_recording),
        )
        .route(
            "/recordings/:session_id/fragments",
            post(handlers::upload_fragment),
        )
        .route("/recordings/:session_id/end", post(handlers::end_recording))
        // Export
        .route(
            "/recordings/:session_id/export",
            post(handlers::export_recording),
        )
        // Request logging and browser-client CORS
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
