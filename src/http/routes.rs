use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Voice turns
        .route("/api/chat", post(handlers::chat))
        // Roleplay catalog and language list for clients
        .route("/api/scenarios", get(handlers::list_scenarios))
        .route("/api/languages", get(handlers::list_languages))
        .layer(
            ServiceBuilder::new()
                // Add tracing middleware for request logging
                .layer(TraceLayer::new_for_http())
                // Browser clients are served from a different origin
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
