//! Axum router configuration with middleware.
//!
//! REST routes are under `/api/v1/`; the realtime gateway upgrades at `/ws`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chats
        .route("/chats", post(handlers::chat::create_chat))
        .route("/chats/{id}", get(handlers::chat::get_chat))
        .route(
            "/chats/{id}/messages",
            get(handlers::chat::get_messages).post(handlers::chat::send_message),
        )
        // User-scoped chat listing
        .route("/users/{id}/chats", get(handlers::chat::list_chats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
