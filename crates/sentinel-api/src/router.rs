//! Route definitions for the Sentinel HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(alert_routes())
        .merge(notification_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Alert CRUD, the manual-check trigger, and the SSE stream.
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts",
            post(handlers::alert::create_alert).get(handlers::alert::list_alerts),
        )
        .route("/alerts/check", post(handlers::alert::manual_check))
        .route("/alerts/stream", get(handlers::stream::notification_stream))
        .route(
            "/alerts/{id}",
            get(handlers::alert::get_alert)
                .put(handlers::alert::update_alert)
                .delete(handlers::alert::delete_alert),
        )
}

/// Notification listing and read-state updates.
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/alerts/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/alerts/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
}

/// Health endpoint.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// CORS from configuration; an empty origin list means allow any.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
