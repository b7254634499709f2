//! Route definitions for the API server

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // The dashboard front end is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dataset
        .route("/fields", get(handlers::list_fields))
        .route("/records", get(handlers::get_records))
        // Comparison, statistics and indicators
        .route("/compare/:field", get(handlers::compare_field))
        .route("/statistics/:field", get(handlers::field_statistics))
        .route("/indicators/:field/:indicator", get(handlers::get_indicator))
        // Overview panels
        .route("/correlation", get(handlers::correlation_matrix))
        .route("/heatmap", get(handlers::spread_heat_map))
        .route("/volatility", get(handlers::volatility_panel))
        // Settings
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/settings/reset", post(handlers::reset_settings))
        // Layout
        .route("/layout", get(handlers::get_layout))
        .route("/layout/reset", post(handlers::reset_layout))
        .route("/layout/:view/move", post(handlers::move_section))
        .route(
            "/layout/:view/toggle/:section",
            post(handlers::toggle_section),
        )
        .route("/layout/:view/active", get(handlers::active_sections))
        // Comments
        .route("/comments", get(handlers::list_commented_sections))
        .route(
            "/comments/:section",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route(
            "/comment/:id",
            put(handlers::edit_comment).delete(handlers::delete_comment),
        )
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
