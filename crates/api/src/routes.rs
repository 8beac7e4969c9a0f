//! Route table.

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the router with CORS open to any origin.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/resolve-action", post(handlers::resolve_action))
        .route("/plan-action", post(handlers::plan_action))
        .route("/pair-address", get(handlers::pair_address))
        .route("/pair-data", get(handlers::pair_data))
        .route("/swap-history", get(handlers::swap_history))
        .route("/quote", get(handlers::quote))
        .route("/pools", get(handlers::list_pools))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
