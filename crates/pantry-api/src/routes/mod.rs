//! HTTP routes.

pub mod commands;
pub mod health;
pub mod products;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(commands::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
