//! Liveness endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` while commands are accepted, `degraded` once the pipeline is down.
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.command_sender.is_closed() {
        "degraded"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
