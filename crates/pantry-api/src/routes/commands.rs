//! Command ingress.
//!
//! The body is forwarded untouched onto the command channel and the request
//! returns as soon as it is queued. The outcome is only ever reported on the
//! notification channel.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Acknowledgement returned once a command is queued.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    /// Always `accepted`.
    pub status: &'static str,
}

/// POST /api/v1/products/commands
#[instrument(skip(state, body), fields(bytes = body.len()))]
async fn submit_command(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    state.command_sender.send(body.to_vec()).await?;
    info!("command queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { status: "accepted" }),
    ))
}

/// Returns the command ingress router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/products/commands", post(submit_command))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use pantry_core::channel::MessageSource;
    use pantry_messaging::command_channel::command_channel;
    use pantry_test_support::InMemoryProductStore;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::routes;

    fn post_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/products/commands")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_command_is_queued_verbatim_and_accepted() {
        // Arrange
        let (sender, receiver) = command_channel(4);
        let app = routes::app(AppState::new(
            Arc::new(InMemoryProductStore::default()),
            sender,
        ));
        let body = r#"{"kind":"delete","payload":{"id":"00000000-0000-0000-0000-000000000000"}}"#;

        // Act
        let response = app.oneshot(post_request(body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(receiver.receive().await.unwrap(), Some(body.as_bytes().to_vec()));
    }

    #[tokio::test]
    async fn test_closed_pipeline_returns_503() {
        let (sender, receiver) = command_channel(1);
        drop(receiver);
        let app = routes::app(AppState::new(
            Arc::new(InMemoryProductStore::default()),
            sender,
        ));

        let response = app.oneshot(post_request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "transport_error");
    }
}
