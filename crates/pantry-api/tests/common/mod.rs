//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pantry_catalog::application::dispatcher::CommandDispatcher;
use pantry_catalog::domain::repository::ProductStore;
use pantry_core::channel::MessageSource;
use pantry_messaging::command_channel::command_channel;
use pantry_messaging::notification_channel::{BroadcastNotificationSink, NotificationSubscriber};
use pantry_store::pg_product_store::PgProductStore;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use pantry_api::routes;
use pantry_api::state::AppState;
use pantry_api::worker;

/// The whole service wired against a test database: router, one command
/// worker and a subscription to the notification channel.
pub struct TestService {
    pub app: Router,
    pub notifications: NotificationSubscriber,
    pub workers: Vec<JoinHandle<()>>,
}

impl TestService {
    /// Waits for the next published notification.
    pub async fn next_notification(&self) -> serde_json::Value {
        let raw = tokio::time::timeout(Duration::from_secs(5), self.notifications.receive())
            .await
            .expect("no notification within 5s")
            .unwrap()
            .expect("notification channel closed");
        serde_json::from_slice(&raw).unwrap()
    }
}

/// Build the full app with a real `PgProductStore` and running workers.
/// Uses the same wiring as `main.rs`.
pub fn start_service(pool: PgPool) -> TestService {
    let store: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool));
    let sink = Arc::new(BroadcastNotificationSink::new(64));
    let notifications = sink.subscribe();
    let (sender, receiver) = command_channel(64);

    let dispatcher = CommandDispatcher::new(Arc::clone(&store), sink);
    let source: Arc<dyn MessageSource> = Arc::new(receiver);
    let workers = worker::spawn_command_workers(1, &dispatcher, &source);

    TestService {
        app: routes::app(AppState::new(store, sender)),
        notifications,
        workers,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or_default();

    (status, json)
}
