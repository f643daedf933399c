//! Pantry API server entry point.

use std::sync::Arc;

use pantry_api::config::AppConfig;
use pantry_api::error::AppError;
use pantry_api::routes;
use pantry_api::state::AppState;
use pantry_api::telemetry::Telemetry;
use pantry_api::worker;
use pantry_catalog::application::dispatcher::CommandDispatcher;
use pantry_catalog::domain::repository::ProductStore;
use pantry_core::channel::MessageSource;
use pantry_messaging::command_channel::command_channel;
use pantry_messaging::notification_channel::BroadcastNotificationSink;
use pantry_store::pg_product_store::PgProductStore;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = Telemetry::init(config.otlp_endpoint.as_deref())?;

    let result = serve(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "server terminated");
    }

    telemetry.shutdown();
    result
}

async fn serve(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Pantry API server");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool));
    let notifications = Arc::new(BroadcastNotificationSink::new(
        config.notification_channel_capacity,
    ));
    let (command_sender, command_receiver) = command_channel(config.command_channel_capacity);

    let notification_log = worker::spawn_notification_logger(Box::new(notifications.subscribe()));
    let dispatcher = CommandDispatcher::new(Arc::clone(&store), notifications.clone());
    let source: Arc<dyn MessageSource> = Arc::new(command_receiver);
    let workers = worker::spawn_command_workers(config.command_workers, &dispatcher, &source);
    tracing::info!(workers = config.command_workers, "command workers started");

    let app = routes::app(AppState::new(store, command_sender))
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // The router owns the last command sender; once it is dropped the
    // workers drain the queue and stop.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining command queue");
    worker::join_all(workers).await;

    drop(dispatcher);
    drop(notifications);
    worker::join_all(vec![notification_log]).await;

    tracing::info!("Pantry API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
