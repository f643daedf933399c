//! Background tasks: command consumers and the notification log.

use std::sync::Arc;

use pantry_catalog::application::dispatcher::CommandDispatcher;
use pantry_core::channel::MessageSource;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span};

/// Spawns `count` consumers sharing one command source.
///
/// Each consumer runs until the source reports that it is closed.
pub fn spawn_command_workers(
    count: usize,
    dispatcher: &CommandDispatcher,
    source: &Arc<dyn MessageSource>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            let dispatcher = dispatcher.clone();
            let source = Arc::clone(source);
            tokio::spawn(
                async move { dispatcher.run(source.as_ref()).await }
                    .instrument(info_span!("command_worker", worker)),
            )
        })
        .collect()
}

/// Spawns a task that logs every notification it receives.
pub fn spawn_notification_logger(subscriber: Box<dyn MessageSource>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match subscriber.receive().await {
                Ok(Some(raw)) => {
                    info!(notification = %String::from_utf8_lossy(&raw), "notification published");
                }
                Ok(None) => break,
                Err(e) => error!(error = %e, "failed to read notification"),
            }
        }
    })
}

/// Waits for every worker to finish.
pub async fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "worker task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_messaging::command_channel::command_channel;
    use pantry_test_support::{InMemoryProductStore, RecordingMessageSink};
    use serde_json::json;

    #[tokio::test]
    async fn test_workers_drain_channel_and_stop_when_it_closes() {
        // Arrange
        let store = Arc::new(InMemoryProductStore::default());
        let sink = Arc::new(RecordingMessageSink::new());
        let dispatcher = CommandDispatcher::new(store.clone(), sink.clone());
        let (sender, receiver) = command_channel(8);
        let source: Arc<dyn MessageSource> = Arc::new(receiver);

        // Act
        let handles = spawn_command_workers(3, &dispatcher, &source);
        for name in ["Apple", "Bread", "Cheese"] {
            let command = json!({
                "kind": "create",
                "payload": { "name": name, "kcal": 1.0, "type": "OTHER" }
            });
            sender
                .send(serde_json::to_vec(&command).unwrap())
                .await
                .unwrap();
        }
        drop(sender);
        join_all(handles).await;

        // Assert
        assert_eq!(store.product_count(), 3);
        assert_eq!(sink.sent().len(), 3);
    }
}
