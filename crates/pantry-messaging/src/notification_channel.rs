//! Fan-out channel for outcome notifications.
//!
//! Every subscriber sees every notification published after it subscribed.
//! Publishing with nobody listening is not an error: the notification is
//! dropped and a warning is logged.

use async_trait::async_trait;
use pantry_core::channel::{MessageSink, MessageSource};
use pantry_core::error::DomainError;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

/// Publishing side of the notification channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationSink {
    sender: broadcast::Sender<Vec<u8>>,
}

impl BroadcastNotificationSink {
    /// Creates a channel buffering up to `capacity` notifications per
    /// subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new subscription.
    #[must_use]
    pub fn subscribe(&self) -> NotificationSubscriber {
        NotificationSubscriber {
            inner: Mutex::new(self.sender.subscribe()),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl MessageSink for BroadcastNotificationSink {
    async fn send(&self, payload: Vec<u8>) -> Result<(), DomainError> {
        match self.sender.send(payload) {
            Ok(receivers) => debug!(receivers, "notification published"),
            Err(_) => warn!("no notification subscribers, notification dropped"),
        }
        Ok(())
    }
}

/// One subscription to the notification channel.
#[derive(Debug)]
pub struct NotificationSubscriber {
    inner: Mutex<broadcast::Receiver<Vec<u8>>>,
}

#[async_trait]
impl MessageSource for NotificationSubscriber {
    async fn receive(&self) -> Result<Option<Vec<u8>>, DomainError> {
        let mut receiver = self.inner.lock().await;
        loop {
            match receiver.recv().await {
                Ok(message) => return Ok(Some(message)),
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged, messages lost");
                }
            }
        }
    }
}
