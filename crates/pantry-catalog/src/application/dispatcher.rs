//! Command dispatcher.
//!
//! Consumes raw messages from the command channel, decodes them, routes each
//! command to its handler and turns the outcome into exactly one
//! notification. No error escapes [`CommandDispatcher::run`]: failures become
//! `*_ERROR` notifications and the consumer moves on to the next message.
//! Failed commands are neither retried nor re-enqueued.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pantry_core::channel::{MessageSink, MessageSource};
use pantry_core::command::Command;
use pantry_core::error::DomainError;
use tracing::{debug, error, info, instrument, warn};

use crate::application::codec::{DecodeError, decode_command};
use crate::application::command_handlers::{
    handle_create_product, handle_delete_product, handle_update_product,
};
use crate::application::notifications::{Notification, NotificationPublisher};
use crate::application::views::ProductView;
use crate::domain::commands::ProductCommand;
use crate::domain::repository::ProductStore;

/// Pause before polling the source again after a receive failure.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Routes commands to their handlers and publishes the outcomes.
///
/// Holds no per-command state, so any number of workers may share one
/// dispatcher.
#[derive(Clone)]
pub struct CommandDispatcher {
    store: Arc<dyn ProductStore>,
    publisher: NotificationPublisher,
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    /// Creates a dispatcher over a store and a notification sink.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, notifications: Arc<dyn MessageSink>) -> Self {
        Self {
            store,
            publisher: NotificationPublisher::new(notifications),
        }
    }

    /// Consumes `source` until it closes.
    pub async fn run(&self, source: &dyn MessageSource) {
        loop {
            match source.receive().await {
                Ok(Some(raw)) => {
                    if let Err(e) = self.process(&raw).await {
                        error!(error = %e, "failed to publish notification");
                    }
                }
                Ok(None) => {
                    info!("command channel closed, consumer stopping");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to receive command message");
                    tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Decodes and handles one raw message, then publishes its notification.
    ///
    /// Messages whose envelope cannot be read carry no command and are
    /// dropped without a notification.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if the notification cannot be sent.
    pub async fn process(&self, raw: &[u8]) -> Result<(), DomainError> {
        debug!(message = %String::from_utf8_lossy(raw), "incoming command message");
        let notification = match decode_command(raw) {
            Ok(command) => self.dispatch(command).await,
            Err(DecodeError::InvalidPayload { kind, source }) => {
                warn!(kind = %kind, error = %source, "rejecting command with invalid payload");
                Notification::failed(
                    kind,
                    &DomainError::Validation(format!("invalid {kind} command: {source}")),
                )
            }
            Err(err @ DecodeError::Malformed(_)) => {
                warn!(error = %err, "dropping undecodable command message");
                return Ok(());
            }
        };
        self.publisher.publish(&notification).await
    }

    /// Handles one decoded command and returns the notification describing
    /// its outcome. Never fails: errors become `*_ERROR` notifications.
    #[instrument(
        skip(self, command),
        fields(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            product_id = ?command.target_id(),
        )
    )]
    pub async fn dispatch(&self, command: ProductCommand) -> Notification {
        let kind = command.kind();
        let store = self.store.as_ref();
        let outcome = match command {
            ProductCommand::Create(create) => handle_create_product(&create, store)
                .await
                .and_then(|product| Notification::created(&ProductView::from(&product))),
            ProductCommand::Update(update) => handle_update_product(&update, store)
                .await
                .and_then(|product| Notification::updated(&ProductView::from(&product))),
            ProductCommand::Delete(delete) => handle_delete_product(&delete, store)
                .await
                .map(|name| Notification::removed(&name)),
        };

        match outcome {
            Ok(notification) => {
                info!(code = %notification.code(), "command handled");
                notification
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "command failed");
                Notification::failed(kind, &e)
            }
        }
    }
}
