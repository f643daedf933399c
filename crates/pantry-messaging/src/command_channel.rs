//! Bounded command queue shared by a pool of consumers.
//!
//! Each message is delivered to exactly one consumer. The channel closes once
//! every [`CommandSender`] is dropped; consumers then drain what is left and
//! observe the close as `Ok(None)`.

use async_trait::async_trait;
use pantry_core::channel::{MessageSink, MessageSource};
use pantry_core::error::DomainError;
use tokio::sync::{Mutex, mpsc};

/// Creates a command channel holding at most `capacity` pending messages.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        CommandSender { inner: tx },
        CommandReceiver {
            inner: Mutex::new(rx),
        },
    )
}

/// Producer half of the command channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandSender {
    inner: mpsc::Sender<Vec<u8>>,
}

impl CommandSender {
    /// Enqueues a raw command, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if every consumer has gone away.
    pub async fn send(&self, payload: Vec<u8>) -> Result<(), DomainError> {
        self.inner
            .send(payload)
            .await
            .map_err(|_| DomainError::Transport("command channel closed".to_owned()))
    }

    /// Whether the consumer side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[async_trait]
impl MessageSink for CommandSender {
    async fn send(&self, payload: Vec<u8>) -> Result<(), DomainError> {
        CommandSender::send(self, payload).await
    }
}

/// Consumer half of the command channel.
///
/// Shared between workers behind an `Arc`; whichever worker holds the lock
/// takes the next message.
#[derive(Debug)]
pub struct CommandReceiver {
    inner: Mutex<mpsc::Receiver<Vec<u8>>>,
}

#[async_trait]
impl MessageSource for CommandReceiver {
    async fn receive(&self) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.inner.lock().await.recv().await)
    }
}
