//! Test channels — `MessageSource` and `MessageSink` implementations for
//! tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pantry_core::channel::{MessageSink, MessageSource};
use pantry_core::error::DomainError;

/// A source that yields a fixed queue of messages and then reports the
/// channel as closed.
#[derive(Debug, Default)]
pub struct QueuedMessageSource {
    messages: Mutex<VecDeque<Vec<u8>>>,
}

impl QueuedMessageSource {
    /// Create a source that will yield `messages` in order.
    #[must_use]
    pub fn new(messages: Vec<Vec<u8>>) -> Self {
        Self {
            messages: Mutex::new(messages.into()),
        }
    }
}

#[async_trait]
impl MessageSource for QueuedMessageSource {
    async fn receive(&self) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.messages.lock().unwrap().pop_front())
    }
}

/// A sink that records every message sent through it.
#[derive(Debug, Default)]
pub struct RecordingMessageSink {
    sent: Mutex<Vec<Vec<u8>>>,
}

impl RecordingMessageSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the raw messages sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the messages sent so far, parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if a recorded message is not valid JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|raw| serde_json::from_slice(raw).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessageSink for RecordingMessageSink {
    async fn send(&self, payload: Vec<u8>) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }
}

/// A sink that always fails with a transport error.
#[derive(Debug)]
pub struct FailingMessageSink;

#[async_trait]
impl MessageSink for FailingMessageSink {
    async fn send(&self, _payload: Vec<u8>) -> Result<(), DomainError> {
        Err(DomainError::Transport("broker unavailable".into()))
    }
}
