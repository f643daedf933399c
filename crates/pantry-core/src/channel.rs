//! Message channel abstractions.
//!
//! Commands arrive as opaque payloads on a [`MessageSource`]; outcome
//! notifications leave through a [`MessageSink`]. Decoding and encoding are
//! the concern of the bounded context, not of the transport.

use async_trait::async_trait;

use crate::error::DomainError;

/// Inbound side of an asynchronous channel.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Waits for the next message.
    ///
    /// Returns `Ok(None)` once the channel is closed and drained.
    async fn receive(&self) -> Result<Option<Vec<u8>>, DomainError>;
}

/// Outbound side of an asynchronous channel.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Emits one message.
    async fn send(&self, payload: Vec<u8>) -> Result<(), DomainError>;
}
