//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The targeted aggregate does not exist.
    #[error("product not found by id {0}")]
    NotFound(Uuid),

    /// Optimistic concurrency conflict: the write was based on a stale version.
    #[error("concurrent modification of product {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrentModification {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer read.
        expected: i64,
        /// The version currently persisted.
        actual: i64,
    },

    /// An invariant violation in command input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A channel send or receive failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
