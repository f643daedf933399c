//! Aggregate root abstraction.

use uuid::Uuid;

/// Trait for aggregate roots persisted as current state under optimistic
/// concurrency control.
pub trait AggregateRoot: Send + Sync {
    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the persisted version. Starts at 0 and grows by one on every
    /// successful update.
    fn version(&self) -> i64;
}
