//! Command abstractions.

use uuid::Uuid;

/// A request to change catalog state, as carried on the command channel.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable dotted name used in logs and spans.
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The aggregate this command addresses. `None` when the command
    /// creates a new one.
    fn target_id(&self) -> Option<Uuid>;
}
