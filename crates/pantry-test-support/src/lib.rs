//! Shared test mocks and utilities for the Pantry product catalog.

mod channel;
mod clock;
mod store;

pub use channel::{FailingMessageSink, QueuedMessageSource, RecordingMessageSink};
pub use clock::{FixedClock, SteppingClock};
pub use store::{ContendedProductStore, FailingProductStore, InMemoryProductStore};
