//! Pantry Messaging — in-process transports for commands and notifications.
//!
//! Commands travel over a bounded multi-consumer queue; notifications fan
//! out to every subscriber.

pub mod command_channel;
pub mod notification_channel;
