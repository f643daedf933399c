//! Application layer for the Product Catalog context.

pub mod codec;
pub mod command_handlers;
pub mod dispatcher;
pub mod notifications;
pub mod query_handlers;
pub mod views;
