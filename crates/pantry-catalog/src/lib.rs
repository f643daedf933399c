//! Pantry — Product Catalog bounded context.
//!
//! Responsible for the product aggregate and its custom properties, the
//! asynchronous create/update/delete command pipeline, and the outcome
//! notifications it publishes.

pub mod application;
pub mod domain;
