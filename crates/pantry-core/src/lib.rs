//! Pantry Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the catalog
//! context and its adapters depend on. It contains no infrastructure code.

pub mod aggregate;
pub mod channel;
pub mod clock;
pub mod command;
pub mod error;
