//! Pantry API — HTTP surface, command workers and process wiring.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod worker;
