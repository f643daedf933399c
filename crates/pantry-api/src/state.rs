//! Shared application state.

use std::fmt;
use std::sync::Arc;

use pantry_catalog::domain::repository::ProductStore;
use pantry_messaging::command_channel::CommandSender;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read side of the catalog.
    pub product_store: Arc<dyn ProductStore>,
    /// Ingress into the command pipeline.
    pub command_sender: CommandSender,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("command_sender", &self.command_sender)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(product_store: Arc<dyn ProductStore>, command_sender: CommandSender) -> Self {
        Self {
            product_store,
            command_sender,
        }
    }
}
