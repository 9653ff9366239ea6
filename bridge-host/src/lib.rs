//! # View Bridge Host Library
//!
//! Shared types for the host binary and its integration tests.

use bridge_core::ViewHandle;

pub mod config;
pub mod health;
pub mod routes;
pub mod socket;

pub use config::HostConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the view context task.
    pub view: ViewHandle,
    /// Host configuration.
    pub config: HostConfig,
}

impl AppState {
    /// Get a reference to the view handle.
    #[must_use]
    pub fn view(&self) -> &ViewHandle {
        &self.view
    }
}
