//! Error types for bridge operations.

use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while applying bridge commands.
///
/// Looking up a node that does not exist is not an error; the registry
/// returns `None` and the caller decides what to do.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A page bootstrap record is missing a field required by a requested feature.
    #[error("Malformed bootstrap payload: {0}")]
    MalformedBootstrap(String),

    /// A widget constructor rejected its initial attributes.
    #[error("Failed to construct <{tag}>: {reason}")]
    Construction {
        /// Tag of the widget being built.
        tag: String,
        /// Why construction failed.
        reason: String,
    },

    /// A page with this transport identity is already bootstrapped.
    #[error("Page already exists: {0}")]
    PageExists(String),

    /// No page is registered under this transport identity.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Wire message serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The other side of the transport has gone away.
    #[error("Transport closed")]
    TransportClosed,
}

impl BridgeError {
    /// Build a construction failure for `tag`.
    pub fn construction(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}
