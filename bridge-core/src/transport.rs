//! Addressing and publishing on the cross-context transport.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::protocol::BridgeEvent;

/// Logic-side handler for page scroll positions.
pub const ON_PAGE_SCROLL: &str = "onPageScroll";
/// Logic-side handler for reach-bottom crossings.
pub const ON_REACH_BOTTOM: &str = "onReachBottom";
/// Logic-side handler for selected-text-range replies.
pub const ON_GET_SELECTED_TEXT_RANGE: &str = "onGetSelectedTextRange";
/// View-side subscription answering selected-text-range requests.
pub const GET_SELECTED_TEXT_RANGE: &str = "getSelectedTextRange";

/// Identity of the native container hosting a page.
///
/// Outbound events and subscriptions are addressed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportId(String);

impl TransportId {
    /// Create a transport identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransportId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TransportId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TransportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sink for outbound bridge events.
pub trait Publisher {
    /// Publish one event to the logic context.
    fn publish(&mut self, event: BridgeEvent);
}

impl Publisher for broadcast::Sender<BridgeEvent> {
    fn publish(&mut self, event: BridgeEvent) {
        // No receivers is fine; the logic side may not be listening yet.
        let _ = self.send(event);
    }
}

impl Publisher for Vec<BridgeEvent> {
    fn publish(&mut self, event: BridgeEvent) {
        self.push(event);
    }
}

/// Per-page subscriptions keyed by `"<transportId>.<eventName>"`.
///
/// Subscribing is idempotent: a page's subscription is installed at most once.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    keys: HashSet<String>,
}

impl Subscriptions {
    /// Create an empty subscription set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscription key for `event` on `page`.
    #[must_use]
    pub fn key(page: &TransportId, event: &str) -> String {
        format!("{page}.{event}")
    }

    /// Install a subscription. Returns `false` if it was already installed.
    pub fn subscribe(&mut self, page: &TransportId, event: &str) -> bool {
        let installed = self.keys.insert(Self::key(page, event));
        if installed {
            tracing::debug!(page = %page, event, "Subscribe");
        }
        installed
    }

    /// Whether `page` is subscribed to `event`.
    #[must_use]
    pub fn is_subscribed(&self, page: &TransportId, event: &str) -> bool {
        self.keys.contains(&Self::key(page, event))
    }

    /// Drop every subscription belonging to `page`.
    pub fn remove_page(&mut self, page: &TransportId) {
        let prefix = format!("{page}.");
        self.keys.retain(|key| !key.starts_with(&prefix));
    }

    /// Number of installed subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no subscriptions are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
