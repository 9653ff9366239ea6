//! Host configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BRIDGE_PORT` | 9474 |
//! | `BRIDGE_FRAME_INTERVAL_MS` | 16 (0 = frames only on explicit `frame` commands) |
//! | `BRIDGE_EVENT_CAPACITY` | 256 |
//! | `WS_MAX_MESSAGE_BYTES` | 65536 |
//!
//! Missing or malformed values fall back to the default.

use std::time::Duration;

use bridge_core::ViewConfig;

/// Default port for the bridge host.
pub const DEFAULT_PORT: u16 = 9474;

/// Default frame interval in milliseconds.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Default outbound event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default maximum inbound WebSocket message size in bytes.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Host process configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Port to bind on localhost.
    pub port: u16,
    /// Frame interval in milliseconds; 0 disables the ticker.
    pub frame_interval_ms: u64,
    /// Outbound event channel capacity.
    pub event_capacity: usize,
    /// Maximum inbound WebSocket message size in bytes.
    pub max_message_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl HostConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            default: T,
        ) -> T {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        }

        Self {
            port: parse(&lookup, "BRIDGE_PORT", DEFAULT_PORT),
            frame_interval_ms: parse(&lookup, "BRIDGE_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS),
            event_capacity: parse(&lookup, "BRIDGE_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY).max(1),
            max_message_bytes: parse(&lookup, "WS_MAX_MESSAGE_BYTES", DEFAULT_MAX_MESSAGE_BYTES),
        }
    }

    /// View context tuning derived from this configuration.
    #[must_use]
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            frame_interval: (self.frame_interval_ms > 0)
                .then(|| Duration::from_millis(self.frame_interval_ms)),
            event_capacity: self.event_capacity,
            ..ViewConfig::default()
        }
    }
}
