//! WebSocket transport between a remote logic context and the view context.
//!
//! Each inbound text frame is one [`Command`]. Every outbound [`BridgeEvent`] is
//! forwarded as a text frame. Frames the host itself produces carry a `"type"`
//! tag (`welcome`, `error`) so clients can tell them apart from bridge events,
//! which carry `"event"`.

use axum::extract::ws::{Message, WebSocket};
use bridge_core::{BridgeError, Command, ViewHandle};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Frames produced by the host rather than the view context.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostFrame {
    /// Sent once on connect.
    Welcome {
        /// Host version.
        version: String,
        /// Connection identity.
        connection_id: String,
    },
    /// An inbound frame was rejected.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

/// Why an inbound frame was rejected.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame exceeds the configured size limit.
    #[error("Message too large: {size} bytes exceeds limit of {max}")]
    TooLarge {
        /// Frame size.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// The frame is not a valid command.
    #[error("Invalid command: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FrameError {
    /// Error code sent to the client.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "message_too_large",
            Self::Parse(_) => "parse_error",
        }
    }
}

impl From<&FrameError> for HostFrame {
    fn from(e: &FrameError) -> Self {
        Self::Error {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Parse one inbound text frame.
///
/// # Errors
///
/// Returns [`FrameError`] if the frame is oversized or not a valid command.
pub fn parse_command(text: &str, max_bytes: usize) -> Result<Command, FrameError> {
    if text.len() > max_bytes {
        return Err(FrameError::TooLarge {
            size: text.len(),
            max: max_bytes,
        });
    }
    Ok(serde_json::from_str(text)?)
}

async fn send_json<S, T>(sender: &mut S, value: &T) -> bool
where
    S: SinkExt<Message> + Unpin,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize outbound frame");
            true
        }
    }
}

/// Drive one bridge connection until either side goes away.
pub async fn handle_bridge_socket(socket: WebSocket, view: ViewHandle, max_message_bytes: usize) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = Uuid::new_v4().to_string();

    // Subscribe before anything is applied so no event is missed.
    let mut event_rx = view.subscribe();

    let welcome = HostFrame::Welcome {
        version: env!("CARGO_PKG_VERSION").to_string(),
        connection_id: connection_id.clone(),
    };
    if !send_json(&mut sender, &welcome).await {
        return;
    }
    tracing::info!(connection_id = %connection_id, "Bridge connection opened");

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let command = match parse_command(&text, max_message_bytes) {
                            Ok(command) => command,
                            Err(e) => {
                                tracing::warn!(connection_id = %connection_id, error = %e, "Frame rejected");
                                if !send_json(&mut sender, &HostFrame::from(&e)).await {
                                    break;
                                }
                                continue;
                            }
                        };

                        tracing::debug!(connection_id = %connection_id, command = command.name(), "Command received");
                        if let Err(BridgeError::TransportClosed) = view.send(command).await {
                            tracing::warn!(connection_id = %connection_id, "View context stopped");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(connection_id = %connection_id, "Bridge connection closed by peer");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !send_json(&mut sender, &event).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(connection_id = %connection_id, skipped = n, "Bridge connection lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(connection_id = %connection_id, "Event channel closed");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(connection_id = %connection_id, "Bridge connection finished");
}
