//! # Bridge wire protocol
//!
//! JSON messages exchanged between the logic and view contexts.
//!
//! ## Logic -> View
//!
//! - `{"type": "create_page", "page": "1", "data": {...}}`
//! - `{"type": "create_node", "page": "1", "id": 3, "tag": "view", "parent_id": 0, "attributes": {...}}`
//! - `{"type": "remove_node", "page": "1", "id": 3}`
//! - `{"type": "subscribe", "page": "1", "event": "getSelectedTextRange"}`
//! - `{"type": "get_selected_text_range", "page": "1", "callback_id": 7}`
//! - `{"type": "destroy_page", "page": "1"}`
//!
//! ## Native surface -> View
//!
//! - `{"type": "scroll", "page": "1", "scroll_top": 120, "viewport_height": 600, "content_height": 2000}`
//! - `{"type": "touch_move", "page": "1"}`
//! - `{"type": "focus", "page": "1", "id": 5, "selection_start": 0, "selection_end": 2}`
//! - `{"type": "frame"}`
//!
//! ## View -> Logic
//!
//! - `{"page": "1", "event": "onPageScroll", "payload": {"scrollTop": 120}}`
//! - `{"page": "1", "event": "onReachBottom"}`
//! - `{"page": "1", "event": "onGetSelectedTextRange", "payload": {"callbackId": 7, "data": {...}}}`
//! - `{"page": "1", "event": "error", "payload": {"message": "..."}}`

use serde::{Deserialize, Serialize};

use crate::node::{wire_parent, Attributes, NodeId};
use crate::page::PageCreateData;
use crate::scroll::ScrollSignal;
use crate::transport::TransportId;

/// A command applied by the view context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Bootstrap a page.
    CreatePage {
        /// Target page.
        page: TransportId,
        /// Bootstrap record.
        data: PageCreateData,
    },
    /// Create a node.
    CreateNode {
        /// Target page.
        page: TransportId,
        /// Node identity.
        id: NodeId,
        /// Tag name.
        tag: String,
        /// Parent identity, `-1` for none.
        #[serde(default, with = "wire_parent")]
        parent_id: Option<NodeId>,
        /// Initial attributes.
        #[serde(default)]
        attributes: Attributes,
    },
    /// Remove a node.
    RemoveNode {
        /// Target page.
        page: TransportId,
        /// Node identity.
        id: NodeId,
    },
    /// Install a view-side subscription for a page.
    Subscribe {
        /// Target page.
        page: TransportId,
        /// Event name.
        event: String,
    },
    /// Ask for the focused field's selection range.
    GetSelectedTextRange {
        /// Target page.
        page: TransportId,
        /// Logic-side callback to answer.
        callback_id: u64,
    },
    /// Tear a page down.
    DestroyPage {
        /// Target page.
        page: TransportId,
    },
    /// Native scroll signal.
    Scroll {
        /// Target page.
        page: TransportId,
        /// Vertical scroll offset.
        scroll_top: f64,
        /// Viewport height.
        viewport_height: f64,
        /// Scrollable content height.
        content_height: f64,
    },
    /// Native touch-move signal.
    TouchMove {
        /// Target page.
        page: TransportId,
    },
    /// Native focus change.
    Focus {
        /// Target page.
        page: TransportId,
        /// Focused node, or `None` to blur.
        #[serde(default)]
        id: Option<NodeId>,
        /// Selection start.
        #[serde(default)]
        selection_start: Option<u32>,
        /// Selection end.
        #[serde(default)]
        selection_end: Option<u32>,
    },
    /// Rendering frame boundary.
    Frame,
}

impl Command {
    /// The page a command targets, if any.
    #[must_use]
    pub fn page(&self) -> Option<&TransportId> {
        match self {
            Self::CreatePage { page, .. }
            | Self::CreateNode { page, .. }
            | Self::RemoveNode { page, .. }
            | Self::Subscribe { page, .. }
            | Self::GetSelectedTextRange { page, .. }
            | Self::DestroyPage { page }
            | Self::Scroll { page, .. }
            | Self::TouchMove { page }
            | Self::Focus { page, .. } => Some(page),
            Self::Frame => None,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatePage { .. } => "create_page",
            Self::CreateNode { .. } => "create_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::Subscribe { .. } => "subscribe",
            Self::GetSelectedTextRange { .. } => "get_selected_text_range",
            Self::DestroyPage { .. } => "destroy_page",
            Self::Scroll { .. } => "scroll",
            Self::TouchMove { .. } => "touch_move",
            Self::Focus { .. } => "focus",
            Self::Frame => "frame",
        }
    }

    /// Build a scroll command from a signal.
    #[must_use]
    pub fn scroll(page: TransportId, signal: ScrollSignal) -> Self {
        Self::Scroll {
            page,
            scroll_top: signal.scroll_top,
            viewport_height: signal.viewport_height,
            content_height: signal.content_height,
        }
    }
}

/// Selection range of the focused text field.
///
/// Empty when the focused element is not a text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTextRange {
    /// Selection start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Selection end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

/// An event published to the logic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum OutboundEvent {
    /// Page scroll position.
    #[serde(rename = "onPageScroll")]
    PageScroll {
        /// Vertical scroll offset.
        #[serde(rename = "scrollTop")]
        scroll_top: f64,
    },
    /// The page scrolled past its reach-bottom threshold.
    #[serde(rename = "onReachBottom")]
    ReachBottom,
    /// Reply to a selected-text-range request.
    #[serde(rename = "onGetSelectedTextRange")]
    SelectedTextRange {
        /// Callback being answered.
        #[serde(rename = "callbackId")]
        callback_id: u64,
        /// Selection range.
        data: SelectedTextRange,
    },
    /// A command targeting this page failed.
    #[serde(rename = "error")]
    Error {
        /// Failure description.
        message: String,
    },
}

impl OutboundEvent {
    /// Logic-side handler name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageScroll { .. } => crate::transport::ON_PAGE_SCROLL,
            Self::ReachBottom => crate::transport::ON_REACH_BOTTOM,
            Self::SelectedTextRange { .. } => crate::transport::ON_GET_SELECTED_TEXT_RANGE,
            Self::Error { .. } => "error",
        }
    }
}

/// An outbound event addressed to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEvent {
    /// Page the event is addressed to.
    pub page: TransportId,
    /// The event.
    #[serde(flatten)]
    pub event: OutboundEvent,
}

impl BridgeEvent {
    /// Address `event` to `page`.
    #[must_use]
    pub fn new(page: TransportId, event: OutboundEvent) -> Self {
        Self { page, event }
    }
}
