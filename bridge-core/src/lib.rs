//! # Bridge Core
//!
//! View-side synchronization core: mirrors a logical node tree described in a
//! logic context into native renderable elements owned by a view context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 bridge-core                 │
//! ├─────────────────────────────────────────────┤
//! │  View Context    │  Transport               │
//! │  - Inbox (mpsc)  │  - Commands / events     │
//! │  - Frame ticker  │  - Subscriptions         │
//! ├─────────────────────────────────────────────┤
//! │  Page            │  Scroll Bridge           │
//! │  - Bootstrap     │  - Page scroll           │
//! │  - CSS vars      │  - Reach bottom          │
//! ├─────────────────────────────────────────────┤
//! │  Element Factory │  Node Registry           │
//! │  - Widgets       │  - Identity -> node      │
//! │  - Native handle │  - Root container        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod css;
pub mod error;
pub mod factory;
pub mod frame;
pub mod native;
pub mod node;
pub mod page;
pub mod protocol;
pub mod registry;
pub mod scroll;
pub mod transport;
pub mod view;
pub mod widget;

pub use css::CssVarSet;
pub use error::{BridgeError, BridgeResult};
pub use factory::ElementFactory;
pub use frame::{FrameHandle, FrameScheduler};
pub use native::{
    ActiveElement, HeadlessProvider, HeadlessSurface, NativeHandle, NativeSurface,
    SurfaceProvider,
};
pub use node::{Attributes, Node, NodeId, NodeKind};
pub use page::{BootstrapStep, Page, PageCreateData, PageMetadata, PageSnapshot, ScrollMode};
pub use protocol::{BridgeEvent, Command, OutboundEvent, SelectedTextRange};
pub use registry::NodeRegistry;
pub use scroll::{ScrollListener, ScrollListenerOptions, ScrollSignal, TouchDisposition};
pub use transport::{Publisher, Subscriptions, TransportId};
pub use view::{spawn, ViewConfig, ViewContext, ViewHandle, ViewMessage};
pub use widget::{Widget, WidgetTable};

/// Bridge core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
