//! Page state and the one-time bootstrap sequence.
//!
//! ## Bootstrap order
//!
//! ```text
//! Init-Route -> Init-System-Info -> Init-Root -> [Init-Stylesheet]
//!   -> Bind-Transport-Identity -> Init-CSS-Vars -> Init-Scroll
//! ```
//!
//! Each step runs exactly once. The input record is validated before the first
//! step, so a malformed record never leaves a half-built page behind.

use serde::{Deserialize, Serialize};

use crate::css::CssVarSet;
use crate::error::{BridgeError, BridgeResult};
use crate::factory::ElementFactory;
use crate::frame::{FrameHandle, FrameScheduler};
use crate::native::{ActiveElement, NativeSurface};
use crate::node::{Attributes, Node, NodeId};
use crate::protocol::{BridgeEvent, OutboundEvent, SelectedTextRange};
use crate::registry::NodeRegistry;
use crate::scroll::{
    ScrollListener, ScrollListenerOptions, ScrollOutput, ScrollSignal, TouchDisposition,
};
use crate::transport::{Publisher, TransportId};

/// Tag bookkept for the root container.
pub const ROOT_TAG: &str = "div";

/// Page bootstrap input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCreateData {
    /// Attach a stylesheet named after the route.
    #[serde(default)]
    pub css: bool,
    /// Route name.
    pub route: String,
    /// Platform identifier.
    pub platform: String,
    /// Device pixel ratio.
    pub pixel_ratio: f64,
    /// Viewport width.
    pub window_width: f64,
    /// Suppress touch-move propagation instead of scrolling.
    pub disable_scroll: bool,
    /// Forward page scroll positions.
    #[serde(default)]
    pub on_page_scroll: bool,
    /// Forward reach-bottom crossings.
    #[serde(default)]
    pub on_page_reach_bottom: bool,
    /// Reach-bottom threshold; required with `on_page_reach_bottom`.
    #[serde(default)]
    pub on_reach_bottom_distance: Option<f64>,
    /// Status bar height.
    pub statusbar_height: f64,
    /// Top window inset.
    pub window_top: f64,
    /// Bottom window inset.
    pub window_bottom: f64,
}

impl PageCreateData {
    /// Check the record carries everything its requested features need.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedBootstrap`] naming the first problem.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.route.trim().is_empty() {
            return Err(BridgeError::MalformedBootstrap("route is empty".into()));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(BridgeError::MalformedBootstrap(format!(
                "pixelRatio must be positive, got {}",
                self.pixel_ratio
            )));
        }
        if !(self.window_width.is_finite() && self.window_width > 0.0) {
            return Err(BridgeError::MalformedBootstrap(format!(
                "windowWidth must be positive, got {}",
                self.window_width
            )));
        }
        for (name, value) in [
            ("statusbarHeight", self.statusbar_height),
            ("windowTop", self.window_top),
            ("windowBottom", self.window_bottom),
        ] {
            if !value.is_finite() {
                return Err(BridgeError::MalformedBootstrap(format!(
                    "{name} must be finite"
                )));
            }
        }
        if self.on_page_reach_bottom {
            match self.on_reach_bottom_distance {
                None => {
                    return Err(BridgeError::MalformedBootstrap(
                        "onReachBottomDistance is required with onPageReachBottom".into(),
                    ))
                }
                Some(d) if !d.is_finite() => {
                    return Err(BridgeError::MalformedBootstrap(
                        "onReachBottomDistance must be finite".into(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Producers requested by this record.
    #[must_use]
    pub fn scroll_options(&self) -> ScrollListenerOptions {
        ScrollListenerOptions {
            page_scroll: self.on_page_scroll,
            reach_bottom_distance: if self.on_page_reach_bottom {
                self.on_reach_bottom_distance
            } else {
                None
            },
        }
    }
}

/// Platform metadata recorded at bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Platform identifier.
    pub platform: String,
    /// Device pixel ratio.
    pub pixel_ratio: f64,
    /// Viewport width.
    pub window_width: f64,
}

/// Per-page metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Route name.
    pub route: String,
    /// Platform metadata.
    pub system: Option<SystemInfo>,
    /// Transport identity outbound events for this page are addressed to.
    pub transport_id: Option<TransportId>,
    /// Identity the native surface reports for its own container.
    pub container_id: Option<TransportId>,
}

/// Bootstrap steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStep {
    /// Route stored.
    InitRoute,
    /// Platform metadata stored.
    InitSystemInfo,
    /// Root container materialized.
    InitRoot,
    /// Route stylesheet attached.
    InitStylesheet,
    /// Transport identity recorded and title set.
    BindTransportIdentity,
    /// CSS variables published.
    InitCssVars,
    /// Scroll handling decided.
    InitScroll,
}

/// Work deferred to a frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameTask {
    /// Install a scroll listener on `page`.
    InstallScrollListener {
        /// Page to install on.
        page: TransportId,
        /// Producers to run.
        options: ScrollListenerOptions,
    },
}

/// How a page handles scroll and touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// No listener installed.
    Inactive,
    /// Touch-move propagation is suppressed.
    TouchGuard,
    /// A scroll listener waits for the next frame.
    Pending,
    /// A scroll listener is running.
    Listening,
}

#[derive(Debug)]
enum ScrollState {
    Inactive,
    TouchGuard,
    Pending(FrameHandle),
    Listening(ScrollListener),
}

/// A bootstrapped page: its node registry, surface and scroll handling.
#[derive(Debug)]
pub struct Page<S> {
    metadata: PageMetadata,
    id: TransportId,
    registry: NodeRegistry,
    surface: S,
    css_vars: CssVarSet,
    scroll: ScrollState,
    steps: Vec<BootstrapStep>,
}

impl<S: NativeSurface> Page<S> {
    /// Run the bootstrap sequence for page `id` on `surface`.
    ///
    /// `id` is the transport identity assigned by the hosting view context.
    /// Deferred work and outbound events are addressed to it, whatever the
    /// surface reports as its own container identity.
    ///
    /// A deferred scroll listener is requested from `frames`; it is cancelled
    /// if the page is dropped before the frame fires.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedBootstrap`] if `data` fails validation.
    pub fn bootstrap(
        id: TransportId,
        data: &PageCreateData,
        surface: S,
        factory: &ElementFactory,
        frames: &mut FrameScheduler<FrameTask>,
    ) -> BridgeResult<Self> {
        data.validate()?;

        let mut page = Self {
            metadata: PageMetadata::default(),
            id,
            registry: NodeRegistry::new(),
            surface,
            css_vars: CssVarSet::default(),
            scroll: ScrollState::Inactive,
            steps: Vec::with_capacity(7),
        };

        page.metadata.route.clone_from(&data.route);
        page.steps.push(BootstrapStep::InitRoute);

        page.metadata.system = Some(SystemInfo {
            platform: data.platform.clone(),
            pixel_ratio: data.pixel_ratio,
            window_width: data.window_width,
        });
        page.steps.push(BootstrapStep::InitSystemInfo);

        factory.create(
            &mut page.registry,
            &mut page.surface,
            NodeId::ROOT,
            ROOT_TAG,
            None,
            Attributes::new(),
        )?;
        page.steps.push(BootstrapStep::InitRoot);

        if data.css {
            let href = format!("{}.css", data.route);
            page.surface.append_stylesheet(&href);
            page.steps.push(BootstrapStep::InitStylesheet);
        }

        let transport_id = page.id.clone();
        page.surface.set_title(&format!("{}[{}]", data.route, transport_id));
        page.metadata.container_id = Some(page.surface.container_id());
        page.metadata.transport_id = Some(transport_id.clone());
        page.steps.push(BootstrapStep::BindTransportIdentity);

        let vars =
            CssVarSet::from_insets(data.statusbar_height, data.window_top, data.window_bottom);
        tracing::debug!(page = %transport_id, vars = ?vars, "initCssVar");
        page.update_css_vars(vars);
        page.steps.push(BootstrapStep::InitCssVars);

        let options = data.scroll_options();
        page.scroll = if data.disable_scroll {
            ScrollState::TouchGuard
        } else if options.is_active() {
            ScrollState::Pending(frames.request(FrameTask::InstallScrollListener {
                page: transport_id.clone(),
                options,
            }))
        } else {
            ScrollState::Inactive
        };
        page.steps.push(BootstrapStep::InitScroll);

        tracing::info!(
            page = %transport_id,
            route = %data.route,
            scroll = ?page.scroll_mode(),
            "Page bootstrapped"
        );
        Ok(page)
    }

    /// Create a node on this page.
    ///
    /// # Errors
    ///
    /// Propagates widget construction failures.
    pub fn create_node(
        &mut self,
        factory: &ElementFactory,
        id: NodeId,
        tag: &str,
        parent: Option<NodeId>,
        attributes: Attributes,
    ) -> BridgeResult<&Node> {
        factory.create(
            &mut self.registry,
            &mut self.surface,
            id,
            tag,
            parent,
            attributes,
        )
    }

    /// Remove a node, releasing its native handle.
    ///
    /// The root container stays registered for the page's lifetime, so
    /// removing it reports `false`.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id.is_root() {
            tracing::warn!(page = %self.transport_id(), "Ignoring removal of root container");
            return false;
        }
        match self.registry.take(id) {
            Some(node) => {
                self.surface.release(node.handle);
                true
            }
            None => false,
        }
    }

    /// Look up a node.
    #[must_use]
    pub fn lookup(&self, id: NodeId) -> Option<&Node> {
        self.registry.lookup(id)
    }

    /// Replace the published CSS variables.
    pub fn update_css_vars(&mut self, vars: CssVarSet) {
        self.surface.update_css_vars(&vars);
        self.css_vars = vars;
    }

    /// Install the deferred scroll listener once its frame fires.
    ///
    /// A page whose scroll handling is no longer pending ignores this.
    pub fn install_scroll_listener(&mut self, options: ScrollListenerOptions) {
        if matches!(self.scroll, ScrollState::Pending(_)) {
            self.scroll = ScrollState::Listening(ScrollListener::new(options));
            tracing::debug!(page = %self.transport_id(), "Scroll listener installed");
        }
    }

    /// Handle a native scroll signal, publishing any outputs.
    pub fn on_scroll<P: Publisher + ?Sized>(&mut self, signal: ScrollSignal, out: &mut P) {
        let ScrollState::Listening(listener) = &mut self.scroll else {
            return;
        };
        let outputs = listener.handle(signal);
        let page = self.transport_id();
        for output in outputs {
            let event = match output {
                ScrollOutput::PageScroll { scroll_top } => OutboundEvent::PageScroll { scroll_top },
                ScrollOutput::ReachBottom => OutboundEvent::ReachBottom,
            };
            out.publish(BridgeEvent::new(page.clone(), event));
        }
    }

    /// Decide what happens to a native touch-move signal.
    #[must_use]
    pub fn on_touch_move(&self) -> TouchDisposition {
        match self.scroll {
            ScrollState::TouchGuard => TouchDisposition::Suppressed,
            _ => TouchDisposition::Propagate,
        }
    }

    /// Move focus to a node, or clear focus with `None`.
    ///
    /// Focusing a node that does not exist clears focus.
    pub fn focus(&mut self, id: Option<NodeId>, selection: Option<(u32, u32)>) {
        let active = id
            .and_then(|id| self.registry.lookup(id))
            .map(|node| ActiveElement {
                handle: node.handle,
                tag: node
                    .widget()
                    .map_or(node.tag.as_str(), |w| w.native_tag())
                    .to_ascii_lowercase(),
                selection,
            });
        self.surface.set_active_element(active);
    }

    /// Selection range of the focused element.
    ///
    /// `None` when nothing is focused; an empty range when the focused element
    /// is not an `input` or `textarea`.
    #[must_use]
    pub fn selected_text_range(&self) -> Option<SelectedTextRange> {
        let active = self.surface.active_element()?;
        if !matches!(active.tag.as_str(), "input" | "textarea") {
            return Some(SelectedTextRange::default());
        }
        Some(SelectedTextRange {
            start: active.selection.map(|(start, _)| start),
            end: active.selection.map(|(_, end)| end),
        })
    }

    /// Release every native handle held by this page.
    pub fn teardown(mut self) {
        let root = self.surface.root_handle();
        let handles: Vec<_> = self.registry.drain().map(|node| node.handle).collect();
        for handle in handles {
            if handle != root {
                self.surface.release(handle);
            }
        }
        tracing::info!(page = %self.transport_id(), "Page torn down");
    }

    /// Page metadata.
    #[must_use]
    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Transport identity this page is addressed by.
    #[must_use]
    pub fn transport_id(&self) -> TransportId {
        self.id.clone()
    }

    /// The node registry.
    #[must_use]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Published CSS variables.
    #[must_use]
    pub fn css_vars(&self) -> &CssVarSet {
        &self.css_vars
    }

    /// The native surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Completed bootstrap steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    /// Current scroll handling.
    #[must_use]
    pub fn scroll_mode(&self) -> ScrollMode {
        match self.scroll {
            ScrollState::Inactive => ScrollMode::Inactive,
            ScrollState::TouchGuard => ScrollMode::TouchGuard,
            ScrollState::Pending(_) => ScrollMode::Pending,
            ScrollState::Listening(_) => ScrollMode::Listening,
        }
    }

    /// Producers of the running scroll listener.
    #[must_use]
    pub fn scroll_options(&self) -> Option<ScrollListenerOptions> {
        match &self.scroll {
            ScrollState::Listening(listener) => Some(listener.options()),
            _ => None,
        }
    }

    /// A serializable summary of this page.
    #[must_use]
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            metadata: self.metadata.clone(),
            nodes: self.registry.ids(),
            css_vars: self.css_vars.clone(),
            scroll: self.scroll_mode(),
            steps: self.steps.clone(),
        }
    }
}

/// Serializable summary of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Page metadata.
    pub metadata: PageMetadata,
    /// Registered node identities, ascending.
    pub nodes: Vec<NodeId>,
    /// Published CSS variables.
    pub css_vars: CssVarSet,
    /// Scroll handling.
    pub scroll: ScrollMode,
    /// Completed bootstrap steps.
    pub steps: Vec<BootstrapStep>,
}
