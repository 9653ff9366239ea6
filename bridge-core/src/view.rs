//! The view context: a single task that owns every page it bootstraps.
//!
//! Commands arrive on an `mpsc` inbox and are applied strictly in arrival
//! order. Outbound events go out on a `broadcast` channel addressed by
//! transport identity. Nothing else crosses the task boundary.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{BridgeError, BridgeResult};
use crate::factory::ElementFactory;
use crate::frame::FrameScheduler;
use crate::native::{NativeSurface, SurfaceProvider};
use crate::page::{FrameTask, Page, PageSnapshot};
use crate::protocol::{BridgeEvent, Command, OutboundEvent};
use crate::scroll::{ScrollSignal, TouchDisposition};
use crate::transport::{Publisher, Subscriptions, TransportId, GET_SELECTED_TEXT_RANGE};

type BoxedPage = Page<Box<dyn NativeSurface + Send>>;

/// Messages accepted by a running view context.
#[derive(Debug)]
pub enum ViewMessage {
    /// Apply a bridge command.
    Command(Command),
    /// Take a snapshot of one page.
    Inspect {
        /// Page to inspect.
        page: TransportId,
        /// Where to send the snapshot.
        reply: oneshot::Sender<Option<PageSnapshot>>,
    },
    /// List the live pages.
    Pages {
        /// Where to send the list.
        reply: oneshot::Sender<Vec<TransportId>>,
    },
}

/// Tuning for a spawned view context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Interval between frame boundaries; `None` crosses frames only on an
    /// explicit `frame` command.
    pub frame_interval: Option<Duration>,
    /// Capacity of the outbound event channel.
    pub event_capacity: usize,
    /// Capacity of the inbound command channel.
    pub inbox_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            frame_interval: Some(Duration::from_millis(16)),
            event_capacity: 256,
            inbox_capacity: 256,
        }
    }
}

/// State of one view context.
pub struct ViewContext {
    pages: HashMap<TransportId, BoxedPage>,
    factory: ElementFactory,
    provider: Box<dyn SurfaceProvider>,
    frames: FrameScheduler<FrameTask>,
    subscriptions: Subscriptions,
    events: broadcast::Sender<BridgeEvent>,
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pages: Vec<_> = self.pages.keys().collect();
        pages.sort();
        f.debug_struct("ViewContext")
            .field("pages", &pages)
            .field("frame", &self.frames.frame())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl ViewContext {
    /// Create an empty view context publishing on `events`.
    #[must_use]
    pub fn new(
        factory: ElementFactory,
        provider: Box<dyn SurfaceProvider>,
        events: broadcast::Sender<BridgeEvent>,
    ) -> Self {
        Self {
            pages: HashMap::new(),
            factory,
            provider,
            frames: FrameScheduler::new(),
            subscriptions: Subscriptions::new(),
            events,
        }
    }

    /// Subscribe to outbound events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Apply a command. Failures are logged and reported to the addressed page
    /// as an `error` event.
    pub fn apply(&mut self, command: Command) {
        let name = command.name();
        let page = command.page().cloned();
        if let Err(e) = self.try_apply(command) {
            tracing::warn!(command = name, page = ?page, error = %e, "Command failed");
            if let Some(page) = page {
                self.events.publish(BridgeEvent::new(
                    page,
                    OutboundEvent::Error {
                        message: e.to_string(),
                    },
                ));
            }
        }
    }

    /// Apply a command, returning any failure to the caller.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::PageExists`] when bootstrapping a live page.
    /// - [`BridgeError::PageNotFound`] when addressing an unknown page.
    /// - Bootstrap validation and widget construction failures.
    pub fn try_apply(&mut self, command: Command) -> BridgeResult<()> {
        match command {
            Command::CreatePage { page, data } => {
                if self.pages.contains_key(&page) {
                    return Err(BridgeError::PageExists(page.to_string()));
                }
                let surface = self.provider.open(&page);
                let created = Page::bootstrap(
                    page.clone(),
                    &data,
                    surface,
                    &self.factory,
                    &mut self.frames,
                )?;
                self.pages.insert(page, created);
            }
            Command::CreateNode {
                page,
                id,
                tag,
                parent_id,
                attributes,
            } => {
                let target = page_mut(&mut self.pages, &page)?;
                target.create_node(&self.factory, id, &tag, parent_id, attributes)?;
            }
            Command::RemoveNode { page, id } => {
                if !page_mut(&mut self.pages, &page)?.remove_node(id) {
                    tracing::debug!(page = %page, id = %id, "Remove of unknown node ignored");
                }
            }
            Command::Subscribe { page, event } => {
                page_mut(&mut self.pages, &page)?;
                self.subscriptions.subscribe(&page, &event);
            }
            Command::GetSelectedTextRange { page, callback_id } => {
                let target = page_mut(&mut self.pages, &page)?;
                if !self.subscriptions.is_subscribed(&page, GET_SELECTED_TEXT_RANGE) {
                    tracing::debug!(page = %page, "No getSelectedTextRange subscription");
                    return Ok(());
                }
                if let Some(data) = target.selected_text_range() {
                    self.events.publish(BridgeEvent::new(
                        page,
                        OutboundEvent::SelectedTextRange { callback_id, data },
                    ));
                }
            }
            Command::DestroyPage { page } => {
                let removed = self
                    .pages
                    .remove(&page)
                    .ok_or_else(|| BridgeError::PageNotFound(page.to_string()))?;
                self.subscriptions.remove_page(&page);
                removed.teardown();
            }
            Command::Scroll {
                page,
                scroll_top,
                viewport_height,
                content_height,
            } => {
                let signal = ScrollSignal {
                    scroll_top,
                    viewport_height,
                    content_height,
                };
                page_mut(&mut self.pages, &page)?.on_scroll(signal, &mut self.events);
            }
            Command::TouchMove { page } => {
                let disposition = self.touch_move(&page)?;
                tracing::trace!(page = %page, ?disposition, "Touch move");
            }
            Command::Focus {
                page,
                id,
                selection_start,
                selection_end,
            } => {
                let selection = selection_start.zip(selection_end);
                page_mut(&mut self.pages, &page)?.focus(id, selection);
            }
            Command::Frame => self.frame(),
        }
        Ok(())
    }

    /// Decide what happens to a touch-move signal on `page`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PageNotFound`] for an unknown page.
    pub fn touch_move(&self, page: &TransportId) -> BridgeResult<TouchDisposition> {
        self.pages
            .get(page)
            .map(|target| target.on_touch_move())
            .ok_or_else(|| BridgeError::PageNotFound(page.to_string()))
    }

    /// Cross a frame boundary, running every deferred task still live.
    pub fn frame(&mut self) {
        for task in self.frames.advance() {
            match task {
                FrameTask::InstallScrollListener { page, options } => {
                    if let Some(target) = self.pages.get_mut(&page) {
                        target.install_scroll_listener(options);
                    }
                }
            }
        }
    }

    /// A live page.
    #[must_use]
    pub fn page(&self, page: &TransportId) -> Option<&BoxedPage> {
        self.pages.get(page)
    }

    /// Snapshot of a live page.
    #[must_use]
    pub fn snapshot(&self, page: &TransportId) -> Option<PageSnapshot> {
        self.pages.get(page).map(|target| target.snapshot())
    }

    /// Transport identities of every live page, sorted.
    #[must_use]
    pub fn page_ids(&self) -> Vec<TransportId> {
        let mut ids: Vec<_> = self.pages.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Handle one inbox message.
    pub fn handle(&mut self, message: ViewMessage) {
        match message {
            ViewMessage::Command(command) => self.apply(command),
            ViewMessage::Inspect { page, reply } => {
                // The caller may have given up waiting.
                let _ = reply.send(self.snapshot(&page));
            }
            ViewMessage::Pages { reply } => {
                let _ = reply.send(self.page_ids());
            }
        }
    }

    /// Run until every sender of `inbox` is dropped.
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<ViewMessage>,
        frame_interval: Option<Duration>,
    ) {
        let mut ticker = frame_interval.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker
        });

        tracing::info!(?frame_interval, "View context started");
        loop {
            tokio::select! {
                message = inbox.recv() => {
                    match message {
                        Some(message) => self.handle(message),
                        None => break,
                    }
                }
                () = next_tick(ticker.as_mut()) => self.frame(),
            }
        }

        let pages: Vec<_> = self.pages.drain().map(|(_, page)| page).collect();
        for page in pages {
            page.teardown();
        }
        tracing::info!("View context stopped");
    }
}

fn page_mut<'p>(
    pages: &'p mut HashMap<TransportId, BoxedPage>,
    page: &TransportId,
) -> BridgeResult<&'p mut BoxedPage> {
    pages
        .get_mut(page)
        .ok_or_else(|| BridgeError::PageNotFound(page.to_string()))
}

async fn next_tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Logic-side handle to a spawned view context.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    inbox: mpsc::Sender<ViewMessage>,
    events: broadcast::Sender<BridgeEvent>,
}

impl ViewHandle {
    /// Send a command.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransportClosed`] if the view context has stopped.
    pub async fn send(&self, command: Command) -> BridgeResult<()> {
        self.inbox
            .send(ViewMessage::Command(command))
            .await
            .map_err(|_| BridgeError::TransportClosed)
    }

    /// Subscribe to outbound events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Snapshot a page after every previously sent command has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransportClosed`] if the view context has stopped.
    pub async fn inspect(&self, page: TransportId) -> BridgeResult<Option<PageSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.inbox
            .send(ViewMessage::Inspect { page, reply })
            .await
            .map_err(|_| BridgeError::TransportClosed)?;
        rx.await.map_err(|_| BridgeError::TransportClosed)
    }

    /// List live pages.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransportClosed`] if the view context has stopped.
    pub async fn pages(&self) -> BridgeResult<Vec<TransportId>> {
        let (reply, rx) = oneshot::channel();
        self.inbox
            .send(ViewMessage::Pages { reply })
            .await
            .map_err(|_| BridgeError::TransportClosed)?;
        rx.await.map_err(|_| BridgeError::TransportClosed)
    }

    /// Whether the view context task is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.inbox.is_closed()
    }
}

/// Spawn a view context task.
///
/// The task stops once every [`ViewHandle`] clone is dropped.
#[must_use]
pub fn spawn(
    config: ViewConfig,
    factory: ElementFactory,
    provider: Box<dyn SurfaceProvider>,
) -> (ViewHandle, JoinHandle<()>) {
    let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity.max(1));
    let (events, _) = broadcast::channel(config.event_capacity.max(1));
    let context = ViewContext::new(factory, provider, events.clone());
    let task = tokio::spawn(context.run(inbox_rx, config.frame_interval));
    (
        ViewHandle {
            inbox: inbox_tx,
            events,
        },
        task,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::HeadlessProvider;
    use crate::node::{Attributes, NodeId};
    use crate::page::{PageCreateData, ScrollMode};

    fn context() -> ViewContext {
        let (events, _) = broadcast::channel(16);
        ViewContext::new(ElementFactory::default(), Box::new(HeadlessProvider), events)
    }

    fn data() -> PageCreateData {
        PageCreateData {
            css: false,
            route: "home".to_string(),
            platform: "app".to_string(),
            pixel_ratio: 2.0,
            window_width: 375.0,
            disable_scroll: false,
            on_page_scroll: true,
            on_page_reach_bottom: false,
            on_reach_bottom_distance: None,
            statusbar_height: 20.0,
            window_top: 0.0,
            window_bottom: 0.0,
        }
    }

    fn create_page(page: &str) -> Command {
        Command::CreatePage {
            page: TransportId::from(page),
            data: data(),
        }
    }

    #[test]
    fn test_duplicate_page_rejected() {
        let mut view = context();
        view.try_apply(create_page("1")).expect("first bootstrap");
        let err = view.try_apply(create_page("1")).expect_err("should fail");
        assert!(matches!(err, BridgeError::PageExists(_)));
    }

    #[test]
    fn test_failure_publishes_error_event() {
        let mut view = context();
        let mut rx = view.subscribe();
        view.apply(Command::CreateNode {
            page: TransportId::from("9"),
            id: NodeId::new(1),
            tag: "view".to_string(),
            parent_id: Some(NodeId::ROOT),
            attributes: Attributes::new(),
        });

        let event = rx.try_recv().expect("should receive error");
        assert_eq!(event.page, TransportId::from("9"));
        assert!(matches!(event.event, OutboundEvent::Error { .. }));
    }

    #[test]
    fn test_frame_installs_listener() {
        let mut view = context();
        view.apply(create_page("1"));
        let page = TransportId::from("1");
        assert_eq!(view.snapshot(&page).map(|s| s.scroll), Some(ScrollMode::Pending));

        view.apply(Command::Frame);
        assert_eq!(view.snapshot(&page).map(|s| s.scroll), Some(ScrollMode::Listening));
    }

    #[test]
    fn test_frame_after_destroy_is_noop() {
        let mut view = context();
        view.apply(create_page("1"));
        view.apply(Command::DestroyPage {
            page: TransportId::from("1"),
        });
        view.frame();
        assert!(view.page_ids().is_empty());
    }

    #[test]
    fn test_touch_move_unknown_page() {
        let view = context();
        assert!(view.touch_move(&TransportId::from("5")).is_err());
    }
}
