//! View context integration tests.
//!
//! Drives a spawned view context through its handle, the way a logic context
//! would, and checks the events it publishes.

use std::time::Duration;

use bridge_core::{
    spawn, BootstrapStep, BridgeEvent, Command, ElementFactory, HeadlessProvider,
    HeadlessSurface, NativeSurface, NodeId, OutboundEvent, PageCreateData, ScrollMode,
    SelectedTextRange, SurfaceProvider, TransportId, ViewConfig, ViewHandle,
};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::timeout;

fn manual_frames() -> ViewConfig {
    ViewConfig {
        frame_interval: None,
        ..ViewConfig::default()
    }
}

fn start() -> ViewHandle {
    let (handle, _task) = spawn(
        manual_frames(),
        ElementFactory::default(),
        Box::new(HeadlessProvider),
    );
    handle
}

fn home(on_page_scroll: bool, reach_bottom: Option<f64>) -> PageCreateData {
    PageCreateData {
        css: false,
        route: "home".to_string(),
        platform: "app".to_string(),
        pixel_ratio: 2.0,
        window_width: 375.0,
        disable_scroll: false,
        on_page_scroll,
        on_page_reach_bottom: reach_bottom.is_some(),
        on_reach_bottom_distance: reach_bottom,
        statusbar_height: 20.0,
        window_top: 0.0,
        window_bottom: 0.0,
    }
}

fn page() -> TransportId {
    TransportId::from("1")
}

fn scroll(scroll_top: f64) -> Command {
    Command::Scroll {
        page: page(),
        scroll_top,
        viewport_height: 600.0,
        content_height: 2000.0,
    }
}

/// Everything published so far; an `inspect` round trip acts as a barrier.
async fn drain(
    handle: &ViewHandle,
    rx: &mut broadcast::Receiver<BridgeEvent>,
) -> Vec<BridgeEvent> {
    handle.inspect(page()).await.expect("view is running");
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn home_page_bootstraps() {
    let handle = start();
    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(true, Some(50.0)),
        })
        .await
        .expect("send");

    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");

    assert_eq!(snapshot.nodes, vec![NodeId::ROOT]);
    assert_eq!(snapshot.css_vars.get("--status-bar-height"), Some("20px"));
    assert_eq!(snapshot.css_vars.get("--window-top"), Some("0px"));
    assert_eq!(snapshot.css_vars.get("--window-bottom"), Some("0px"));
    assert_eq!(snapshot.scroll, ScrollMode::Pending);
    assert_eq!(snapshot.steps.last(), Some(&BootstrapStep::InitScroll));

    handle.send(Command::Frame).await.expect("send");
    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");
    assert_eq!(snapshot.scroll, ScrollMode::Listening);
}

#[tokio::test]
async fn scroll_is_deferred_to_next_frame() {
    let handle = start();
    let mut rx = handle.subscribe();

    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(true, None),
        })
        .await
        .expect("send");
    handle.send(scroll(10.0)).await.expect("send");
    assert!(drain(&handle, &mut rx).await.is_empty());

    handle.send(Command::Frame).await.expect("send");
    handle.send(scroll(10.0)).await.expect("send");
    let events = drain(&handle, &mut rx).await;
    assert_eq!(
        events,
        vec![BridgeEvent::new(
            page(),
            OutboundEvent::PageScroll { scroll_top: 10.0 }
        )]
    );
}

#[tokio::test]
async fn reach_bottom_fires_once_until_rearmed() {
    let handle = start();
    let mut rx = handle.subscribe();

    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(false, Some(50.0)),
        })
        .await
        .expect("send");
    handle.send(Command::Frame).await.expect("send");

    for top in [1000.0, 1360.0, 1380.0, 1200.0, 1390.0] {
        handle.send(scroll(top)).await.expect("send");
    }

    let events = drain(&handle, &mut rx).await;
    assert_eq!(
        events,
        vec![
            BridgeEvent::new(page(), OutboundEvent::ReachBottom),
            BridgeEvent::new(page(), OutboundEvent::ReachBottom),
        ]
    );
}

#[tokio::test]
async fn disable_scroll_suppresses_everything() {
    let handle = start();
    let mut rx = handle.subscribe();

    let data = PageCreateData {
        disable_scroll: true,
        ..home(true, Some(50.0))
    };
    handle
        .send(Command::CreatePage { page: page(), data })
        .await
        .expect("send");
    handle.send(Command::Frame).await.expect("send");
    handle.send(scroll(1400.0)).await.expect("send");
    handle
        .send(Command::TouchMove { page: page() })
        .await
        .expect("send");

    assert!(drain(&handle, &mut rx).await.is_empty());
    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");
    assert_eq!(snapshot.scroll, ScrollMode::TouchGuard);
}

#[tokio::test]
async fn destroyed_page_ignores_pending_frame() {
    let handle = start();
    let mut rx = handle.subscribe();

    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(true, None),
        })
        .await
        .expect("send");
    handle
        .send(Command::DestroyPage { page: page() })
        .await
        .expect("send");
    handle.send(Command::Frame).await.expect("send");

    assert!(handle.pages().await.expect("view is running").is_empty());
    assert!(drain(&handle, &mut rx).await.is_empty());
}

#[tokio::test]
async fn node_lifecycle() {
    let handle = start();
    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(false, None),
        })
        .await
        .expect("send");

    for (id, tag) in [(1, "view"), (2, "text"), (3, "uni-custom")] {
        handle
            .send(Command::CreateNode {
                page: page(),
                id: NodeId::new(id),
                tag: tag.to_string(),
                parent_id: Some(NodeId::ROOT),
                attributes: serde_json::Map::new(),
            })
            .await
            .expect("send");
    }
    handle
        .send(Command::RemoveNode {
            page: page(),
            id: NodeId::new(2),
        })
        .await
        .expect("send");
    handle
        .send(Command::RemoveNode {
            page: page(),
            id: NodeId::new(2),
        })
        .await
        .expect("send");

    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");
    assert_eq!(
        snapshot.nodes,
        vec![NodeId::ROOT, NodeId::new(1), NodeId::new(3)]
    );
}

#[tokio::test]
async fn bad_widget_attributes_report_error() {
    let handle = start();
    let mut rx = handle.subscribe();
    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(false, None),
        })
        .await
        .expect("send");

    let attributes = match json!({"disabled": "yes"}) {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    handle
        .send(Command::CreateNode {
            page: page(),
            id: NodeId::new(4),
            tag: "button".to_string(),
            parent_id: Some(NodeId::ROOT),
            attributes,
        })
        .await
        .expect("send");

    let events = drain(&handle, &mut rx).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].event, OutboundEvent::Error { .. }));

    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");
    assert_eq!(snapshot.nodes, vec![NodeId::ROOT]);
}

#[tokio::test]
async fn selected_text_range_round_trip() {
    let handle = start();
    let mut rx = handle.subscribe();
    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(false, None),
        })
        .await
        .expect("send");
    handle
        .send(Command::CreateNode {
            page: page(),
            id: NodeId::new(5),
            tag: "textarea".to_string(),
            parent_id: Some(NodeId::ROOT),
            attributes: serde_json::Map::new(),
        })
        .await
        .expect("send");

    // Without a subscription nothing answers.
    handle
        .send(Command::GetSelectedTextRange {
            page: page(),
            callback_id: 1,
        })
        .await
        .expect("send");
    assert!(drain(&handle, &mut rx).await.is_empty());

    for _ in 0..2 {
        handle
            .send(Command::Subscribe {
                page: page(),
                event: "getSelectedTextRange".to_string(),
            })
            .await
            .expect("send");
    }

    // Nothing focused: still no reply.
    handle
        .send(Command::GetSelectedTextRange {
            page: page(),
            callback_id: 2,
        })
        .await
        .expect("send");
    assert!(drain(&handle, &mut rx).await.is_empty());

    handle
        .send(Command::Focus {
            page: page(),
            id: Some(NodeId::new(5)),
            selection_start: Some(2),
            selection_end: Some(6),
        })
        .await
        .expect("send");
    handle
        .send(Command::GetSelectedTextRange {
            page: page(),
            callback_id: 3,
        })
        .await
        .expect("send");

    let events = drain(&handle, &mut rx).await;
    assert_eq!(
        events,
        vec![BridgeEvent::new(
            page(),
            OutboundEvent::SelectedTextRange {
                callback_id: 3,
                data: SelectedTextRange {
                    start: Some(2),
                    end: Some(6),
                },
            }
        )]
    );
}

#[tokio::test]
async fn ticker_drives_frames() {
    let (handle, _task) = spawn(
        ViewConfig {
            frame_interval: Some(Duration::from_millis(5)),
            ..ViewConfig::default()
        },
        ElementFactory::default(),
        Box::new(HeadlessProvider),
    );
    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(true, None),
        })
        .await
        .expect("send");

    let listening = timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = handle.inspect(page()).await.ok().flatten();
            if snapshot.map(|s| s.scroll) == Some(ScrollMode::Listening) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(listening.is_ok(), "ticker should install the listener");
}

#[tokio::test]
async fn view_stops_when_handles_drop() {
    let (handle, task) = spawn(
        manual_frames(),
        ElementFactory::default(),
        Box::new(HeadlessProvider),
    );
    assert!(handle.is_alive());
    drop(handle);
    timeout(Duration::from_secs(2), task)
        .await
        .expect("task should stop")
        .expect("task should not panic");
}

/// Opens surfaces whose container identity differs from the page key.
struct WebviewProvider;

impl SurfaceProvider for WebviewProvider {
    fn open(&self, page: &TransportId) -> Box<dyn NativeSurface + Send> {
        Box::new(HeadlessSurface::new(format!("webview-{page}")))
    }
}

#[tokio::test]
async fn container_identity_does_not_change_page_addressing() {
    let (handle, _task) = spawn(
        manual_frames(),
        ElementFactory::default(),
        Box::new(WebviewProvider),
    );
    let mut rx = handle.subscribe();

    handle
        .send(Command::CreatePage {
            page: page(),
            data: home(true, Some(50.0)),
        })
        .await
        .expect("send");
    handle
        .send(Command::CreateNode {
            page: page(),
            id: NodeId::new(5),
            tag: "textarea".to_string(),
            parent_id: Some(NodeId::ROOT),
            attributes: serde_json::Map::new(),
        })
        .await
        .expect("send");
    handle.send(Command::Frame).await.expect("send");

    let snapshot = handle
        .inspect(page())
        .await
        .expect("view is running")
        .expect("page exists");
    assert_eq!(snapshot.scroll, ScrollMode::Listening);
    assert_eq!(snapshot.metadata.transport_id, Some(page()));
    assert_eq!(
        snapshot.metadata.container_id,
        Some(TransportId::from("webview-1"))
    );

    handle.send(scroll(1400.0)).await.expect("send");
    handle
        .send(Command::Subscribe {
            page: page(),
            event: "getSelectedTextRange".to_string(),
        })
        .await
        .expect("send");
    handle
        .send(Command::Focus {
            page: page(),
            id: Some(NodeId::new(5)),
            selection_start: Some(0),
            selection_end: Some(3),
        })
        .await
        .expect("send");
    handle
        .send(Command::GetSelectedTextRange {
            page: page(),
            callback_id: 9,
        })
        .await
        .expect("send");

    let events = drain(&handle, &mut rx).await;
    assert_eq!(
        events,
        vec![
            BridgeEvent::new(page(), OutboundEvent::PageScroll { scroll_top: 1400.0 }),
            BridgeEvent::new(page(), OutboundEvent::ReachBottom),
            BridgeEvent::new(
                page(),
                OutboundEvent::SelectedTextRange {
                    callback_id: 9,
                    data: SelectedTextRange {
                        start: Some(0),
                        end: Some(3),
                    },
                }
            ),
        ]
    );
}
