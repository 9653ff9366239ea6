//! Test server harness for integration tests.
//!
//! Spins up the bridge routes on a random port with frames driven only by
//! explicit `frame` commands, so scroll tests are deterministic.

use std::net::SocketAddr;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use bridge_core::{ElementFactory, HeadlessProvider};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use bridge_host::socket::handle_bridge_socket;
use bridge_host::{health, routes, AppState, HostConfig};

/// Frame size limit used by the test server.
pub const TEST_MAX_MESSAGE_BYTES: usize = 4096;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let config = HostConfig {
            port,
            frame_interval_ms: 0,
            max_message_bytes: TEST_MAX_MESSAGE_BYTES,
            ..HostConfig::default()
        };
        let (view, _view_task) = bridge_core::spawn(
            config.view_config(),
            ElementFactory::default(),
            Box::new(HeadlessProvider),
        );
        let state = AppState { view, config };

        let app = Router::new()
            .route("/health/live", get(health::liveness))
            .route("/health/ready", get(health::readiness))
            .route("/ws/bridge", get(ws_handler))
            .route("/api/pages", get(routes::list_pages))
            .route("/api/pages/{page}", get(routes::get_page))
            .with_state(state);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the WebSocket URL for connecting to the server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/bridge", self.addr)
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let max = state.config.max_message_bytes;
    ws.on_upgrade(move |socket| handle_bridge_socket(socket, state.view, max))
}
