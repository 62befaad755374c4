//! CDP WebSocket connection implementation
//!
//! The socket is split once: the write half sits behind a mutex for
//! `send_command`, the read half is owned by a spawned reader task that
//! routes responses to pending commands. Protocol events are only logged;
//! page readiness is polled instead.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;

/// Per-method command timeouts
#[derive(Debug, Clone)]
pub struct CdpTimeoutConfig {
    /// Default timeout for most commands
    pub default_timeout: Duration,
    /// Timeout for screenshot commands
    pub screenshot_timeout: Duration,
    /// Timeout for page navigation commands
    pub navigation_timeout: Duration,
    /// Timeout for JavaScript execution
    pub execution_timeout: Duration,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            screenshot_timeout: Duration::from_secs(60),
            navigation_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpTimeoutConfig {
    /// Use one operation timeout for everything except screenshots
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
            screenshot_timeout: timeout.max(Duration::from_secs(30)),
            navigation_timeout: timeout,
            execution_timeout: timeout,
        }
    }

    /// Get timeout duration for a specific command method
    pub fn for_method(&self, method: &str) -> Duration {
        let method_lower = method.to_lowercase();

        if method_lower.contains("screenshot") || method_lower.contains("capture") {
            return self.screenshot_timeout;
        }

        if method_lower.contains("navigate") || method_lower.contains("reload") {
            return self.navigation_timeout;
        }

        if method_lower.starts_with("runtime.") {
            return self.execution_timeout;
        }

        self.default_timeout
    }
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: Mutex<Option<WsSink>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending_commands: PendingMap,
    /// Is connection active
    is_active: Arc<AtomicBool>,
    /// Timeout configuration
    timeouts: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Connect to a target
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn connect<S: Into<String>>(url: S, timeouts: CdpTimeoutConfig) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP WebSocket {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;

        let (sink, stream) = ws_stream.split();

        let connection = Arc::new(Self {
            url,
            sink: Mutex::new(Some(sink)),
            next_id: AtomicU64::new(1),
            pending_commands: Arc::new(Mutex::new(HashMap::new())),
            is_active: Arc::new(AtomicBool::new(true)),
            timeouts,
        });

        let pending = Arc::clone(&connection.pending_commands);
        let is_active = Arc::clone(&connection.is_active);

        tokio::spawn(async move {
            debug!("CDP reader task started");
            if let Err(e) = Self::read_loop(stream, &pending).await {
                error!("CDP reader task error: {}", e);
            }
            is_active.store(false, Ordering::SeqCst);
            // Dropping the senders wakes every waiter with a closed channel
            pending.lock().await.clear();
            debug!("CDP reader task exited");
        });

        info!("WebSocket connection established");
        Ok(connection)
    }

    /// WebSocket URL of this connection
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reader loop over the read half of the socket
    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending: &PendingMap,
    ) -> Result<(), Error> {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, pending).await,
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    let msg = e.to_string();
                    if msg.contains("closed") || msg.contains("Closed") {
                        warn!("WebSocket connection closed: {}", msg);
                        break;
                    }
                    return Err(Error::websocket(msg));
                }
            }
        }
        Ok(())
    }

    /// Route one incoming text frame
    async fn dispatch(text: &str, pending: &PendingMap) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            let mut pending = pending.lock().await;
            match pending.remove(&response.id) {
                Some(cmd) => {
                    debug!("Response for command {} ({})", response.id, cmd.method);
                    let _ = cmd.sender.send(CdpResponse {
                        id: response.id,
                        result: Some(response.result),
                        error: response.error.map(|e| CdpErrorResponse {
                            code: e.code,
                            message: e.message,
                            data: e.data,
                        }),
                    });
                }
                None => warn!("Received response for unknown command ID: {}", response.id),
            }
            return;
        }

        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            debug!("Ignoring event: {}", notification.method);
            return;
        }

        warn!("Unknown message format: {}", text);
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };
        let json = serde_json::to_string(&request)?;
        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        self.pending_commands.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        {
            let mut sink = self.sink.lock().await;
            let sent = match sink.as_mut() {
                Some(sink) => sink
                    .send(Message::Text(json))
                    .await
                    .map_err(|e| Error::websocket(format!("Failed to send message: {}", e))),
                None => Err(Error::websocket("WebSocket sink not available")),
            };
            if let Err(e) = sent {
                self.pending_commands.lock().await.remove(&id);
                return Err(e);
            }
        }

        let timeout = self.timeouts.for_method(method);
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{}: {} (code: {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed while waiting for {}",
                method
            ))),
            Err(_) => {
                self.pending_commands.lock().await.remove(&id);
                Err(Error::timeout(format!(
                    "Command {} ({}) timed out after {:?}",
                    id, method, timeout
                )))
            }
        }
    }

    /// Close the connection
    async fn close(&self) -> Result<(), Error> {
        info!("Closing CDP WebSocket connection to {}", self.url);
        self.is_active.store(false, Ordering::SeqCst);

        let mut sink = self.sink.lock().await;
        if let Some(mut ws_sink) = sink.take() {
            ws_sink
                .close()
                .await
                .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))?;
        }
        Ok(())
    }

    /// Check if connection is active
    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_for_method() {
        let timeouts = CdpTimeoutConfig::default();
        assert_eq!(timeouts.for_method("Page.captureScreenshot"), Duration::from_secs(60));
        assert_eq!(timeouts.for_method("Page.navigate"), Duration::from_secs(60));
        assert_eq!(timeouts.for_method("Runtime.evaluate"), Duration::from_secs(30));
        assert_eq!(timeouts.for_method("Input.dispatchMouseEvent"), Duration::from_secs(30));
    }

    #[test]
    fn test_uniform_timeouts_keep_screenshot_floor() {
        let timeouts = CdpTimeoutConfig::uniform(Duration::from_millis(5000));
        assert_eq!(timeouts.for_method("Runtime.evaluate"), Duration::from_millis(5000));
        assert_eq!(timeouts.for_method("Page.captureScreenshot"), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_dispatch_routes_response_to_pending() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(
            7,
            PendingCommand {
                sender: tx,
                method: "Runtime.evaluate".to_string(),
            },
        );

        CdpWebSocketConnection::dispatch(
            r#"{"id":7,"result":{"result":{"type":"number","value":3}}}"#,
            &pending,
        )
        .await;

        let response = rx.await.unwrap();
        assert_eq!(response.id, 7);
        assert!(response.error.is_none());
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_ignores_events_and_unknown_ids() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, mut rx) = oneshot::channel();
        pending.lock().await.insert(
            3,
            PendingCommand {
                sender: tx,
                method: "Page.navigate".to_string(),
            },
        );

        CdpWebSocketConnection::dispatch(
            r#"{"method":"Page.loadEventFired","params":{"timestamp":1.0}}"#,
            &pending,
        )
        .await;
        CdpWebSocketConnection::dispatch(r#"{"id":99,"result":{}}"#, &pending).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(pending.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_sink_leaves_no_pending_command() {
        let connection = CdpWebSocketConnection {
            url: "ws://127.0.0.1:9/devtools/page/closed".to_string(),
            sink: Mutex::new(None),
            next_id: AtomicU64::new(1),
            pending_commands: Arc::new(Mutex::new(HashMap::new())),
            is_active: Arc::new(AtomicBool::new(true)),
            timeouts: CdpTimeoutConfig::default(),
        };

        let err = connection
            .send_command("Runtime.evaluate", serde_json::json!({"expression": "1"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WebSocket(msg) if msg.contains("sink not available")));
        assert!(connection.pending_commands.lock().await.is_empty());
        assert_eq!(connection.next_id.load(Ordering::SeqCst), 2);
    }
}
