//! CDP browser control implementation
//!
//! Talks to the DevTools HTTP endpoint (`/json/version`, `/json/new`) and
//! opens WebSocket connections to page targets.

use super::client::CdpClientImpl;
use super::connection::{CdpTimeoutConfig, CdpWebSocketConnection};
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "http://127.0.0.1:9222" or "ws://localhost:9222")
    endpoint: String,
    /// HTTP client for the /json endpoints
    http: reqwest::Client,
    /// Command timeouts for new connections
    timeouts: CdpTimeoutConfig,
    /// Active connections (target URL -> connection)
    connections: Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser endpoint, `ws://` and `http://` forms are both accepted
    pub fn new<S: Into<String>>(endpoint: S, timeouts: CdpTimeoutConfig) -> Self {
        let endpoint = endpoint.into();
        info!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            timeouts,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// HTTP base URL of the DevTools endpoint
    pub fn http_endpoint(&self) -> String {
        let endpoint = self
            .endpoint
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        // A browser-level ws URL carries a /devtools/browser/<id> path
        match endpoint.find("/devtools/") {
            Some(idx) => endpoint[..idx].to_string(),
            None => endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Number of open target connections
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::connect(target_url, self.timeouts.clone()).await?;
        self.connections
            .lock()
            .await
            .insert(target_url.to_string(), Arc::clone(&connection) as Arc<dyn CdpConnection>);

        let client = Arc::new(CdpClientImpl::new(connection));
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }

    async fn close(&self) -> Result<(), Error> {
        let mut connections = self.connections.lock().await;
        info!("Closing {} CDP connections", connections.len());

        for (target, connection) in connections.drain() {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target, e);
            }
        }

        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let version_json: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::cdp(format!("Failed to connect to browser at {}: {}", url, e)))?
            .json()
            .await
            .map_err(|e| Error::cdp(format!("Failed to parse version: {}", e)))?;

        let field = |name: &str| {
            version_json
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };

        Ok(BrowserVersion {
            protocol_version: field("Protocol-Version"),
            product: field("Browser"),
            user_agent: field("User-Agent"),
            web_socket_debugger_url: version_json
                .get("webSocketDebuggerUrl")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }

    async fn create_target(&self, url: &str) -> Result<String, Error> {
        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        debug!("Creating new page via HTTP API: {}", new_url);

        let response_text = self
            .http
            .put(&new_url)
            .send()
            .await
            .map_err(|e| {
                Error::cdp(format!(
                    "Failed to reach DevTools endpoint {}: {}",
                    self.endpoint, e
                ))
            })?
            .text()
            .await
            .map_err(|e| Error::cdp(format!("Failed to read response: {}", e)))?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::cdp(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::cdp("No webSocketDebuggerUrl in new target response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_endpoint_from_ws() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222", CdpTimeoutConfig::default());
        assert_eq!(browser.http_endpoint(), "http://localhost:9222");
    }

    #[test]
    fn test_http_endpoint_strips_browser_path() {
        let browser = CdpBrowserImpl::new(
            "ws://127.0.0.1:9333/devtools/browser/6f1c",
            CdpTimeoutConfig::default(),
        );
        assert_eq!(browser.http_endpoint(), "http://127.0.0.1:9333");
    }

    #[test]
    fn test_http_endpoint_passthrough() {
        let browser = CdpBrowserImpl::new("http://127.0.0.1:9222/", CdpTimeoutConfig::default());
        assert_eq!(browser.http_endpoint(), "http://127.0.0.1:9222");
    }

    #[tokio::test]
    async fn test_get_version_unreachable() {
        let browser = CdpBrowserImpl::new("http://127.0.0.1:1", CdpTimeoutConfig::default());
        assert!(browser.get_version().await.is_err());
    }
}
