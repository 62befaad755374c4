//! CDP-backed page driver
//!
//! Every element operation is a `Runtime.evaluate` call into the injected
//! page runtime; pointer and keyboard input go through the `Input` domain so
//! framework listeners see trusted events.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::element::CdpElement;
use super::query::Query;
use super::scripts;
use super::traits::{ElementHandle, LoadState, Modifier, PageDriver, Root};
use crate::cdp::CdpClient;
use crate::{Error, Result};

/// Interval between readiness polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period without new resource entries that counts as network idle
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// Marks the current document so a stale `complete` readyState is ignored
const MARK_STALE: &str = "window.__autotestStale = true";

const NAVIGATION_STATE: &str = "window.__autotestStale ? 'stale' : document.readyState";

/// State shared by a page and the element handles it hands out
#[derive(Debug)]
pub(crate) struct PageContext {
    pub(crate) client: Arc<dyn CdpClient>,
    pub(crate) timeout: Duration,
    modifiers: AtomicU32,
}

impl PageContext {
    /// Run a runtime operation and decode its result
    ///
    /// The runtime is installed on first use in each document.
    pub(crate) async fn call<T: DeserializeOwned>(&self, op: &str, args: &[Value]) -> Result<T> {
        let expression = scripts::invoke(op, args);
        let mut result = self.client.evaluate(&expression, false).await?.into_value();
        if scripts::is_missing_runtime(&result) {
            debug!("Installing page runtime");
            self.client.evaluate(scripts::RUNTIME, false).await?;
            result = self.client.evaluate(&expression, false).await?.into_value();
        }
        serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Unexpected result from {}: {}", op, e)))
    }

    /// Currently held modifier mask
    pub(crate) fn modifiers(&self) -> u32 {
        self.modifiers.load(Ordering::SeqCst)
    }

    /// Dispatch one `Input.dispatchMouseEvent`
    pub(crate) async fn mouse(&self, kind: &str, x: f64, y: f64) -> Result<()> {
        let mut params = json!({
            "type": kind,
            "x": x,
            "y": y,
            "modifiers": self.modifiers(),
        });
        if kind != "mouseMoved" {
            params["button"] = json!("left");
            params["clickCount"] = json!(1);
        }
        self.client.call_method("Input.dispatchMouseEvent", params).await?;
        Ok(())
    }
}

/// Page driver over a CDP client
#[derive(Debug, Clone)]
pub struct CdpPage {
    context: Arc<PageContext>,
}

impl CdpPage {
    /// Create a page driver; `timeout` bounds navigation and visibility waits
    pub fn new(client: Arc<dyn CdpClient>, timeout: Duration) -> Self {
        Self {
            context: Arc::new(PageContext {
                client,
                timeout,
                modifiers: AtomicU32::new(0),
            }),
        }
    }

    async fn ready_state(&self) -> String {
        // Evaluation fails while the old context is torn down; treat as not ready
        match self.context.client.evaluate(NAVIGATION_STATE, false).await {
            Ok(result) => result.into_value().as_str().unwrap_or("loading").to_string(),
            Err(e) => {
                debug!("readyState poll failed: {}", e);
                "loading".to_string()
            }
        }
    }

    async fn wait_ready(&self, url: &str, wait_until: LoadState, deadline: Instant) -> Result<()> {
        loop {
            let state = self.ready_state().await;
            let ready = match wait_until {
                LoadState::DomContentLoaded => state == "interactive" || state == "complete",
                LoadState::Load | LoadState::NetworkIdle => state == "complete",
            };
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(format!(
                    "Navigation to {} did not reach {:?} (readyState: {})",
                    url, wait_until, state
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_network_idle(&self, url: &str, deadline: Instant) -> Result<()> {
        let mut seen: u64 = self.context.call("resources", &[]).await?;
        let mut quiet_since = Instant::now();
        loop {
            if quiet_since.elapsed() >= NETWORK_QUIET {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(format!("Network never went idle after loading {}", url)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            let count: u64 = self.context.call("resources", &[]).await?;
            if count != seen {
                seen = count;
                quiet_since = Instant::now();
            }
        }
    }

    async fn dispatch_key(&self, kind: &str, modifier: Modifier) -> Result<()> {
        self.context
            .client
            .call_method(
                "Input.dispatchKeyEvent",
                json!({
                    "type": kind,
                    "key": modifier.key(),
                    "code": modifier.code(),
                    "windowsVirtualKeyCode": modifier.key_code(),
                    "modifiers": self.context.modifiers(),
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    #[instrument(skip(self))]
    async fn goto(&self, url: &str, wait_until: LoadState) -> Result<()> {
        info!("Opening {}", url);
        let deadline = Instant::now() + self.context.timeout;

        // about:blank and friends may refuse evaluation; the mark is best effort
        if let Err(e) = self.context.client.evaluate(MARK_STALE, false).await {
            debug!("Could not mark current document: {}", e);
        }
        self.context.client.navigate(url).await?;
        self.wait_ready(url, wait_until, deadline).await?;
        if wait_until == LoadState::NetworkIdle {
            self.wait_network_idle(url, deadline).await?;
        }

        debug!("Page ready: {}", url);
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        let result = self.context.client.evaluate(scripts::LOCATION, false).await?;
        Ok(result.into_value().as_str().unwrap_or_default().to_string())
    }

    async fn query_all(&self, root: &Root, query: &Query) -> Result<Vec<Arc<dyn ElementHandle>>> {
        let ids: Vec<String> = self
            .context
            .call("query", &[json!(root.handle_id()), serde_json::to_value(query)?])
            .await?;
        debug!("{} -> {} match(es)", query, ids.len());
        Ok(ids
            .into_iter()
            .map(|id| Arc::new(CdpElement::new(id, Arc::clone(&self.context))) as Arc<dyn ElementHandle>)
            .collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.context.client.screenshot(None).await
    }

    async fn key_down(&self, modifier: Modifier) -> Result<()> {
        self.context.modifiers.fetch_or(modifier.bit(), Ordering::SeqCst);
        self.dispatch_key("rawKeyDown", modifier).await
    }

    async fn key_up(&self, modifier: Modifier) -> Result<()> {
        self.context.modifiers.fetch_and(!modifier.bit(), Ordering::SeqCst);
        self.dispatch_key("keyUp", modifier).await
    }
}
