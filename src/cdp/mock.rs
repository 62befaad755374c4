//! Mock CDP implementation for testing
//!
//! `MockCdpConnection` records every command it receives and answers from a
//! per-method queue of scripted replies, falling back to canned defaults.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cdp::traits::*;
use crate::Error;

/// 1x1 transparent PNG
const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// A scripted reply
#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Timeout,
}

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    id: String,
    is_active: Arc<AtomicBool>,
    next_id: AtomicU64,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            is_active: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
            replies: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Connection identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a result for the next call of `method`
    pub async fn respond(&self, method: &str, result: Value) {
        self.replies
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Result(result));
    }

    /// Queue a `Runtime.evaluate` reply carrying a by-value result
    pub async fn respond_eval(&self, value: Value) {
        let remote = match &value {
            Value::String(_) => serde_json::json!({ "type": "string", "value": value }),
            Value::Number(_) => serde_json::json!({ "type": "number", "value": value }),
            Value::Bool(_) => serde_json::json!({ "type": "boolean", "value": value }),
            Value::Null => serde_json::json!({ "type": "object", "subtype": "null", "value": null }),
            _ => serde_json::json!({ "type": "object", "value": value }),
        };
        self.respond("Runtime.evaluate", serde_json::json!({ "result": remote }))
            .await;
    }

    /// Make the next call of `method` time out
    pub async fn time_out(&self, method: &str) {
        self.replies
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Timeout);
    }

    /// Commands received so far
    pub async fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().await.clone()
    }

    /// Commands received so far for one method
    pub async fn sent_for(&self, method: &str) -> Vec<Value> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn default_reply(method: &str) -> Value {
        match method {
            "Page.navigate" => serde_json::json!({
                "frameId": uuid::Uuid::new_v4().to_string(),
                "loaderId": uuid::Uuid::new_v4().to_string(),
            }),
            "Runtime.evaluate" => serde_json::json!({
                "result": { "type": "undefined" }
            }),
            "Page.captureScreenshot" => serde_json::json!({ "data": PNG_1X1 }),
            _ => serde_json::json!({}),
        }
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sent.lock().await.push((method.to_string(), params));

        let scripted = self
            .replies
            .lock()
            .await
            .get_mut(method)
            .and_then(|queue| queue.pop_front());

        let result = match scripted {
            Some(Reply::Result(value)) => value,
            Some(Reply::Timeout) => {
                return Err(Error::timeout(format!("Command {} ({}) timed out", id, method)))
            }
            None => Self::default_reply(method),
        };

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}
