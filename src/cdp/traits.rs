//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::types::Clip;

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client that provides typed methods for common CDP operations.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Start navigating to a URL; does not wait for load
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Capture a PNG screenshot, optionally clipped to a page region
    async fn screenshot(&self, clip: Option<Clip>) -> Result<Vec<u8>, crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Frame being navigated
    pub frame_id: Option<String>,
    /// Loader ID, absent for same-document navigations
    pub loader_id: Option<String>,
    /// Requested URL
    pub url: String,
}

/// JavaScript evaluation result
#[derive(Debug, Clone)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// Convert back into a JSON value
    pub fn into_value(self) -> Value {
        match self {
            EvaluationResult::String(s) => Value::String(s),
            EvaluationResult::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            EvaluationResult::Bool(b) => Value::Bool(b),
            EvaluationResult::Null => Value::Null,
            EvaluationResult::Object(v) => v,
        }
    }
}

/// CDP browser trait
///
/// Controls browser-level operations via the DevTools HTTP endpoint.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create a new CDP client attached to a target WebSocket URL
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, crate::Error>;

    /// Close all connections opened through this browser
    async fn close(&self) -> Result<(), crate::Error>;

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// Create a new page target and return its WebSocket URL
    async fn create_target(&self, url: &str) -> Result<String, crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// Browser-level WebSocket URL
    pub web_socket_debugger_url: Option<String>,
}
