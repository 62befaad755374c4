//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(
                obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "undefined" => EvaluationResult::Null,
            "object" => match &obj.value {
                None | Some(serde_json::Value::Null) => EvaluationResult::Null,
                Some(value) => EvaluationResult::Object(value.clone()),
            },
            other => {
                debug!("parse_remote_object: unsupported type '{}', returning Null", other);
                EvaluationResult::Null
            }
        }
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams { url: url.to_string() };
        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(Error::cdp(format!("Navigation to {} failed: {}", url, error_text)));
        }

        Ok(NavigationResult {
            frame_id: result
                .get("frameId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            loader_id: result
                .get("loaderId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise,
            return_by_value: true,
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(exception) = response.exception_details {
            return Err(Error::cdp(format!("Script failed: {}", exception.message())));
        }

        Ok(Self::parse_remote_object(&response.result))
    }

    async fn screenshot(&self, clip: Option<Clip>) -> Result<Vec<u8>, Error> {
        debug!("Capturing screenshot (clip: {:?})", clip);

        let params = ScreenshotParams {
            format: "png".to_string(),
            capture_beyond_viewport: clip.map(|_| true),
            clip,
        };

        let result = self
            .call_method("Page.captureScreenshot", serde_json::to_value(params)?)
            .await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        debug!("Enabling domain: {}", domain);
        self.call_method(&format!("{}.enable", domain), serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;

        if let Some(error) = response.error {
            return Err(Error::cdp(format!("{}: {} (code: {})", method, error.message, error.code)));
        }

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }
}
