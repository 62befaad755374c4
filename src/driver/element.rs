//! Element handles of a CDP page

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::page::PageContext;
use super::traits::{BoundingBox, ClickOptions, ElementHandle, OptionMatch};
use crate::cdp::Clip;
use crate::{Error, Result};

const VISIBILITY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct Center {
    x: f64,
    y: f64,
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct SelectOutcome {
    #[serde(default)]
    missing: Option<String>,
    #[serde(default)]
    selected: Vec<String>,
}

/// Element registered in the page runtime
#[derive(Debug, Clone)]
pub struct CdpElement {
    id: String,
    context: Arc<PageContext>,
}

impl CdpElement {
    pub(crate) fn new(id: String, context: Arc<PageContext>) -> Self {
        Self { id, context }
    }

    fn arg(&self) -> Value {
        json!(self.id)
    }

    /// Scroll into view and return the centre, waiting for visibility unless forced
    async fn actionable_center(&self, force: bool) -> Result<Center> {
        let deadline = Instant::now() + self.context.timeout;
        loop {
            let center: Center = self.context.call("center", &[self.arg()]).await?;
            if force || center.visible {
                return Ok(center);
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(format!(
                    "Element {} not visible after {:?}",
                    self.id, self.context.timeout
                )));
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn set_checked(&self, checked: bool) -> Result<()> {
        let state: bool = self
            .context
            .call("setChecked", &[self.arg(), json!(checked)])
            .await?;
        if state != checked {
            return Err(Error::cdp(format!(
                "Clicking element {} did not change its checked state",
                self.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for CdpElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn is_visible(&self) -> Result<bool> {
        self.context.call("visible", &[self.arg()]).await
    }

    async fn text_content(&self) -> Result<String> {
        self.context.call("text", &[self.arg()]).await
    }

    async fn input_value(&self) -> Result<String> {
        self.context.call("value", &[self.arg()]).await
    }

    async fn is_checked(&self) -> Result<bool> {
        self.context.call("checked", &[self.arg()]).await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.context.call("attr", &[self.arg(), json!(name)]).await
    }

    async fn tag_name(&self) -> Result<String> {
        self.context.call("tag", &[self.arg()]).await
    }

    async fn is_multiple(&self) -> Result<bool> {
        self.context.call("multiple", &[self.arg()]).await
    }

    async fn option_labels(&self) -> Result<Vec<String>> {
        self.context.call("options", &[self.arg()]).await
    }

    async fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        let rect: Rect = self.context.call("box", &[self.arg()]).await?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(None);
        }
        Ok(Some(BoundingBox {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }))
    }

    async fn click(&self, options: ClickOptions) -> Result<()> {
        let center = self.actionable_center(options.force).await?;
        debug!("Click {} at ({:.0}, {:.0})", self.id, center.x, center.y);
        self.context.mouse("mouseMoved", center.x, center.y).await?;
        self.context.mouse("mousePressed", center.x, center.y).await?;
        self.context.mouse("mouseReleased", center.x, center.y).await
    }

    async fn hover(&self) -> Result<()> {
        let center = self.actionable_center(true).await?;
        self.context.mouse("mouseMoved", center.x, center.y).await
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.actionable_center(false).await?;
        let _: bool = self.context.call("fill", &[self.arg(), json!(text)]).await?;
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        self.set_checked(true).await
    }

    async fn uncheck(&self) -> Result<()> {
        self.set_checked(false).await
    }

    async fn select_options(&self, values: &[String], by: OptionMatch) -> Result<Vec<String>> {
        let outcome: SelectOutcome = self
            .context
            .call("select", &[self.arg(), json!(values), json!(by.as_str())])
            .await?;
        match outcome.missing {
            Some(value) => Err(Error::option_not_found(format!("{} (by {})", value, by.as_str()))),
            None => Ok(outcome.selected),
        }
    }

    async fn scroll_into_view(&self) -> Result<()> {
        let _: bool = self.context.call("scroll", &[self.arg()]).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.scroll_into_view().await?;
        let rect = self
            .bounding_box()
            .await?
            .ok_or_else(|| Error::not_found(format!("Element {} has no visible box", self.id)))?;
        self.context
            .client
            .screenshot(Some(Clip {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: 1.0,
            }))
            .await
    }
}
