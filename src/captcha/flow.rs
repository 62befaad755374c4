//! Capture, recognize and type a captcha

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::traits::CaptchaSolver;
use crate::config::{settle, Config, Pacing};
use crate::driver::ElementHandle;
use crate::locator::{ElementLocator, SelectorDescriptor};
use crate::{Error, Result};

/// Captcha image candidates tried by [`CaptchaFlow::auto`]
pub fn image_candidates() -> Vec<SelectorDescriptor> {
    vec![
        SelectorDescriptor::css("img[src*='captcha']"),
        SelectorDescriptor::css("img[src*='verify']"),
        SelectorDescriptor::css("img[alt*='验证码']"),
        SelectorDescriptor::css("img[alt*='captcha']"),
        SelectorDescriptor::css(".captcha img"),
        SelectorDescriptor::css(".verify-code img"),
        SelectorDescriptor::xpath("//img[contains(@src, 'captcha')]"),
        SelectorDescriptor::xpath("//img[contains(@src, 'verify')]"),
    ]
}

/// Captcha input candidates tried by [`CaptchaFlow::auto`]
pub fn input_candidates() -> Vec<SelectorDescriptor> {
    vec![
        SelectorDescriptor::text("验证码"),
        SelectorDescriptor::text("请输入验证码"),
        SelectorDescriptor::css("input[name*='captcha']"),
        SelectorDescriptor::css("input[name*='verify']"),
        SelectorDescriptor::css("input[placeholder*='验证码']"),
        SelectorDescriptor::css("input[placeholder*='captcha']"),
        SelectorDescriptor::xpath("//input[contains(@placeholder, '验证码')]"),
        SelectorDescriptor::xpath("//input[contains(@name, 'captcha')]"),
    ]
}

#[derive(Debug, Clone)]
pub struct CaptchaFlow {
    locator: Arc<ElementLocator>,
    solver: Arc<dyn CaptchaSolver>,
    dir: PathBuf,
    attempts: u32,
    pacing: Pacing,
}

impl CaptchaFlow {
    pub fn new(locator: Arc<ElementLocator>, solver: Arc<dyn CaptchaSolver>, config: &Config) -> Self {
        Self {
            locator,
            solver,
            dir: config.captcha_dir(),
            attempts: config.retry_captcha.max(1),
            pacing: config.pacing,
        }
    }

    /// Recognize the captcha shown by `image` and type it into `input`
    #[instrument(skip(self, image, input), fields(image = %image, input = %input))]
    pub async fn solve_and_input(&self, image: &SelectorDescriptor, input: &SelectorDescriptor) -> Result<String> {
        let image = self.locator.locate(image).await?;
        let text = self.recognize(&image).await?;
        let input = self.locator.locate(input).await?;
        self.type_in(&input, &text).await?;
        Ok(text)
    }

    /// Find the captcha image and input among well-known patterns, then solve
    #[instrument(skip(self))]
    pub async fn auto(&self) -> Result<String> {
        let image = self
            .first_visible(&image_candidates())
            .await?
            .ok_or_else(|| Error::captcha("no captcha image found"))?;
        let input = self
            .first_visible(&input_candidates())
            .await?
            .ok_or_else(|| Error::captcha("no captcha input found"))?;

        let text = self.recognize(&image).await?;
        self.type_in(&input, &text).await?;
        Ok(text)
    }

    async fn first_visible(&self, candidates: &[SelectorDescriptor]) -> Result<Option<Arc<dyn ElementHandle>>> {
        for desc in candidates {
            let found = match self.locator.probe(desc).await {
                Ok(found) => found,
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) => {
                    debug!("Candidate {} failed: {}", desc, e);
                    continue;
                }
            };
            if let Some(handle) = found {
                if handle.is_visible().await.unwrap_or(false) {
                    debug!("Using {}", desc);
                    return Ok(Some(handle));
                }
            }
        }
        Ok(None)
    }

    /// Screenshot and OCR `image`, retrying on failed or empty recognition
    async fn recognize(&self, image: &Arc<dyn ElementHandle>) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            let png = image.screenshot().await?;
            let path = self.dir.join(format!(
                "captcha_{}_{}.png",
                Local::now().format("%Y%m%d_%H%M%S_%3f"),
                attempt
            ));
            tokio::fs::write(&path, &png).await?;

            match self.solver.solve(&path).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!("Recognized captcha '{}' with {}", text.trim(), self.solver.name());
                    return Ok(text.trim().to_string());
                }
                Ok(_) => {
                    warn!("Captcha attempt {}/{} returned no text", attempt, self.attempts);
                    last_error = Some(Error::captcha("recognition returned no text"));
                }
                Err(e) => {
                    warn!("Captcha attempt {}/{} failed: {}", attempt, self.attempts, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::captcha(format!(
            "recognition failed after {} attempt(s): {}",
            self.attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn type_in(&self, input: &Arc<dyn ElementHandle>, text: &str) -> Result<()> {
        input.fill(text).await?;
        settle(self.pacing.form_ms).await;
        Ok(())
    }
}
