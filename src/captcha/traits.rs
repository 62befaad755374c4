//! Captcha solver trait definition

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// OCR capability turning a captcha image into text
#[async_trait]
pub trait CaptchaSolver: Send + Sync + std::fmt::Debug {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Recognize the text in the PNG at `image`
    async fn solve(&self, image: &Path) -> Result<String>;
}
