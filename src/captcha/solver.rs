//! Captcha solver backends

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use super::traits::CaptchaSolver;
use crate::config::{CaptchaEngine, Config};
use crate::{Error, Result};

/// Characters tesseract may emit
pub const WHITELIST: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shells out to the `tesseract` command line tool
#[derive(Debug, Clone)]
pub struct TesseractSolver {
    program: String,
}

impl TesseractSolver {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractSolver {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl CaptchaSolver for TesseractSolver {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn solve(&self, image: &Path) -> Result<String> {
        debug!("Running {} on {}", self.program, image.display());
        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", WHITELIST))
            .output()
            .await
            .map_err(|e| Error::captcha(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(Error::captcha(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Recognition switched off; every attempt fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSolver;

#[async_trait]
impl CaptchaSolver for DisabledSolver {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn solve(&self, _image: &Path) -> Result<String> {
        Err(Error::captcha(
            "captcha recognition is disabled (set captcha_engine: tesseract and install Tesseract OCR)",
        ))
    }
}

/// Build the solver selected by `captcha_engine`
pub fn solver_from_config(config: &Config) -> Arc<dyn CaptchaSolver> {
    match config.captcha_engine {
        CaptchaEngine::Tesseract => Arc::new(TesseractSolver::new(config.tesseract_path.clone())),
        CaptchaEngine::Disabled => Arc::new(DisabledSolver),
    }
}
