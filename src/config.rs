//! Configuration management for autotest
//!
//! Settings are read from an optional file (YAML, TOML or JSON, chosen by
//! extension) and then overridden by `AUTOTEST_*` environment variables.
//! Nested keys use a double underscore, e.g. `AUTOTEST_PACING__STEP_MS=0`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix
const ENV_PREFIX: &str = "AUTOTEST";

/// Which OCR backend solves captchas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaEngine {
    /// Shell out to the `tesseract` binary
    #[default]
    Tesseract,
    /// Always fail recognition
    Disabled,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser name (chromium, firefox, webkit); only chromium speaks CDP
    pub browser: String,

    /// Headless mode
    pub headless: bool,

    /// Timeout for page operations in milliseconds
    pub timeout: u64,

    /// Captcha recognition attempts
    pub retry_captcha: u32,

    /// Ignore HTTPS certificate errors
    pub ignore_https_errors: bool,

    /// Keep the browser open after the run
    pub keep_browser_open: bool,

    /// Connect to an already running browser instead of launching one
    pub cdp_endpoint: Option<String>,

    /// Chrome executable path
    pub chrome_path: Option<String>,

    /// Directory for error screenshots and captcha captures
    pub artifacts_dir: PathBuf,

    /// OCR backend
    pub captcha_engine: CaptchaEngine,

    /// `tesseract` binary used by the OCR backend
    pub tesseract_path: String,

    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Settle delays between actions
    pub pacing: Pacing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: "chromium".to_string(),
            headless: false,
            timeout: 5000,
            retry_captcha: 3,
            ignore_https_errors: false,
            keep_browser_open: false,
            cdp_endpoint: None,
            chrome_path: None,
            artifacts_dir: PathBuf::from("assets"),
            captcha_engine: CaptchaEngine::Tesseract,
            tesseract_path: "tesseract".to_string(),
            log_level: "info".to_string(),
            pacing: Pacing::default(),
        }
    }
}

/// Fixed settle delays (milliseconds) inserted after actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// After every successful step
    pub step_ms: u64,
    /// After a click step
    pub click_ms: u64,
    /// After a form control mutation
    pub form_ms: u64,
    /// Between options of a custom dropdown and between radios of a batch
    pub option_ms: u64,
    /// After opening a custom dropdown
    pub dropdown_open_ms: u64,
    /// After clicking a menu item
    pub menu_ms: u64,
    /// After hovering a menu item, and before descending a level
    pub menu_expand_ms: u64,
    /// After clicking a table row action
    pub table_action_ms: u64,
    /// After filling each search input
    pub search_input_ms: u64,
    /// After clicking the search button
    pub search_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            step_ms: 300,
            click_ms: 500,
            form_ms: 200,
            option_ms: 100,
            dropdown_open_ms: 300,
            menu_ms: 300,
            menu_expand_ms: 200,
            table_action_ms: 300,
            search_input_ms: 200,
            search_ms: 500,
        }
    }
}

impl Pacing {
    /// No delays at all
    pub fn none() -> Self {
        Self {
            step_ms: 0,
            click_ms: 0,
            form_ms: 0,
            option_ms: 0,
            dropdown_open_ms: 0,
            menu_ms: 0,
            menu_expand_ms: 0,
            table_action_ms: 0,
            search_input_ms: 0,
            search_ms: 0,
        }
    }
}

/// Sleep for a settle delay given in milliseconds
pub async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

impl Config {
    /// Load configuration from an optional file layered under the environment
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path));
            } else {
                info!("Config file {} not found, using defaults", path.display());
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to read config: {}", e)))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config.normalized())
    }

    /// Load configuration from a file only
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config.normalized())
    }

    /// Zero or empty values fall back to defaults
    fn normalized(mut self) -> Self {
        let defaults = Config::default();
        if self.browser.trim().is_empty() {
            self.browser = defaults.browser;
        }
        if self.timeout == 0 {
            self.timeout = defaults.timeout;
        }
        if self.retry_captcha == 0 {
            self.retry_captcha = defaults.retry_captcha;
        }
        debug!("Effective configuration: {:?}", self);
        self
    }

    /// Page operation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Whether the configured browser is driven over CDP natively
    pub fn is_chromium(&self) -> bool {
        matches!(
            self.browser.to_ascii_lowercase().as_str(),
            "chromium" | "chrome" | "google-chrome"
        )
    }

    /// Directory holding failure screenshots
    pub fn errors_dir(&self) -> PathBuf {
        self.artifacts_dir.join("errors")
    }

    /// Directory holding captcha captures
    pub fn captcha_dir(&self) -> PathBuf {
        self.artifacts_dir.join("captcha")
    }
}
