//! Browser session lifecycle
//!
//! A [`Session`] either attaches to a running browser (`cdp_endpoint`) or
//! launches a local Chrome/Chromium with remote debugging on a free port,
//! then opens one page target for the whole run.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};

use super::page::CdpPage;
use super::traits::PageDriver;
use crate::cdp::{CdpBrowser, CdpBrowserImpl, CdpTimeoutConfig};
use crate::config::Config;
use crate::{Error, Result};

/// Executables tried when `chrome_path` is not configured
const CHROME_CANDIDATES: [&str; 4] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"];

/// How long a freshly launched browser gets to open its DevTools endpoint
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

const STARTUP_POLL: Duration = Duration::from_millis(200);

/// A browser with one open page
#[derive(Debug)]
pub struct Session {
    browser: CdpBrowserImpl,
    page: Arc<CdpPage>,
    child: Option<Child>,
    profile_dir: Option<PathBuf>,
}

impl Session {
    /// Attach to or launch a browser and open a blank page
    #[instrument(skip(config), fields(browser = %config.browser, headless = config.headless))]
    pub async fn start(config: &Config) -> Result<Self> {
        if !config.is_chromium() {
            warn!(
                "Browser '{}' cannot be driven over DevTools; using Chromium instead",
                config.browser
            );
        }

        let timeouts = CdpTimeoutConfig::uniform(config.timeout());
        let (endpoint, child, profile_dir) = match &config.cdp_endpoint {
            Some(endpoint) => {
                info!("Attaching to browser at {}", endpoint);
                (endpoint.clone(), None, None)
            }
            None => {
                let (endpoint, child, profile_dir) = launch(config)?;
                (endpoint, Some(child), Some(profile_dir))
            }
        };

        let browser = CdpBrowserImpl::new(endpoint, timeouts);
        wait_for_devtools(&browser).await?;

        let target = browser.create_target("about:blank").await?;
        let client = browser.create_client(&target).await?;
        if config.ignore_https_errors {
            client
                .call_method(
                    "Security.setIgnoreCertificateErrors",
                    serde_json::json!({ "ignore": true }),
                )
                .await?;
        }

        info!("Browser session ready");
        Ok(Self {
            browser,
            page: Arc::new(CdpPage::new(client, config.timeout())),
            child,
            profile_dir,
        })
    }

    /// The session's page
    pub fn page(&self) -> Arc<dyn PageDriver> {
        self.page.clone()
    }

    /// Close connections, stop a launched browser and remove its profile
    pub async fn stop(mut self) -> Result<()> {
        self.browser.close().await?;

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop browser process: {}", e);
            }
        }
        if let Some(dir) = self.profile_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Could not remove profile {}: {}", dir.display(), e);
            }
        }

        info!("Browser session closed");
        Ok(())
    }
}

fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn launch(config: &Config) -> Result<(String, Child, PathBuf)> {
    let port = free_port()?;
    let profile_dir = std::env::temp_dir().join(format!("autotest-profile-{}", uuid::Uuid::new_v4()));

    let mut args = vec![
        format!("--remote-debugging-port={}", port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--window-size=1920,1080".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    if config.ignore_https_errors {
        args.push("--ignore-certificate-errors".to_string());
    }

    let candidates: Vec<String> = match &config.chrome_path {
        Some(path) => vec![path.clone()],
        None => CHROME_CANDIDATES.iter().map(|s| s.to_string()).collect(),
    };

    for program in &candidates {
        let spawned = Command::new(program)
            .args(&args)
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        match spawned {
            Ok(child) => {
                info!("Launched {} (debugging port {})", program, port);
                return Ok((format!("http://127.0.0.1:{}", port), child, profile_dir));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found", program);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::configuration(format!(
        "No Chrome executable found (tried {}); set chrome_path or cdp_endpoint",
        candidates.join(", ")
    )))
}

async fn wait_for_devtools(browser: &CdpBrowserImpl) -> Result<()> {
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        match browser.get_version().await {
            Ok(version) => {
                debug!("Connected to {} (protocol {})", version.product, version.protocol_version);
                return Ok(());
            }
            Err(e) if Instant::now() < deadline => {
                debug!("DevTools not ready yet: {}", e);
                tokio::time::sleep(STARTUP_POLL).await;
            }
            Err(e) => {
                return Err(Error::timeout(format!(
                    "DevTools endpoint did not come up within {:?}: {}",
                    STARTUP_TIMEOUT, e
                )))
            }
        }
    }
}
