//! Step interpreter
//!
//! Runs the steps of a case strictly in order. The first failing step takes
//! a best-effort screenshot and aborts the case; the first failing case
//! aborts the suite.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::report::{CaseReport, CaseStatus, SuiteReport};
use super::step::{AssertMode, CaptchaTarget, Expectation, Step, TestCase, TestSuite};
use crate::captcha::{CaptchaFlow, CaptchaSolver};
use crate::config::{settle, Config, Pacing};
use crate::driver::{ClickOptions, LoadState, PageDriver};
use crate::forms::FormEngine;
use crate::locator::{ElementLocator, SelectorDescriptor};
use crate::menu::MenuNavigator;
use crate::table::TableEngine;
use crate::{Error, Result};

/// Executes test cases against one page
#[derive(Debug, Clone)]
pub struct Runner {
    page: Arc<dyn PageDriver>,
    locator: Arc<ElementLocator>,
    forms: FormEngine,
    tables: TableEngine,
    menus: MenuNavigator,
    captcha: CaptchaFlow,
    pacing: Pacing,
    errors_dir: PathBuf,
}

impl Runner {
    pub fn new(page: Arc<dyn PageDriver>, config: &Config, solver: Arc<dyn CaptchaSolver>) -> Self {
        let locator = Arc::new(ElementLocator::new(Arc::clone(&page), config.timeout()));
        Self {
            forms: FormEngine::new(Arc::clone(&locator), config.pacing),
            tables: TableEngine::new(Arc::clone(&locator), config.pacing),
            menus: MenuNavigator::new(Arc::clone(&locator), config.pacing),
            captcha: CaptchaFlow::new(Arc::clone(&locator), solver, config),
            pacing: config.pacing,
            errors_dir: config.errors_dir(),
            locator,
            page,
        }
    }

    /// Run every step of `case`; a failure is reported as `StepFailed`
    #[instrument(skip(self, case), fields(case = %case.name))]
    pub async fn run_case(&self, case: &TestCase) -> Result<()> {
        info!("Running case '{}'", case.name);
        let total = case.steps.len();

        for (i, raw) in case.steps.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, raw.action);
            let outcome = match Step::try_from(raw) {
                Ok(step) => self.execute(&step).await,
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                error!("Step [{}] {} failed: {}", i + 1, raw.action, e);
                self.capture_error_screenshot().await;
                return Err(Error::step_failed(i + 1, raw.action.clone(), e));
            }
            settle(self.pacing.step_ms).await;
        }

        info!("Case '{}' passed", case.name);
        Ok(())
    }

    /// Run cases in order, stopping at the first failure
    pub async fn run_suite(&self, suite: &TestSuite) -> SuiteReport {
        let started_at = Local::now();
        let started = Instant::now();
        let mut cases = Vec::with_capacity(suite.len());
        let mut aborted = false;

        for case in &suite.cases {
            if aborted {
                cases.push(CaseReport {
                    name: case.name.clone(),
                    status: CaseStatus::NotRun,
                    duration: Default::default(),
                });
                continue;
            }

            let case_started = Instant::now();
            let status = match self.run_case(case).await {
                Ok(()) => CaseStatus::Passed,
                Err(Error::StepFailed { index, action, source }) => CaseStatus::Failed {
                    step: index,
                    action,
                    error: *source,
                },
                Err(other) => CaseStatus::Failed {
                    step: 0,
                    action: String::new(),
                    error: other,
                },
            };
            aborted = matches!(status, CaseStatus::Failed { .. });
            cases.push(CaseReport {
                name: case.name.clone(),
                status,
                duration: case_started.elapsed(),
            });
        }

        let report = SuiteReport {
            started_at,
            duration: started.elapsed(),
            cases,
        };
        report.log();
        report
    }

    /// Load a suite file and run it
    pub async fn run_suite_file(&self, path: &Path) -> Result<SuiteReport> {
        info!("Loading test file {}", path.display());
        let suite = TestSuite::from_file(path).await?;
        Ok(self.run_suite(&suite).await)
    }

    /// Execute one validated step
    pub async fn execute(&self, step: &Step) -> Result<()> {
        match step {
            Step::Goto { url } => self.page.goto(url, LoadState::NetworkIdle).await,
            Step::Input { target, text, expect } => {
                self.locator.locate(target).await?.fill(text).await?;
                match expect {
                    Some(expect) => self.verify(expect).await,
                    None => Ok(()),
                }
            }
            Step::Click { target } => self.click(target).await,
            Step::Assert { target, expect } => {
                let element = self.locator.locate(target).await?;
                if !element.is_visible().await? {
                    return Err(Error::assertion_failed(format!("{} is not visible", target)));
                }
                match expect {
                    Some(expect) => self.verify(expect).await,
                    None => Ok(()),
                }
            }
            Step::MenuClick { path } => self.menus.click_path(path).await,
            Step::CaptchaInput(target) => {
                let text = match target {
                    CaptchaTarget::Auto => self.captcha.auto().await?,
                    CaptchaTarget::Manual { image, input } => self.captcha.solve_and_input(image, input).await?,
                };
                debug!("Captcha entered: {}", text);
                Ok(())
            }
            Step::SelectOption { target, value } => self.forms.select_option(target, value).await,
            Step::SelectOptions { target, values } => self.forms.set_select_values(target, values).await,
            Step::CheckboxToggle { target } => {
                let checked = self.forms.toggle_checkbox(target).await?;
                debug!("{} is now {}", target, if checked { "checked" } else { "unchecked" });
                Ok(())
            }
            Step::CheckboxSet { target, checked } => self.forms.set_checkbox(target, *checked).await,
            Step::CheckboxesSet { targets, checked } => {
                let items: Vec<_> = targets.iter().map(|t| (t.clone(), *checked)).collect();
                self.forms.set_checkboxes(&items).await
            }
            Step::RadioSelect { target } => self.forms.select_radio(target).await,
            Step::RadiosSelect { targets } => self.forms.select_radios(targets).await,
            Step::TableEdit { table, label } | Step::TableDelete { table, label } => {
                self.tables.click_row_action(table, label).await
            }
            Step::TableAssert { table, expected, mode } => self.tables.assert_cell(table, expected, *mode).await,
            Step::Search { inputs, button } => {
                for (target, text) in inputs {
                    self.locator.locate(target).await?.fill(text).await?;
                    settle(self.pacing.search_input_ms).await;
                }
                self.locator
                    .locate(button)
                    .await?
                    .click(ClickOptions::default())
                    .await?;
                settle(self.pacing.search_ms).await;
                Ok(())
            }
        }
    }

    async fn click(&self, target: &SelectorDescriptor) -> Result<()> {
        let element = self.locator.locate(target).await?;
        if let Err(e) = element.scroll_into_view().await {
            debug!("Scroll into view failed: {}", e);
        }
        element.click(ClickOptions::forced()).await?;
        settle(self.pacing.click_ms).await;
        Ok(())
    }

    async fn verify(&self, expect: &Expectation) -> Result<()> {
        let element = self.locator.locate(&expect.target).await?;
        match expect.mode {
            AssertMode::ValueEquals => {
                let value = element.input_value().await?;
                if value != expect.text {
                    return Err(Error::assertion_failed(format!(
                        "expected value '{}', got '{}'",
                        expect.text, value
                    )));
                }
            }
            AssertMode::TextEquals => {
                let text = element.text_content().await?;
                if text.trim() != expect.text.trim() {
                    return Err(Error::assertion_failed(format!(
                        "expected text '{}', got '{}'",
                        expect.text,
                        text.trim()
                    )));
                }
            }
            AssertMode::TextContains => {
                let text = element.text_content().await?;
                if !text.contains(expect.text.as_str()) {
                    return Err(Error::assertion_failed(format!(
                        "expected text containing '{}', got '{}'",
                        expect.text,
                        text.trim()
                    )));
                }
            }
            AssertMode::Visible => {
                if !element.is_visible().await? {
                    return Err(Error::assertion_failed(format!("{} is not visible", expect.target)));
                }
            }
        }
        debug!("Expectation on {} holds", expect.target);
        Ok(())
    }

    /// Save a viewport screenshot under `<artifacts>/errors/`; failures are only logged
    pub async fn capture_error_screenshot(&self) -> Option<PathBuf> {
        let path = self
            .errors_dir
            .join(format!("error_{}.png", Local::now().format("%Y%m%d_%H%M%S_%3f")));
        let saved = async {
            tokio::fs::create_dir_all(&self.errors_dir).await?;
            let png = self.page.screenshot().await?;
            tokio::fs::write(&path, png).await?;
            Ok::<(), Error>(())
        }
        .await;

        match saved {
            Ok(()) => {
                info!("Error screenshot saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to capture error screenshot: {}", e);
                None
            }
        }
    }
}
