//! Form control engine
//!
//! Compound operations on dropdowns, checkboxes and radios built on the
//! element locator. Every mutation ends with the form settle delay.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{settle, Pacing};
use crate::driver::{ClickOptions, ElementHandle, Modifier, OptionMatch, PageDriver};
use crate::locator::{strategies, Cascade, ElementLocator, Outcome, SelectorDescriptor, SelectorKind};
use crate::{Error, Result};

/// Dropdown, checkbox and radio operations
#[derive(Debug, Clone)]
pub struct FormEngine {
    locator: Arc<ElementLocator>,
    pacing: Pacing,
}

impl FormEngine {
    pub fn new(locator: Arc<ElementLocator>, pacing: Pacing) -> Self {
        Self { locator, pacing }
    }

    fn page(&self) -> &dyn PageDriver {
        self.locator.page().as_ref()
    }

    /// Select `values` in a native or custom dropdown
    ///
    /// Native selects are tried by option label, then by option value. Any
    /// other control is opened and each value is clicked in the popup; a
    /// value that cannot be found aborts the remaining ones without undoing
    /// earlier clicks.
    #[instrument(skip(self, desc), fields(selector = %desc))]
    pub async fn set_select_values(&self, desc: &SelectorDescriptor, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Err(Error::invalid_step("no option values given"));
        }
        let control = self.resolve_select(desc).await?;

        for by in [OptionMatch::Label, OptionMatch::Value] {
            match control.select_options(values, by).await {
                Ok(selected) => {
                    info!("Selected {:?} by {}", selected, by.as_str());
                    settle(self.pacing.form_ms).await;
                    return Ok(());
                }
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) => debug!("Native select by {} failed: {}", by.as_str(), e),
            }
        }

        self.pick_from_popup(&control, values).await?;
        settle(self.pacing.form_ms).await;
        Ok(())
    }

    /// Select one value
    pub async fn select_option(&self, desc: &SelectorDescriptor, value: &str) -> Result<()> {
        self.set_select_values(desc, &[value.to_string()]).await
    }

    /// The dropdown control behind `desc`; text descriptors look for a labelled select first
    async fn resolve_select(&self, desc: &SelectorDescriptor) -> Result<Arc<dyn ElementHandle>> {
        if desc.kind == SelectorKind::Text && !desc.is_empty() {
            let root = self.locator.root(desc.scope).await?;
            let cascade = Cascade::new(strategies::select_by_label(desc.value.trim()));
            if let Outcome::Found { handle, strategy } = cascade.run(self.page(), &root).await? {
                debug!("Dropdown for '{}' resolved via '{}'", desc.value, strategy);
                return Ok(handle);
            }
        }
        self.locator.locate(desc).await
    }

    async fn pick_from_popup(&self, control: &Arc<dyn ElementHandle>, values: &[String]) -> Result<()> {
        control.click(ClickOptions::default()).await?;
        settle(self.pacing.dropdown_open_ms).await;

        let multiple = control.is_multiple().await?;
        let values = if !multiple && values.len() > 1 {
            warn!(
                "Dropdown is single-select; using only the first of {} values",
                values.len()
            );
            &values[..1]
        } else {
            values
        };

        for (i, value) in values.iter().enumerate() {
            self.click_option(value, multiple && i > 0).await?;
            debug!("Picked option '{}'", value);
            settle(self.pacing.option_ms).await;
        }
        Ok(())
    }

    /// Click the first clickable popup entry for `value`
    ///
    /// Popups are usually attached to the body, so options are searched
    /// page-wide. An entry whose click fails (a stale hidden popup, say)
    /// gives way to the next strategy's pick.
    async fn click_option(&self, value: &str, extend: bool) -> Result<()> {
        let root = self.locator.root(Default::default()).await?;
        let cascade = Cascade::new(strategies::option_item(value));
        let mut candidates = cascade.candidates(self.page(), &root);

        while let Some((strategy, option)) = candidates.next().await? {
            let clicked = if extend {
                self.page().key_down(Modifier::Control).await?;
                let clicked = option.click(ClickOptions::default()).await;
                self.page().key_up(Modifier::Control).await?;
                clicked
            } else {
                option.click(ClickOptions::default()).await
            };
            match clicked {
                Ok(()) => return Ok(()),
                Err(e) if e.is_disconnected() => return Err(e),
                Err(e) => {
                    debug!("Option '{}' via '{}' not clickable: {}", value, strategy, e);
                    candidates.reject(e);
                }
            }
        }
        Err(Error::option_not_found(value))
    }

    /// Flip a checkbox; returns the new state
    #[instrument(skip(self, desc), fields(selector = %desc))]
    pub async fn toggle_checkbox(&self, desc: &SelectorDescriptor) -> Result<bool> {
        let checkbox = self.locator.locate(desc).await?;
        let checked = checkbox.is_checked().await?;
        if checked {
            checkbox.uncheck().await?;
        } else {
            checkbox.check().await?;
        }
        settle(self.pacing.form_ms).await;
        Ok(!checked)
    }

    /// Force a checkbox into `checked`
    #[instrument(skip(self, desc), fields(selector = %desc))]
    pub async fn set_checkbox(&self, desc: &SelectorDescriptor, checked: bool) -> Result<()> {
        let checkbox = self.locator.locate(desc).await?;
        if checked {
            checkbox.check().await?;
        } else {
            checkbox.uncheck().await?;
        }
        settle(self.pacing.form_ms).await;
        Ok(())
    }

    /// Apply `set_checkbox` to each item, stopping at the first failure
    pub async fn set_checkboxes(&self, items: &[(SelectorDescriptor, bool)]) -> Result<()> {
        let total = items.len();
        for (i, (desc, checked)) in items.iter().enumerate() {
            self.set_checkbox(desc, *checked)
                .await
                .map_err(|e| Error::batch_item(i + 1, total, desc.to_string(), e))?;
        }
        Ok(())
    }

    /// Toggle each checkbox, stopping at the first failure
    pub async fn toggle_checkboxes(&self, descs: &[SelectorDescriptor]) -> Result<()> {
        let total = descs.len();
        for (i, desc) in descs.iter().enumerate() {
            self.toggle_checkbox(desc)
                .await
                .map_err(|e| Error::batch_item(i + 1, total, desc.to_string(), e))?;
        }
        Ok(())
    }

    /// Check a radio button
    #[instrument(skip(self, desc), fields(selector = %desc))]
    pub async fn select_radio(&self, desc: &SelectorDescriptor) -> Result<()> {
        self.locator.locate(desc).await?.check().await?;
        settle(self.pacing.form_ms).await;
        Ok(())
    }

    /// Check several radios; each may belong to a different group
    pub async fn select_radios(&self, descs: &[SelectorDescriptor]) -> Result<()> {
        let total = descs.len();
        for (i, desc) in descs.iter().enumerate() {
            let radio = self
                .locator
                .locate(desc)
                .await
                .map_err(|e| Error::batch_item(i + 1, total, desc.to_string(), e))?;
            radio
                .check()
                .await
                .map_err(|e| Error::batch_item(i + 1, total, desc.to_string(), e))?;
            settle(self.pacing.option_ms).await;
        }
        settle(self.pacing.form_ms).await;
        Ok(())
    }

    /// Current value of a dropdown
    pub async fn select_value(&self, desc: &SelectorDescriptor) -> Result<String> {
        self.resolve_select(desc).await?.input_value().await
    }

    /// Trimmed option labels of a dropdown
    pub async fn select_option_labels(&self, desc: &SelectorDescriptor) -> Result<Vec<String>> {
        let labels = self.resolve_select(desc).await?.option_labels().await?;
        Ok(labels.into_iter().map(|l| l.trim().to_string()).collect())
    }

    pub async fn checkbox_state(&self, desc: &SelectorDescriptor) -> Result<bool> {
        self.locator.locate(desc).await?.is_checked().await
    }

    pub async fn radio_state(&self, desc: &SelectorDescriptor) -> Result<bool> {
        self.locator.locate(desc).await?.is_checked().await
    }
}
