//! Step model
//!
//! `TestStep` mirrors the JSON written by test authors and is deliberately
//! lenient: every action-specific field is optional. `Step::try_from`
//! validates one record at dispatch time and produces the typed step the
//! interpreter executes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::locator::{Scope, SelectorDescriptor, SelectorKind};
use crate::table::{ColumnLocator, RowLocator, TableAssertMode, TableLocator};
use crate::{Error, Result};

/// Default label of the row action clicked by `table_edit`
pub const DEFAULT_EDIT_LABEL: &str = "编辑";
/// Default label of the row action clicked by `table_delete`
pub const DEFAULT_DELETE_LABEL: &str = "删除";

/// Step action vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Goto,
    Input,
    Click,
    Assert,
    MenuClick,
    CaptchaInput,
    SelectOption,
    SelectOptions,
    CheckboxToggle,
    CheckboxSet,
    CheckboxesSet,
    RadioSelect,
    RadiosSelect,
    TableEdit,
    TableDelete,
    TableAssert,
    Search,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::Goto,
        Action::Input,
        Action::Click,
        Action::Assert,
        Action::MenuClick,
        Action::CaptchaInput,
        Action::SelectOption,
        Action::SelectOptions,
        Action::CheckboxToggle,
        Action::CheckboxSet,
        Action::CheckboxesSet,
        Action::RadioSelect,
        Action::RadiosSelect,
        Action::TableEdit,
        Action::TableDelete,
        Action::TableAssert,
        Action::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Goto => "goto",
            Action::Input => "input",
            Action::Click => "click",
            Action::Assert => "assert",
            Action::MenuClick => "menu_click",
            Action::CaptchaInput => "captcha_input",
            Action::SelectOption => "select_option",
            Action::SelectOptions => "select_options",
            Action::CheckboxToggle => "checkbox_toggle",
            Action::CheckboxSet => "checkbox_set",
            Action::CheckboxesSet => "checkboxes_set",
            Action::RadioSelect => "radio_select",
            Action::RadiosSelect => "radios_select",
            Action::TableEdit => "table_edit",
            Action::TableDelete => "table_delete",
            Action::TableAssert => "table_assert",
            Action::Search => "search",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::unknown_action(s))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept `"3"` as well as `3`
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// `expect` block of `input` and `assert`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectConfig {
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: SelectorKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub text: String,
}

/// Row or column locator as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub selector: SelectorDescriptor,
    pub row: Option<AxisConfig>,
    pub column: Option<AxisConfig>,
    /// Row action label for `table_edit` / `table_delete`
    pub action: Option<String>,
    /// Expected cell text for `table_assert`
    pub value: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInput {
    pub selector: Option<SelectorDescriptor>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub inputs: Vec<SearchInput>,
    pub button: Option<SelectorDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub image_selector: Option<SelectorDescriptor>,
    pub input_selector: Option<SelectorDescriptor>,
    #[serde(default)]
    pub auto: bool,
}

/// One step as written in a test file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<SelectorDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<ExpectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchConfig>,
}

impl TestStep {
    pub fn new<S: Into<String>>(action: S) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }
}

/// Named, ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

/// Ordered list of cases; the file format is a JSON array of cases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSuite {
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration(format!("Failed to read test file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::configuration(format!("Failed to parse test file {}: {}", path.display(), e))
        })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// How an `expect` block checks its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertMode {
    ValueEquals,
    TextEquals,
    TextContains,
    Visible,
}

impl FromStr for AssertMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "value_equals" => Ok(AssertMode::ValueEquals),
            "text_equals" => Ok(AssertMode::TextEquals),
            "text_contains" => Ok(AssertMode::TextContains),
            "visible" => Ok(AssertMode::Visible),
            other => Err(Error::invalid_step(format!("unknown expect mode '{}'", other))),
        }
    }
}

/// Validated `expect` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub target: SelectorDescriptor,
    pub mode: AssertMode,
    pub text: String,
}

impl TryFrom<&ExpectConfig> for Expectation {
    type Error = Error;

    fn try_from(raw: &ExpectConfig) -> Result<Self> {
        Ok(Self {
            target: SelectorDescriptor {
                kind: raw.kind,
                value: raw.value.clone(),
                scope: raw.scope,
            },
            mode: raw.mode.parse()?,
            text: raw.text.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaTarget {
    /// Probe well-known image and input patterns
    Auto,
    Manual {
        image: SelectorDescriptor,
        input: SelectorDescriptor,
    },
}

/// A validated step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Goto { url: String },
    Input { target: SelectorDescriptor, text: String, expect: Option<Expectation> },
    Click { target: SelectorDescriptor },
    Assert { target: SelectorDescriptor, expect: Option<Expectation> },
    MenuClick { path: String },
    CaptchaInput(CaptchaTarget),
    SelectOption { target: SelectorDescriptor, value: String },
    SelectOptions { target: SelectorDescriptor, values: Vec<String> },
    CheckboxToggle { target: SelectorDescriptor },
    CheckboxSet { target: SelectorDescriptor, checked: bool },
    CheckboxesSet { targets: Vec<SelectorDescriptor>, checked: bool },
    RadioSelect { target: SelectorDescriptor },
    RadiosSelect { targets: Vec<SelectorDescriptor> },
    TableEdit { table: TableLocator, label: String },
    TableDelete { table: TableLocator, label: String },
    TableAssert { table: TableLocator, expected: String, mode: TableAssertMode },
    Search { inputs: Vec<(SelectorDescriptor, String)>, button: SelectorDescriptor },
}

impl Step {
    pub fn action(&self) -> Action {
        match self {
            Step::Goto { .. } => Action::Goto,
            Step::Input { .. } => Action::Input,
            Step::Click { .. } => Action::Click,
            Step::Assert { .. } => Action::Assert,
            Step::MenuClick { .. } => Action::MenuClick,
            Step::CaptchaInput(_) => Action::CaptchaInput,
            Step::SelectOption { .. } => Action::SelectOption,
            Step::SelectOptions { .. } => Action::SelectOptions,
            Step::CheckboxToggle { .. } => Action::CheckboxToggle,
            Step::CheckboxSet { .. } => Action::CheckboxSet,
            Step::CheckboxesSet { .. } => Action::CheckboxesSet,
            Step::RadioSelect { .. } => Action::RadioSelect,
            Step::RadiosSelect { .. } => Action::RadiosSelect,
            Step::TableEdit { .. } => Action::TableEdit,
            Step::TableDelete { .. } => Action::TableDelete,
            Step::TableAssert { .. } => Action::TableAssert,
            Step::Search { .. } => Action::Search,
        }
    }
}

fn missing(action: Action, field: &str) -> Error {
    Error::invalid_step(format!("{} requires {}", action, field))
}

fn non_empty(value: &Option<String>, action: Action, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(missing(action, field)),
    }
}

fn selector(raw: &TestStep, action: Action) -> Result<SelectorDescriptor> {
    raw.selector.clone().ok_or_else(|| missing(action, "selector"))
}

fn selectors(raw: &TestStep, action: Action) -> Result<Vec<SelectorDescriptor>> {
    if raw.selectors.is_empty() {
        return Err(missing(action, "selectors"));
    }
    Ok(raw.selectors.clone())
}

fn checked(raw: &TestStep, action: Action) -> Result<bool> {
    raw.checked.ok_or_else(|| missing(action, "checked"))
}

fn expectation(raw: &TestStep) -> Result<Option<Expectation>> {
    raw.expect.as_ref().map(Expectation::try_from).transpose()
}

fn table_locator(raw: &TestStep, action: Action, needs_column: bool) -> Result<(TableLocator, &TableConfig)> {
    let table = raw.table.as_ref().ok_or_else(|| missing(action, "table"))?;
    let row = table.row.as_ref().ok_or_else(|| missing(action, "table.row"))?;
    let mut locator = TableLocator::new(
        table.selector.clone(),
        RowLocator {
            kind: row.kind.parse()?,
            value: row.value.clone(),
        },
    );
    match &table.column {
        Some(column) => {
            locator = locator.column(ColumnLocator {
                kind: column.kind.parse()?,
                value: column.value.clone(),
            })
        }
        None if needs_column => return Err(missing(action, "table.column")),
        None => {}
    }
    Ok((locator, table))
}

fn row_action_label(table: &TableConfig, default: &str) -> String {
    table
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl TryFrom<&TestStep> for Step {
    type Error = Error;

    fn try_from(raw: &TestStep) -> Result<Self> {
        let action: Action = raw.action.parse()?;
        Ok(match action {
            Action::Goto => Step::Goto {
                url: non_empty(&raw.url, action, "url")?,
            },
            Action::Input => Step::Input {
                target: selector(raw, action)?,
                text: non_empty(&raw.text, action, "text")?,
                expect: expectation(raw)?,
            },
            Action::Click => Step::Click {
                target: selector(raw, action)?,
            },
            Action::Assert => Step::Assert {
                target: selector(raw, action)?,
                expect: expectation(raw)?,
            },
            Action::MenuClick => Step::MenuClick {
                path: non_empty(&raw.menu_path, action, "menu_path")?,
            },
            Action::CaptchaInput => {
                let captcha = raw.captcha.as_ref().ok_or_else(|| missing(action, "captcha"))?;
                if captcha.auto {
                    Step::CaptchaInput(CaptchaTarget::Auto)
                } else {
                    match (&captcha.image_selector, &captcha.input_selector) {
                        (Some(image), Some(input)) => Step::CaptchaInput(CaptchaTarget::Manual {
                            image: image.clone(),
                            input: input.clone(),
                        }),
                        _ => {
                            return Err(missing(
                                action,
                                "captcha.image_selector and captcha.input_selector, or captcha.auto",
                            ))
                        }
                    }
                }
            }
            Action::SelectOption => Step::SelectOption {
                target: selector(raw, action)?,
                value: non_empty(&raw.text, action, "text")?,
            },
            Action::SelectOptions => {
                if raw.options.is_empty() {
                    return Err(missing(action, "options"));
                }
                Step::SelectOptions {
                    target: selector(raw, action)?,
                    values: raw.options.clone(),
                }
            }
            Action::CheckboxToggle => Step::CheckboxToggle {
                target: selector(raw, action)?,
            },
            Action::CheckboxSet => Step::CheckboxSet {
                target: selector(raw, action)?,
                checked: checked(raw, action)?,
            },
            Action::CheckboxesSet => Step::CheckboxesSet {
                targets: selectors(raw, action)?,
                checked: checked(raw, action)?,
            },
            Action::RadioSelect => Step::RadioSelect {
                target: selector(raw, action)?,
            },
            Action::RadiosSelect => Step::RadiosSelect {
                targets: selectors(raw, action)?,
            },
            Action::TableEdit => {
                let (table, config) = table_locator(raw, action, false)?;
                Step::TableEdit {
                    label: row_action_label(config, DEFAULT_EDIT_LABEL),
                    table,
                }
            }
            Action::TableDelete => {
                let (table, config) = table_locator(raw, action, false)?;
                Step::TableDelete {
                    label: row_action_label(config, DEFAULT_DELETE_LABEL),
                    table,
                }
            }
            Action::TableAssert => {
                let (table, config) = table_locator(raw, action, true)?;
                Step::TableAssert {
                    expected: non_empty(&config.value, action, "table.value")?,
                    mode: config.mode.as_deref().unwrap_or_default().parse()?,
                    table,
                }
            }
            Action::Search => {
                let search = raw.search.as_ref().ok_or_else(|| missing(action, "search"))?;
                let button = search
                    .button
                    .clone()
                    .ok_or_else(|| missing(action, "search.button"))?;
                let inputs = search
                    .inputs
                    .iter()
                    .map(|input| {
                        input
                            .selector
                            .clone()
                            .map(|s| (s, input.text.clone()))
                            .ok_or_else(|| missing(action, "a selector for every search input"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Step::Search { inputs, button }
            }
        })
    }
}
