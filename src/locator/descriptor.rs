//! Selector descriptors as written in test cases

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a descriptor's `value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SelectorKind {
    /// Broadest label cascade; also used for unknown kinds
    #[default]
    Text,
    /// Form field identified by its label or placeholder
    Field,
    /// Button identified by its label
    Button,
    /// Raw XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// Raw CSS selector
    Css,
    /// Bare `id` attribute value
    Id,
}

impl From<String> for SelectorKind {
    fn from(kind: String) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "field" => SelectorKind::Field,
            "button" => SelectorKind::Button,
            "xpath" => SelectorKind::XPath,
            "css" => SelectorKind::Css,
            "id" => SelectorKind::Id,
            _ => SelectorKind::Text,
        }
    }
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Text => "text",
            SelectorKind::Field => "field",
            SelectorKind::Button => "button",
            SelectorKind::XPath => "xpath",
            SelectorKind::Css => "css",
            SelectorKind::Id => "id",
        }
    }

    /// Raw kinds run one query; label kinds run a cascade
    pub fn is_raw(&self) -> bool {
        matches!(self, SelectorKind::XPath | SelectorKind::Css | SelectorKind::Id)
    }
}

/// Logical search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Scope {
    /// Whole document
    #[default]
    None,
    /// The visible modal dialog
    Dialog,
    /// The main content region
    Main,
}

impl From<String> for Scope {
    fn from(scope: String) -> Self {
        match scope.trim().to_ascii_lowercase().as_str() {
            "dialog" => Scope::Dialog,
            "main" => Scope::Main,
            _ => Scope::None,
        }
    }
}

/// `{type, value, scope}` as found in step JSON
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectorDescriptor {
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: SelectorKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub scope: Scope,
}

impl SelectorDescriptor {
    pub fn new<S: Into<String>>(kind: SelectorKind, value: S) -> Self {
        Self {
            kind,
            value: value.into(),
            scope: Scope::None,
        }
    }

    pub fn text<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::Text, value)
    }

    pub fn field<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::Field, value)
    }

    pub fn button<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::Button, value)
    }

    pub fn css<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::Css, value)
    }

    pub fn xpath<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::XPath, value)
    }

    pub fn id<S: Into<String>>(value: S) -> Self {
        Self::new(SelectorKind::Id, value)
    }

    /// Restrict the search to `scope`
    pub fn within(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// No usable value
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl fmt::Display for SelectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind.as_str(), self.value)?;
        match self.scope {
            Scope::None => Ok(()),
            Scope::Dialog => write!(f, " in dialog"),
            Scope::Main => write!(f, " in main"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_selector() {
        let desc: SelectorDescriptor =
            serde_json::from_str(r#"{"type": "field", "value": "用户名", "scope": "dialog"}"#).unwrap();
        assert_eq!(desc, SelectorDescriptor::field("用户名").within(Scope::Dialog));
        assert_eq!(desc.to_string(), "field '用户名' in dialog");
    }

    #[test]
    fn test_kind_alias_and_defaults() {
        let desc: SelectorDescriptor = serde_json::from_str(r#"{"kind": "xpath", "value": "//a"}"#).unwrap();
        assert_eq!(desc.kind, SelectorKind::XPath);
        assert_eq!(desc.scope, Scope::None);

        let desc: SelectorDescriptor = serde_json::from_str(r#"{"value": "保存"}"#).unwrap();
        assert_eq!(desc.kind, SelectorKind::Text);
    }

    #[test]
    fn test_unknown_kind_and_scope_fall_back() {
        let desc: SelectorDescriptor =
            serde_json::from_str(r#"{"type": "label", "value": "x", "scope": "sidebar"}"#).unwrap();
        assert_eq!(desc.kind, SelectorKind::Text);
        assert_eq!(desc.scope, Scope::None);
    }

    #[test]
    fn test_serialize_uses_type_key() {
        let json = serde_json::to_value(SelectorDescriptor::xpath("//a").within(Scope::Main)).unwrap();
        assert_eq!(json["type"], "xpath");
        assert_eq!(json["scope"], "main");
    }
}
