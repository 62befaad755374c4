//! Table, row and column locators

use std::fmt;
use std::str::FromStr;

use crate::locator::SelectorDescriptor;
use crate::{Error, Result};

/// How a row is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// 1-based position
    Index,
    /// Whole-row text equals the value
    Text,
    /// Whole-row text contains the value
    Contains,
}

impl FromStr for RowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "index" => Ok(RowKind::Index),
            "text" => Ok(RowKind::Text),
            "contains" => Ok(RowKind::Contains),
            other => Err(Error::invalid_step(format!("unsupported row locator type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocator {
    pub kind: RowKind,
    pub value: String,
}

impl RowLocator {
    pub fn index(n: usize) -> Self {
        Self {
            kind: RowKind::Index,
            value: n.to_string(),
        }
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            kind: RowKind::Text,
            value: text.into(),
        }
    }

    pub fn contains<S: Into<String>>(text: S) -> Self {
        Self {
            kind: RowKind::Contains,
            value: text.into(),
        }
    }
}

impl fmt::Display for RowLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RowKind::Index => write!(f, "row #{}", self.value),
            RowKind::Text => write!(f, "row '{}'", self.value),
            RowKind::Contains => write!(f, "row containing '{}'", self.value),
        }
    }
}

/// How a column is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 1-based position
    Index,
    /// First header cell containing the value
    Header,
}

impl FromStr for ColumnKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "index" => Ok(ColumnKind::Index),
            "header" => Ok(ColumnKind::Header),
            other => Err(Error::invalid_step(format!("unsupported column locator type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLocator {
    pub kind: ColumnKind,
    pub value: String,
}

impl ColumnLocator {
    pub fn index(n: usize) -> Self {
        Self {
            kind: ColumnKind::Index,
            value: n.to_string(),
        }
    }

    pub fn header<S: Into<String>>(text: S) -> Self {
        Self {
            kind: ColumnKind::Header,
            value: text.into(),
        }
    }
}

impl fmt::Display for ColumnLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ColumnKind::Index => write!(f, "column #{}", self.value),
            ColumnKind::Header => write!(f, "column '{}'", self.value),
        }
    }
}

/// Table, row and optional column; an empty table selector means the first table on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocator {
    pub selector: SelectorDescriptor,
    pub row: RowLocator,
    pub column: Option<ColumnLocator>,
}

impl TableLocator {
    pub fn new(selector: SelectorDescriptor, row: RowLocator) -> Self {
        Self {
            selector,
            row,
            column: None,
        }
    }

    /// First table on the page
    pub fn first(row: RowLocator) -> Self {
        Self::new(SelectorDescriptor::default(), row)
    }

    pub fn column(mut self, column: ColumnLocator) -> Self {
        self.column = Some(column);
        self
    }
}

/// Comparison applied by a table assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableAssertMode {
    #[default]
    Equals,
    Contains,
    NotEquals,
    NotContains,
}

impl FromStr for TableAssertMode {
    type Err = Error;

    /// An empty mode means `equals`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "equals" => Ok(TableAssertMode::Equals),
            "contains" => Ok(TableAssertMode::Contains),
            "not_equals" => Ok(TableAssertMode::NotEquals),
            "not_contains" => Ok(TableAssertMode::NotContains),
            other => Err(Error::invalid_step(format!("unsupported table assert mode '{}'", other))),
        }
    }
}

impl TableAssertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableAssertMode::Equals => "equals",
            TableAssertMode::Contains => "contains",
            TableAssertMode::NotEquals => "not_equals",
            TableAssertMode::NotContains => "not_contains",
        }
    }

    /// Whether `actual` satisfies the mode against `expected`
    pub fn holds(&self, actual: &str, expected: &str) -> bool {
        match self {
            TableAssertMode::Equals => actual == expected,
            TableAssertMode::Contains => actual.contains(expected),
            TableAssertMode::NotEquals => actual != expected,
            TableAssertMode::NotContains => !actual.contains(expected),
        }
    }
}
