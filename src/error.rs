//! Unified error types for autotest

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for autotest
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A selector, option or menu item could not be resolved
    #[error("Element not found: {0}")]
    NotFound(String),

    /// A dropdown option could not be located among the available options
    #[error("Option not found: {0}")]
    OptionNotFound(String),

    /// No table matched the table selector
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// No row matched the row locator
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// No column matched the column locator
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A step is missing a field its action requires
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    /// The step action tag is not part of the vocabulary
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Expected and actual values differ
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// Underlying page capability exceeded its timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Captcha capture or recognition failed
    #[error("Captcha error: {0}")]
    Captcha(String),

    /// One item of a batch form operation failed
    #[error("Item {index}/{total} ({target}) failed: {source}")]
    BatchItemFailed {
        index: usize,
        total: usize,
        target: String,
        #[source]
        source: Box<Error>,
    },

    /// A step handler failed; `index` is 1-based
    #[error("Step [{index}] {action} failed: {source}")]
    StepFailed {
        index: usize,
        action: String,
        #[source]
        source: Box<Error>,
    },

    /// A test case failed
    #[error("Case '{name}' failed: {source}")]
    CaseFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Error::NotFound(what.into())
    }

    /// Create a new option not found error
    pub fn option_not_found<S: Into<String>>(option: S) -> Self {
        Error::OptionNotFound(option.into())
    }

    /// Create a new table not found error
    pub fn table_not_found<S: Into<String>>(msg: S) -> Self {
        Error::TableNotFound(msg.into())
    }

    /// Create a new row not found error
    pub fn row_not_found<S: Into<String>>(msg: S) -> Self {
        Error::RowNotFound(msg.into())
    }

    /// Create a new column not found error
    pub fn column_not_found<S: Into<String>>(msg: S) -> Self {
        Error::ColumnNotFound(msg.into())
    }

    /// Create a new invalid step error
    pub fn invalid_step<S: Into<String>>(msg: S) -> Self {
        Error::InvalidStep(msg.into())
    }

    /// Create a new unknown action error
    pub fn unknown_action<S: Into<String>>(action: S) -> Self {
        Error::UnknownAction(action.into())
    }

    /// Create a new assertion failed error
    pub fn assertion_failed<S: Into<String>>(msg: S) -> Self {
        Error::AssertionFailed(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new captcha error
    pub fn captcha<S: Into<String>>(msg: S) -> Self {
        Error::Captcha(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Wrap a handler error with the originating step
    pub fn step_failed<S: Into<String>>(index: usize, action: S, source: Error) -> Self {
        Error::StepFailed {
            index,
            action: action.into(),
            source: Box::new(source),
        }
    }

    /// Wrap the failure of item `index` (1-based) of a batch operation
    pub fn batch_item<S: Into<String>>(index: usize, total: usize, target: S, source: Error) -> Self {
        Error::BatchItemFailed {
            index,
            total,
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// Whether the underlying page capability timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::StepFailed { source, .. }
            | Error::CaseFailed { source, .. }
            | Error::BatchItemFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the browser connection is gone; nothing else on the page can succeed
    pub fn is_disconnected(&self) -> bool {
        matches!(self.root_cause(), Error::WebSocket(_))
    }

    /// The innermost error, with step/case/batch wrappers removed
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::StepFailed { source, .. }
            | Error::CaseFailed { source, .. }
            | Error::BatchItemFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failed_display() {
        let err = Error::step_failed(3, "click", Error::not_found("button '新建'"));
        assert_eq!(
            err.to_string(),
            "Step [3] click failed: Element not found: button '新建'"
        );
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let err = Error::CaseFailed {
            name: "login".to_string(),
            source: Box::new(Error::step_failed(1, "frobnicate", Error::unknown_action("frobnicate"))),
        };
        assert!(matches!(err.root_cause(), Error::UnknownAction(a) if a == "frobnicate"));
    }

    #[test]
    fn test_is_timeout_through_wrappers() {
        let err = Error::step_failed(2, "goto", Error::timeout("Command 7 timed out"));
        assert!(err.is_timeout());
        assert!(!Error::not_found("x").is_timeout());
    }

    #[test]
    fn test_is_disconnected() {
        assert!(Error::websocket("Connection is not active").is_disconnected());
        assert!(Error::step_failed(1, "click", Error::websocket("closed")).is_disconnected());
        assert!(!Error::timeout("Element a#x is not visible").is_disconnected());
        assert!(!Error::cdp("Node is detached").is_disconnected());
    }
}
