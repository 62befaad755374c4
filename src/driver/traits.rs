//! Page automation traits
//!
//! `PageDriver` and `ElementHandle` are the only surface the resolution
//! engines touch. Handles are valid until the next navigation.

use async_trait::async_trait;
use std::sync::Arc;

use super::query::Query;
use crate::Result;

/// Page load state to wait for after navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// `document.readyState == "complete"`
    Load,
    /// `document.readyState` is at least `interactive`
    DomContentLoaded,
    /// Loaded, then no new resource requests for a quiet period
    #[default]
    NetworkIdle,
}

/// Keyboard modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Alt,
    Control,
    Meta,
    Shift,
}

impl Modifier {
    /// Bit in the CDP `modifiers` mask
    pub fn bit(self) -> u32 {
        match self {
            Modifier::Alt => 1,
            Modifier::Control => 2,
            Modifier::Meta => 4,
            Modifier::Shift => 8,
        }
    }

    /// DOM `key` value
    pub fn key(self) -> &'static str {
        match self {
            Modifier::Alt => "Alt",
            Modifier::Control => "Control",
            Modifier::Meta => "Meta",
            Modifier::Shift => "Shift",
        }
    }

    /// DOM `code` value
    pub fn code(self) -> &'static str {
        match self {
            Modifier::Alt => "AltLeft",
            Modifier::Control => "ControlLeft",
            Modifier::Meta => "MetaLeft",
            Modifier::Shift => "ShiftLeft",
        }
    }

    /// Windows virtual key code
    pub fn key_code(self) -> u32 {
        match self {
            Modifier::Alt => 18,
            Modifier::Control => 17,
            Modifier::Meta => 91,
            Modifier::Shift => 16,
        }
    }
}

/// How `select_options` matches requested values against `<option>`s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMatch {
    /// Trimmed option text
    Label,
    /// `value` attribute
    Value,
}

impl OptionMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionMatch::Label => "label",
            OptionMatch::Value => "value",
        }
    }
}

/// Click options
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickOptions {
    /// Skip the visibility check before clicking
    pub force: bool,
}

impl ClickOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Element rectangle in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The sub-tree a query runs against
#[derive(Debug, Clone)]
pub enum Root {
    /// The document body
    Document,
    /// A located container
    Element(Arc<dyn ElementHandle>),
}

impl Root {
    /// Handle ID of the root element, `None` for the document
    pub fn handle_id(&self) -> Option<&str> {
        match self {
            Root::Document => None,
            Root::Element(el) => Some(el.id()),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Root::Document)
    }
}

/// A live page
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate and wait for the given load state
    async fn goto(&self, url: &str, wait_until: LoadState) -> Result<()>;

    /// Current URL
    async fn url(&self) -> Result<String>;

    /// All elements under `root` matching `query`, in document order
    async fn query_all(&self, root: &Root, query: &Query) -> Result<Vec<Arc<dyn ElementHandle>>>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Press and hold a modifier
    async fn key_down(&self, modifier: Modifier) -> Result<()>;

    /// Release a held modifier
    async fn key_up(&self, modifier: Modifier) -> Result<()>;
}

/// A reference to one element of a live page
#[async_trait]
pub trait ElementHandle: Send + Sync + std::fmt::Debug {
    /// Handle ID, unique within the page until the next navigation
    fn id(&self) -> &str;

    /// Non-empty box and not `visibility: hidden`
    async fn is_visible(&self) -> Result<bool>;

    /// Raw `textContent`
    async fn text_content(&self) -> Result<String>;

    /// Value of an input, textarea or select
    async fn input_value(&self) -> Result<String>;

    /// Checked state of a checkbox or radio
    async fn is_checked(&self) -> Result<bool>;

    /// Attribute value
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Lower-case tag name
    async fn tag_name(&self) -> Result<String>;

    /// Whether a select (or the select inside this element) allows multiple selection
    async fn is_multiple(&self) -> Result<bool>;

    /// Option texts of a select (or the select inside this element)
    async fn option_labels(&self) -> Result<Vec<String>>;

    /// Element rectangle
    async fn bounding_box(&self) -> Result<Option<BoundingBox>>;

    /// Click at the element centre
    async fn click(&self, options: ClickOptions) -> Result<()>;

    /// Move the pointer over the element centre
    async fn hover(&self) -> Result<()>;

    /// Replace the value of an editable element
    async fn fill(&self, text: &str) -> Result<()>;

    /// Ensure a checkbox or radio is checked
    async fn check(&self) -> Result<()>;

    /// Ensure a checkbox is unchecked
    async fn uncheck(&self) -> Result<()>;

    /// Select options of a native `<select>`; fails unless every value matches
    async fn select_options(&self, values: &[String], by: OptionMatch) -> Result<Vec<String>>;

    /// Scroll the element into view if needed
    async fn scroll_into_view(&self) -> Result<()>;

    /// PNG screenshot clipped to the element
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
