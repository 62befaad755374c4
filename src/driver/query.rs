//! Structured element query patterns
//!
//! A `Query` is evaluated by a [`PageDriver`](super::PageDriver) relative to a
//! root element and yields matches in document order. Both the CDP driver
//! (through the injected page runtime) and the in-memory mock evaluate the
//! same JSON form, so the resolution engine never builds raw selector strings.

use serde::{Deserialize, Serialize};

/// How a text pattern is compared against element text
///
/// Element text is always whitespace-normalized (runs collapsed, trimmed)
/// before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum TextMatch {
    /// Normalized equality
    Exact(String),
    /// Normalized substring, case-sensitive
    Contains(String),
    /// Normalized substring, case-insensitive
    Loose(String),
}

impl TextMatch {
    pub fn exact<S: Into<String>>(s: S) -> Self {
        TextMatch::Exact(s.into())
    }

    pub fn contains<S: Into<String>>(s: S) -> Self {
        TextMatch::Contains(s.into())
    }

    pub fn loose<S: Into<String>>(s: S) -> Self {
        TextMatch::Loose(s.into())
    }

    /// Pattern text
    pub fn pattern(&self) -> &str {
        match self {
            TextMatch::Exact(s) | TextMatch::Contains(s) | TextMatch::Loose(s) => s,
        }
    }

    /// Whether `text` satisfies this pattern
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize_whitespace(text);
        let pattern = normalize_whitespace(self.pattern());
        match self {
            TextMatch::Exact(_) => text == pattern,
            TextMatch::Contains(_) => text.contains(&pattern),
            TextMatch::Loose(_) => text.to_lowercase().contains(&pattern.to_lowercase()),
        }
    }
}

/// Collapse whitespace runs to one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Where a control sits relative to its `<label>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRelation {
    /// The label's next element sibling
    Adjacent,
    /// Any following element sibling of the label
    Sibling,
    /// A direct child of the label's parent
    Parent,
    /// A descendant of the label
    Inside,
    /// The label's previous element sibling
    Previous,
}

/// A structured element query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Raw CSS selector
    Css { selector: String },
    /// Raw XPath expression
    #[serde(rename = "xpath")]
    XPath { expression: String },
    /// CSS matches whose full text matches
    CssWithText { css: String, text: TextMatch },
    /// CSS matches whose attribute `name` matches
    Attribute { css: String, name: String, value: TextMatch },
    /// Innermost elements whose text matches
    Text { text: TextMatch },
    /// Controls matching `control`, positioned by `relation` to a matching `<label>`
    Labelled {
        label: TextMatch,
        control: String,
        relation: LabelRelation,
    },
    /// First element matching `target` after each element whose own text matches `anchor`
    Following { anchor: TextMatch, target: String },
    /// CSS matches that contain a `descendant` whose text matches
    HasDescendant {
        css: String,
        descendant: String,
        text: TextMatch,
    },
}

impl Query {
    pub fn css<S: Into<String>>(selector: S) -> Self {
        Query::Css { selector: selector.into() }
    }

    pub fn xpath<S: Into<String>>(expression: S) -> Self {
        Query::XPath { expression: expression.into() }
    }

    pub fn css_with_text<S: Into<String>>(css: S, text: TextMatch) -> Self {
        Query::CssWithText { css: css.into(), text }
    }

    pub fn attribute<S: Into<String>, N: Into<String>>(css: S, name: N, value: TextMatch) -> Self {
        Query::Attribute {
            css: css.into(),
            name: name.into(),
            value,
        }
    }

    pub fn text(text: TextMatch) -> Self {
        Query::Text { text }
    }

    pub fn labelled<S: Into<String>>(label: TextMatch, control: S, relation: LabelRelation) -> Self {
        Query::Labelled {
            label,
            control: control.into(),
            relation,
        }
    }

    pub fn following<S: Into<String>>(anchor: TextMatch, target: S) -> Self {
        Query::Following {
            anchor,
            target: target.into(),
        }
    }

    pub fn has_descendant<S: Into<String>, D: Into<String>>(css: S, descendant: D, text: TextMatch) -> Self {
        Query::HasDescendant {
            css: css.into(),
            descendant: descendant.into(),
            text,
        }
    }

    /// CSS selector matching an exact `id` attribute, safe for any id string
    pub fn id(id: &str) -> Self {
        Query::css(format!("[id=\"{}\"]", escape_css_string(id)))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Css { selector } => write!(f, "css={}", selector),
            Query::XPath { expression } => write!(f, "xpath={}", expression),
            Query::CssWithText { css, text } => write!(f, "{}:text({:?})", css, text),
            Query::Attribute { css, name, value } => write!(f, "{}[{}~{:?}]", css, name, value),
            Query::Text { text } => write!(f, "text({:?})", text),
            Query::Labelled { label, control, relation } => {
                write!(f, "label({:?}) {:?} {}", label, relation, control)
            }
            Query::Following { anchor, target } => write!(f, "{:?} >> following {}", anchor, target),
            Query::HasDescendant { css, descendant, text } => {
                write!(f, "{}:has({}:text({:?}))", css, descendant, text)
            }
        }
    }
}

/// Escape a value for use inside a double-quoted CSS string
pub fn escape_css_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_match_modes() {
        assert!(TextMatch::exact("新建").matches("  新建 "));
        assert!(!TextMatch::exact("新建").matches("新建用户"));
        assert!(TextMatch::contains("新建").matches("新建用户"));
        assert!(!TextMatch::contains("login").matches("Login"));
        assert!(TextMatch::loose("login").matches("Please LOGIN now"));
    }

    #[test]
    fn test_whitespace_normalization() {
        assert!(TextMatch::exact("Bob 25").matches("Bob\n     25"));
        assert_eq!(normalize_whitespace("\t a  b \n"), "a b");
    }

    #[test]
    fn test_query_json_shape() {
        let query = Query::labelled(TextMatch::contains("用户名"), "input", LabelRelation::Adjacent);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["kind"], "labelled");
        assert_eq!(json["label"]["mode"], "contains");
        assert_eq!(json["label"]["value"], "用户名");
        assert_eq!(json["relation"], "adjacent");

        let xpath = serde_json::to_value(Query::xpath("//a")).unwrap();
        assert_eq!(xpath["kind"], "xpath");
    }

    #[test]
    fn test_id_query_escapes() {
        assert_eq!(Query::id("user.name"), Query::css("[id=\"user.name\"]"));
        assert_eq!(Query::id("a\"b"), Query::css("[id=\"a\\\"b\"]"));
    }
}
