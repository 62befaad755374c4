//! Heuristic strategy tables
//!
//! Pure data: each function maps a label to the ordered query patterns tried
//! for one descriptor kind or engine lookup. The cascade combinator in
//! [`super::cascade`] decides how they are run.

use crate::driver::{LabelRelation, Query, TextMatch};

/// Which match of a strategy is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// First visible match, else the first match
    PreferVisible,
    /// First visible match only
    VisibleOnly,
}

/// One named query in a cascade
#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub query: Query,
    pub pick: Pick,
}

impl Strategy {
    pub fn new(name: &'static str, query: Query) -> Self {
        Self {
            name,
            query,
            pick: Pick::PreferVisible,
        }
    }

    pub fn visible_only(name: &'static str, query: Query) -> Self {
        Self {
            name,
            query,
            pick: Pick::VisibleOnly,
        }
    }
}

const CONTROLS: &str = "input, select, textarea";
const TOGGLES: &str = "input[type='checkbox'], input[type='radio']";
const EDITABLE: &str = "input, textarea, [contenteditable='true']";

fn exact(s: &str) -> TextMatch {
    TextMatch::exact(s)
}

fn contains(s: &str) -> TextMatch {
    TextMatch::contains(s)
}

fn loose(s: &str) -> TextMatch {
    TextMatch::loose(s)
}

/// Form field by label or placeholder
pub fn field(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("placeholder exact", Query::attribute("input", "placeholder", exact(label))),
        Strategy::new("placeholder substring", Query::attribute("input", "placeholder", contains(label))),
        Strategy::new("label + input", Query::labelled(loose(label), "input", LabelRelation::Adjacent)),
        Strategy::new("label ~ input", Query::labelled(loose(label), "input", LabelRelation::Sibling)),
        Strategy::new("label sibling control", Query::labelled(contains(label), CONTROLS, LabelRelation::Sibling)),
        Strategy::new("label parent control", Query::labelled(contains(label), CONTROLS, LabelRelation::Parent)),
        Strategy::new("text then input", Query::following(contains(label), "input")),
        Strategy::new("text then textarea", Query::following(contains(label), "textarea")),
        Strategy::new(
            "text then contenteditable",
            Query::following(contains(label), "[contenteditable='true']"),
        ),
    ]
}

/// Last resort for modal forms: the first visible editable control
pub fn dialog_fallback() -> Vec<Strategy> {
    vec![Strategy::visible_only("first visible control", Query::css(EDITABLE))]
}

/// Real buttons by label
pub fn button(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("button text", Query::css_with_text("button", loose(label))),
        Strategy::new("el-button text", Query::css_with_text(".el-button", loose(label))),
        Strategy::new("ant-btn text", Query::css_with_text(".ant-btn", loose(label))),
        Strategy::new("role=button text", Query::css_with_text("[role='button']", loose(label))),
        Strategy::new("button with exact descendant", Query::has_descendant("button", "*", exact(label))),
        Strategy::new("button with descendant", Query::has_descendant("button", "*", contains(label))),
    ]
}

/// Styled non-button elements acting as buttons
pub fn pseudo_button(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("exact text", Query::text(exact(label))),
        Strategy::new("text substring", Query::text(contains(label))),
        Strategy::new("p text", Query::css_with_text("p", loose(label))),
        Strategy::new("div text", Query::css_with_text("div", loose(label))),
        Strategy::new("span text", Query::css_with_text("span", loose(label))),
        Strategy::new("link text", Query::css_with_text("a", loose(label))),
        Strategy::new("signIn class", Query::css_with_text("[class*='signIn']", loose(label))),
        Strategy::new("login class", Query::css_with_text("[class*='login']", loose(label))),
        Strategy::new("button class", Query::css_with_text("[class*='button']", loose(label))),
        Strategy::new("btn class", Query::css_with_text("[class*='btn']", loose(label))),
        Strategy::new("login id", Query::css_with_text("[id*='login']", loose(label))),
        Strategy::new("signIn id", Query::css_with_text("[id*='signIn']", loose(label))),
    ]
}

/// The broad catch-all cascade
pub fn text(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("placeholder exact", Query::attribute("input, textarea", "placeholder", exact(label))),
        Strategy::new(
            "placeholder substring",
            Query::attribute("input, textarea", "placeholder", contains(label)),
        ),
        Strategy::new("label + control", Query::labelled(loose(label), CONTROLS, LabelRelation::Adjacent)),
        Strategy::new("label ~ control", Query::labelled(loose(label), CONTROLS, LabelRelation::Sibling)),
        Strategy::new("label parent control", Query::labelled(contains(label), CONTROLS, LabelRelation::Parent)),
        Strategy::new("toggle inside label", Query::labelled(loose(label), TOGGLES, LabelRelation::Inside)),
        Strategy::new("aria-label exact", Query::attribute("*", "aria-label", exact(label))),
        Strategy::new("aria-label substring", Query::attribute("*", "aria-label", contains(label))),
        Strategy::new("title exact", Query::attribute("*", "title", exact(label))),
        Strategy::new("title substring", Query::attribute("*", "title", contains(label))),
        Strategy::new("data-label", Query::attribute("*", "data-label", contains(label))),
        Strategy::new("data-placeholder", Query::attribute("*", "data-placeholder", contains(label))),
        Strategy::new("select by option text", Query::has_descendant("select", "option", contains(label))),
        Strategy::new("toggle by value", Query::attribute(TOGGLES, "value", contains(label))),
        Strategy::new("toggle before label", Query::labelled(loose(label), TOGGLES, LabelRelation::Previous)),
        Strategy::new("button text", Query::css_with_text("button", loose(label))),
        Strategy::new("el-button text", Query::css_with_text(".el-button", loose(label))),
        Strategy::new("ant-btn text", Query::css_with_text(".ant-btn", loose(label))),
        Strategy::new("exact text", Query::text(exact(label))),
        Strategy::new("text substring", Query::text(contains(label))),
        Strategy::visible_only("visible text", Query::text(loose(label))),
    ]
}

/// A native select identified by its label or one of its options
pub fn select_by_label(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("label + select", Query::labelled(loose(label), "select", LabelRelation::Adjacent)),
        Strategy::new("label ~ select", Query::labelled(loose(label), "select", LabelRelation::Sibling)),
        Strategy::new("label parent select", Query::labelled(contains(label), "select", LabelRelation::Parent)),
        Strategy::new("select with option", Query::has_descendant("select", "option", loose(label))),
    ]
}

/// An entry of an open dropdown popup
pub fn option_item(value: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("exact text", Query::text(exact(value))),
        Strategy::new("option", Query::css_with_text("option", contains(value))),
        Strategy::new("list item", Query::css_with_text("li", contains(value))),
        Strategy::new("role=option", Query::css_with_text("[role='option']", loose(value))),
    ]
}

/// One level of a navigation menu
pub fn menu_item(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("exact text", Query::text(exact(label))),
        Strategy::new("text substring", Query::text(contains(label))),
        Strategy::new("list item", Query::css_with_text("li", loose(label))),
        Strategy::new("link", Query::css_with_text("a", loose(label))),
        Strategy::new("span", Query::css_with_text("span", loose(label))),
        Strategy::new("div", Query::css_with_text("div", loose(label))),
        Strategy::new("role=menuitem", Query::css_with_text("[role='menuitem']", loose(label))),
        Strategy::new("role=button", Query::css_with_text("[role='button']", loose(label))),
        Strategy::new("aria-label substring", Query::attribute("*", "aria-label", contains(label))),
        Strategy::new("aria-label exact", Query::attribute("*", "aria-label", exact(label))),
        Strategy::new("title substring", Query::attribute("*", "title", contains(label))),
        Strategy::new("title exact", Query::attribute("*", "title", exact(label))),
        Strategy::new("data-menu", Query::attribute("*", "data-menu", contains(label))),
        Strategy::new("data-title", Query::attribute("*", "data-title", contains(label))),
    ]
}

/// A clickable action inside a table row
pub fn row_action(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::new("exact text", Query::text(exact(label))),
        Strategy::new("text substring", Query::text(contains(label))),
        Strategy::new("button text", Query::css_with_text("button", loose(label))),
        Strategy::new("link text", Query::css_with_text("a", loose(label))),
        Strategy::new("button with descendant", Query::has_descendant("button", "*", contains(label))),
        Strategy::new("link with descendant", Query::has_descendant("a", "*", contains(label))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_starts_with_placeholder() {
        let strategies = field("用户名");
        assert_eq!(strategies[0].name, "placeholder exact");
        assert!(strategies.iter().all(|s| s.pick == Pick::PreferVisible));
        assert!(matches!(
            strategies.last().map(|s| &s.query),
            Some(Query::Following { target, .. }) if target == "[contenteditable='true']"
        ));
    }

    #[test]
    fn test_text_cascade_ends_with_visible_only_text() {
        let strategies = text("保存");
        let last = strategies.last().unwrap();
        assert_eq!(last.pick, Pick::VisibleOnly);
        let select_at = strategies.iter().position(|s| s.name == "select by option text").unwrap();
        let button_at = strategies.iter().position(|s| s.name == "button text").unwrap();
        assert!(select_at < button_at);
    }

    #[test]
    fn test_no_strategy_uses_xpath() {
        let all = [field("a"), button("a"), pseudo_button("a"), text("a"), menu_item("a"), row_action("a")];
        assert!(all
            .iter()
            .flatten()
            .all(|s| !matches!(s.query, Query::XPath { .. })));
    }
}
