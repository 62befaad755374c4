//! In-memory page for testing
//!
//! `MockPage` evaluates [`Query`] against a small DOM built with [`El`] and
//! simulates the interactions the engines rely on: clicks toggling
//! checkboxes and radios, labels forwarding clicks, option clicks honouring a
//! held Control key, elements revealed by clicks or hovers. XPath is not
//! evaluated; XPath queries fail like an invalid expression would.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::mock_css::{self, SelectorList};
use super::query::{normalize_whitespace, LabelRelation, Query, TextMatch};
use super::traits::{
    BoundingBox, ClickOptions, ElementHandle, LoadState, Modifier, OptionMatch, PageDriver, Root,
};
use crate::{Error, Result};

/// Bytes returned by mock screenshots
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock";

const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Element builder
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<El>,
    hidden: bool,
    value: Option<String>,
    checked: bool,
    selected: bool,
    reveals: Vec<String>,
    hover_reveals: Vec<String>,
}

impl El {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(n, _)| n != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Own text, placed before any children
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = El>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    /// Not rendered (and neither are its descendants)
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Initial value of an input or textarea
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Initially selected `<option>`
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Show the element with this id when clicked
    pub fn reveals(mut self, id: &str) -> Self {
        self.reveals.push(id.to_string());
        self
    }

    /// Show the element with this id when hovered
    pub fn reveals_on_hover(mut self, id: &str) -> Self {
        self.hover_reveals.push(id.to_string());
        self
    }

    /// `<input type=... >`
    pub fn input(kind: &str) -> Self {
        El::new("input").attr("type", kind)
    }

    /// `<option value=...>label</option>`
    pub fn option(value: &str, label: &str) -> Self {
        El::new("option").attr("value", value).text(label)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
    parent: Option<usize>,
    hidden: bool,
    value: String,
    checked: bool,
    selected: bool,
    reveals: Vec<String>,
    hover_reveals: Vec<String>,
}

/// Arena DOM; node indices follow document order and node 0 is `<body>`
#[derive(Debug, Clone, Default)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub(crate) fn from_body(content: El) -> Self {
        let body = if content.tag == "body" {
            content
        } else {
            El::new("body").child(content)
        };
        let mut dom = Dom::default();
        dom.insert(body, None);
        dom
    }

    fn insert(&mut self, el: El, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        let value = el.value.clone().unwrap_or_else(|| {
            if el.tag == "option" {
                String::new()
            } else {
                el.attrs
                    .iter()
                    .find(|(n, _)| n == "value")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            }
        });
        self.nodes.push(Node {
            tag: el.tag,
            attrs: el.attrs,
            text: el.text,
            children: Vec::new(),
            parent,
            hidden: el.hidden,
            value,
            checked: el.checked,
            selected: el.selected,
            reveals: el.reveals,
            hover_reveals: el.hover_reveals,
        });
        for child in el.children {
            let child = self.insert(child, Some(index));
            self.nodes[index].children.push(child);
        }
        index
    }

    pub(crate) fn tag(&self, node: usize) -> &str {
        &self.nodes[node].tag
    }

    pub(crate) fn attr(&self, node: usize, name: &str) -> Option<&str> {
        self.nodes[node]
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    pub(crate) fn ancestors(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = self.nodes[node].parent;
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p].parent;
        }
        out
    }

    fn siblings_before(&self, node: usize) -> &[usize] {
        match self.nodes[node].parent {
            Some(p) => {
                let children = &self.nodes[p].children;
                let at = children.iter().position(|&c| c == node).unwrap_or(0);
                &children[..at]
            }
            None => &[],
        }
    }

    pub(crate) fn previous_sibling(&self, node: usize) -> Option<usize> {
        self.siblings_before(node).last().copied()
    }

    pub(crate) fn previous_siblings(&self, node: usize) -> Vec<usize> {
        self.siblings_before(node).iter().rev().copied().collect()
    }

    fn next_siblings(&self, node: usize) -> Vec<usize> {
        match self.nodes[node].parent {
            Some(p) => self.nodes[p]
                .children
                .iter()
                .copied()
                .skip_while(|&c| c != node)
                .skip(1)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Strict descendants in document order
    pub(crate) fn descendants(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev());
        }
        out
    }

    fn contains(&self, ancestor: usize, node: usize) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    fn own_text(&self, node: usize) -> &str {
        &self.nodes[node].text
    }

    pub(crate) fn text_content(&self, node: usize) -> String {
        let n = &self.nodes[node];
        let mut text = n.text.clone();
        for &child in &n.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn is_visible(&self, node: usize) -> bool {
        let rendered = |n: usize| {
            let style = self.attr(n, "style").unwrap_or_default().replace(' ', "");
            !self.nodes[n].hidden && !style.contains("display:none") && !style.contains("visibility:hidden")
        };
        if self.tag(node) == "input" && self.attr(node, "type") == Some("hidden") {
            return false;
        }
        rendered(node) && self.ancestors(node).into_iter().all(rendered)
    }

    fn by_id(&self, id: &str) -> Option<usize> {
        (0..self.nodes.len()).find(|&n| self.attr(n, "id") == Some(id))
    }

    fn input_type(&self, node: usize) -> Option<&str> {
        (self.tag(node) == "input").then(|| self.attr(node, "type").unwrap_or("text"))
    }

    fn select_of(&self, node: usize) -> Option<usize> {
        if self.tag(node) == "select" {
            return Some(node);
        }
        self.descendants(node).into_iter().find(|&n| self.tag(n) == "select")
    }

    fn options(&self, select: usize) -> Vec<usize> {
        self.descendants(select)
            .into_iter()
            .filter(|&n| self.tag(n) == "option")
            .collect()
    }

    fn option_value(&self, option: usize) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => normalize_whitespace(&self.text_content(option)),
        }
    }

    /// `tag#id`, `tag.class` or `tag`
    pub(crate) fn describe(&self, node: usize) -> String {
        let tag = self.tag(node);
        if let Some(id) = self.attr(node, "id") {
            return format!("{}#{}", tag, id);
        }
        match self.attr(node, "class").and_then(|c| c.split_whitespace().next()) {
            Some(class) => format!("{}.{}", tag, class),
            None => tag.to_string(),
        }
    }

    fn reveal(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(n) = self.by_id(id) {
                self.nodes[n].hidden = false;
            }
        }
    }

    fn set_checked(&mut self, node: usize, checked: bool) {
        if checked && self.input_type(node) == Some("radio") {
            if let Some(name) = self.attr(node, "name").map(str::to_string) {
                for n in 0..self.nodes.len() {
                    if self.input_type(n) == Some("radio") && self.attr(n, "name") == Some(name.as_str()) {
                        self.nodes[n].checked = false;
                    }
                }
            }
        }
        self.nodes[node].checked = checked;
    }

    /// Checkbox or radio a click on `node` acts on
    fn toggle_target(&self, node: usize) -> Option<usize> {
        match self.input_type(node) {
            Some("checkbox") | Some("radio") => return Some(node),
            _ => {}
        }
        if self.tag(node) != "label" {
            return None;
        }
        let control = match self.attr(node, "for") {
            Some(id) => self.by_id(id),
            None => self
                .descendants(node)
                .into_iter()
                .find(|&n| self.tag(n) == "input"),
        }?;
        matches!(self.input_type(control), Some("checkbox") | Some("radio")).then_some(control)
    }

    fn click_effects(&mut self, node: usize, modifiers: &BTreeSet<ModifierKey>) {
        let reveals = self.nodes[node].reveals.clone();
        self.reveal(&reveals);

        if let Some(target) = self.toggle_target(node) {
            let checked = match self.input_type(target) {
                Some("radio") => true,
                _ => !self.nodes[target].checked,
            };
            self.set_checked(target, checked);
            return;
        }

        if self.tag(node) == "option" {
            let Some(select) = self.ancestors(node).into_iter().find(|&a| self.tag(a) == "select") else {
                return;
            };
            let multiple = self.attr(select, "multiple").is_some();
            if multiple && modifiers.contains(&ModifierKey(Modifier::Control)) {
                self.nodes[node].selected = !self.nodes[node].selected;
            } else {
                for option in self.options(select) {
                    self.nodes[option].selected = option == node;
                }
            }
        }
    }

    fn evaluate(&self, root: usize, query: &Query) -> Result<Vec<usize>> {
        let found: Vec<usize> = match query {
            Query::Css { selector } => mock_css::select(self, root, selector)?,
            Query::XPath { expression } => {
                return Err(Error::cdp(format!(
                    "Failed to execute 'evaluate': '{}' is not supported by the mock page",
                    expression
                )))
            }
            Query::CssWithText { css, text } => mock_css::select(self, root, css)?
                .into_iter()
                .filter(|&n| text.matches(&self.text_content(n)))
                .collect(),
            Query::Attribute { css, name, value } => mock_css::select(self, root, css)?
                .into_iter()
                .filter(|&n| self.attr(n, name).is_some_and(|v| value.matches(v)))
                .collect(),
            Query::Text { text } => {
                let candidates: Vec<usize> = self
                    .descendants(root)
                    .into_iter()
                    .filter(|&n| !SKIP_TAGS.contains(&self.tag(n)))
                    .collect();
                candidates
                    .into_iter()
                    .filter(|&n| text.matches(&self.text_content(n)))
                    .filter(|&n| {
                        !self.nodes[n]
                            .children
                            .iter()
                            .any(|&c| text.matches(&self.text_content(c)))
                    })
                    .collect()
            }
            Query::Labelled { label, control, relation } => {
                self.labelled(root, label, control, *relation)?
            }
            Query::Following { anchor, target } => {
                let targets = mock_css::select(self, root, target)?;
                self.descendants(root)
                    .into_iter()
                    .filter(|&a| anchor.matches(self.own_text(a)))
                    .filter_map(|a| targets.iter().copied().find(|&t| t > a && !self.contains(a, t)))
                    .collect()
            }
            Query::HasDescendant { css, descendant, text } => {
                let list = SelectorList::parse(descendant)?;
                mock_css::select(self, root, css)?
                    .into_iter()
                    .filter(|&n| {
                        self.descendants(n)
                            .into_iter()
                            .any(|d| list.matches(self, d) && text.matches(&self.text_content(d)))
                    })
                    .collect()
            }
        };
        let unique: BTreeSet<usize> = found.into_iter().collect();
        Ok(unique.into_iter().collect())
    }

    fn labelled(&self, root: usize, label: &TextMatch, control: &str, relation: LabelRelation) -> Result<Vec<usize>> {
        let list = SelectorList::parse(control)?;
        let mut out = Vec::new();
        for l in mock_css::select(self, root, "label")? {
            if !label.matches(&self.text_content(l)) {
                continue;
            }
            let candidates: Vec<usize> = match relation {
                LabelRelation::Adjacent => self.next_siblings(l).into_iter().take(1).collect(),
                LabelRelation::Sibling => self.next_siblings(l),
                LabelRelation::Parent => match self.parent(l) {
                    Some(p) => self.nodes[p].children.iter().copied().filter(|&c| c != l).collect(),
                    None => Vec::new(),
                },
                LabelRelation::Inside => self.descendants(l),
                LabelRelation::Previous => self.previous_sibling(l).into_iter().collect(),
            };
            out.extend(
                candidates
                    .into_iter()
                    .filter(|&c| list.matches(self, c))
                    .filter(|&c| c != root && self.contains(root, c)),
            );
        }
        Ok(out)
    }
}

/// Ordered wrapper so held modifiers can live in a `BTreeSet`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModifierKey(Modifier);

impl PartialOrd for ModifierKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModifierKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.bit().cmp(&other.0.bit())
    }
}

/// Interaction recorded by the mock page
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Goto(String),
    Click { target: String, modifiers: Vec<Modifier> },
    Hover(String),
    Fill { target: String, text: String },
    KeyDown(Modifier),
    KeyUp(Modifier),
    Screenshot,
}

#[derive(Debug)]
struct MockState {
    dom: Dom,
    generation: u64,
    url: String,
    routes: HashMap<String, El>,
    held: BTreeSet<ModifierKey>,
    events: Vec<MockEvent>,
    /// Visibility checks left before they start timing out
    visibility_budget: Option<usize>,
}

impl MockState {
    fn held(&self) -> Vec<Modifier> {
        self.held.iter().map(|m| m.0).collect()
    }
}

/// In-memory [`PageDriver`]
#[derive(Debug, Clone)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
}

impl MockPage {
    /// Page showing `content` inside `<body>`
    pub fn new(content: El) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                dom: Dom::from_body(content),
                generation: 0,
                url: "about:blank".to_string(),
                routes: HashMap::new(),
                held: BTreeSet::new(),
                events: Vec::new(),
                visibility_budget: None,
            })),
        }
    }

    /// Serve `content` when `url` is opened
    pub fn route(self, url: &str, content: El) -> Self {
        self.lock().routes.insert(url.to_string(), content);
        self
    }

    /// Let `n` visibility checks succeed, then time out every later one
    pub fn stall_visibility_after(self, n: usize) -> Self {
        self.lock().visibility_budget = Some(n);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Recorded interactions
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    /// Descriptions (`tag#id`, `tag.class` or `tag`) of clicked elements, in order
    pub fn clicked(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Click { target, .. } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// URLs opened, in order
    pub fn visited(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Goto(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current value of the element with this id
    pub fn value_of(&self, id: &str) -> Option<String> {
        let state = self.lock();
        let node = state.dom.by_id(id)?;
        Some(state.dom.nodes[node].value.clone())
    }

    /// Checked state of the element with this id
    pub fn is_checked(&self, id: &str) -> Option<bool> {
        let state = self.lock();
        let node = state.dom.by_id(id)?;
        Some(state.dom.nodes[node].checked)
    }

    /// Whether the element with this id is rendered
    pub fn is_shown(&self, id: &str) -> bool {
        let state = self.lock();
        state.dom.by_id(id).is_some_and(|n| state.dom.is_visible(n))
    }

    /// Labels of the selected options of the select with this id
    pub fn selected_labels(&self, id: &str) -> Vec<String> {
        let state = self.lock();
        let Some(select) = state.dom.by_id(id) else {
            return Vec::new();
        };
        state
            .dom
            .options(select)
            .into_iter()
            .filter(|&o| state.dom.nodes[o].selected)
            .map(|o| normalize_whitespace(&state.dom.text_content(o)))
            .collect()
    }

    fn handle(&self, node: usize, generation: u64) -> Arc<dyn ElementHandle> {
        Arc::new(MockElement {
            id: format!("m{}:{}", generation, node),
            node,
            generation,
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str, _wait_until: LoadState) -> Result<()> {
        let mut state = self.lock();
        state.events.push(MockEvent::Goto(url.to_string()));
        state.url = url.to_string();
        let routed = state.routes.get(url).cloned();
        if let Some(content) = routed {
            state.dom = Dom::from_body(content);
        }
        state.generation += 1;
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn query_all(&self, root: &Root, query: &Query) -> Result<Vec<Arc<dyn ElementHandle>>> {
        let state = self.lock();
        let root = match root.handle_id() {
            None => 0,
            Some(id) => resolve_handle(&state, id)?,
        };
        let nodes = state.dom.evaluate(root, query)?;
        let generation = state.generation;
        drop(state);
        Ok(nodes.into_iter().map(|n| self.handle(n, generation)).collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.lock().events.push(MockEvent::Screenshot);
        Ok(MOCK_PNG.to_vec())
    }

    async fn key_down(&self, modifier: Modifier) -> Result<()> {
        let mut state = self.lock();
        state.held.insert(ModifierKey(modifier));
        state.events.push(MockEvent::KeyDown(modifier));
        Ok(())
    }

    async fn key_up(&self, modifier: Modifier) -> Result<()> {
        let mut state = self.lock();
        state.held.remove(&ModifierKey(modifier));
        state.events.push(MockEvent::KeyUp(modifier));
        Ok(())
    }
}

fn resolve_handle(state: &MockState, id: &str) -> Result<usize> {
    let stale = || Error::cdp(format!("stale element handle {}", id));
    let (generation, node) = id
        .strip_prefix('m')
        .and_then(|rest| rest.split_once(':'))
        .ok_or_else(stale)?;
    let generation: u64 = generation.parse().map_err(|_| stale())?;
    let node: usize = node.parse().map_err(|_| stale())?;
    if generation != state.generation || node >= state.dom.nodes.len() {
        return Err(stale());
    }
    Ok(node)
}

/// Element of a [`MockPage`]
#[derive(Debug, Clone)]
pub struct MockElement {
    id: String,
    node: usize,
    generation: u64,
    state: Arc<Mutex<MockState>>,
}

impl MockElement {
    fn lock(&self) -> Result<MutexGuard<'_, MockState>> {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.generation != self.generation {
            return Err(Error::cdp(format!("stale element handle {}", self.id)));
        }
        Ok(state)
    }

    fn not_visible(&self, dom: &Dom) -> Error {
        Error::timeout(format!("Element {} is not visible", dom.describe(self.node)))
    }

    fn set_checked(&self, checked: bool) -> Result<()> {
        let mut state = self.lock()?;
        let target = state
            .dom
            .toggle_target(self.node)
            .ok_or_else(|| Error::cdp("Not a checkbox or radio button"))?;
        if !checked && state.dom.input_type(target) == Some("radio") {
            return Err(Error::cdp("Cannot uncheck a radio button"));
        }
        if state.dom.nodes[target].checked != checked {
            state.dom.set_checked(target, checked);
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for MockElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn is_visible(&self) -> Result<bool> {
        let mut state = self.lock()?;
        match state.visibility_budget {
            Some(0) => return Err(Error::timeout(format!("visibility of {} timed out", self.id))),
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        Ok(state.dom.is_visible(self.node))
    }

    async fn text_content(&self) -> Result<String> {
        Ok(self.lock()?.dom.text_content(self.node))
    }

    async fn input_value(&self) -> Result<String> {
        let state = self.lock()?;
        let dom = &state.dom;
        match dom.tag(self.node) {
            "input" | "textarea" => Ok(dom.nodes[self.node].value.clone()),
            "select" => {
                let options = dom.options(self.node);
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&o| dom.nodes[o].selected)
                    .or_else(|| options.first().copied());
                Ok(chosen.map(|o| dom.option_value(o)).unwrap_or_default())
            }
            _ if dom.attr(self.node, "contenteditable") == Some("true") => Ok(dom.text_content(self.node)),
            _ => Err(Error::cdp("Not an <input>, <textarea> or <select> element")),
        }
    }

    async fn is_checked(&self) -> Result<bool> {
        let state = self.lock()?;
        match state.dom.input_type(self.node) {
            Some("checkbox") | Some("radio") => Ok(state.dom.nodes[self.node].checked),
            _ => match state.dom.attr(self.node, "aria-checked") {
                Some(aria) => Ok(aria == "true"),
                None => Err(Error::cdp("Not a checkbox or radio button")),
            },
        }
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.dom.attr(self.node, name).map(str::to_string))
    }

    async fn tag_name(&self) -> Result<String> {
        Ok(self.lock()?.dom.tag(self.node).to_string())
    }

    async fn is_multiple(&self) -> Result<bool> {
        let state = self.lock()?;
        Ok(state
            .dom
            .select_of(self.node)
            .is_some_and(|s| state.dom.attr(s, "multiple").is_some()))
    }

    async fn option_labels(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        let Some(select) = state.dom.select_of(self.node) else {
            return Ok(Vec::new());
        };
        Ok(state
            .dom
            .options(select)
            .into_iter()
            .map(|o| state.dom.text_content(o))
            .collect())
    }

    async fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        let state = self.lock()?;
        if !state.dom.is_visible(self.node) {
            return Ok(None);
        }
        Ok(Some(BoundingBox {
            x: 0.0,
            y: self.node as f64 * 20.0,
            width: 100.0,
            height: 20.0,
        }))
    }

    async fn click(&self, options: ClickOptions) -> Result<()> {
        let mut state = self.lock()?;
        if !options.force && !state.dom.is_visible(self.node) {
            return Err(self.not_visible(&state.dom));
        }
        let target = state.dom.describe(self.node);
        let modifiers = state.held();
        state.events.push(MockEvent::Click { target, modifiers });
        let held = state.held.clone();
        state.dom.click_effects(self.node, &held);
        Ok(())
    }

    async fn hover(&self) -> Result<()> {
        let mut state = self.lock()?;
        let target = state.dom.describe(self.node);
        state.events.push(MockEvent::Hover(target));
        let reveals = state.dom.nodes[self.node].hover_reveals.clone();
        state.dom.reveal(&reveals);
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<()> {
        let mut state = self.lock()?;
        let editable = match state.dom.tag(self.node) {
            "textarea" => true,
            "input" => !matches!(
                state.dom.input_type(self.node),
                Some("checkbox") | Some("radio") | Some("hidden") | Some("button") | Some("submit")
            ),
            _ => state.dom.attr(self.node, "contenteditable") == Some("true"),
        };
        if !editable {
            return Err(Error::cdp(
                "Element is not an <input>, <textarea> or [contenteditable] element",
            ));
        }
        if !state.dom.is_visible(self.node) {
            return Err(self.not_visible(&state.dom));
        }
        let target = state.dom.describe(self.node);
        state.events.push(MockEvent::Fill {
            target,
            text: text.to_string(),
        });
        let node = &mut state.dom.nodes[self.node];
        node.value = text.to_string();
        if node.tag != "input" && node.tag != "textarea" {
            node.text = text.to_string();
        }
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        self.set_checked(true)
    }

    async fn uncheck(&self) -> Result<()> {
        self.set_checked(false)
    }

    async fn select_options(&self, values: &[String], by: OptionMatch) -> Result<Vec<String>> {
        let mut state = self.lock()?;
        if state.dom.tag(self.node) != "select" {
            return Err(Error::cdp("Element is not a <select> element"));
        }
        let multiple = state.dom.attr(self.node, "multiple").is_some();
        let options = state.dom.options(self.node);
        let mut picked = Vec::new();
        for value in values {
            let found = options.iter().copied().find(|&o| match by {
                OptionMatch::Label => {
                    normalize_whitespace(&state.dom.text_content(o)) == normalize_whitespace(value)
                }
                OptionMatch::Value => state.dom.option_value(o) == *value,
            });
            match found {
                Some(o) => picked.push(o),
                None => return Err(Error::option_not_found(format!("{} (by {})", value, by.as_str()))),
            }
            if !multiple {
                break;
            }
        }
        for &o in &options {
            state.dom.nodes[o].selected = picked.contains(&o);
        }
        Ok(picked.into_iter().map(|o| state.dom.option_value(o)).collect())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.lock()?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let mut state = self.lock()?;
        if !state.dom.is_visible(self.node) {
            return Err(self.not_visible(&state.dom));
        }
        state.events.push(MockEvent::Screenshot);
        Ok(MOCK_PNG.to_vec())
    }
}
