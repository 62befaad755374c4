//! CSS selector subset for the mock DOM
//!
//! Supports type and universal selectors, `#id`, `.class`, attribute
//! selectors (`[a]`, `=`, `*=`, `^=`, `$=`, `~=`), compound selectors, the
//! descendant, `>`, `+` and `~` combinators, and comma-separated lists.

use super::mock::Dom;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

/// A parsed selector list
#[derive(Debug, Clone)]
pub(crate) struct SelectorList(Vec<Complex>);

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> Result<Self> {
        Parser::new(selector).parse_list()
    }

    /// Whether `node` matches any selector of the list
    pub(crate) fn matches(&self, dom: &Dom, node: usize) -> bool {
        self.0
            .iter()
            .any(|complex| match_from(dom, node, complex, complex.compounds.len() - 1))
    }
}

/// Descendants of `root` matching `selector`, in document order
pub(crate) fn select(dom: &Dom, root: usize, selector: &str) -> Result<Vec<usize>> {
    let list = SelectorList::parse(selector)?;
    Ok(dom
        .descendants(root)
        .into_iter()
        .filter(|&n| list.matches(dom, n))
        .collect())
}

/// Whether `node` matches `selector`
pub(crate) fn matches(dom: &Dom, node: usize, selector: &str) -> Result<bool> {
    Ok(SelectorList::parse(selector)?.matches(dom, node))
}

fn match_from(dom: &Dom, node: usize, complex: &Complex, i: usize) -> bool {
    if !compound_matches(dom, node, &complex.compounds[i]) {
        return false;
    }
    if i == 0 {
        return true;
    }
    match complex.combinators[i - 1] {
        Combinator::Descendant => dom
            .ancestors(node)
            .into_iter()
            .any(|a| match_from(dom, a, complex, i - 1)),
        Combinator::Child => dom
            .parent(node)
            .is_some_and(|p| match_from(dom, p, complex, i - 1)),
        Combinator::Adjacent => dom
            .previous_sibling(node)
            .is_some_and(|s| match_from(dom, s, complex, i - 1)),
        Combinator::Sibling => dom
            .previous_siblings(node)
            .into_iter()
            .any(|s| match_from(dom, s, complex, i - 1)),
    }
}

fn compound_matches(dom: &Dom, node: usize, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if !dom.tag(node).eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if compound.ids.iter().any(|id| dom.attr(node, "id") != Some(id.as_str())) {
        return false;
    }
    if !compound.classes.is_empty() {
        let classes: Vec<&str> = dom.attr(node, "class").unwrap_or_default().split_whitespace().collect();
        if compound.classes.iter().any(|c| !classes.contains(&c.as_str())) {
            return false;
        }
    }
    compound.attrs.iter().all(|sel| {
        let Some(actual) = dom.attr(node, &sel.name) else {
            return false;
        };
        match sel.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == sel.value,
            AttrOp::Contains => !sel.value.is_empty() && actual.contains(&sel.value),
            AttrOp::Prefix => !sel.value.is_empty() && actual.starts_with(&sel.value),
            AttrOp::Suffix => !sel.value.is_empty() && actual.ends_with(&sel.value),
            AttrOp::Word => actual.split_whitespace().any(|w| w == sel.value),
        }
    })
}

struct Parser {
    source: String,
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, what: &str) -> Error {
        Error::cdp(format!(
            "'{}' is not a valid selector: {} at {}",
            self.source, what, self.pos
        ))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<SelectorList> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_complex()?);
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(SelectorList(list))
    }

    fn parse_complex(&mut self) -> Result<Complex> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::Sibling,
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return Err(self.error("expected combinator")),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex { compounds, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let start = self.pos;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
            }
            Some(c) if is_ident_char(c) => compound.tag = Some(self.ident()?),
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => return Err(self.error("pseudo-classes are not supported")),
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.error("expected selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Result<AttrSelector> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                })
            }
            Some('=') => AttrOp::Equals,
            Some(c @ ('*' | '^' | '$' | '~')) => {
                if self.bump() != Some('=') {
                    return Err(self.error("expected '='"));
                }
                match c {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Word,
                }
            }
            _ => return Err(self.error("bad attribute selector")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                self.quoted(quote)?
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(AttrSelector { name, op, value })
    }

    fn quoted(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
