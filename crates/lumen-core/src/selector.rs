#![forbid(unsafe_code)]

//! A small CSS selector engine covering the landing page markup contract.
//!
//! Supported syntax:
//!
//! - type selectors (`button`), universal `*`, `#id`, `.class`
//! - attribute conditions `[attr]`, `[attr="v"]`, `[attr^="v"]`,
//!   `[attr$="v"]`, `[attr*="v"]`
//! - descendant (whitespace) and child (`>`) combinators
//! - selector groups separated by `,`
//!
//! Matching is delegated to a [`Matchable`] tree so the same compiled
//! [`Selector`] works against the in-memory [`Document`](crate::document::Document)
//! and any other host tree.
//!
//! # Failure Modes
//!
//! Unsupported syntax (pseudo-classes, sibling combinators, unterminated
//! brackets or quotes, empty groups) is rejected at parse time with
//! [`LumenError::InvalidSelector`].

use std::fmt;
use std::str::FromStr;

use crate::error::{LumenError, Result};

/// Read-only view of a tree that selectors can be matched against.
pub trait Matchable {
    type Node: Copy;

    /// Lower-case tag name, `None` for non-element nodes.
    fn tag(&self, node: Self::Node) -> Option<&str>;

    /// Attribute value; the `class` attribute holds the space-separated list.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Step {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

impl Step {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    step: Step,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

/// A compiled selector list.
#[derive(Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Vec<Part>>,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("source", &self.source)
            .field("groups", &self.groups.len())
            .finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = LumenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Selector {
    /// Compile a selector list.
    pub fn parse(source: &str) -> Result<Self> {
        let source = normalize(source);
        if source.is_empty() {
            return Err(LumenError::selector(source, "empty selector"));
        }
        let groups = split_groups(&source)?
            .into_iter()
            .map(|group| parse_chain(group, &source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { source, groups })
    }

    /// The normalized source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of comma-separated alternatives.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether `node` matches any alternative.
    pub fn matches<M: Matchable + ?Sized>(&self, tree: &M, node: M::Node) -> bool {
        if tree.tag(node).is_none() {
            return false;
        }
        self.groups
            .iter()
            .any(|parts| matches_chain(tree, node, parts))
    }
}

/// Collapse whitespace runs so multi-line selector lists read back cleanly.
fn normalize(source: &str) -> String {
    source.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matches_chain<M: Matchable + ?Sized>(tree: &M, node: M::Node, parts: &[Part]) -> bool {
    let Some(last) = parts.last() else {
        return false;
    };
    if !matches_step(tree, node, &last.step) {
        return false;
    }

    // (node, idx): `node` matched `parts[idx]`; the parts left of it remain.
    let mut pending = vec![(node, parts.len() - 1)];
    let mut candidates = Vec::new();
    while let Some((current, idx)) = pending.pop() {
        let Some(next) = idx.checked_sub(1) else {
            return true;
        };
        let step = &parts[next].step;
        match parts[idx].combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => {
                if let Some(parent) = tree
                    .parent(current)
                    .filter(|parent| matches_step(tree, *parent, step))
                {
                    pending.push((parent, next));
                }
            }
            Combinator::Descendant => {
                candidates.clear();
                let mut cursor = tree.parent(current);
                while let Some(ancestor) = cursor {
                    if matches_step(tree, ancestor, step) {
                        candidates.push(ancestor);
                    }
                    cursor = tree.parent(ancestor);
                }
                // Nearest ancestor is tried first.
                pending.extend(candidates.iter().rev().map(|&ancestor| (ancestor, next)));
            }
        }
    }
    false
}

fn matches_step<M: Matchable + ?Sized>(tree: &M, node: M::Node, step: &Step) -> bool {
    let Some(tag) = tree.tag(node) else {
        return false;
    };
    if let Some(expected) = &step.tag {
        if !tag.eq_ignore_ascii_case(expected) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if tree.attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !step.classes.is_empty() {
        let classes = tree.attribute(node, "class").unwrap_or("");
        if step
            .classes
            .iter()
            .any(|wanted| !classes.split_whitespace().any(|have| have == wanted))
        {
            return false;
        }
    }
    step.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists { key } => tree.attribute(node, key).is_some(),
        AttrCondition::Eq { key, value } => tree.attribute(node, key) == Some(value.as_str()),
        AttrCondition::StartsWith { key, value } => tree
            .attribute(node, key)
            .is_some_and(|attr| attr.starts_with(value.as_str())),
        AttrCondition::EndsWith { key, value } => tree
            .attribute(node, key)
            .is_some_and(|attr| attr.ends_with(value.as_str())),
        AttrCondition::Contains { key, value } => tree
            .attribute(node, key)
            .is_some_and(|attr| attr.contains(value.as_str())),
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split on top-level commas (outside brackets and quotes).
fn split_groups(source: &str) -> Result<Vec<&str>> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| LumenError::selector(source, "unbalanced ']'"))?;
            }
            (None, ',') if depth == 0 => {
                groups.push(source[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(LumenError::selector(source, "unterminated quote"));
    }
    if depth != 0 {
        return Err(LumenError::selector(source, "unterminated '['"));
    }
    groups.push(source[start..].trim());
    if groups.iter().any(|g| g.is_empty()) {
        return Err(LumenError::selector(source, "empty selector group"));
    }
    Ok(groups)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Compound(String),
    Child,
}

fn tokenize(group: &str, source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token::Compound(std::mem::take(current)));
        }
    };

    for ch in group.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => flush(&mut current, &mut tokens),
            '>' if depth == 0 => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Child);
            }
            '+' | '~' if depth == 0 => {
                return Err(LumenError::selector(
                    source,
                    format!("sibling combinator {ch:?} is not supported"),
                ));
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

fn parse_chain(group: &str, source: &str) -> Result<Vec<Part>> {
    let mut parts: Vec<Part> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(group, source)? {
        match token {
            Token::Child => {
                if pending.is_some() || parts.is_empty() {
                    return Err(LumenError::selector(source, "misplaced '>' combinator"));
                }
                pending = Some(Combinator::Child);
            }
            Token::Compound(text) => {
                let step = parse_step(&text, source)?;
                let combinator = if parts.is_empty() {
                    None
                } else {
                    Some(pending.take().unwrap_or(Combinator::Descendant))
                };
                parts.push(Part { step, combinator });
            }
        }
    }

    if parts.is_empty() || pending.is_some() {
        return Err(LumenError::selector(source, "dangling combinator"));
    }
    Ok(parts)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn read_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    (end > start).then(|| (chars[start..end].iter().collect(), end))
}

fn parse_step(text: &str, source: &str) -> Result<Step> {
    let chars: Vec<char> = text.chars().collect();
    let mut step = Step::default();
    let mut idx = 0;

    if chars.first() == Some(&'*') {
        step.universal = true;
        idx = 1;
    } else if let Some((tag, next)) = read_ident(&chars, 0) {
        step.tag = Some(tag.to_ascii_lowercase());
        idx = next;
    }

    while idx < chars.len() {
        match chars[idx] {
            '.' => {
                let (class, next) = read_ident(&chars, idx + 1)
                    .ok_or_else(|| LumenError::selector(source, "expected class name after '.'"))?;
                step.classes.push(class);
                idx = next;
            }
            '#' => {
                let (id, next) = read_ident(&chars, idx + 1)
                    .ok_or_else(|| LumenError::selector(source, "expected id after '#'"))?;
                step.id = Some(id);
                idx = next;
            }
            '[' => {
                let close = find_closing_bracket(&chars, idx)
                    .ok_or_else(|| LumenError::selector(source, "unterminated '['"))?;
                let inner: String = chars[idx + 1..close].iter().collect();
                step.attrs.push(parse_attr(&inner, source)?);
                idx = close + 1;
            }
            other => {
                return Err(LumenError::selector(
                    source,
                    format!("unexpected character {other:?}"),
                ));
            }
        }
    }

    if step.is_empty() {
        return Err(LumenError::selector(source, "empty compound selector"));
    }
    Ok(step)
}

fn find_closing_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &ch) in chars[open + 1..].iter().enumerate() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, ']') => return Some(open + 1 + offset),
            _ => {}
        }
    }
    None
}

fn parse_attr(inner: &str, source: &str) -> Result<AttrCondition> {
    let inner = inner.trim();
    let Some(eq) = inner.find('=') else {
        if inner.is_empty() || !inner.chars().all(is_ident_char) {
            return Err(LumenError::selector(source, "invalid attribute name"));
        }
        return Ok(AttrCondition::Exists {
            key: inner.to_string(),
        });
    };

    let (lhs, rhs) = (&inner[..eq], &inner[eq + 1..]);
    let (key, operator) = match lhs.chars().last() {
        Some(op @ ('^' | '$' | '*')) => (&lhs[..lhs.len() - 1], Some(op)),
        _ => (lhs, None),
    };
    let key = key.trim();
    if key.is_empty() || !key.chars().all(is_ident_char) {
        return Err(LumenError::selector(source, "invalid attribute name"));
    }
    let key = key.to_string();
    let value = unquote(rhs.trim())
        .ok_or_else(|| LumenError::selector(source, "malformed attribute value"))?
        .to_string();

    Ok(match operator {
        None => AttrCondition::Eq { key, value },
        Some('^') => AttrCondition::StartsWith { key, value },
        Some('$') => AttrCondition::EndsWith { key, value },
        _ => AttrCondition::Contains { key, value },
    })
}

fn unquote(value: &str) -> Option<&str> {
    let mut chars = value.chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) => value
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q)),
        Some(_) if value.chars().all(is_ident_char) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal tree: (tag, attrs, parent).
    struct Tree {
        nodes: Vec<(&'static str, Vec<(&'static str, &'static str)>, Option<usize>)>,
    }

    impl Matchable for Tree {
        type Node = usize;

        fn tag(&self, node: usize) -> Option<&str> {
            self.nodes.get(node).map(|(tag, _, _)| *tag)
        }

        fn attribute(&self, node: usize, name: &str) -> Option<&str> {
            self.nodes
                .get(node)?
                .1
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        }

        fn parent(&self, node: usize) -> Option<usize> {
            self.nodes.get(node)?.2
        }
    }

    fn tree() -> Tree {
        Tree {
            nodes: vec![
                ("body", vec![], None),
                ("nav", vec![("class", "nav-menu")], Some(0)),
                ("a", vec![("href", "#features")], Some(1)),
                ("div", vec![("class", "floating-shapes")], Some(0)),
                ("div", vec![("class", "shape shape-1")], Some(3)),
                ("button", vec![("class", "demo-btn active"), ("data-demo", "ai")], Some(0)),
                ("a", vec![("href", "https://example.com"), ("class", "cta-primary")], Some(0)),
                ("div", vec![("id", "ai-demo"), ("class", "demo-panel")], Some(0)),
            ],
        }
    }

    fn sel(src: &str) -> Selector {
        Selector::parse(src).expect("selector should parse")
    }

    #[test]
    fn descendant_backtracks_to_farther_ancestor() {
        // .a > .b#b1 > .b#b2 > span.c
        let t = Tree {
            nodes: vec![
                ("body", vec![], None),
                ("div", vec![("class", "a")], Some(0)),
                ("div", vec![("class", "b"), ("id", "b1")], Some(1)),
                ("div", vec![("class", "b"), ("id", "b2")], Some(2)),
                ("span", vec![("class", "c")], Some(3)),
            ],
        };
        assert!(sel(".a > .b .c").matches(&t, 4));
        assert!(sel(".a > .b > .b > .c").matches(&t, 4));
        assert!(sel(".a .b .b .c").matches(&t, 4));
        assert!(!sel(".a > .b > .c").matches(&t, 4));
        assert!(!sel(".b > .a .c").matches(&t, 4));
    }

    #[test]
    fn class_selector() {
        let t = tree();
        assert!(sel(".nav-menu").matches(&t, 1));
        assert!(!sel(".nav-menu").matches(&t, 2));
        assert!(sel(".shape").matches(&t, 4));
    }

    #[test]
    fn compound_classes_require_all() {
        let t = tree();
        assert!(sel(".demo-btn.active").matches(&t, 5));
        assert!(!sel(".demo-btn.inactive").matches(&t, 5));
        assert!(sel("button.demo-btn").matches(&t, 5));
        assert!(!sel("div.demo-btn").matches(&t, 5));
    }

    #[test]
    fn descendant_combinator() {
        let t = tree();
        assert!(sel(".nav-menu a").matches(&t, 2));
        assert!(!sel(".nav-menu a").matches(&t, 6));
        assert!(sel(".floating-shapes .shape").matches(&t, 4));
        assert!(sel("body .shape").matches(&t, 4));
    }

    #[test]
    fn child_combinator() {
        let t = tree();
        assert!(sel(".floating-shapes > .shape").matches(&t, 4));
        assert!(!sel("body > .shape").matches(&t, 4));
        assert!(sel("body > .floating-shapes > .shape").matches(&t, 4));
    }

    #[test]
    fn attribute_prefix() {
        let t = tree();
        let anchors = sel("a[href^=\"#\"]");
        assert!(anchors.matches(&t, 2));
        assert!(!anchors.matches(&t, 6));
        assert!(sel("[data-demo]").matches(&t, 5));
        assert!(sel("[data-demo=ai]").matches(&t, 5));
        assert!(sel("[data-demo='ai']").matches(&t, 5));
        assert!(sel("[href$=\".com\"]").matches(&t, 6));
        assert!(sel("[href*=\"example\"]").matches(&t, 6));
    }

    #[test]
    fn id_selector() {
        let t = tree();
        assert!(sel("#ai-demo").matches(&t, 7));
        assert!(sel("div#ai-demo.demo-panel").matches(&t, 7));
        assert!(!sel("#other").matches(&t, 7));
    }

    #[test]
    fn groups_match_any_alternative() {
        let t = tree();
        let buttons = sel("button, .cta-primary, .cta-secondary");
        assert_eq!(buttons.group_count(), 3);
        assert!(buttons.matches(&t, 5));
        assert!(buttons.matches(&t, 6));
        assert!(!buttons.matches(&t, 1));
    }

    #[test]
    fn multiline_source_is_normalized() {
        let s = sel(
            "
            .problem-card,
            .target-card,
            .feature-card
        ",
        );
        assert_eq!(s.source(), ".problem-card, .target-card, .feature-card");
        assert_eq!(s.group_count(), 3);
    }

    #[test]
    fn universal_matches_everything() {
        let t = tree();
        assert!((0..8).all(|n| sel("*").matches(&t, n)));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        for bad in [
            "",
            "   ",
            ".a,",
            ",.a",
            ".a >",
            "> .a",
            ".a > > .b",
            ".a + .b",
            ".a ~ .b",
            ".a:hover",
            "[href",
            "[href=\"x]",
            ".",
            "#",
            "[=x]",
            "[a=\"x\"y]",
        ] {
            assert!(Selector::parse(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn display_round_trips_source() {
        let s = sel(".floating-shapes   .shape");
        assert_eq!(s.to_string(), ".floating-shapes .shape");
        let reparsed: Selector = s.to_string().parse().unwrap();
        assert_eq!(reparsed, s);
    }
}
