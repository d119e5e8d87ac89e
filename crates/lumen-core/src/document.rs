#![forbid(unsafe_code)]

//! In-memory retained element tree implementing [`Surface`].
//!
//! [`Document`] stands in for the browser page: it stores tags, attributes,
//! classes, text, inline styles and document-space bounds, and answers
//! selector queries in document order. Every mutation made through the
//! [`Surface`] API is appended to a journal of [`Mutation`]s, which the web
//! runner drains as patches and the test harness inspects directly.
//!
//! Setup operations ([`Document::insert`], [`Document::set_bounds`],
//! [`Document::scroll_to`]) model the host and are not journaled.
//!
//! # Invariants
//!
//! 1. The body element always exists, has id `#0`, and cannot be removed.
//! 2. Element ids are never reused; removed elements stay addressable but are
//!    detached, excluded from queries, and reject mutations.
//! 3. Query results follow a depth-first pre-order walk from the body.
//! 4. The journal records mutations in the order they were applied.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::error::{LumenError, Result};
use crate::geometry::{Rect, Viewport};
use crate::selector::{Matchable, Selector};
use crate::style::StyleProp;
use crate::surface::{ElementId, ElementSpec, ScrollBehavior, ScrollBlock, Surface};

/// A journaled surface mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "op", rename_all = "snake_case")
)]
pub enum Mutation {
    Style {
        id: ElementId,
        prop: StyleProp,
        value: String,
    },
    Text {
        id: ElementId,
        text: String,
    },
    ClassAdded {
        id: ElementId,
        class: String,
    },
    ClassRemoved {
        id: ElementId,
        class: String,
    },
    Appended {
        id: ElementId,
        parent: ElementId,
        tag: String,
        classes: Vec<String>,
        styles: Vec<(StyleProp, String)>,
    },
    Removed {
        id: ElementId,
    },
    ScrollIntoView {
        id: ElementId,
        behavior: ScrollBehavior,
        block: ScrollBlock,
    },
}

impl Mutation {
    /// Element the mutation applies to.
    #[must_use]
    pub fn target(&self) -> ElementId {
        match self {
            Self::Style { id, .. }
            | Self::Text { id, .. }
            | Self::ClassAdded { id, .. }
            | Self::ClassRemoved { id, .. }
            | Self::Appended { id, .. }
            | Self::Removed { id }
            | Self::ScrollIntoView { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    styles: BTreeMap<StyleProp, String>,
    bounds: Rect,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attached: bool,
}

impl Node {
    fn from_spec(spec: ElementSpec, parent: Option<ElementId>) -> Self {
        let mut attrs: Vec<(String, String)> = Vec::with_capacity(spec.attributes.len() + 1);
        if !spec.classes.is_empty() {
            attrs.push(("class".to_string(), spec.classes.join(" ")));
        }
        for (name, value) in spec.attributes {
            if name == "class" {
                match attrs.iter_mut().find(|(key, _)| key == "class") {
                    Some((_, existing)) => {
                        existing.push(' ');
                        existing.push_str(&value);
                    }
                    None => attrs.push((name, value)),
                }
            } else if let Some((_, existing)) = attrs.iter_mut().find(|(key, _)| *key == name) {
                *existing = value;
            } else {
                attrs.push((name, value));
            }
        }
        Self {
            tag: spec.tag,
            attrs,
            text: spec.text,
            styles: spec.styles.into_iter().collect(),
            bounds: spec.bounds,
            parent,
            children: Vec::new(),
            attached: true,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }
}

/// In-memory page model.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    viewport: Viewport,
    id_index: AHashMap<String, ElementId>,
    journal: Vec<Mutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Viewport::new(1280.0, 800.0))
    }
}

impl Document {
    pub const BODY: ElementId = ElementId::new(0);

    /// Create a document holding only `body`.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let body = Node::from_spec(ElementSpec::new("body"), None);
        Self {
            nodes: vec![body],
            viewport,
            id_index: AHashMap::new(),
            journal: Vec::new(),
        }
    }

    /// Insert an element as host setup (not journaled).
    pub fn insert(&mut self, parent: ElementId, spec: ElementSpec) -> Result<ElementId> {
        self.create(parent, spec)
            .ok_or(LumenError::UnknownElement { id: parent })
    }

    fn create(&mut self, parent: ElementId, spec: ElementSpec) -> Option<ElementId> {
        if !self.is_attached(parent) {
            return None;
        }
        let id = ElementId::new(u32::try_from(self.nodes.len()).ok()?);
        let node = Node::from_spec(spec, Some(parent));
        if let Some(dom_id) = node.attr("id") {
            self.id_index.entry(dom_id.to_string()).or_insert(id);
        }
        self.nodes.push(node);
        self.nodes[parent.get() as usize].children.push(id);
        Some(id)
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes
            .get(element.get() as usize)
            .filter(|node| node.attached)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes
            .get_mut(element.get() as usize)
            .filter(|node| node.attached)
    }

    /// Whether `element` exists and is part of the tree.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.node(element).is_some()
    }

    /// Number of attached elements, including `body`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.attached).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    #[must_use]
    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.node(element)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|node| node.tag.as_str())
    }

    /// All inline styles of `element`, sorted by property.
    #[must_use]
    pub fn styles(&self, element: ElementId) -> Vec<(StyleProp, String)> {
        self.node(element)
            .map(|node| {
                node.styles
                    .iter()
                    .map(|(prop, value)| (*prop, value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Move the viewport (host scroll; not journaled).
    pub fn scroll_to(&mut self, offset: f64) {
        self.viewport.scroll_y = offset.max(0.0);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Replace an element's layout box (host layout; not journaled).
    pub fn set_bounds(&mut self, element: ElementId, bounds: Rect) -> bool {
        match self.node_mut(element) {
            Some(node) => {
                node.bounds = bounds;
                true
            }
            None => false,
        }
    }

    /// Mutations applied so far.
    #[must_use]
    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    /// Drain the journal.
    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// Pre-order walk of the subtree at `from`, in document order.
    fn walk(&self, from: ElementId, out: &mut Vec<ElementId>) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    fn detach(&mut self, element: ElementId) {
        let mut subtree = Vec::new();
        self.walk(element, &mut subtree);
        for id in subtree {
            let node = &mut self.nodes[id.get() as usize];
            node.attached = false;
            if let Some(dom_id) = node.attr("id").map(str::to_string) {
                if self.id_index.get(&dom_id) == Some(&id) {
                    self.id_index.remove(&dom_id);
                }
            }
        }
    }
}

impl Matchable for Document {
    type Node = ElementId;

    fn tag(&self, node: ElementId) -> Option<&str> {
        Document::tag(self, node)
    }

    fn attribute(&self, node: ElementId, name: &str) -> Option<&str> {
        self.node(node)?.attr(name)
    }

    fn parent(&self, node: ElementId) -> Option<ElementId> {
        self.node(node)?.parent
    }
}

impl Surface for Document {
    fn query(&self, selector: &Selector) -> Vec<ElementId> {
        let mut all = Vec::with_capacity(self.nodes.len());
        self.walk(Self::BODY, &mut all);
        all.retain(|&id| selector.matches(self, id));
        all
    }

    fn matches(&self, element: ElementId, selector: &Selector) -> bool {
        self.is_attached(element) && selector.matches(self, element)
    }

    fn find_by_id(&self, id: &str) -> Option<ElementId> {
        self.id_index
            .get(id)
            .copied()
            .filter(|&element| self.is_attached(element))
    }

    fn body(&self) -> ElementId {
        Self::BODY
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        Matchable::parent(self, element)
    }

    fn text(&self, element: ElementId) -> Option<String> {
        self.node(element).map(|node| node.text.clone())
    }

    fn set_text(&mut self, element: ElementId, text: &str) -> bool {
        let Some(node) = self.node_mut(element) else {
            return false;
        };
        node.text = text.to_string();
        self.journal.push(Mutation::Text {
            id: element,
            text: text.to_string(),
        });
        true
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.node(element)?.attr(name).map(str::to_string)
    }

    fn style(&self, element: ElementId, prop: StyleProp) -> Option<String> {
        self.node(element)?.styles.get(&prop).cloned()
    }

    fn set_style(&mut self, element: ElementId, prop: StyleProp, value: &str) -> bool {
        let Some(node) = self.node_mut(element) else {
            return false;
        };
        node.styles.insert(prop, value.to_string());
        self.journal.push(Mutation::Style {
            id: element,
            prop,
            value: value.to_string(),
        });
        true
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element).is_some_and(|node| node.has_class(class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) -> bool {
        let Some(node) = self.node_mut(element) else {
            return false;
        };
        if node.has_class(class) {
            return true;
        }
        match node.attrs.iter_mut().find(|(key, _)| key == "class") {
            Some((_, list)) if !list.trim().is_empty() => {
                list.push(' ');
                list.push_str(class);
            }
            Some((_, list)) => *list = class.to_string(),
            None => node.attrs.push(("class".to_string(), class.to_string())),
        }
        self.journal.push(Mutation::ClassAdded {
            id: element,
            class: class.to_string(),
        });
        true
    }

    fn remove_class(&mut self, element: ElementId, class: &str) -> bool {
        let Some(node) = self.node_mut(element) else {
            return false;
        };
        if !node.has_class(class) {
            return true;
        }
        if let Some((_, list)) = node.attrs.iter_mut().find(|(key, _)| key == "class") {
            *list = list
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
        self.journal.push(Mutation::ClassRemoved {
            id: element,
            class: class.to_string(),
        });
        true
    }

    fn bounds(&self, element: ElementId) -> Option<Rect> {
        self.node(element).map(|node| node.bounds)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn append_element(&mut self, parent: ElementId, spec: ElementSpec) -> Option<ElementId> {
        let tag = spec.tag.clone();
        let classes = spec.classes.clone();
        let styles = spec.styles.clone();
        let id = self.create(parent, spec)?;
        self.journal.push(Mutation::Appended {
            id,
            parent,
            tag,
            classes,
            styles,
        });
        Some(id)
    }

    fn remove_element(&mut self, element: ElementId) -> bool {
        if element == Self::BODY || !self.is_attached(element) {
            return false;
        }
        if let Some(parent) = self.nodes[element.get() as usize].parent {
            self.nodes[parent.get() as usize]
                .children
                .retain(|&child| child != element);
        }
        self.detach(element);
        self.journal.push(Mutation::Removed { id: element });
        true
    }

    fn scroll_into_view(
        &mut self,
        element: ElementId,
        behavior: ScrollBehavior,
        block: ScrollBlock,
    ) -> bool {
        let Some(bounds) = self.bounds(element) else {
            return false;
        };
        let vp = self.viewport;
        let target = match block {
            ScrollBlock::Start => bounds.y,
            ScrollBlock::Center => bounds.y - (vp.height - bounds.height) / 2.0,
            ScrollBlock::End => bounds.bottom() - vp.height,
            ScrollBlock::Nearest => {
                if bounds.y < vp.scroll_y {
                    bounds.y
                } else if bounds.bottom() > vp.scroll_y + vp.height {
                    bounds.bottom() - vp.height
                } else {
                    vp.scroll_y
                }
            }
        };
        self.viewport.scroll_y = target.max(0.0);
        tracing::trace!(
            message = "document.scroll_into_view",
            element = element.get(),
            offset = self.viewport.scroll_y
        );
        self.journal.push(Mutation::ScrollIntoView {
            id: element,
            behavior,
            block,
        });
        true
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Host-supplied description of a page, in document order.
///
/// Element `i` of `elements` becomes `ElementId(i + 1)`; `parent` refers to
/// an earlier index, `None` meaning `body`.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub styles: BTreeMap<StyleProp, String>,
    #[serde(default)]
    pub bounds: Rect,
}

#[cfg(feature = "serde")]
impl Document {
    /// Build a document from a host snapshot.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self> {
        let mut doc = Document::new(snapshot.viewport);
        for (index, element) in snapshot.elements.iter().enumerate() {
            let parent = match element.parent {
                None => Self::BODY,
                Some(p) if (p as usize) < index => ElementId::new(p + 1),
                Some(p) => {
                    return Err(LumenError::UnknownElement {
                        id: ElementId::new(p + 1),
                    });
                }
            };
            let mut spec = ElementSpec::new(&element.tag)
                .text(element.text.clone())
                .bounds(element.bounds);
            spec.classes = element.classes.clone();
            spec.attributes = element
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            spec.styles = element
                .styles
                .iter()
                .map(|(prop, value)| (*prop, value.clone()))
                .collect();
            doc.insert(parent, spec)?;
        }
        Ok(doc)
    }
}
