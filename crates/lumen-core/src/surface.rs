#![forbid(unsafe_code)]

//! The render surface contract.
//!
//! A [`Surface`] is the capability set the engine needs from a page: query
//! elements by selector, read text/geometry/attributes, and mutate inline
//! styles, classes, text and the element tree. Components receive the surface
//! explicitly instead of reaching for ambient document state, so tests can
//! substitute the in-memory [`Document`](crate::document::Document).
//!
//! # Invariants
//!
//! 1. [`Surface::query`] returns elements in document (declaration) order,
//!    without duplicates.
//! 2. Mutators return `false` for unknown or removed elements and have no
//!    other effect.
//! 3. An empty query result is not an error.

use std::fmt;

use crate::geometry::{Rect, Viewport};
use crate::selector::Selector;
use crate::style::StyleProp;

/// Opaque element handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ElementId(u32);

impl ElementId {
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How `scroll_into_view` should move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Vertical alignment for `scroll_into_view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

/// Description of an element to create.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub styles: Vec<(StyleProp, String)>,
    pub bounds: Rect,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn style(mut self, prop: StyleProp, value: impl Into<String>) -> Self {
        self.styles.push((prop, value.into()));
        self
    }

    #[must_use]
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Query and mutation capabilities of a page.
pub trait Surface {
    /// Elements matching `selector`, in document order.
    fn query(&self, selector: &Selector) -> Vec<ElementId>;

    /// Whether `element` matches `selector`.
    fn matches(&self, element: ElementId, selector: &Selector) -> bool;

    /// Element whose `id` attribute equals `id`.
    fn find_by_id(&self, id: &str) -> Option<ElementId>;

    /// The root `body` element.
    fn body(&self) -> ElementId;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn text(&self, element: ElementId) -> Option<String>;

    fn set_text(&mut self, element: ElementId, text: &str) -> bool;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn style(&self, element: ElementId, prop: StyleProp) -> Option<String>;

    fn set_style(&mut self, element: ElementId, prop: StyleProp, value: &str) -> bool;

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    fn add_class(&mut self, element: ElementId, class: &str) -> bool;

    fn remove_class(&mut self, element: ElementId, class: &str) -> bool;

    /// Toggle `class`; returns whether the class is present afterwards.
    fn toggle_class(&mut self, element: ElementId, class: &str) -> bool {
        if self.has_class(element, class) {
            self.remove_class(element, class);
            false
        } else {
            self.add_class(element, class)
        }
    }

    /// Document-space bounding rectangle.
    fn bounds(&self, element: ElementId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Append a new child element; `None` if `parent` is unknown.
    fn append_element(&mut self, parent: ElementId, spec: ElementSpec) -> Option<ElementId>;

    /// Detach `element` (and its subtree) from the tree.
    fn remove_element(&mut self, element: ElementId) -> bool;

    fn scroll_into_view(
        &mut self,
        element: ElementId,
        behavior: ScrollBehavior,
        block: ScrollBlock,
    ) -> bool;
}
