#![forbid(unsafe_code)]

//! Document-space geometry: rectangles, margins, viewports and visibility.
//!
//! All coordinates are CSS pixels in document space (the origin is the top
//! left corner of the page, not of the viewport). The viewport is a rectangle
//! positioned at the current scroll offset.
//!
//! # Invariants
//!
//! 1. [`Rect::area`] is never negative; degenerate rectangles have area 0.
//! 2. [`visible_fraction`] returns a value in `[0.0, 1.0]` or `None` when the
//!    element does not intersect the root at all.
//! 3. A negative margin shrinks the root; the result never has a negative size.

use crate::error::{LumenError, Result};

/// Axis-aligned rectangle in document space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Whether the rectangle covers no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Intersection of two rectangles.
    ///
    /// Rectangles that only touch along an edge yield a zero-area
    /// intersection rather than `None`.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow the rectangle by `margin` on each side (negative values shrink).
    #[must_use]
    pub fn expand(&self, margin: Margin) -> Rect {
        let width = (self.width + margin.left + margin.right).max(0.0);
        let height = (self.height + margin.top + margin.bottom).max(0.0);
        Rect::new(self.x - margin.left, self.y - margin.top, width, height)
    }
}

/// Per-side offsets, in the CSS `top right bottom left` order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const ZERO: Margin = Margin::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Parse a CSS margin shorthand such as `"0px 0px -50px 0px"`.
    ///
    /// One to four pixel values are accepted with the usual shorthand
    /// expansion. Units other than `px` (or unitless numbers) are rejected.
    pub fn parse(src: &str) -> Result<Self> {
        let values = src
            .split_whitespace()
            .map(|token| parse_px(token).ok_or_else(|| bad_margin(src, token)))
            .collect::<Result<Vec<f64>>>()?;
        match values.as_slice() {
            [all] => Ok(Margin::new(*all, *all, *all, *all)),
            [vertical, horizontal] => Ok(Margin::new(*vertical, *horizontal, *vertical, *horizontal)),
            [top, horizontal, bottom] => Ok(Margin::new(*top, *horizontal, *bottom, *horizontal)),
            [top, right, bottom, left] => Ok(Margin::new(*top, *right, *bottom, *left)),
            _ => Err(LumenError::config(
                "root_margin",
                format!("expected 1 to 4 values, got {:?}", src),
            )),
        }
    }
}

fn parse_px(token: &str) -> Option<f64> {
    let number = token.strip_suffix("px").unwrap_or(token);
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn bad_margin(src: &str, token: &str) -> LumenError {
    LumenError::config(
        "root_margin",
        format!("unsupported value {token:?} in {src:?}"),
    )
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    /// Same viewport scrolled vertically to `offset`.
    #[must_use]
    pub fn scrolled_to(self, offset: f64) -> Self {
        Self {
            scroll_y: offset,
            ..self
        }
    }

    /// The viewport as a document-space rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

/// Fraction of `bounds` visible inside `root`.
///
/// Returns `None` when the two do not intersect. Zero-area elements are fully
/// visible when their origin lies inside the root.
#[must_use]
pub fn visible_fraction(bounds: &Rect, root: &Rect) -> Option<f64> {
    if bounds.is_empty() {
        return root.contains_point(bounds.x, bounds.y).then_some(1.0);
    }
    let overlap = bounds.intersection(root)?;
    Some((overlap.area() / bounds.area()).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_overlapping() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
    }

    #[test]
    fn intersection_disjoint_is_none() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn touching_edges_yield_empty_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(0.0, 10.0, 10.0, 10.0);
        let hit = a.intersection(&b).expect("edges touch");
        assert_eq!(hit.area(), 0.0);
    }

    #[test]
    fn negative_margin_shrinks_bottom() {
        let root = Rect::new(0.0, 200.0, 800.0, 600.0);
        let shrunk = root.expand(Margin::new(0.0, 0.0, -50.0, 0.0));
        assert_eq!(shrunk, Rect::new(0.0, 200.0, 800.0, 550.0));
    }

    #[test]
    fn margin_never_goes_negative() {
        let root = Rect::new(0.0, 0.0, 10.0, 10.0);
        let shrunk = root.expand(Margin::new(-20.0, -20.0, -20.0, -20.0));
        assert_eq!(shrunk.width, 0.0);
        assert_eq!(shrunk.height, 0.0);
    }

    #[test]
    fn margin_parse_shorthands() {
        assert_eq!(Margin::parse("10px").unwrap(), Margin::new(10.0, 10.0, 10.0, 10.0));
        assert_eq!(Margin::parse("1px 2px").unwrap(), Margin::new(1.0, 2.0, 1.0, 2.0));
        assert_eq!(
            Margin::parse("1px 2px 3px").unwrap(),
            Margin::new(1.0, 2.0, 3.0, 2.0)
        );
        assert_eq!(
            Margin::parse("0px 0px -50px 0px").unwrap(),
            Margin::new(0.0, 0.0, -50.0, 0.0)
        );
        assert_eq!(Margin::parse("0 0 -50 0").unwrap(), Margin::new(0.0, 0.0, -50.0, 0.0));
    }

    #[test]
    fn margin_parse_rejects_garbage() {
        assert!(Margin::parse("").is_err());
        assert!(Margin::parse("10%").is_err());
        assert!(Margin::parse("1px 2px 3px 4px 5px").is_err());
        assert!(Margin::parse("auto").is_err());
    }

    #[test]
    fn visible_fraction_partial() {
        let root = Viewport::new(800.0, 600.0).rect();
        let card = Rect::new(0.0, 500.0, 200.0, 200.0);
        let fraction = visible_fraction(&card, &root).expect("intersects");
        assert!((fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn visible_fraction_outside_is_none() {
        let root = Viewport::new(800.0, 600.0).rect();
        let card = Rect::new(0.0, 900.0, 200.0, 200.0);
        assert_eq!(visible_fraction(&card, &root), None);
    }

    #[test]
    fn visible_fraction_zero_area_element() {
        let root = Viewport::new(800.0, 600.0).rect();
        assert_eq!(visible_fraction(&Rect::new(10.0, 10.0, 0.0, 0.0), &root), Some(1.0));
        assert_eq!(visible_fraction(&Rect::new(10.0, 700.0, 0.0, 0.0), &root), None);
    }

    #[test]
    fn scrolled_viewport_moves_root() {
        let vp = Viewport::new(800.0, 600.0).scrolled_to(1000.0);
        assert_eq!(vp.rect(), Rect::new(0.0, 1000.0, 800.0, 600.0));
        let card = Rect::new(0.0, 1100.0, 100.0, 100.0);
        assert_eq!(visible_fraction(&card, &vp.rect()), Some(1.0));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn visible_fraction_is_a_fraction(
                y in -2_000.0f64..4_000.0,
                h in 0.0f64..1_500.0,
                scroll in 0.0f64..3_000.0,
            ) {
                let root = Viewport::new(1280.0, 800.0).scrolled_to(scroll).rect();
                if let Some(f) = visible_fraction(&Rect::new(40.0, y, 400.0, h), &root) {
                    prop_assert!((0.0..=1.0).contains(&f), "fraction {}", f);
                }
            }
        }
    }
}
