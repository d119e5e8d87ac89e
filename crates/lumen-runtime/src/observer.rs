#![forbid(unsafe_code)]

//! Threshold-based visibility observer.
//!
//! A [`VisibilityObserver`] watches a list of elements and reports a
//! [`Crossing`] whenever an element's visible fraction rises from below its
//! threshold to at-or-above it. Visibility is measured against the viewport
//! grown (or shrunk) by the configured root margin.
//!
//! Two paths feed the same edge detector: [`VisibilityObserver::check`]
//! measures geometry on a [`Surface`], and [`VisibilityObserver::notify`]
//! accepts a ratio already measured by the host.
//!
//! # Invariants
//!
//! 1. Every element starts below threshold, so the first measurement at or
//!    above the threshold is a crossing.
//! 2. Only rising edges are reported; falling below re-arms the element.
//! 3. Crossings are reported in observation order.
//! 4. Unobserved elements are never reported.
//!
//! # Failure Modes
//!
//! - Element removed from the surface: it has no bounds and is skipped until
//!   unobserved.

use ahash::AHashSet;
use lumen_core::geometry::{Margin, visible_fraction};
use lumen_core::{ElementId, Surface};

/// Observer tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: Margin,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: Margin::ZERO,
        }
    }
}

/// An element that became visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub target: ElementId,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityObserver {
    options: ObserverOptions,
    watched: Vec<ElementId>,
    above: AHashSet<ElementId>,
}

impl VisibilityObserver {
    #[must_use]
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            watched: Vec::new(),
            above: AHashSet::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> ObserverOptions {
        self.options
    }

    /// Start watching `element`; `false` if it was already watched.
    pub fn observe(&mut self, element: ElementId) -> bool {
        if self.watched.contains(&element) {
            return false;
        }
        self.watched.push(element);
        true
    }

    /// Stop watching `element`; `false` if it was not watched.
    pub fn unobserve(&mut self, element: ElementId) -> bool {
        let before = self.watched.len();
        self.watched.retain(|&id| id != element);
        self.above.remove(&element);
        self.watched.len() != before
    }

    /// Stop watching everything; returns how many elements were dropped.
    pub fn disconnect(&mut self) -> usize {
        let dropped = self.watched.len();
        self.watched.clear();
        self.above.clear();
        dropped
    }

    #[must_use]
    pub fn is_observing(&self, element: ElementId) -> bool {
        self.watched.contains(&element)
    }

    #[must_use]
    pub fn watched(&self) -> &[ElementId] {
        &self.watched
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Measure every watched element against the surface viewport.
    pub fn check<S: Surface + ?Sized>(&mut self, surface: &S) -> Vec<Crossing> {
        let root = surface.viewport().rect().expand(self.options.root_margin);
        let measured: Vec<(ElementId, Option<f64>)> = self
            .watched
            .iter()
            .filter_map(|&id| {
                let bounds = surface.bounds(id)?;
                Some((id, visible_fraction(&bounds, &root)))
            })
            .collect();
        measured
            .into_iter()
            .filter_map(|(id, ratio)| self.record(id, ratio))
            .collect()
    }

    /// Feed a host-measured ratio for `element`.
    pub fn notify(&mut self, element: ElementId, ratio: f64) -> Option<Crossing> {
        if !self.is_observing(element) {
            return None;
        }
        self.record(element, Some(ratio.clamp(0.0, 1.0)))
    }

    fn record(&mut self, id: ElementId, ratio: Option<f64>) -> Option<Crossing> {
        let is_above = ratio.is_some_and(|r| r >= self.options.threshold);
        if !is_above {
            self.above.remove(&id);
            return None;
        }
        if !self.above.insert(id) {
            return None;
        }
        let ratio = ratio.unwrap_or(0.0);
        tracing::trace!(message = "observer.cross", element = id.get(), ratio);
        Some(Crossing { target: id, ratio })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::document::Document;
    use lumen_core::geometry::{Rect, Viewport};
    use lumen_core::surface::ElementSpec;

    fn page() -> (Document, ElementId, ElementId) {
        let mut doc = Document::new(Viewport::new(800.0, 600.0));
        let near = doc
            .insert(
                Document::BODY,
                ElementSpec::new("div").bounds(Rect::new(0.0, 100.0, 200.0, 200.0)),
            )
            .expect("insert");
        let far = doc
            .insert(
                Document::BODY,
                ElementSpec::new("div").bounds(Rect::new(0.0, 1500.0, 200.0, 200.0)),
            )
            .expect("insert");
        (doc, near, far)
    }

    fn reveal_options() -> ObserverOptions {
        ObserverOptions {
            threshold: 0.1,
            root_margin: Margin::new(0.0, 0.0, -50.0, 0.0),
        }
    }

    #[test]
    fn initial_check_reports_visible_elements() {
        let (doc, near, far) = page();
        let mut observer = VisibilityObserver::new(reveal_options());
        observer.observe(near);
        observer.observe(far);
        let crossings = observer.check(&doc);
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].target, near);
        assert_eq!(crossings[0].ratio, 1.0);
    }

    #[test]
    fn rising_edge_only() {
        let (mut doc, near, _) = page();
        let mut observer = VisibilityObserver::new(reveal_options());
        observer.observe(near);
        assert_eq!(observer.check(&doc).len(), 1);
        assert!(observer.check(&doc).is_empty());
        doc.scroll_to(2000.0);
        assert!(observer.check(&doc).is_empty());
        doc.scroll_to(0.0);
        assert_eq!(observer.check(&doc).len(), 1);
    }

    #[test]
    fn negative_margin_delays_crossing() {
        // Element top sits 30px above the viewport bottom: 30/200 = 15% visible
        // without margin, 0% with the -50px bottom bias.
        let mut doc = Document::new(Viewport::new(800.0, 600.0));
        let el = doc
            .insert(
                Document::BODY,
                ElementSpec::new("div").bounds(Rect::new(0.0, 570.0, 200.0, 200.0)),
            )
            .expect("insert");
        let mut plain = VisibilityObserver::new(ObserverOptions {
            threshold: 0.1,
            root_margin: Margin::ZERO,
        });
        let mut biased = VisibilityObserver::new(reveal_options());
        plain.observe(el);
        biased.observe(el);
        assert_eq!(plain.check(&doc).len(), 1);
        assert!(biased.check(&doc).is_empty());
        doc.scroll_to(100.0);
        assert_eq!(biased.check(&doc).len(), 1);
    }

    #[test]
    fn threshold_zero_accepts_touching() {
        let mut doc = Document::new(Viewport::new(800.0, 600.0));
        let el = doc
            .insert(
                Document::BODY,
                ElementSpec::new("div").bounds(Rect::new(0.0, 600.0, 100.0, 100.0)),
            )
            .expect("insert");
        let mut observer = VisibilityObserver::new(ObserverOptions::default());
        observer.observe(el);
        assert_eq!(observer.check(&doc).len(), 1);
    }

    #[test]
    fn notify_path_shares_edge_state() {
        let (doc, near, far) = page();
        let mut observer = VisibilityObserver::new(reveal_options());
        observer.observe(near);
        observer.observe(far);
        assert!(observer.notify(far, 0.05).is_none());
        assert!(observer.notify(far, 0.5).is_some());
        assert!(observer.notify(far, 0.9).is_none());
        assert_eq!(observer.check(&doc).len(), 1);
        assert!(observer.notify(ElementId::new(99), 1.0).is_none());
    }

    #[test]
    fn observe_is_idempotent_and_unobserve_stops_reports() {
        let (doc, near, far) = page();
        let mut observer = VisibilityObserver::new(reveal_options());
        assert!(observer.observe(near));
        assert!(!observer.observe(near));
        assert_eq!(observer.len(), 1);
        assert!(observer.unobserve(near));
        assert!(!observer.unobserve(near));
        assert!(observer.check(&doc).is_empty());
        observer.observe(near);
        observer.observe(far);
        assert_eq!(observer.disconnect(), 2);
        assert!(observer.is_empty());
    }

    #[test]
    fn removed_elements_are_skipped() {
        let (mut doc, near, _) = page();
        let mut observer = VisibilityObserver::new(reveal_options());
        observer.observe(near);
        assert!(lumen_core::Surface::remove_element(&mut doc, near));
        assert!(observer.check(&doc).is_empty());
    }
}
