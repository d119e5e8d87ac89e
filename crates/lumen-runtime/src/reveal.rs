#![forbid(unsafe_code)]

//! One-shot scroll-triggered reveal transitions.
//!
//! At registration every matching element is put into its hidden state
//! (transparent, shifted down, with a transition) and handed to a
//! [`VisibilityObserver`]. On the element's first crossing the engine either
//! reveals it immediately or, for staggered elements, returns a delay after
//! which the caller invokes [`RevealEngine::complete`].
//!
//! # Invariants
//!
//! 1. An element is revealed at most once; later crossings return
//!    [`RevealPlan::Skip`].
//! 2. A staggered element's delay is `index × step`, with `index` taken from
//!    the stagger group's query at trigger time.
//! 3. Revealed elements are never hidden again.

use ahash::{AHashMap, AHashSet};
use bitflags::bitflags;
use lumen_core::error::Result;
use lumen_core::selector::Selector;
use lumen_core::style::{StyleProp, Transform};
use lumen_core::{ElementId, Surface};
use web_time::Duration;

use crate::config::RevealConfig;
use crate::observer::{Crossing, ObserverOptions, VisibilityObserver};
use crate::stagger::StaggerGroup;

bitflags! {
    /// Reveal flavours, from the element's classes at registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RevealVariant: u8 {
        /// Finishes with `scale(1)`.
        const CARD      = 0b0000_0001;
        /// Delayed by its index in the stagger group.
        const STAGGERED = 0b0000_0010;
    }
}

/// What to do about a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPlan {
    /// The element was revealed.
    Now,
    /// Call [`RevealEngine::complete`] after this delay.
    After(Duration),
    /// Already revealed, pending, or not registered.
    Skip,
}

#[derive(Debug, Clone)]
pub struct RevealEngine {
    selector: Selector,
    card: Selector,
    stagger: StaggerGroup,
    hidden: Transform,
    transition: String,
    observer: VisibilityObserver,
    variants: AHashMap<ElementId, RevealVariant>,
    pending: AHashSet<ElementId>,
    revealed: AHashSet<ElementId>,
}

impl RevealEngine {
    pub fn new(config: &RevealConfig) -> Result<Self> {
        let options = ObserverOptions {
            threshold: config.threshold,
            root_margin: config.margin()?,
        };
        Ok(Self {
            selector: Selector::parse(&config.selector)?,
            card: Selector::parse(&config.card_selector)?,
            stagger: StaggerGroup::new(
                Selector::parse(&config.stagger_selector)?,
                Duration::from_millis(config.stagger_step_ms),
            ),
            hidden: Transform::translate_y(config.hidden_offset_px),
            transition: config.transition.clone(),
            observer: VisibilityObserver::new(options),
            variants: AHashMap::new(),
            pending: AHashSet::new(),
            revealed: AHashSet::new(),
        })
    }

    /// Hide and observe every matching element; returns how many were added.
    pub fn register<S: Surface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let hidden = self.hidden.to_string();
        let mut added = 0;
        for id in surface.query(&self.selector) {
            if !self.observer.observe(id) {
                continue;
            }
            surface.set_style(id, StyleProp::Opacity, "0");
            surface.set_style(id, StyleProp::Transform, &hidden);
            surface.set_style(id, StyleProp::Transition, &self.transition);
            let mut variant = RevealVariant::empty();
            variant.set(RevealVariant::CARD, surface.matches(id, &self.card));
            variant.set(
                RevealVariant::STAGGERED,
                surface.matches(id, self.stagger.selector()),
            );
            self.variants.insert(id, variant);
            added += 1;
        }
        tracing::debug!(message = "reveal.register", count = added);
        added
    }

    /// Measure watched elements against the viewport.
    pub fn check<S: Surface + ?Sized>(&mut self, surface: &S) -> Vec<Crossing> {
        self.observer.check(surface)
    }

    /// Host-measured visibility for `element`.
    pub fn notify(&mut self, element: ElementId, ratio: f64) -> Option<Crossing> {
        self.observer.notify(element, ratio)
    }

    /// React to a crossing.
    pub fn on_crossing<S: Surface + ?Sized>(&mut self, surface: &mut S, crossing: Crossing) -> RevealPlan {
        let id = crossing.target;
        let Some(&variant) = self.variants.get(&id) else {
            return RevealPlan::Skip;
        };
        if self.revealed.contains(&id) || self.pending.contains(&id) {
            return RevealPlan::Skip;
        }
        self.observer.unobserve(id);
        if variant.contains(RevealVariant::STAGGERED) {
            let index = self.stagger.index_of(surface, id).unwrap_or(0);
            let delay = self.stagger.delay_for(index);
            self.pending.insert(id);
            tracing::debug!(
                message = "reveal.stagger",
                element = id.get(),
                index,
                delay_ms = delay.as_millis() as u64
            );
            return RevealPlan::After(delay);
        }
        self.apply(surface, id, variant);
        RevealPlan::Now
    }

    /// Finish a delayed reveal. Returns `false` if nothing was pending.
    pub fn complete<S: Surface + ?Sized>(&mut self, surface: &mut S, element: ElementId) -> bool {
        if !self.pending.remove(&element) {
            return false;
        }
        let variant = self.variants.get(&element).copied().unwrap_or_default();
        self.apply(surface, element, variant);
        true
    }

    fn apply<S: Surface + ?Sized>(&mut self, surface: &mut S, id: ElementId, variant: RevealVariant) {
        let mut shown = Transform::translate_y(0.0);
        if variant.contains(RevealVariant::CARD) {
            shown = shown.with_scale(1.0);
        }
        surface.set_style(id, StyleProp::Opacity, "1");
        surface.set_style(id, StyleProp::Transform, &shown.to_string());
        self.revealed.insert(id);
        tracing::debug!(
            message = "reveal.fire",
            element = id.get(),
            card = variant.contains(RevealVariant::CARD),
            staggered = variant.contains(RevealVariant::STAGGERED)
        );
    }

    #[must_use]
    pub fn variant(&self, element: ElementId) -> Option<RevealVariant> {
        self.variants.get(&element).copied()
    }

    #[must_use]
    pub fn is_revealed(&self, element: ElementId) -> bool {
        self.revealed.contains(&element)
    }

    #[must_use]
    pub fn is_pending(&self, element: ElementId) -> bool {
        self.pending.contains(&element)
    }

    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    /// Stop observing and forget pending reveals.
    pub fn dispose(&mut self) {
        self.observer.disconnect();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::document::Document;
    use lumen_core::geometry::{Rect, Viewport};
    use lumen_core::surface::ElementSpec;
    use pretty_assertions::assert_eq;

    fn at(y: f64) -> Rect {
        Rect::new(0.0, y, 300.0, 200.0)
    }

    fn page() -> (Document, Vec<ElementId>) {
        let mut doc = Document::new(Viewport::new(800.0, 600.0));
        let specs = [
            ElementSpec::new("div").class("problem-card").bounds(at(100.0)),
            ElementSpec::new("div").class("timeline-item").bounds(at(200.0)),
            ElementSpec::new("div").class("feature-card").bounds(at(1000.0)),
            ElementSpec::new("div").class("feature-card").bounds(at(1000.0)),
            ElementSpec::new("div").class("unrelated").bounds(at(100.0)),
        ];
        let ids = specs
            .into_iter()
            .map(|spec| doc.insert(Document::BODY, spec).expect("insert"))
            .collect();
        (doc, ids)
    }

    #[test]
    fn engine_reports_bad_margin_by_field() {
        let config = RevealConfig {
            root_margin: "5em".into(),
            ..RevealConfig::default()
        };
        let err = RevealEngine::new(&config).expect_err("bad margin");
        assert!(matches!(
            err,
            lumen_core::error::LumenError::InvalidConfig {
                field: "reveal.root_margin",
                ..
            }
        ));
    }

    #[test]
    fn register_hides_and_classifies() {
        let (mut doc, ids) = page();
        let mut engine = RevealEngine::new(&RevealConfig::default()).expect("config");
        assert_eq!(engine.register(&mut doc), 4);
        assert_eq!(doc.style(ids[0], StyleProp::Opacity).as_deref(), Some("0"));
        assert_eq!(
            doc.style(ids[0], StyleProp::Transform).as_deref(),
            Some("translateY(40px)")
        );
        assert!(doc.style(ids[0], StyleProp::Transition).is_some_and(|t| t.contains("cubic-bezier")));
        assert_eq!(doc.style(ids[4], StyleProp::Opacity), None);
        assert_eq!(engine.variant(ids[0]), Some(RevealVariant::CARD));
        assert_eq!(engine.variant(ids[1]), Some(RevealVariant::empty()));
        assert_eq!(engine.variant(ids[2]), Some(RevealVariant::STAGGERED));
        assert_eq!(engine.register(&mut doc), 0);
    }

    #[test]
    fn visible_elements_reveal_immediately() {
        let (mut doc, ids) = page();
        let mut engine = RevealEngine::new(&RevealConfig::default()).expect("config");
        engine.register(&mut doc);
        let crossings = engine.check(&doc);
        let plans: Vec<RevealPlan> = crossings
            .into_iter()
            .map(|c| engine.on_crossing(&mut doc, c))
            .collect();
        assert_eq!(plans, vec![RevealPlan::Now, RevealPlan::Now]);
        assert_eq!(
            doc.style(ids[0], StyleProp::Transform).as_deref(),
            Some("translateY(0) scale(1)")
        );
        assert_eq!(
            doc.style(ids[1], StyleProp::Transform).as_deref(),
            Some("translateY(0)")
        );
        assert_eq!(doc.style(ids[1], StyleProp::Opacity).as_deref(), Some("1"));
    }

    #[test]
    fn staggered_elements_wait_for_their_index() {
        let (mut doc, ids) = page();
        let mut engine = RevealEngine::new(&RevealConfig::default()).expect("config");
        engine.register(&mut doc);
        doc.scroll_to(800.0);
        let plans: Vec<(ElementId, RevealPlan)> = engine
            .check(&doc)
            .into_iter()
            .map(|c| (c.target, engine.on_crossing(&mut doc, c)))
            .collect();
        assert_eq!(
            plans,
            vec![
                (ids[2], RevealPlan::After(Duration::ZERO)),
                (ids[3], RevealPlan::After(Duration::from_millis(100))),
            ]
        );
        assert_eq!(doc.style(ids[3], StyleProp::Opacity).as_deref(), Some("0"));
        assert!(engine.complete(&mut doc, ids[3]));
        assert!(!engine.complete(&mut doc, ids[3]));
        assert_eq!(doc.style(ids[3], StyleProp::Opacity).as_deref(), Some("1"));
    }

    #[test]
    fn reveal_fires_once_across_scrolling() {
        let (mut doc, ids) = page();
        let mut engine = RevealEngine::new(&RevealConfig::default()).expect("config");
        engine.register(&mut doc);
        for offset in [0.0, 2000.0, 0.0, 2000.0, 0.0] {
            doc.scroll_to(offset);
            for crossing in engine.check(&doc) {
                engine.on_crossing(&mut doc, crossing);
            }
        }
        let fires = doc
            .journal()
            .iter()
            .filter(|m| {
                matches!(m, lumen_core::document::Mutation::Style { id, prop: StyleProp::Opacity, value } if *id == ids[0] && value == "1")
            })
            .count();
        assert_eq!(fires, 1);
        assert_eq!(
            engine.on_crossing(&mut doc, Crossing { target: ids[0], ratio: 1.0 }),
            RevealPlan::Skip
        );
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let (mut doc, ids) = page();
        let mut engine = RevealEngine::new(&RevealConfig::default()).expect("config");
        engine.register(&mut doc);
        assert_eq!(
            engine.on_crossing(&mut doc, Crossing { target: ids[4], ratio: 1.0 }),
            RevealPlan::Skip
        );
    }

    #[test]
    fn invalid_selector_fails_construction() {
        let config = RevealConfig {
            selector: ".a ~ .b".into(),
            ..RevealConfig::default()
        };
        assert!(RevealEngine::new(&config).is_err());
    }
}
