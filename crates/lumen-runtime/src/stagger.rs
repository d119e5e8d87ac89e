#![forbid(unsafe_code)]

//! Index-proportional delays for groups of elements.
//!
//! Members of a stagger group start `index × step` after the group's trigger.
//! The index is the element's position in the group's query result at the
//! moment of triggering, so it follows document order.

use lumen_core::selector::Selector;
use lumen_core::{ElementId, Surface};
use web_time::Duration;

/// A selector-defined group with a fixed per-index delay.
#[derive(Debug, Clone)]
pub struct StaggerGroup {
    selector: Selector,
    step: Duration,
}

impl StaggerGroup {
    #[must_use]
    pub fn new(selector: Selector, step: Duration) -> Self {
        Self { selector, step }
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        self.step
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Delay for the member at `index`.
    #[must_use]
    pub fn delay_for(&self, index: usize) -> Duration {
        self.step
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position of `element` among the current group members.
    #[must_use]
    pub fn index_of<S: Surface + ?Sized>(&self, surface: &S, element: ElementId) -> Option<usize> {
        surface
            .query(&self.selector)
            .iter()
            .position(|&id| id == element)
    }

    /// Members in document order paired with their delays.
    #[must_use]
    pub fn schedule<S: Surface + ?Sized>(&self, surface: &S) -> Vec<(ElementId, Duration)> {
        surface
            .query(&self.selector)
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, self.delay_for(index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::document::Document;
    use lumen_core::surface::ElementSpec;

    #[test]
    fn delays_scale_with_index() {
        let group = StaggerGroup::new(
            Selector::parse(".feature-card").expect("selector"),
            Duration::from_millis(100),
        );
        assert_eq!(group.delay_for(0), Duration::ZERO);
        assert_eq!(group.delay_for(3), Duration::from_millis(300));
    }

    #[test]
    fn index_follows_document_order() {
        let mut doc = Document::default();
        let cards: Vec<ElementId> = (0..3)
            .map(|_| {
                doc.insert(Document::BODY, ElementSpec::new("div").class("feature-card"))
                    .expect("insert")
            })
            .collect();
        let group = StaggerGroup::new(
            Selector::parse(".feature-card").expect("selector"),
            Duration::from_millis(200),
        );
        assert_eq!(group.index_of(&doc, cards[2]), Some(2));
        assert_eq!(group.index_of(&doc, Document::BODY), None);
        assert_eq!(
            group.schedule(&doc),
            vec![
                (cards[0], Duration::ZERO),
                (cards[1], Duration::from_millis(200)),
                (cards[2], Duration::from_millis(400)),
            ]
        );
    }
}
