#![forbid(unsafe_code)]

//! Hero intro: hide the hero blocks at `dom_ready`, then fade them in one
//! after another once the page has loaded.

use lumen_core::error::Result;
use lumen_core::selector::Selector;
use lumen_core::style::{StyleProp, Transform};
use lumen_core::{ElementId, Surface};
use web_time::Duration;

use crate::config::HeroConfig;
use crate::stagger::StaggerGroup;

#[derive(Debug, Clone)]
pub struct HeroIntro {
    group: StaggerGroup,
    hidden: Transform,
    transition: String,
    loaded_class: String,
    loaded: bool,
}

impl HeroIntro {
    pub fn new(config: &HeroConfig) -> Result<Self> {
        Ok(Self {
            group: StaggerGroup::new(
                Selector::parse(&config.selector)?,
                Duration::from_millis(config.stagger_step_ms),
            ),
            hidden: Transform::translate_y(config.hidden_offset_px),
            transition: config.transition.clone(),
            loaded_class: config.loaded_class.clone(),
            loaded: false,
        })
    }

    /// Put every hero block into its hidden state.
    pub fn prepare<S: Surface + ?Sized>(&self, surface: &mut S) -> usize {
        let hidden = self.hidden.to_string();
        let blocks = surface.query(self.group.selector());
        for &block in &blocks {
            surface.set_style(block, StyleProp::Opacity, "0");
            surface.set_style(block, StyleProp::Transform, &hidden);
            surface.set_style(block, StyleProp::Transition, &self.transition);
        }
        blocks.len()
    }

    /// Mark the body loaded and return each block with its reveal delay.
    ///
    /// Only the first call has an effect.
    pub fn load<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Vec<(ElementId, Duration)> {
        if self.loaded {
            return Vec::new();
        }
        self.loaded = true;
        let body = surface.body();
        surface.add_class(body, &self.loaded_class);
        let schedule = self.group.schedule(surface);
        tracing::debug!(message = "hero.load", blocks = schedule.len());
        schedule
    }

    pub fn reveal<S: Surface + ?Sized>(&self, surface: &mut S, block: ElementId) {
        surface.set_style(block, StyleProp::Opacity, "1");
        surface.set_style(block, StyleProp::Transform, &Transform::translate_y(0.0).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::document::Document;
    use lumen_core::surface::ElementSpec;

    #[test]
    fn prepare_load_reveal() {
        let mut doc = Document::default();
        let title = doc
            .insert(Document::BODY, ElementSpec::new("h1").class("hero-title"))
            .expect("insert");
        let badge = doc
            .insert(Document::BODY, ElementSpec::new("div").class("hero-badge"))
            .expect("insert");
        let mut hero = HeroIntro::new(&HeroConfig::default()).expect("config");
        assert_eq!(hero.prepare(&mut doc), 2);
        assert_eq!(doc.style(title, StyleProp::Transform).as_deref(), Some("translateY(30px)"));
        assert_eq!(
            doc.style(badge, StyleProp::Transition).as_deref(),
            Some("opacity 0.8s ease, transform 0.8s ease")
        );

        let schedule = hero.load(&mut doc);
        assert!(doc.has_class(Document::BODY, "loaded"));
        assert_eq!(
            schedule,
            vec![(title, Duration::ZERO), (badge, Duration::from_millis(200))]
        );
        assert!(hero.load(&mut doc).is_empty());

        hero.reveal(&mut doc, badge);
        assert_eq!(doc.style(badge, StyleProp::Opacity).as_deref(), Some("1"));
        assert_eq!(doc.style(badge, StyleProp::Transform).as_deref(), Some("translateY(0)"));
    }
}
