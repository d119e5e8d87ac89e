#![forbid(unsafe_code)]

//! Click and hover wiring: navigation toggle, smooth anchors, demo tabs,
//! rotating demo steps, ripples and card hover.
//!
//! Each operation is a direct event-to-style mapping with no history beyond
//! what the surface stores; the last event wins. Elements are classified
//! into [`Role`]s so the page can route events without the handlers needing
//! access to the surface.

use bitflags::bitflags;
use lumen_core::error::Result;
use lumen_core::selector::Selector;
use lumen_core::style::{StyleProp, px};
use lumen_core::surface::{ElementSpec, ScrollBehavior, ScrollBlock};
use lumen_core::{ElementId, Surface};

use crate::config::InteractionConfig;

bitflags! {
    /// What an element does when interacted with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Role: u16 {
        const HAMBURGER   = 1 << 0;
        const NAV_LINK    = 1 << 1;
        const ANCHOR      = 1 << 2;
        const DEMO_BUTTON = 1 << 3;
        const RIPPLE      = 1 << 4;
        const HOVER_CARD  = 1 << 5;
    }
}

/// Outcome of a demo tab click.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DemoSwitch {
    /// The button's `data-demo` value.
    pub tab: Option<String>,
    /// Panel made active, if one matched.
    pub panel: Option<ElementId>,
    /// Metric bars zeroed for replay, with the widths to restore.
    pub restore: Vec<(ElementId, String)>,
}

#[derive(Debug, Clone)]
pub struct Interactions {
    config: InteractionConfig,
    hamburger: Selector,
    nav_menu: Selector,
    nav_link: Selector,
    anchor: Selector,
    demo_button: Selector,
    demo_panel: Selector,
    metric_fill: Selector,
    demo_step: Selector,
    ripple: Selector,
    hover: Selector,
}

impl Interactions {
    pub fn new(config: &InteractionConfig) -> Result<Self> {
        Ok(Self {
            hamburger: Selector::parse(&config.hamburger_selector)?,
            nav_menu: Selector::parse(&config.nav_menu_selector)?,
            nav_link: Selector::parse(&config.nav_link_selector)?,
            anchor: Selector::parse(&config.anchor_selector)?,
            demo_button: Selector::parse(&config.demo_button_selector)?,
            demo_panel: Selector::parse(&config.demo_panel_selector)?,
            metric_fill: Selector::parse(&config.metric_fill_selector)?,
            demo_step: Selector::parse(&config.demo_step_selector)?,
            ripple: Selector::parse(&config.ripple_selector)?,
            hover: Selector::parse(&config.hover_selector)?,
            config: config.clone(),
        })
    }

    /// Classify `element`.
    #[must_use]
    pub fn roles<S: Surface + ?Sized>(&self, surface: &S, element: ElementId) -> Role {
        let mut roles = Role::empty();
        for (role, selector) in [
            (Role::HAMBURGER, &self.hamburger),
            (Role::NAV_LINK, &self.nav_link),
            (Role::ANCHOR, &self.anchor),
            (Role::DEMO_BUTTON, &self.demo_button),
            (Role::RIPPLE, &self.ripple),
            (Role::HOVER_CARD, &self.hover),
        ] {
            roles.set(role, surface.matches(element, selector));
        }
        roles
    }

    // -- navigation ----------------------------------------------------------

    /// Toggle the menu; returns whether the hamburger is now active.
    pub fn toggle_nav<S: Surface + ?Sized>(&self, surface: &mut S) -> bool {
        let active = &self.config.active_class;
        let mut open = false;
        if let Some(&hamburger) = surface.query(&self.hamburger).first() {
            open = surface.toggle_class(hamburger, active);
        }
        if let Some(&menu) = surface.query(&self.nav_menu).first() {
            surface.toggle_class(menu, active);
        }
        tracing::debug!(message = "nav.toggle", open);
        open
    }

    pub fn close_nav<S: Surface + ?Sized>(&self, surface: &mut S) {
        let active = &self.config.active_class;
        if let Some(&hamburger) = surface.query(&self.hamburger).first() {
            surface.remove_class(hamburger, active);
        }
        if let Some(&menu) = surface.query(&self.nav_menu).first() {
            surface.remove_class(menu, active);
        }
    }

    /// Scroll the anchor's `#id` target into view; `None` when it has no
    /// resolvable target.
    pub fn smooth_scroll<S: Surface + ?Sized>(&self, surface: &mut S, anchor: ElementId) -> Option<ElementId> {
        let href = surface.attribute(anchor, "href")?;
        let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
        let target = surface.find_by_id(id)?;
        surface.scroll_into_view(target, ScrollBehavior::Smooth, ScrollBlock::Start);
        tracing::debug!(message = "anchor.scroll", anchor = anchor.get(), target = target.get());
        Some(target)
    }

    // -- demo tabs -----------------------------------------------------------

    /// Activate `button`'s tab and its panel.
    pub fn switch_demo<S: Surface + ?Sized>(&self, surface: &mut S, button: ElementId) -> DemoSwitch {
        let active = &self.config.active_class;
        let tab = surface.attribute(button, "data-demo");
        let from = surface
            .query(&self.demo_button)
            .into_iter()
            .find(|&b| surface.has_class(b, active))
            .and_then(|b| surface.attribute(b, "data-demo"));
        for other in surface.query(&self.demo_button) {
            surface.remove_class(other, active);
        }
        surface.add_class(button, active);

        let wanted = tab.as_ref().map(|tab| format!("{tab}-demo"));
        let mut panel = None;
        for candidate in surface.query(&self.demo_panel) {
            surface.remove_class(candidate, active);
            if wanted.is_some() && surface.attribute(candidate, "id") == wanted {
                surface.add_class(candidate, active);
                panel = Some(candidate);
            }
        }

        let mut restore = Vec::new();
        if tab.as_deref() == Some(self.config.metric_demo.as_str()) {
            for fill in surface.query(&self.metric_fill) {
                let width = surface.style(fill, StyleProp::Width).unwrap_or_default();
                surface.set_style(fill, StyleProp::Width, "0%");
                restore.push((fill, width));
            }
        }
        tracing::debug!(
            message = "tabs.switch",
            from = from.as_deref().unwrap_or(""),
            to = tab.as_deref().unwrap_or(""),
            replay = restore.len()
        );
        DemoSwitch {
            tab,
            panel,
            restore,
        }
    }

    pub fn restore_metric<S: Surface + ?Sized>(&self, surface: &mut S, fill: ElementId, width: &str) {
        surface.set_style(fill, StyleProp::Width, width);
    }

    /// Make step `current` the only active one and return the next cursor.
    ///
    /// With no steps nothing changes and the cursor stays at zero.
    pub fn rotate_steps<S: Surface + ?Sized>(&self, surface: &mut S, current: usize) -> usize {
        let steps = surface.query(&self.demo_step);
        if steps.is_empty() {
            return 0;
        }
        let current = current % steps.len();
        let active = &self.config.active_class;
        for (index, &step) in steps.iter().enumerate() {
            surface.remove_class(step, active);
            if index == current {
                surface.add_class(step, active);
            }
        }
        (current + 1) % steps.len()
    }

    #[must_use]
    pub fn has_steps<S: Surface + ?Sized>(&self, surface: &S) -> bool {
        !surface.query(&self.demo_step).is_empty()
    }

    // -- ripple and hover ----------------------------------------------------

    /// Append a ripple inside `button` centred on the client point `(x, y)`.
    pub fn ripple<S: Surface + ?Sized>(&self, surface: &mut S, button: ElementId, x: f64, y: f64) -> Option<ElementId> {
        let bounds = surface.bounds(button)?;
        let viewport = surface.viewport();
        let left = bounds.x - viewport.scroll_x;
        let top = bounds.y - viewport.scroll_y;
        let size = bounds.width.max(bounds.height);
        let spec = ElementSpec::new("span")
            .class(self.config.ripple_class.clone())
            .style(StyleProp::Width, px(size))
            .style(StyleProp::Height, px(size))
            .style(StyleProp::Left, px(x - left - size / 2.0))
            .style(StyleProp::Top, px(y - top - size / 2.0));
        let ripple = surface.append_element(button, spec)?;
        tracing::trace!(message = "ripple.spawn", button = button.get(), ripple = ripple.get());
        Some(ripple)
    }

    pub fn remove_ripple<S: Surface + ?Sized>(&self, surface: &mut S, ripple: ElementId) -> bool {
        surface.remove_element(ripple)
    }

    pub fn hover_enter<S: Surface + ?Sized>(&self, surface: &mut S, card: ElementId) {
        surface.set_style(card, StyleProp::Transform, &self.config.hover_transform);
        surface.set_style(card, StyleProp::BoxShadow, &self.config.hover_shadow);
    }

    pub fn hover_leave<S: Surface + ?Sized>(&self, surface: &mut S, card: ElementId) {
        surface.set_style(card, StyleProp::Transform, &self.config.rest_transform);
        surface.set_style(card, StyleProp::BoxShadow, &self.config.rest_shadow);
    }

    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }
}
