#![forbid(unsafe_code)]

//! Throttled scroll reactor: navbar chrome and parallax.
//!
//! Scroll events arrive in bursts. The reactor coalesces each burst into one
//! trailing invocation: every scroll (re)arms a timer `debounce` in the
//! future, and only when that timer fires does [`ScrollReactor::settle`] read
//! the current offset and apply its effects.
//!
//! ```text
//!            scroll                   scroll
//!   Idle ───────────► Pending ◄───────────────┐
//!    ▲                  │  (cancel + re-arm)  │
//!    │    timer fires   └─────────────────────┘
//!    └──────────────── settle()
//! ```
//!
//! # Invariants
//!
//! 1. At most one settle timer is pending.
//! 2. A burst of scrolls produces exactly one settle, no earlier than
//!    `debounce` after the last scroll of the burst.
//! 3. Effects use the offset at settle time, never a stale event offset.
//! 4. Parallax translation grows with the shape index for positive offsets.

use lumen_core::error::Result;
use lumen_core::selector::Selector;
use lumen_core::style::{StyleProp, Transform};
use lumen_core::timer::{TimerHandle, TimerQueue};
use lumen_core::Surface;
use web_time::Duration;

use crate::config::ScrollConfig;

/// Navbar appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeLevel {
    Resting,
    Raised,
}

/// Navbar level for `offset`.
///
/// With `hysteresis == 0` the level flips exactly at the threshold. A
/// positive band keeps the `previous` level while the offset stays within
/// `threshold ± hysteresis`.
#[must_use]
pub fn chrome_for(offset: f64, previous: Option<ChromeLevel>, threshold: f64, hysteresis: f64) -> ChromeLevel {
    let cut = match previous {
        Some(ChromeLevel::Raised) if hysteresis > 0.0 => threshold - hysteresis,
        Some(ChromeLevel::Resting) if hysteresis > 0.0 => threshold + hysteresis,
        _ => threshold,
    };
    if offset > cut {
        ChromeLevel::Raised
    } else {
        ChromeLevel::Resting
    }
}

/// Transform of the parallax shape at `index`.
#[must_use]
pub fn parallax_transform(index: usize, offset: f64, base_speed: f64, speed_step: f64, rotation: f64) -> Transform {
    let speed = base_speed + index as f64 * speed_step;
    Transform::translate_y(offset * speed).with_rotation(offset * rotation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactorState {
    Idle,
    Pending { timer: TimerHandle, due: Duration },
}

/// What one settle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleReport {
    pub offset: f64,
    pub chrome: ChromeLevel,
    pub shapes: usize,
}

#[derive(Debug, Clone)]
pub struct ScrollReactor {
    config: ScrollConfig,
    navbar: Selector,
    parallax: Selector,
    state: ReactorState,
    chrome: Option<ChromeLevel>,
    executions: u64,
    coalesced: u64,
    last_settled_at: Option<Duration>,
}

impl ScrollReactor {
    pub fn new(config: &ScrollConfig) -> Result<Self> {
        Ok(Self {
            navbar: Selector::parse(&config.navbar_selector)?,
            parallax: Selector::parse(&config.parallax_selector)?,
            config: config.clone(),
            state: ReactorState::Idle,
            chrome: None,
            executions: 0,
            coalesced: 0,
            last_settled_at: None,
        })
    }

    /// Record a scroll at `now`: cancel any pending settle and arm a new one
    /// that delivers `msg`.
    pub fn on_scroll<M>(&mut self, now: Duration, timers: &mut TimerQueue<M>, msg: M) -> TimerHandle {
        if let ReactorState::Pending { timer, .. } = self.state {
            timers.cancel(timer);
            self.coalesced += 1;
        }
        let due = now.saturating_add(self.config.debounce());
        let timer = timers.schedule_at(due, msg);
        self.state = ReactorState::Pending { timer, due };
        timer
    }

    /// Run the trailing invocation.
    pub fn settle<S: Surface + ?Sized>(&mut self, surface: &mut S, now: Duration) -> SettleReport {
        self.state = ReactorState::Idle;
        self.executions += 1;
        self.last_settled_at = Some(now);

        let offset = surface.viewport().scroll_y;
        let chrome = chrome_for(
            offset,
            self.chrome,
            self.config.navbar_threshold_px,
            self.config.navbar_hysteresis_px,
        );
        let (background, shadow) = match chrome {
            ChromeLevel::Raised => (&self.config.raised_background, &self.config.raised_shadow),
            ChromeLevel::Resting => (&self.config.resting_background, &self.config.resting_shadow),
        };
        for navbar in surface.query(&self.navbar) {
            surface.set_style(navbar, StyleProp::Background, background);
            surface.set_style(navbar, StyleProp::BoxShadow, shadow);
            surface.set_style(navbar, StyleProp::BackdropFilter, &self.config.backdrop_filter);
        }
        if self.chrome != Some(chrome) {
            tracing::debug!(
                message = "scroll.chrome",
                offset,
                raised = chrome == ChromeLevel::Raised
            );
        }
        self.chrome = Some(chrome);

        let shapes = surface.query(&self.parallax);
        for (index, &shape) in shapes.iter().enumerate() {
            let transform = parallax_transform(
                index,
                offset,
                self.config.parallax_base_speed,
                self.config.parallax_speed_step,
                self.config.parallax_rotation,
            );
            surface.set_style(shape, StyleProp::Transform, &transform.to_string());
        }

        tracing::debug!(
            message = "scroll.settle",
            offset,
            shapes = shapes.len(),
            executions = self.executions,
            coalesced = self.coalesced
        );
        SettleReport {
            offset,
            chrome,
            shapes: shapes.len(),
        }
    }

    /// Drop the pending settle, if any.
    pub fn cancel<M>(&mut self, timers: &mut TimerQueue<M>) -> bool {
        match std::mem::replace(&mut self.state, ReactorState::Idle) {
            ReactorState::Pending { timer, .. } => timers.cancel(timer),
            ReactorState::Idle => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ReactorState::Pending { .. })
    }

    /// When the pending settle is due.
    #[must_use]
    pub fn due(&self) -> Option<Duration> {
        match self.state {
            ReactorState::Pending { due, .. } => Some(due),
            ReactorState::Idle => None,
        }
    }

    #[must_use]
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// Scrolls absorbed into an already pending settle.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    #[must_use]
    pub fn last_settled_at(&self) -> Option<Duration> {
        self.last_settled_at
    }

    #[must_use]
    pub fn chrome(&self) -> Option<ChromeLevel> {
        self.chrome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::ElementId;
    use lumen_core::document::Document;
    use lumen_core::surface::ElementSpec;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn page() -> (Document, ElementId, Vec<ElementId>) {
        let mut doc = Document::default();
        let nav = doc
            .insert(Document::BODY, ElementSpec::new("nav").class("navbar"))
            .expect("insert");
        let holder = doc
            .insert(Document::BODY, ElementSpec::new("div").class("floating-shapes"))
            .expect("insert");
        let shapes = (0..3)
            .map(|_| {
                doc.insert(holder, ElementSpec::new("div").class("shape"))
                    .expect("insert")
            })
            .collect();
        (doc, nav, shapes)
    }

    #[test]
    fn chrome_flips_at_threshold() {
        assert_eq!(chrome_for(100.0, None, 100.0, 0.0), ChromeLevel::Resting);
        assert_eq!(chrome_for(100.5, None, 100.0, 0.0), ChromeLevel::Raised);
        assert_eq!(
            chrome_for(99.0, Some(ChromeLevel::Raised), 100.0, 0.0),
            ChromeLevel::Resting
        );
    }

    #[test]
    fn chrome_hysteresis_holds_previous_level() {
        let raised = Some(ChromeLevel::Raised);
        let resting = Some(ChromeLevel::Resting);
        assert_eq!(chrome_for(95.0, raised, 100.0, 10.0), ChromeLevel::Raised);
        assert_eq!(chrome_for(89.0, raised, 100.0, 10.0), ChromeLevel::Resting);
        assert_eq!(chrome_for(105.0, resting, 100.0, 10.0), ChromeLevel::Resting);
        assert_eq!(chrome_for(111.0, resting, 100.0, 10.0), ChromeLevel::Raised);
    }

    #[test]
    fn parallax_formula() {
        assert_eq!(
            parallax_transform(0, 200.0, 0.5, 0.1, 0.1).to_string(),
            "translateY(100px) rotate(20deg)"
        );
        let a = parallax_transform(1, 200.0, 0.5, 0.1, 0.1).translate_y;
        let b = parallax_transform(2, 200.0, 0.5, 0.1, 0.1).translate_y;
        assert!(b > a);
    }

    #[test]
    fn burst_coalesces_into_one_settle() {
        let mut reactor = ScrollReactor::new(&ScrollConfig::default()).expect("config");
        let mut timers: TimerQueue<&'static str> = TimerQueue::new();
        for i in 0..10 {
            reactor.on_scroll(Duration::from_micros(i * 300), &mut timers, "settle");
        }
        assert_eq!(timers.len(), 1);
        assert_eq!(reactor.coalesced(), 9);
        let due = reactor.due().expect("pending");
        assert_eq!(due, Duration::from_micros(2700) + ms(16));
        assert_eq!(timers.pop_due(due - Duration::from_micros(1)), None);
        assert!(timers.pop_due(due).is_some());
    }

    #[test]
    fn settle_applies_chrome_and_parallax() {
        let (mut doc, nav, shapes) = page();
        let mut reactor = ScrollReactor::new(&ScrollConfig::default()).expect("config");
        let mut timers: TimerQueue<()> = TimerQueue::new();
        reactor.on_scroll(ms(0), &mut timers, ());
        doc.scroll_to(200.0);
        let report = reactor.settle(&mut doc, ms(16));
        assert!(!reactor.is_pending());
        assert_eq!(report.chrome, ChromeLevel::Raised);
        assert_eq!(report.shapes, 3);
        assert_eq!(
            doc.style(nav, StyleProp::Background).as_deref(),
            Some("rgba(255, 255, 255, 0.98)")
        );
        assert_eq!(
            doc.style(nav, StyleProp::BackdropFilter).as_deref(),
            Some("blur(20px)")
        );
        assert_eq!(
            doc.style(shapes[0], StyleProp::Transform).as_deref(),
            Some("translateY(100px) rotate(20deg)")
        );
        let third = parallax_transform(2, 200.0, 0.5, 0.1, 0.1);
        assert!((third.translate_y - 140.0).abs() < 1e-9);
        assert_eq!(
            doc.style(shapes[2], StyleProp::Transform),
            Some(third.to_string())
        );
        doc.scroll_to(50.0);
        reactor.settle(&mut doc, ms(40));
        assert_eq!(
            doc.style(nav, StyleProp::BoxShadow).as_deref(),
            Some("0 4px 20px rgba(0,0,0,0.08)")
        );
        assert_eq!(reactor.executions(), 2);
        assert_eq!(reactor.last_settled_at(), Some(ms(40)));
    }

    #[test]
    fn cancel_drops_pending_timer() {
        let mut reactor = ScrollReactor::new(&ScrollConfig::default()).expect("config");
        let mut timers: TimerQueue<()> = TimerQueue::new();
        reactor.on_scroll(ms(0), &mut timers, ());
        assert!(reactor.cancel(&mut timers));
        assert!(!reactor.cancel(&mut timers));
        assert!(timers.is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parallax_speeds_increase_with_index(offset in 0.001f64..10_000.0, index in 0usize..8) {
                let near = parallax_transform(index, offset, 0.5, 0.1, 0.1);
                let far = parallax_transform(index + 1, offset, 0.5, 0.1, 0.1);
                prop_assert!(far.translate_y > near.translate_y);
                prop_assert_eq!(near.rotate_deg, far.rotate_deg);
            }
        }
    }
}
