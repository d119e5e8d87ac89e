#![forbid(unsafe_code)]

//! Deterministic page driver.
//!
//! [`PageHarness`] wires a [`Page`] over the reference [`LandingPage`]
//! document and a shared [`LabClock`]. Time only moves when a test calls
//! [`PageHarness::advance`], which walks the timer queue deadline by
//! deadline so every timer fires with the clock reading its own deadline.
//!
//! # Invariants
//!
//! 1. `advance(d)` leaves the clock exactly `d` later than before.
//! 2. No timer with a deadline at or before the new time is left pending.
//! 3. The harness never touches the clock except through `advance`.

use lumen_core::clock::{Clock, LabClock};
use lumen_core::document::{Document, Mutation};
use lumen_core::error::Result;
use lumen_core::event::PageEvent;
use lumen_core::geometry::Viewport;
use lumen_core::style::StyleProp;
use lumen_core::{ElementId, Surface};
use lumen_runtime::{Dispatch, LumenConfig, Page, PageStats};
use web_time::Duration;

use crate::fixtures::LandingPage;

pub struct PageHarness {
    page: Page<Document, LabClock>,
    clock: LabClock,
    ids: LandingPage,
}

impl std::fmt::Debug for PageHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHarness")
            .field("now", &self.clock.now())
            .field("page", &self.page)
            .finish()
    }
}

impl PageHarness {
    /// Landing page with the default configuration; `dom_ready` not yet run.
    pub fn new() -> Result<Self> {
        Self::with_config(LumenConfig::default())
    }

    pub fn with_config(config: LumenConfig) -> Result<Self> {
        let (doc, ids) = LandingPage::build()?;
        let clock = LabClock::new();
        let page = Page::new(doc, clock.clone(), config)?;
        Ok(Self { page, clock, ids })
    }

    /// Run `dom_ready` and `load`, and drop the setup mutations from the
    /// journal.
    pub fn boot(config: LumenConfig) -> Result<Self> {
        let mut harness = Self::with_config(config)?;
        harness.page.dom_ready();
        harness.page.load();
        harness.page.surface_mut().take_journal();
        Ok(harness)
    }

    // -- time ----------------------------------------------------------------

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Move time forward by `delta`, firing timers in deadline order.
    /// Returns how many fired.
    pub fn advance(&mut self, delta: Duration) -> usize {
        let until = self.clock.now().saturating_add(delta);
        self.advance_to(until)
    }

    /// Move time forward to `until` (never backwards).
    pub fn advance_to(&mut self, until: Duration) -> usize {
        let mut fired = self.page.pump();
        while let Some(deadline) = self.page.next_deadline() {
            if deadline > until {
                break;
            }
            self.clock.set(deadline);
            fired += self.page.pump();
        }
        self.clock.set(until);
        fired + self.page.pump()
    }

    pub fn advance_ms(&mut self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    // -- input ---------------------------------------------------------------

    /// Scroll the viewport, then deliver the scroll event.
    pub fn scroll_to(&mut self, offset: f64) -> Dispatch {
        self.page.surface_mut().scroll_to(offset);
        let offset = self.page.surface().viewport().scroll_y;
        self.page.dispatch(PageEvent::Scroll { offset })
    }

    /// Click the centre of `target` (client coordinates).
    pub fn click(&mut self, target: ElementId) -> Dispatch {
        let viewport = self.page.surface().viewport();
        let (x, y) = self
            .page
            .surface()
            .bounds(target)
            .map(|b| {
                (
                    b.x + b.width / 2.0 - viewport.scroll_x,
                    b.y + b.height / 2.0 - viewport.scroll_y,
                )
            })
            .unwrap_or_default();
        self.click_at(target, x, y)
    }

    pub fn click_at(&mut self, target: ElementId, x: f64, y: f64) -> Dispatch {
        self.page.dispatch(PageEvent::Click { target, x, y })
    }

    pub fn hover(&mut self, target: ElementId) -> Dispatch {
        self.page.dispatch(PageEvent::PointerEnter { target })
    }

    pub fn leave(&mut self, target: ElementId) -> Dispatch {
        self.page.dispatch(PageEvent::PointerLeave { target })
    }

    /// Resize the viewport, keeping the scroll position.
    pub fn resize(&mut self, width: f64, height: f64) -> Dispatch {
        let scroll_y = self.page.surface().viewport().scroll_y;
        self.page
            .surface_mut()
            .set_viewport(Viewport::new(width, height).scrolled_to(scroll_y));
        self.page.dispatch(PageEvent::Resize { width, height })
    }

    pub fn dispatch(&mut self, event: PageEvent) -> Dispatch {
        self.page.dispatch(event)
    }

    // -- inspection ----------------------------------------------------------

    #[must_use]
    pub fn ids(&self) -> &LandingPage {
        &self.ids
    }

    #[must_use]
    pub fn doc(&self) -> &Document {
        self.page.surface()
    }

    #[must_use]
    pub fn page(&self) -> &Page<Document, LabClock> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page<Document, LabClock> {
        &mut self.page
    }

    #[must_use]
    pub fn stats(&self) -> PageStats {
        self.page.stats()
    }

    #[must_use]
    pub fn style(&self, element: ElementId, prop: StyleProp) -> Option<String> {
        self.doc().style(element, prop)
    }

    #[must_use]
    pub fn text(&self, element: ElementId) -> Option<String> {
        self.doc().text(element)
    }

    /// Whether `element` has been faded in.
    #[must_use]
    pub fn is_shown(&self, element: ElementId) -> bool {
        self.style(element, StyleProp::Opacity).as_deref() == Some("1")
    }

    pub fn take_journal(&mut self) -> Vec<Mutation> {
        self.page.surface_mut().take_journal()
    }

    pub fn dispose(&mut self) {
        self.page.dispose();
    }
}
