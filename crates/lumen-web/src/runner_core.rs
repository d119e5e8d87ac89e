#![forbid(unsafe_code)]

//! Platform-independent runner core.
//!
//! The host owns real time and the real DOM; the core owns everything else.
//! A frame on the host side looks like:
//!
//! ```text
//! set_time_ms(now) ─► push_encoded_event(..)* ─► step() ─► take_patches_json()
//! ```
//!
//! # Invariants
//!
//! 1. Time never moves backwards; earlier timestamps are ignored.
//! 2. `Scroll` and `Resize` events update the document viewport before the
//!    page sees them, so reactions read the host's geometry.
//! 3. Patches are drained exactly once, in application order.
//!
//! # Failure Modes
//!
//! - Malformed snapshot, config or event JSON: [`WebError::Json`]; the
//!   runner state is unchanged.
//! - Non-finite or negative time: [`WebError::InvalidTime`].

use std::collections::VecDeque;

use lumen_core::clock::{Clock, LabClock};
use lumen_core::document::{Document, DocumentSnapshot};
use lumen_core::event::{EventKind, PageEvent};
use lumen_core::geometry::{Rect, Viewport};
use lumen_core::{ElementId, Surface};
use lumen_runtime::{Dispatch, LumenConfig, Page, PageStats, Phase};
use web_time::Duration;

use crate::error::{Result, WebError};

/// Log lines kept between `take_logs` calls.
const MAX_LOGS: usize = 1024;

/// Outcome of one [`RunnerCore::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Timers fired.
    pub fired: usize,
    /// Mutations waiting in the journal.
    pub patches: usize,
    pub pending_timers: usize,
    /// When the host should call `step` next, in ms.
    pub next_deadline_ms: Option<f64>,
}

pub struct RunnerCore {
    page: Page<Document, LabClock>,
    clock: LabClock,
    logs: VecDeque<String>,
    dropped_logs: u64,
}

impl std::fmt::Debug for RunnerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerCore")
            .field("now", &self.clock.now())
            .field("page", &self.page)
            .field("logs", &self.logs.len())
            .finish()
    }
}

fn millis(ms: f64) -> Result<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(WebError::InvalidTime(ms));
    }
    Ok(Duration::from_micros((ms * 1000.0).round() as u64))
}

fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn kind_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Scroll => "scroll",
        EventKind::Intersection => "intersection",
        EventKind::Click => "click",
        EventKind::PointerEnter => "pointer_enter",
        EventKind::PointerLeave => "pointer_leave",
        EventKind::Resize => "resize",
    }
}

impl RunnerCore {
    /// Build a runner from a JSON [`DocumentSnapshot`] and an optional JSON
    /// [`LumenConfig`] (missing fields take their defaults).
    pub fn from_snapshot_json(snapshot_json: &str, config_json: Option<&str>) -> Result<Self> {
        let snapshot: DocumentSnapshot = serde_json::from_str(snapshot_json)?;
        let config = match config_json {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
            _ => LumenConfig::default(),
        };
        Self::new(&snapshot, config)
    }

    pub fn new(snapshot: &DocumentSnapshot, config: LumenConfig) -> Result<Self> {
        let doc = Document::from_snapshot(snapshot)?;
        let elements = doc.len();
        let clock = LabClock::new();
        let page = Page::new(doc, clock.clone(), config)?;
        let mut core = Self {
            page,
            clock,
            logs: VecDeque::new(),
            dropped_logs: 0,
        };
        core.log(format!("runner event=create elements={elements}"));
        Ok(core)
    }

    fn log(&mut self, line: String) {
        tracing::trace!(message = "runner.log", line = %line);
        if self.logs.len() == MAX_LOGS {
            self.logs.pop_front();
            self.dropped_logs += 1;
        }
        self.logs.push_back(line);
    }

    // -- lifecycle -----------------------------------------------------------

    pub fn dom_ready(&mut self) {
        self.page.dom_ready();
        let stats = self.page.stats();
        self.log(format!(
            "runner event=dom_ready counters={} pending_timers={}",
            stats.counters_running, stats.pending_timers
        ));
    }

    pub fn load(&mut self) {
        self.page.load();
        self.log("runner event=load".to_string());
    }

    pub fn dispose(&mut self) {
        if self.page.phase() == Phase::Disposed {
            return;
        }
        self.page.dispose();
        self.log("runner event=dispose".to_string());
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.page.phase() != Phase::Disposed
    }

    // -- time ----------------------------------------------------------------

    /// Set the current host time (ms since the runner's origin).
    pub fn set_time_ms(&mut self, ms: f64) -> Result<()> {
        self.clock.set(millis(ms)?);
        Ok(())
    }

    pub fn advance_time_ms(&mut self, ms: f64) -> Result<()> {
        self.clock.advance(millis(ms)?);
        Ok(())
    }

    #[must_use]
    pub fn now_ms(&self) -> f64 {
        as_ms(self.clock.now())
    }

    // -- input ---------------------------------------------------------------

    /// Decode and dispatch one host event.
    pub fn push_encoded_event(&mut self, json: &str) -> Result<Dispatch> {
        let event: PageEvent = serde_json::from_str(json)?;
        Ok(self.push_event(event))
    }

    pub fn push_event(&mut self, event: PageEvent) -> Dispatch {
        match event {
            PageEvent::Scroll { offset } => self.page.surface_mut().scroll_to(offset),
            PageEvent::Resize { width, height } => {
                let scroll_y = self.page.surface().viewport().scroll_y;
                self.page
                    .surface_mut()
                    .set_viewport(Viewport::new(width, height).scrolled_to(scroll_y));
            }
            _ => {}
        }
        let outcome = self.page.dispatch(event);
        self.log(format!(
            "runner event=dispatch kind={} handled={} prevented={}",
            kind_name(event.kind()),
            outcome.handled,
            outcome.prevented
        ));
        outcome
    }

    /// Convenience for `{"kind":"scroll","offset":..}`.
    pub fn scroll_to(&mut self, offset: f64) -> Dispatch {
        self.push_event(PageEvent::Scroll { offset })
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Dispatch {
        self.push_event(PageEvent::Resize { width, height })
    }

    /// Report a new layout box for `element` (host layout).
    pub fn set_bounds(&mut self, element: u32, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.page
            .surface_mut()
            .set_bounds(ElementId::new(element), Rect::new(x, y, width, height))
    }

    // -- frame ---------------------------------------------------------------

    /// Fire every timer due at the current time.
    pub fn step(&mut self) -> StepResult {
        let fired = self.page.pump();
        let stats = self.page.stats();
        let result = StepResult {
            fired,
            patches: self.page.surface().journal().len(),
            pending_timers: stats.pending_timers,
            next_deadline_ms: self.page.next_deadline().map(as_ms),
        };
        if fired > 0 {
            self.log(format!(
                "runner event=step t_ms={} fired={fired} patches={}",
                self.now_ms(),
                result.patches
            ));
        }
        result
    }

    /// Drain the mutation journal as a JSON array.
    pub fn take_patches_json(&mut self) -> Result<String> {
        let patches = self.page.surface_mut().take_journal();
        Ok(serde_json::to_string(&patches)?)
    }

    pub fn take_logs(&mut self) -> Vec<String> {
        if self.dropped_logs > 0 {
            let dropped = std::mem::take(&mut self.dropped_logs);
            self.logs.push_front(format!("runner event=logs_dropped count={dropped}"));
        }
        self.logs.drain(..).collect()
    }

    // -- inspection ----------------------------------------------------------

    #[must_use]
    pub fn stats(&self) -> PageStats {
        self.page.stats()
    }

    #[must_use]
    pub fn page(&self) -> &Page<Document, LabClock> {
        &self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::document::Mutation;
    use lumen_core::style::StyleProp;
    use lumen_harness::LandingPage;
    use lumen_harness::fixtures::{FEATURES_OFFSET, IMPACT_OFFSET};
    use pretty_assertions::assert_eq;

    fn snapshot_json() -> (String, LandingPage) {
        let (snapshot, ids) = LandingPage::snapshot();
        (serde_json::to_string(&snapshot).expect("encode snapshot"), ids)
    }

    fn started() -> (RunnerCore, LandingPage) {
        let (json, ids) = snapshot_json();
        let mut core = RunnerCore::from_snapshot_json(&json, None).expect("runner");
        core.dom_ready();
        core.load();
        core.take_patches_json().expect("drain setup");
        (core, ids)
    }

    fn patches(core: &mut RunnerCore) -> Vec<Mutation> {
        serde_json::from_str(&core.take_patches_json().expect("patches")).expect("decode")
    }

    #[test]
    fn runner_core_creates_and_readies() {
        let (json, ids) = snapshot_json();
        let mut core = RunnerCore::from_snapshot_json(&json, None).expect("runner");
        assert!(core.is_running());
        core.dom_ready();
        let setup = patches(&mut core);
        assert!(setup.iter().any(|m| matches!(
            m,
            Mutation::Style { id, prop: StyleProp::Opacity, value } if *id == ids.feature_cards[0] && value == "0"
        )));
    }

    #[test]
    fn runner_core_config_json_overrides_defaults() {
        let (json, _) = snapshot_json();
        let core = RunnerCore::from_snapshot_json(&json, Some(r#"{"scroll":{"debounce_ms":40}}"#))
            .expect("runner");
        assert_eq!(core.page().config().scroll.debounce_ms, 40);
        assert_eq!(core.page().config().counter.tick_ms, 16);
    }

    #[test]
    fn runner_core_rejects_invalid_config() {
        let (json, _) = snapshot_json();
        let err = RunnerCore::from_snapshot_json(&json, Some(r#"{"counter":{"tick_ms":0}}"#))
            .expect_err("zero tick");
        assert!(matches!(err, WebError::Page(_)));
    }

    #[test]
    fn runner_core_malformed_input_is_rejected() {
        let (mut core, _) = started();
        assert!(matches!(
            core.push_encoded_event("not json"),
            Err(WebError::Json(_))
        ));
        assert!(core.push_encoded_event(r#"{"kind":"keyboard","code":"Tab"}"#).is_err());
        assert!(matches!(
            RunnerCore::from_snapshot_json("[1,2", None),
            Err(WebError::Json(_))
        ));
    }

    #[test]
    fn runner_core_scroll_settles_after_debounce() {
        let (mut core, ids) = started();
        let outcome = core
            .push_encoded_event(r#"{"kind":"scroll","offset":250.0}"#)
            .expect("scroll");
        assert_eq!(outcome.handled, 1);
        core.set_time_ms(15.0).expect("time");
        core.step();
        assert!(!patches(&mut core).iter().any(|m| m.target() == ids.navbar));

        core.set_time_ms(16.0).expect("time");
        let result = core.step();
        assert!(result.fired >= 1);
        let applied = patches(&mut core);
        assert!(applied.contains(&Mutation::Style {
            id: ids.navbar,
            prop: StyleProp::Background,
            value: "rgba(255, 255, 255, 0.98)".to_string(),
        }));
    }

    #[test]
    fn runner_core_time_is_monotonic_and_validated() {
        let (mut core, _) = started();
        core.set_time_ms(100.0).expect("time");
        core.set_time_ms(50.0).expect("earlier is ignored");
        assert_eq!(core.now_ms(), 100.0);
        core.advance_time_ms(16.5).expect("advance");
        assert_eq!(core.now_ms(), 116.5);
        assert!(matches!(core.set_time_ms(f64::NAN), Err(WebError::InvalidTime(_))));
        assert!(matches!(core.advance_time_ms(-1.0), Err(WebError::InvalidTime(_))));
    }

    #[test]
    fn runner_core_next_deadline_guides_host() {
        let (mut core, _) = started();
        core.scroll_to(FEATURES_OFFSET);
        assert!(core.step().next_deadline_ms.is_some());
        let mut guard = 0;
        while let Some(next) = core.step().next_deadline_ms {
            if next > 500.0 {
                break;
            }
            core.set_time_ms(next).expect("time");
            guard += 1;
            assert!(guard < 10_000, "runaway timers");
        }
        assert!(core.now_ms() <= 500.0);
    }

    #[test]
    fn runner_core_counters_finish_with_original_text() {
        let (mut core, ids) = started();
        core.scroll_to(IMPACT_OFFSET);
        let mut t = 0.0;
        while t <= 2_100.0 {
            t += 16.0;
            core.set_time_ms(t).expect("time");
            core.step();
        }
        let mut last_text = |element| {
            patches(&mut core)
                .into_iter()
                .rev()
                .find_map(|m| match m {
                    Mutation::Text { id, text } if id == element => Some(text),
                    _ => None,
                })
        };
        assert_eq!(last_text(ids.metrics[1]).as_deref(), Some("85%"));
    }

    #[test]
    fn runner_core_set_bounds_moves_targets() {
        let (mut core, ids) = started();
        let card = ids.timeline[0];
        assert!(core.set_bounds(card.get(), 200.0, 100.0, 880.0, 200.0));
        assert!(!core.set_bounds(9_999, 0.0, 0.0, 1.0, 1.0));
        core.scroll_to(0.0);
        let reveal = core.page().reveal();
        assert!(reveal.is_revealed(card) || reveal.is_pending(card));
    }

    #[test]
    fn runner_core_take_logs_drains() {
        let (mut core, _) = started();
        core.push_encoded_event(r#"{"kind":"resize","width":800.0,"height":600.0}"#)
            .expect("resize");
        let logs = core.take_logs();
        assert!(logs.iter().any(|l| l.starts_with("runner event=create")));
        assert!(
            logs.iter()
                .any(|l| l.contains("event=dispatch kind=resize")),
            "{logs:?}"
        );
        assert!(core.take_logs().is_empty());
        assert_eq!(core.page().surface().viewport().width, 800.0);
    }

    #[test]
    fn runner_core_dispose_stops_everything() {
        let (mut core, _) = started();
        core.scroll_to(IMPACT_OFFSET);
        core.dispose();
        core.dispose();
        assert!(!core.is_running());
        assert_eq!(core.stats().pending_timers, 0);
        core.take_patches_json().expect("drain");
        core.set_time_ms(5_000.0).expect("time");
        assert_eq!(core.step().fired, 0);
        assert_eq!(core.take_patches_json().expect("patches"), "[]");
        let logs = core.take_logs();
        assert_eq!(logs.iter().filter(|l| l.contains("event=dispose")).count(), 1);
    }
}
