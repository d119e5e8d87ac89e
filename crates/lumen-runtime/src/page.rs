#![forbid(unsafe_code)]

//! Page controller.
//!
//! [`Page`] owns a [`Surface`], a [`Clock`] and every mechanism of the
//! landing page. The host drives it:
//!
//! 1. [`Page::dom_ready`] hides reveal targets and hero blocks, registers the
//!    observers, starts the demo step rotation and runs a first visibility
//!    check.
//! 2. [`Page::dispatch`] routes host events through the subscription
//!    registry. Each event is classified against the surface (its node and,
//!    for clicks, every ancestor) and mapped to [`Msg`]s, which are applied
//!    in subscription order.
//! 3. [`Page::pump`] fires due timers at the clock's current time: scroll
//!    settles, counter ticks, staggered reveals, hero fades, metric restores,
//!    step rotation and ripple removal.
//! 4. [`Page::dispose`] tears everything down.
//!
//! The host owns the scroll position and layout: it updates the surface
//! before dispatching `Scroll` or `Resize`, and the page reads the surface
//! when it reacts.
//!
//! # Invariants
//!
//! 1. Timers never fire outside [`Page::pump`]; a zero delay means "next
//!    pump".
//! 2. After [`Page::dispose`] no timer is pending, no element is observed,
//!    and dispatch and pump are no-ops.
//! 3. Every scroll re-checks both observers against the surface geometry.

use lumen_core::clock::Clock;
use lumen_core::error::Result;
use lumen_core::event::{EventKind, PageEvent};
use lumen_core::subscription::Subscriptions;
use lumen_core::timer::{TimerHandle, TimerQueue};
use lumen_core::{ElementId, Surface};
use web_time::Duration;

use crate::config::LumenConfig;
use crate::counter::{CounterAnimator, StepOutcome};
use crate::hero::HeroIntro;
use crate::interactions::{Interactions, Role};
use crate::observer::Crossing;
use crate::reveal::{RevealEngine, RevealPlan};
use crate::scroll::ScrollReactor;

/// An event as seen from one node of its propagation path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Routed {
    pub event: PageEvent,
    /// Node the handlers run for: the target or one of its ancestors.
    pub node: ElementId,
    pub roles: Role,
}

impl Routed {
    fn clicked(&self, role: Role) -> bool {
        self.event.kind() == EventKind::Click && self.roles.contains(role)
    }
}

/// Page messages, from events and from timers.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Scrolled { offset: f64 },
    Relayout,
    Visibility { target: ElementId, ratio: f64 },
    ToggleNav,
    CloseNav,
    SmoothScroll(ElementId),
    SwitchDemo(ElementId),
    Ripple { button: ElementId, x: f64, y: f64 },
    HoverEnter(ElementId),
    HoverLeave(ElementId),
    ScrollSettled,
    StaggeredReveal(ElementId),
    CounterTick(ElementId),
    HeroReveal(ElementId),
    RestoreMetric { fill: ElementId, width: String },
    RotateStep,
    RemoveRipple(ElementId),
}

/// Result of [`Page::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The host should suppress the event's default action.
    pub prevented: bool,
    /// Messages applied.
    pub handled: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Ready,
    Disposed,
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageStats {
    pub events: u64,
    pub messages: u64,
    pub timers_fired: u64,
    pub reveals: usize,
    pub counters_running: usize,
    pub counters_skipped: usize,
    pub scroll_settles: u64,
    pub scrolls_coalesced: u64,
    pub pending_timers: usize,
}

pub struct Page<S: Surface, C: Clock> {
    surface: S,
    clock: C,
    config: LumenConfig,
    subscriptions: Subscriptions<Routed, Msg>,
    timers: TimerQueue<Msg>,
    reveal: RevealEngine,
    counters: CounterAnimator,
    scroll: ScrollReactor,
    hero: HeroIntro,
    interactions: Interactions,
    step_cursor: usize,
    step_timer: Option<TimerHandle>,
    phase: Phase,
    events: u64,
    messages: u64,
    timers_fired: u64,
}

impl<S: Surface, C: Clock> std::fmt::Debug for Page<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("phase", &self.phase)
            .field("subscriptions", &self.subscriptions.len())
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

impl<S: Surface, C: Clock> Page<S, C> {
    /// Validate `config`, compile its selectors and wire the subscriptions.
    pub fn new(surface: S, clock: C, config: LumenConfig) -> Result<Self> {
        config.validate()?;
        let mut page = Self {
            reveal: RevealEngine::new(&config.reveal)?,
            counters: CounterAnimator::new(&config.counter)?,
            scroll: ScrollReactor::new(&config.scroll)?,
            hero: HeroIntro::new(&config.hero)?,
            interactions: Interactions::new(&config.interactions)?,
            surface,
            clock,
            config,
            subscriptions: Subscriptions::new(),
            timers: TimerQueue::new(),
            step_cursor: 0,
            step_timer: None,
            phase: Phase::Created,
            events: 0,
            messages: 0,
            timers_fired: 0,
        };
        page.wire();
        Ok(page)
    }

    fn wire(&mut self) {
        let subs = &mut self.subscriptions;
        subs.subscribe(|r| r.clicked(Role::HAMBURGER), |_| Some(Msg::ToggleNav));
        subs.subscribe(|r| r.clicked(Role::NAV_LINK), |_| Some(Msg::CloseNav));
        subs.subscribe(
            |r| r.clicked(Role::ANCHOR),
            |r| Some(Msg::SmoothScroll(r.node)),
        );
        subs.subscribe(
            |r| r.event.kind() == EventKind::Scroll,
            |r| match r.event {
                PageEvent::Scroll { offset } => Some(Msg::Scrolled { offset }),
                _ => None,
            },
        );
        subs.subscribe(
            |r| r.event.kind() == EventKind::Intersection,
            |r| match r.event {
                PageEvent::Intersection { target, ratio } => Some(Msg::Visibility { target, ratio }),
                _ => None,
            },
        );
        subs.subscribe(
            |r| r.clicked(Role::DEMO_BUTTON),
            |r| Some(Msg::SwitchDemo(r.node)),
        );
        subs.subscribe(
            |r| r.clicked(Role::RIPPLE),
            |r| match r.event {
                PageEvent::Click { x, y, .. } => Some(Msg::Ripple {
                    button: r.node,
                    x,
                    y,
                }),
                _ => None,
            },
        );
        subs.subscribe(
            |r| r.event.kind() == EventKind::PointerEnter && r.roles.contains(Role::HOVER_CARD),
            |r| Some(Msg::HoverEnter(r.node)),
        );
        subs.subscribe(
            |r| r.event.kind() == EventKind::PointerLeave && r.roles.contains(Role::HOVER_CARD),
            |r| Some(Msg::HoverLeave(r.node)),
        );
        subs.subscribe(
            |r| r.event.kind() == EventKind::Resize,
            |_| Some(Msg::Relayout),
        );
    }

    // -- lifecycle -----------------------------------------------------------

    /// Initial wiring against the parsed document. Only the first call has
    /// an effect.
    pub fn dom_ready(&mut self) {
        if self.phase != Phase::Created {
            return;
        }
        self.phase = Phase::Ready;
        let now = self.clock.now();

        let reveals = self.reveal.register(&mut self.surface);

        if self.interactions.has_steps(&self.surface) {
            self.step_cursor = self.interactions.rotate_steps(&mut self.surface, 0);
            let every = Duration::from_millis(self.config.interactions.step_rotation_ms);
            self.step_timer = Some(self.timers.schedule_repeating(now + every, every, Msg::RotateStep));
        }

        let counters = self.counters.register(&self.surface);
        let hero = self.hero.prepare(&mut self.surface);
        tracing::debug!(message = "page.dom_ready", reveals, counters, hero);

        self.relayout();
    }

    /// Window load: start the hero intro.
    pub fn load(&mut self) {
        if self.phase != Phase::Ready {
            return;
        }
        let now = self.clock.now();
        for (block, delay) in self.hero.load(&mut self.surface) {
            self.timers.schedule_after(now, delay, Msg::HeroReveal(block));
        }
    }

    /// Tear down observers, timers and subscriptions. Idempotent.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.phase = Phase::Disposed;
        self.reveal.dispose();
        for timer in self.counters.dispose() {
            self.timers.cancel(timer);
        }
        self.scroll.cancel(&mut self.timers);
        if let Some(timer) = self.step_timer.take() {
            self.timers.cancel(timer);
        }
        let timers = self.timers.clear();
        let subscriptions = self.subscriptions.clear();
        tracing::debug!(message = "page.dispose", timers, subscriptions);
    }

    // -- events and time -----------------------------------------------------

    /// Route a host event.
    pub fn dispatch(&mut self, event: PageEvent) -> Dispatch {
        let mut outcome = Dispatch::default();
        if self.phase == Phase::Disposed {
            return outcome;
        }
        self.events += 1;
        for node in self.propagation_path(&event) {
            let routed = Routed {
                event,
                node,
                roles: self.interactions.roles(&self.surface, node),
            };
            for msg in self.subscriptions.dispatch(&routed) {
                outcome.prevented |= self.apply(msg);
                outcome.handled += 1;
            }
        }
        tracing::trace!(
            message = "page.dispatch",
            kind = ?event.kind(),
            handled = outcome.handled,
            prevented = outcome.prevented
        );
        outcome
    }

    fn propagation_path(&self, event: &PageEvent) -> Vec<ElementId> {
        match event {
            PageEvent::Click { target, .. } => {
                let mut path = vec![*target];
                let mut cursor = self.surface.parent(*target);
                while let Some(node) = cursor {
                    path.push(node);
                    cursor = self.surface.parent(node);
                }
                path
            }
            other => vec![other.target().unwrap_or_else(|| self.surface.body())],
        }
    }

    /// Fire every timer due at the clock's current time; returns how many
    /// fired.
    pub fn pump(&mut self) -> usize {
        if self.phase == Phase::Disposed {
            return 0;
        }
        let now = self.clock.now();
        let mut fired = 0;
        while let Some((_, msg)) = self.timers.pop_due(now) {
            self.apply(msg);
            fired += 1;
        }
        self.timers_fired += fired as u64;
        fired
    }

    /// Apply one message; returns whether the default action is prevented.
    fn apply(&mut self, msg: Msg) -> bool {
        self.messages += 1;
        let now = self.clock.now();
        match msg {
            Msg::Scrolled { offset } => {
                tracing::trace!(message = "scroll.event", offset);
                self.scroll.on_scroll(now, &mut self.timers, Msg::ScrollSettled);
                self.relayout();
            }
            Msg::Relayout => self.relayout(),
            Msg::Visibility { target, ratio } => {
                if let Some(crossing) = self.reveal.notify(target, ratio) {
                    self.handle_reveal(crossing);
                }
                if let Some(crossing) = self.counters.notify(target, ratio) {
                    self.handle_counter(crossing);
                }
            }
            Msg::ToggleNav => {
                self.interactions.toggle_nav(&mut self.surface);
            }
            Msg::CloseNav => self.interactions.close_nav(&mut self.surface),
            Msg::SmoothScroll(anchor) => {
                self.interactions.smooth_scroll(&mut self.surface, anchor);
                return true;
            }
            Msg::SwitchDemo(button) => {
                let switch = self.interactions.switch_demo(&mut self.surface, button);
                let delay = Duration::from_millis(self.config.interactions.metric_restore_ms);
                for (fill, width) in switch.restore {
                    self.timers
                        .schedule_after(now, delay, Msg::RestoreMetric { fill, width });
                }
            }
            Msg::Ripple { button, x, y } => {
                if let Some(ripple) = self.interactions.ripple(&mut self.surface, button, x, y) {
                    let lifetime = Duration::from_millis(self.config.interactions.ripple_lifetime_ms);
                    self.timers
                        .schedule_after(now, lifetime, Msg::RemoveRipple(ripple));
                }
            }
            Msg::HoverEnter(card) => self.interactions.hover_enter(&mut self.surface, card),
            Msg::HoverLeave(card) => self.interactions.hover_leave(&mut self.surface, card),
            Msg::ScrollSettled => {
                self.scroll.settle(&mut self.surface, now);
            }
            Msg::StaggeredReveal(element) => {
                self.reveal.complete(&mut self.surface, element);
            }
            Msg::CounterTick(element) => {
                if let StepOutcome::Finished { timer: Some(timer) } =
                    self.counters.step(&mut self.surface, element)
                {
                    self.timers.cancel(timer);
                }
            }
            Msg::HeroReveal(block) => self.hero.reveal(&mut self.surface, block),
            Msg::RestoreMetric { fill, width } => {
                self.interactions
                    .restore_metric(&mut self.surface, fill, &width);
            }
            Msg::RotateStep => {
                self.step_cursor = self
                    .interactions
                    .rotate_steps(&mut self.surface, self.step_cursor);
            }
            Msg::RemoveRipple(ripple) => {
                self.interactions.remove_ripple(&mut self.surface, ripple);
            }
        }
        false
    }

    fn relayout(&mut self) {
        for crossing in self.reveal.check(&self.surface) {
            self.handle_reveal(crossing);
        }
        for crossing in self.counters.check(&self.surface) {
            self.handle_counter(crossing);
        }
    }

    fn handle_reveal(&mut self, crossing: Crossing) {
        if let RevealPlan::After(delay) = self.reveal.on_crossing(&mut self.surface, crossing) {
            let now = self.clock.now();
            self.timers
                .schedule_after(now, delay, Msg::StaggeredReveal(crossing.target));
        }
    }

    fn handle_counter(&mut self, crossing: Crossing) {
        if let Some(tick) = self.counters.on_crossing(&self.surface, crossing) {
            let first = self.clock.now().saturating_add(tick);
            let timer = self
                .timers
                .schedule_repeating(first, tick, Msg::CounterTick(crossing.target));
            self.counters.attach_timer(crossing.target, timer);
        }
    }

    // -- accessors -----------------------------------------------------------

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access for the host (scrolling, layout).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn config(&self) -> &LumenConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn reveal(&self) -> &RevealEngine {
        &self.reveal
    }

    #[must_use]
    pub fn counters(&self) -> &CounterAnimator {
        &self.counters
    }

    #[must_use]
    pub fn scroll(&self) -> &ScrollReactor {
        &self.scroll
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub fn stats(&self) -> PageStats {
        PageStats {
            events: self.events,
            messages: self.messages,
            timers_fired: self.timers_fired,
            reveals: self.reveal.revealed_count(),
            counters_running: self.counters.running(),
            counters_skipped: self.counters.skipped(),
            scroll_settles: self.scroll.executions(),
            scrolls_coalesced: self.scroll.coalesced(),
            pending_timers: self.timers.len(),
        }
    }
}
