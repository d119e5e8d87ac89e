#![forbid(unsafe_code)]

//! Numeric counter ramps.
//!
//! A counter element shows a figure such as `2.5K`, `85%` or `1.2M`. When it
//! first becomes visible its text is parsed into a [`CounterTarget`], the
//! element is unobserved, and a [`CounterRamp`] counts from zero to the
//! target in fixed ticks, rewriting the text with the original suffix each
//! tick.
//!
//! # Invariants
//!
//! 1. The displayed value never decreases during a ramp and ends exactly at
//!    the target.
//! 2. A ramp finishes within `duration / tick + 1` ticks.
//! 3. A counter element is ramped at most once; its observation ends on the
//!    first crossing, whether or not its text parses.
//! 4. Display is a pure function of the current value and the suffix.
//!
//! # Failure Modes
//!
//! - Text without digits: [`LumenError::InvalidCounterFormat`]; the element is
//!   logged at WARN, unobserved, and left untouched.
//! - Starting a non-idle ramp: [`LumenError::CounterReentry`].

use std::fmt;

use ahash::AHashMap;
use lumen_core::error::{LumenError, Result};
use lumen_core::selector::Selector;
use lumen_core::timer::TimerHandle;
use lumen_core::{ElementId, Surface};
use web_time::Duration;

use crate::config::CounterConfig;
use crate::observer::{Crossing, ObserverOptions, VisibilityObserver};

// ---------------------------------------------------------------------------
// Target parsing and display
// ---------------------------------------------------------------------------

/// Unit suffix preserved from the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Suffix {
    #[default]
    None,
    Percent,
    Thousand,
    Million,
}

impl Suffix {
    /// Detect the suffix; `K` wins over `M`, which wins over `%`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.contains('K') {
            Self::Thousand
        } else if text.contains('M') {
            Self::Million
        } else if text.contains('%') {
            Self::Percent
        } else {
            Self::None
        }
    }

    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Thousand => 1_000,
            Self::Million => 1_000_000,
            Self::None | Self::Percent => 1,
        }
    }
}

/// Parsed counter goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTarget {
    pub value: f64,
    pub suffix: Suffix,
}

impl fmt::Display for CounterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_display(self.value, self.suffix))
    }
}

/// Extract the ramp target from counter text.
///
/// Every ASCII digit and `.` is kept, the longest valid decimal prefix of the
/// result is read, and the suffix multiplier applied. Scaling works on the
/// decimal digits, so `"2.5K"` is exactly `2500`.
pub fn parse_target(text: &str) -> Result<CounterTarget> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let (int_part, frac_part) = decimal_prefix(&kept);
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(LumenError::InvalidCounterFormat {
            text: text.to_string(),
        });
    }
    let suffix = Suffix::detect(text);
    Ok(CounterTarget {
        value: scale_decimal(int_part, frac_part, suffix.multiplier()),
        suffix,
    })
}

// Digits before the first dot, and digits between it and the next dot.
fn decimal_prefix(kept: &str) -> (&str, &str) {
    match kept.split_once('.') {
        None => (kept, ""),
        Some((int_part, rest)) => {
            let end = rest.find('.').unwrap_or(rest.len());
            (int_part, &rest[..end])
        }
    }
}

fn exact_parts(int_part: &str, frac_part: &str, multiplier: u64) -> Option<(u128, u128)> {
    let mantissa: u128 = format!("{int_part}{frac_part}").parse().ok()?;
    let scaled = mantissa.checked_mul(u128::from(multiplier))?;
    let divisor = 10u128.checked_pow(u32::try_from(frac_part.len()).ok()?)?;
    Some((scaled, divisor))
}

fn scale_decimal(int_part: &str, frac_part: &str, multiplier: u64) -> f64 {
    match exact_parts(int_part, frac_part, multiplier) {
        Some((scaled, divisor)) if scaled % divisor == 0 => (scaled / divisor) as f64,
        Some((scaled, divisor)) => scaled as f64 / divisor as f64,
        None => {
            let literal = format!("{}.{}", non_empty(int_part), non_empty(frac_part));
            literal.parse::<f64>().unwrap_or(0.0) * multiplier as f64
        }
    }
}

fn non_empty(digits: &str) -> &str {
    if digits.is_empty() { "0" } else { digits }
}

/// Render `current` with `suffix`.
///
/// The value is floored first; thousands and millions are then shown with
/// one decimal, rounded half up.
#[must_use]
pub fn format_display(current: f64, suffix: Suffix) -> String {
    let floored = if current.is_finite() && current > 0.0 {
        current.floor()
    } else {
        0.0
    };
    if floored >= U64_LIMIT {
        return format_wide(floored, suffix);
    }
    let n = floored as u64;
    match suffix {
        Suffix::None => n.to_string(),
        Suffix::Percent => format!("{n}%"),
        Suffix::Thousand => one_decimal(n, 1_000, 'K'),
        Suffix::Million => one_decimal(n, 1_000_000, 'M'),
    }
}

/// 2^64: the first float that no longer fits a `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Values past the integer range are formatted from the float itself.
fn format_wide(floored: f64, suffix: Suffix) -> String {
    match suffix {
        Suffix::None => format!("{floored:.0}"),
        Suffix::Percent => format!("{floored:.0}%"),
        Suffix::Thousand => format!("{:.1}K", floored / 1_000.0),
        Suffix::Million => format!("{:.1}M", floored / 1_000_000.0),
    }
}

fn one_decimal(n: u64, unit: u64, mark: char) -> String {
    let tenth = unit / 10;
    let tenths = n.saturating_add(tenth / 2) / tenth;
    format!("{}.{}{mark}", tenths / 10, tenths % 10)
}

// ---------------------------------------------------------------------------
// Ramp state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    Idle,
    Running,
    Done,
}

/// Linear count from zero to a target.
#[derive(Debug, Clone)]
pub struct CounterRamp {
    element: ElementId,
    target: CounterTarget,
    increment: f64,
    current: f64,
    ticks: u32,
    state: RampState,
}

impl CounterRamp {
    #[must_use]
    pub fn new(element: ElementId, target: CounterTarget, duration: Duration, tick: Duration) -> Self {
        let steps = duration.as_micros() as f64 / tick.as_micros().max(1) as f64;
        let increment = if steps > 0.0 {
            target.value / steps
        } else {
            target.value
        };
        Self {
            element,
            target,
            increment,
            current: 0.0,
            ticks: 0,
            state: RampState::Idle,
        }
    }

    /// `Idle -> Running`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RampState::Idle {
            return Err(LumenError::CounterReentry { id: self.element });
        }
        self.state = RampState::Running;
        Ok(())
    }

    /// Advance one tick and return the new display text; `None` unless
    /// running.
    pub fn tick(&mut self) -> Option<String> {
        if self.state != RampState::Running {
            return None;
        }
        self.ticks += 1;
        self.current += self.increment;
        if self.current >= self.target.value || self.increment <= 0.0 {
            self.current = self.target.value;
            self.state = RampState::Done;
        }
        Some(self.display())
    }

    #[must_use]
    pub fn display(&self) -> String {
        format_display(self.current, self.target.suffix)
    }

    #[must_use]
    pub fn state(&self) -> RampState {
        self.state
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == RampState::Done
    }

    #[must_use]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[must_use]
    pub fn target(&self) -> CounterTarget {
        self.target
    }

    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

/// Result of [`CounterAnimator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// The ramp reached its target; cancel `timer`.
    Finished { timer: Option<TimerHandle> },
    /// No running ramp for the element.
    Inactive,
}

/// Observes counter elements and drives their ramps.
#[derive(Debug, Clone)]
pub struct CounterAnimator {
    selector: Selector,
    observer: VisibilityObserver,
    duration: Duration,
    tick: Duration,
    ramps: AHashMap<ElementId, CounterRamp>,
    timers: AHashMap<ElementId, TimerHandle>,
    skipped: usize,
}

impl CounterAnimator {
    pub fn new(config: &CounterConfig) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(&config.selector)?,
            observer: VisibilityObserver::new(ObserverOptions {
                threshold: config.threshold,
                root_margin: config.margin()?,
            }),
            duration: config.duration(),
            tick: config.tick(),
            ramps: AHashMap::new(),
            timers: AHashMap::new(),
            skipped: 0,
        })
    }

    /// Observe every counter element; returns how many were added.
    pub fn register<S: Surface + ?Sized>(&mut self, surface: &S) -> usize {
        surface
            .query(&self.selector)
            .into_iter()
            .filter(|&id| !self.ramps.contains_key(&id) && self.observer.observe(id))
            .count()
    }

    pub fn check<S: Surface + ?Sized>(&mut self, surface: &S) -> Vec<Crossing> {
        self.observer.check(surface)
    }

    pub fn notify(&mut self, element: ElementId, ratio: f64) -> Option<Crossing> {
        self.observer.notify(element, ratio)
    }

    /// Start a ramp for a crossing element.
    ///
    /// Returns the tick interval when a ramp started; the caller schedules a
    /// repeating timer and hands its handle to [`Self::attach_timer`].
    pub fn on_crossing<S: Surface + ?Sized>(&mut self, surface: &S, crossing: Crossing) -> Option<Duration> {
        let id = crossing.target;
        if !self.observer.unobserve(id) {
            return None;
        }
        let text = surface.text(id).unwrap_or_default();
        let target = match parse_target(&text) {
            Ok(target) => target,
            Err(err) => {
                self.skipped += 1;
                tracing::warn!(message = "counter.skip", element = id.get(), %err);
                return None;
            }
        };
        let mut ramp = CounterRamp::new(id, target, self.duration, self.tick);
        if let Err(err) = ramp.start() {
            tracing::warn!(message = "counter.skip", element = id.get(), %err);
            return None;
        }
        tracing::debug!(
            message = "counter.start",
            element = id.get(),
            target = target.value,
            text = %text
        );
        self.ramps.insert(id, ramp);
        Some(self.tick)
    }

    pub fn attach_timer(&mut self, element: ElementId, timer: TimerHandle) {
        self.timers.insert(element, timer);
    }

    /// Advance the ramp of `element` by one tick and write its text.
    pub fn step<S: Surface + ?Sized>(&mut self, surface: &mut S, element: ElementId) -> StepOutcome {
        let Some(ramp) = self.ramps.get_mut(&element) else {
            return StepOutcome::Inactive;
        };
        let Some(text) = ramp.tick() else {
            return StepOutcome::Inactive;
        };
        surface.set_text(element, &text);
        if ramp.is_done() {
            tracing::debug!(
                message = "counter.done",
                element = element.get(),
                ticks = ramp.ticks(),
                text = %text
            );
            return StepOutcome::Finished {
                timer: self.timers.remove(&element),
            };
        }
        StepOutcome::Running
    }

    #[must_use]
    pub fn ramp(&self, element: ElementId) -> Option<&CounterRamp> {
        self.ramps.get(&element)
    }

    #[must_use]
    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    /// Counters whose text could not be parsed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn running(&self) -> usize {
        self.ramps
            .values()
            .filter(|ramp| ramp.state() == RampState::Running)
            .count()
    }

    /// Stop observing; returns the timers the caller must cancel.
    pub fn dispose(&mut self) -> Vec<TimerHandle> {
        self.observer.disconnect();
        self.timers.drain().map(|(_, timer)| timer).collect()
    }
}
