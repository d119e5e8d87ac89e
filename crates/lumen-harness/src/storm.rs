#![forbid(unsafe_code)]

//! Scroll storm generation.
//!
//! Produces deterministic bursts of scroll samples (timestamp + offset) from
//! a [`BurstPattern`] and a seed, and replays them through a
//! [`PageHarness`], recording when the scroll reactor settled. Replay emits
//! JSONL evidence lines (`start`, `inject`, `settle`, `complete`).

use serde_json::json;
use web_time::Duration;

use crate::harness::PageHarness;

/// Shape of a storm.
#[derive(Debug, Clone, PartialEq)]
pub enum BurstPattern {
    /// `count` samples evenly spread over `span`, offsets moving linearly
    /// from `from` to `to`.
    Burst {
        count: usize,
        span: Duration,
        from: f64,
        to: f64,
    },
    /// `count` samples at seeded random times within `span`, offsets
    /// random-walking from `from`.
    Jittered {
        count: usize,
        span: Duration,
        from: f64,
    },
    /// `count` samples spaced `gap` apart.
    Trickle { count: usize, gap: Duration, step: f64 },
    /// `bursts` bursts of `per_burst` samples 1 ms apart, separated by
    /// `pause`.
    Flick {
        bursts: usize,
        per_burst: usize,
        pause: Duration,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollStormConfig {
    pub pattern: BurstPattern,
    pub seed: u64,
    /// Quiet time appended after the last sample.
    pub tail: Duration,
}

impl ScrollStormConfig {
    #[must_use]
    pub fn new(pattern: BurstPattern, seed: u64) -> Self {
        Self {
            pattern,
            seed,
            tail: Duration::from_millis(100),
        }
    }

    #[must_use]
    pub fn with_tail(mut self, tail: Duration) -> Self {
        self.tail = tail;
        self
    }
}

/// One scroll: at `at` after the storm starts, the page is at `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub at: Duration,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollStorm {
    pub config: ScrollStormConfig,
    pub samples: Vec<ScrollSample>,
}

impl ScrollStorm {
    /// Time of the last sample relative to the storm start.
    #[must_use]
    pub fn last_at(&self) -> Option<Duration> {
        self.samples.last().map(|s| s.at)
    }
}

/// xorshift64*; zero seeds are remapped.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.next_u64() % bound }
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[must_use]
pub fn generate_storm(config: &ScrollStormConfig) -> ScrollStorm {
    let mut rng = Rng::new(config.seed);
    let samples = match config.pattern {
        BurstPattern::Burst {
            count,
            span,
            from,
            to,
        } => {
            let last = count.saturating_sub(1).max(1) as u64;
            (0..count as u64)
                .map(|i| ScrollSample {
                    at: Duration::from_micros(micros(span) * i / last),
                    offset: from + (to - from) * i as f64 / last as f64,
                })
                .collect()
        }
        BurstPattern::Jittered { count, span, from } => {
            let mut times: Vec<u64> = (0..count).map(|_| rng.below(micros(span) + 1)).collect();
            times.sort_unstable();
            let mut offset = from;
            times
                .into_iter()
                .map(|t| {
                    offset = (offset + rng.below(81) as f64 - 40.0).max(0.0);
                    ScrollSample {
                        at: Duration::from_micros(t),
                        offset,
                    }
                })
                .collect()
        }
        BurstPattern::Trickle { count, gap, step } => (0..count)
            .map(|i| ScrollSample {
                at: gap.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)),
                offset: step * (i + 1) as f64,
            })
            .collect(),
        BurstPattern::Flick {
            bursts,
            per_burst,
            pause,
        } => {
            let burst_len = Duration::from_millis(per_burst.saturating_sub(1) as u64);
            let period = burst_len + pause;
            (0..bursts)
                .flat_map(|b| {
                    let start = period.saturating_mul(u32::try_from(b).unwrap_or(u32::MAX));
                    (0..per_burst).map(move |i| (start, b, i))
                })
                .map(|(start, b, i)| ScrollSample {
                    at: start + Duration::from_millis(i as u64),
                    offset: 200.0 * b as f64 + 10.0 * i as f64 + rng.below(5) as f64,
                })
                .collect()
        }
    };
    ScrollStorm {
        config: config.clone(),
        samples,
    }
}

/// What a replay observed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StormReport {
    pub events: usize,
    /// Absolute clock times at which the scroll reactor settled.
    pub settled_at: Vec<Duration>,
    /// Absolute clock time of the last injected sample.
    pub last_event_at: Option<Duration>,
    pub coalesced: u64,
}

fn advance_recording(harness: &mut PageHarness, until: Duration, report: &mut StormReport, log: &mut Vec<String>) {
    let before = harness.stats().scroll_settles;
    harness.advance_to(until);
    if harness.stats().scroll_settles > before {
        if let Some(at) = harness.page().scroll().last_settled_at() {
            report.settled_at.push(at);
            log.push(json!({"event": "settle", "t_us": micros(at)}).to_string());
        }
    }
}

/// Replay `storm` starting at the harness's current time.
pub fn run_storm(harness: &mut PageHarness, storm: &ScrollStorm) -> StormReport {
    run_storm_with_logging(harness, storm).0
}

/// [`run_storm`] plus JSONL evidence lines.
pub fn run_storm_with_logging(harness: &mut PageHarness, storm: &ScrollStorm) -> (StormReport, Vec<String>) {
    let mut report = StormReport::default();
    let mut log = Vec::with_capacity(storm.samples.len() + 2);
    let start = harness.now();
    let coalesced_before = harness.stats().scrolls_coalesced;
    log.push(
        json!({
            "event": "start",
            "seed": storm.config.seed,
            "samples": storm.samples.len(),
            "t_us": micros(start),
        })
        .to_string(),
    );

    for sample in &storm.samples {
        let at = start + sample.at;
        advance_recording(harness, at, &mut report, &mut log);
        harness.scroll_to(sample.offset);
        report.events += 1;
        report.last_event_at = Some(at);
        log.push(
            json!({
                "event": "inject",
                "t_us": micros(at),
                "offset": sample.offset,
            })
            .to_string(),
        );
    }
    let end = start + storm.last_at().unwrap_or_default() + storm.config.tail;
    advance_recording(harness, end, &mut report, &mut log);

    report.coalesced = harness.stats().scrolls_coalesced - coalesced_before;
    log.push(
        json!({
            "event": "complete",
            "events": report.events,
            "settles": report.settled_at.len(),
            "coalesced": report.coalesced,
        })
        .to_string(),
    );
    tracing::debug!(
        message = "storm.complete",
        events = report.events,
        settles = report.settled_at.len()
    );
    (report, log)
}
