//! E2E fault injection: scroll storms against the throttled scroll reactor.
//!
//! Replays deterministic scroll bursts through the reference landing page
//! and verifies:
//! 1. A burst of 50 scrolls within 5 ms produces exactly one settle, no
//!    earlier than 16 ms after the last scroll
//! 2. Jittered bursts with any seed behave the same
//! 3. Scrolls spaced wider than the debounce settle individually
//! 4. Separate bursts settle separately
//! 5. Effects read the offset at settle time
//! 6. Structured JSONL evidence is complete
//! 7. The same seed produces the same mutation journal

#![forbid(unsafe_code)]

use lumen_core::Surface;
use lumen_core::style::StyleProp;
use lumen_harness::storm::{ScrollStorm, StormReport, run_storm_with_logging};
use lumen_harness::{BurstPattern, JournalTrace, PageHarness, ScrollStormConfig, generate_storm, run_storm};
use lumen_runtime::LumenConfig;
use lumen_runtime::scroll::parallax_transform;
use web_time::Duration;

// ── Helpers ─────────────────────────────────────────────────────────────

const DEBOUNCE: Duration = Duration::from_millis(16);

fn booted() -> PageHarness {
    PageHarness::boot(LumenConfig::default()).expect("landing page boots")
}

fn burst(count: usize, span_ms: u64, from: f64, to: f64) -> ScrollStorm {
    generate_storm(&ScrollStormConfig::new(
        BurstPattern::Burst {
            count,
            span: Duration::from_millis(span_ms),
            from,
            to,
        },
        42,
    ))
}

fn assert_single_trailing_settle(report: &StormReport) {
    assert_eq!(report.settled_at.len(), 1, "settles: {:?}", report.settled_at);
    let last = report.last_event_at.expect("events were injected");
    assert_eq!(report.settled_at[0], last + DEBOUNCE);
}

// ═════════════════════════════════════════════════════════════════════════
// Test 1: 50 scrolls in 5 ms → one settle, 16 ms after the last
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_fifty_scrolls_one_settle() {
    let mut h = booted();
    h.advance_ms(250);
    let report = run_storm(&mut h, &burst(50, 5, 0.0, 1500.0));
    assert_eq!(report.events, 50);
    assert_single_trailing_settle(&report);
    assert_eq!(report.coalesced, 49);
    assert_eq!(h.stats().scroll_settles, 1);
}

// ═════════════════════════════════════════════════════════════════════════
// Test 2: Jittered bursts, many seeds
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_jittered_bursts_settle_once() {
    for seed in 0..32 {
        let storm = generate_storm(&ScrollStormConfig::new(
            BurstPattern::Jittered {
                count: 50,
                span: Duration::from_millis(5),
                from: 800.0,
            },
            seed,
        ));
        let mut h = booted();
        let report = run_storm(&mut h, &storm);
        assert_single_trailing_settle(&report);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Test 3: Spacing relative to the debounce quantum
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_sparse_scrolls_settle_individually() {
    let storm = generate_storm(&ScrollStormConfig::new(
        BurstPattern::Trickle {
            count: 10,
            gap: Duration::from_millis(20),
            step: 40.0,
        },
        1,
    ));
    let mut h = booted();
    let report = run_storm(&mut h, &storm);
    assert_eq!(report.settled_at.len(), 10);
    assert_eq!(report.coalesced, 0);
    for (i, at) in report.settled_at.iter().enumerate() {
        assert_eq!(*at, Duration::from_millis(20) * i as u32 + DEBOUNCE);
    }
}

#[test]
fn e2e_dense_trickle_coalesces() {
    let storm = generate_storm(&ScrollStormConfig::new(
        BurstPattern::Trickle {
            count: 10,
            gap: Duration::from_millis(15),
            step: 40.0,
        },
        1,
    ));
    let mut h = booted();
    let report = run_storm(&mut h, &storm);
    assert_single_trailing_settle(&report);
}

// ═════════════════════════════════════════════════════════════════════════
// Test 4: Separate bursts
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_flicks_settle_per_burst() {
    let storm = generate_storm(&ScrollStormConfig::new(
        BurstPattern::Flick {
            bursts: 4,
            per_burst: 8,
            pause: Duration::from_millis(60),
        },
        9,
    ));
    let mut h = booted();
    let report = run_storm(&mut h, &storm);
    assert_eq!(report.events, 32);
    assert_eq!(report.settled_at.len(), 4);
    assert_eq!(report.coalesced, 28);
}

// ═════════════════════════════════════════════════════════════════════════
// Test 5: Effects use the offset at settle time
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_settle_reads_final_offset() {
    let mut h = booted();
    run_storm(&mut h, &burst(20, 4, 0.0, 240.0));
    let ids = h.ids().clone();
    assert_eq!(
        h.style(ids.navbar, StyleProp::Background).as_deref(),
        Some("rgba(255, 255, 255, 0.98)")
    );
    assert_eq!(
        h.style(ids.shapes[0], StyleProp::Transform),
        Some(parallax_transform(0, 240.0, 0.5, 0.1, 0.1).to_string())
    );

    // Scroll back up past the threshold: chrome rests again.
    run_storm(&mut h, &burst(20, 4, 240.0, 60.0));
    assert_eq!(h.doc().viewport().scroll_y, 60.0);
    assert_eq!(
        h.style(ids.navbar, StyleProp::BoxShadow).as_deref(),
        Some("0 4px 20px rgba(0,0,0,0.08)")
    );
    assert_eq!(
        h.style(ids.shapes[2], StyleProp::Transform),
        Some(parallax_transform(2, 60.0, 0.5, 0.1, 0.1).to_string())
    );
}

#[test]
fn e2e_no_effects_before_quiet_period() {
    let mut h = booted();
    let navbar = h.ids().navbar;
    h.scroll_to(300.0);
    h.advance_ms(15);
    assert_eq!(h.style(navbar, StyleProp::Background), None);
    h.scroll_to(320.0);
    h.advance_ms(15);
    assert_eq!(h.style(navbar, StyleProp::Background), None);
    h.advance_ms(1);
    assert!(h.style(navbar, StyleProp::Background).is_some());
}

// ═════════════════════════════════════════════════════════════════════════
// Test 6: JSONL evidence
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_jsonl_evidence_complete() {
    let mut h = booted();
    let storm = burst(50, 5, 0.0, 900.0);
    let (report, log_lines) = run_storm_with_logging(&mut h, &storm);

    let mut kinds = Vec::new();
    for line in &log_lines {
        let val: serde_json::Value = serde_json::from_str(line).expect("valid json line");
        kinds.push(val["event"].as_str().expect("event field").to_string());
    }
    assert_eq!(kinds.first().map(String::as_str), Some("start"));
    assert_eq!(kinds.last().map(String::as_str), Some("complete"));
    assert_eq!(kinds.iter().filter(|k| *k == "inject").count(), 50);
    assert_eq!(kinds.iter().filter(|k| *k == "settle").count(), 1);

    let complete: serde_json::Value =
        serde_json::from_str(log_lines.last().expect("complete line")).expect("json");
    assert_eq!(complete["events"], 50);
    assert_eq!(complete["settles"], report.settled_at.len());
}

// ═════════════════════════════════════════════════════════════════════════
// Test 7: Determinism
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn e2e_same_seed_same_journal() {
    let config = ScrollStormConfig::new(
        BurstPattern::Jittered {
            count: 200,
            span: Duration::from_millis(400),
            from: 1200.0,
        },
        0xC0FFEE,
    )
    .with_tail(Duration::from_millis(2_500));

    let digest = || {
        let mut h = booted();
        let mut trace = JournalTrace::new();
        run_storm(&mut h, &generate_storm(&config));
        trace.capture(&mut h);
        trace.digest()
    };
    assert_eq!(digest(), digest());
}
