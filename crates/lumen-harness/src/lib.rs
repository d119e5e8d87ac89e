#![forbid(unsafe_code)]

//! Test harness for Lumen pages.
//!
//! - [`fixtures`]: the reference landing page document.
//! - [`harness`]: a lab-clock page driver.
//! - [`storm`]: seeded scroll storm generation and replay.
//! - [`trace`]: time-stamped mutation journals with blake3 digests.

pub mod fixtures;
pub mod harness;
pub mod storm;
pub mod trace;

pub use fixtures::LandingPage;
pub use harness::PageHarness;
pub use storm::{BurstPattern, ScrollStormConfig, generate_storm, run_storm};
pub use trace::{JournalTrace, journal_digest};
