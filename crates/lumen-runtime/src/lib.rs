#![forbid(unsafe_code)]

//! Lumen runtime: the landing page's scroll-driven reveal engine.
//!
//! - [`observer`]: threshold-based visibility observer
//! - [`reveal`]: one-shot reveal transitions, with staggering
//! - [`counter`]: numeric counter ramps
//! - [`scroll`]: throttled scroll reactor (navbar chrome, parallax)
//! - [`hero`], [`interactions`]: intro sequence and click/hover wiring
//! - [`page`]: the controller that ties them to a surface and a clock

pub mod config;
pub mod counter;
pub mod hero;
pub mod interactions;
pub mod observer;
pub mod page;
pub mod reveal;
pub mod scroll;
pub mod stagger;

pub use config::LumenConfig;
pub use page::{Dispatch, Msg, Page, PageStats, Phase};
