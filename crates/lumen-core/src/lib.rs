#![forbid(unsafe_code)]

//! Core: render surface contract, in-memory document, selectors, geometry,
//! clocks, timers and subscriptions.

pub mod clock;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod selector;
pub mod style;
pub mod subscription;
pub mod surface;
pub mod timer;

pub use error::{LumenError, Result};
pub use surface::{ElementId, ElementSpec, Surface};
