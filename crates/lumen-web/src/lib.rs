#![forbid(unsafe_code)]

//! Web runner for Lumen pages.
//!
//! [`RunnerCore`] wraps a [`Page`](lumen_runtime::Page) over an in-memory
//! [`Document`](lumen_core::document::Document) built from a host snapshot.
//! The host drives it: it pushes JSON-encoded events, reports time, calls
//! `step`, and applies the drained mutation patches to the real DOM. On
//! `wasm32` the same API is exported to JavaScript as `PageRunner`.
//!
//! Native builds use [`RunnerCore`] directly, which is also how the runner
//! is tested.

pub mod error;
pub mod runner_core;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use error::{Result, WebError};
pub use runner_core::{RunnerCore, StepResult};

#[cfg(target_arch = "wasm32")]
pub use wasm::PageRunner;
