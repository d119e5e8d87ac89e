#![forbid(unsafe_code)]

//! Lumen public facade crate.
//!
//! Re-exports the document model and, with the default `runtime` feature,
//! the page controller.

pub mod prelude {
    pub use lumen_core as core;
    pub use lumen_core::clock::{Clock, LabClock, SystemClock};
    pub use lumen_core::document::Document;
    pub use lumen_core::event::PageEvent;
    pub use lumen_core::geometry::{Rect, Viewport};
    pub use lumen_core::{ElementId, LumenError, Surface};

    #[cfg(feature = "runtime")]
    pub use lumen_runtime as runtime;
    #[cfg(feature = "runtime")]
    pub use lumen_runtime::{Dispatch, LumenConfig, Page};
}
