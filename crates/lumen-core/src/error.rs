#![forbid(unsafe_code)]

//! Error taxonomy shared by the Lumen crates.

use thiserror::Error;

use crate::surface::ElementId;

pub type Result<T> = std::result::Result<T, LumenError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LumenError {
    #[error("counter text has no numeric content: {text:?}")]
    InvalidCounterFormat { text: String },

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unknown element: {id}")]
    UnknownElement { id: ElementId },

    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("counter ramp for element {id} started twice")]
    CounterReentry { id: ElementId },
}

impl LumenError {
    #[must_use]
    pub fn selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
