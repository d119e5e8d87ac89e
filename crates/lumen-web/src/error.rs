#![forbid(unsafe_code)]

//! Runner errors.

use lumen_core::LumenError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Page(#[from] LumenError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("time must be a finite, non-negative number of milliseconds, got {0}")]
    InvalidTime(f64),
}
