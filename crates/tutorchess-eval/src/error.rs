//! Evaluation client errors
//!
//! None of these are fatal to a session: callers clear the eval overlay and
//! move on. `Superseded` in particular is the expected outcome for every
//! request overtaken by a newer position.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("evaluation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status other than 404
    #[error("evaluation service returned status {0}")]
    Status(u16),

    /// The response body was not a readable evaluation
    #[error("unreadable evaluation response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A newer analysis request aborted this one
    #[error("analysis superseded by a newer request")]
    Superseded,
}

pub type EvalResult<T> = Result<T, EvalError>;
