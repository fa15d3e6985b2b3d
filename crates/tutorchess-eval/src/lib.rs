//! # TutorChess Eval
//!
//! Async client for the position-evaluation service. Lookups are keyed by
//! FEN only, so this crate is independent of the board and sync crates.
//!
//! # Architecture
//!
//! Evaluation is advisory: it feeds an overlay, never move legality. The
//! client therefore optimizes for responsiveness over completeness - at most
//! one request is outstanding per client, and starting a new analysis aborts
//! whatever was still in flight (last-request-wins). A position with no
//! cached evaluation is an ordinary `Ok(None)`, not an error.

mod client;
mod config;
mod error;

pub use client::{EvalClient, Evaluation, Score};
pub use config::EvalConfig;
pub use error::{EvalError, EvalResult};
