//! Evaluation service configuration
//!
//! Read once at startup from the environment, falling back to defaults with
//! a log line so a misconfigured deployment is visible rather than silent.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9377/eval";
const DEFAULT_TIMEOUT_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Base URL of the evaluation endpoint; the FEN goes in a query param
    pub endpoint: String,
    /// Per-request deadline
    pub timeout: Duration,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl EvalConfig {
    /// Configuration from `TUTORCHESS_EVAL_URL` / `TUTORCHESS_EVAL_TIMEOUT_MS`
    pub fn from_env() -> Self {
        let endpoint = match env::var("TUTORCHESS_EVAL_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                info!("[EVAL] TUTORCHESS_EVAL_URL not set, using {DEFAULT_ENDPOINT}");
                DEFAULT_ENDPOINT.to_string()
            }
        };
        let timeout = parse_timeout(env::var("TUTORCHESS_EVAL_TIMEOUT_MS").ok().as_deref());
        Self { endpoint, timeout }
    }
}

fn parse_timeout(raw: Option<&str>) -> Duration {
    match raw {
        None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!(
                    "[EVAL] unreadable TUTORCHESS_EVAL_TIMEOUT_MS {value:?}, \
                     using {DEFAULT_TIMEOUT_MS}ms"
                );
                Duration::from_millis(DEFAULT_TIMEOUT_MS)
            }
        },
    }
}
