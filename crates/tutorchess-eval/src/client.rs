//! The evaluation client and its wire types
//!
//! One GET per analysis, FEN in the query string. The wire shape carries the
//! score as either `score_centipawns` or `mate`; both decode into [`Score`].
//!
//! Cancellation model: the client keeps the [`AbortHandle`] of the in-flight
//! request in a mutex-guarded slot. A new `analyze` call aborts whatever the
//! slot holds before registering itself, so the superseded caller observes
//! [`EvalError::Superseded`] while the newest request proceeds. Aborting an
//! already-finished future is a no-op, so stale handles in the slot are
//! harmless.

use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};

/// Engine verdict for one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Advantage in centipawns from White's point of view
    Centipawns(i32),
    /// Forced mate in this many moves (negative: the side to move is mated)
    Mate(i32),
}

/// A decoded evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub depth: u32,
    pub score: Score,
    pub best_move: Option<String>,
    pub principal_variations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireEvaluation {
    depth: u32,
    #[serde(default)]
    score_centipawns: Option<i32>,
    #[serde(default)]
    mate: Option<i32>,
    #[serde(rename = "bestMove", default)]
    best_move: Option<String>,
    #[serde(rename = "principalVariations", default)]
    principal_variations: Vec<String>,
}

impl TryFrom<WireEvaluation> for Evaluation {
    type Error = EvalError;

    fn try_from(wire: WireEvaluation) -> EvalResult<Self> {
        use serde::de::Error as _;
        // A mate score outranks a centipawn score if the service sends both.
        let score = match (wire.mate, wire.score_centipawns) {
            (Some(mate), _) => Score::Mate(mate),
            (None, Some(cp)) => Score::Centipawns(cp),
            (None, None) => {
                return Err(EvalError::Decode(serde_json::Error::custom(
                    "neither score_centipawns nor mate present",
                )))
            }
        };
        Ok(Self {
            depth: wire.depth,
            score,
            best_move: wire.best_move,
            principal_variations: wire.principal_variations,
        })
    }
}

/// Cancellable analysis client; at most one outstanding request
pub struct EvalClient {
    http: reqwest::Client,
    config: EvalConfig,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl EvalClient {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            in_flight: Mutex::new(None),
        }
    }

    /// Client configured from the environment
    pub fn from_env() -> Self {
        Self::new(EvalConfig::from_env())
    }

    /// Request an evaluation for `fen`, aborting any in-flight request
    ///
    /// `Ok(None)` means the service has no evaluation for this position
    /// (HTTP 404 or an empty body) - an ordinary outcome, not a failure.
    pub async fn analyze(&self, fen: &str) -> EvalResult<Option<Evaluation>> {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.in_flight.lock().replace(handle) {
            debug!("[EVAL] aborting superseded analysis");
            previous.abort();
        }

        match Abortable::new(self.fetch(fen), registration).await {
            Ok(result) => result,
            Err(_aborted) => Err(EvalError::Superseded),
        }
    }

    async fn fetch(&self, fen: &str) -> EvalResult<Option<Evaluation>> {
        debug!("[EVAL] requesting analysis for {fen}");
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[("fen", fen)])
            .timeout(self.config.timeout)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("[EVAL] no evaluation available");
            return Ok(None);
        }
        if !response.status().is_success() {
            warn!("[EVAL] service returned {}", response.status());
            return Err(EvalError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        let wire: WireEvaluation = serde_json::from_slice(&body)?;
        let evaluation = Evaluation::try_from(wire)?;
        debug!(
            "[EVAL] depth {} score {:?}",
            evaluation.depth, evaluation.score
        );
        Ok(Some(evaluation))
    }
}
