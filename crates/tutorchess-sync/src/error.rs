//! Error types for the sync crate
//!
//! No variant here is fatal to the process. The recovery rules:
//! - [`SyncError::IllegalMove`] / [`SyncError::WriteDenied`]: the caller
//!   snaps the display back to the canonical position (which was never
//!   mutated) in the same tick.
//! - [`SyncError::RemoteSync`]: logged and ignored; stale local state is
//!   retained rather than partially applied.
//! - [`SyncError::InputFormat`]: surfaced to the user, board untouched.
//! - [`SyncError::Publish`]: the local mutation stays applied; retry via
//!   [`crate::SessionController::republish`] is the caller's responsibility.

use thiserror::Error;

/// Errors produced by the session controller and its collaborators
#[derive(Error, Debug)]
pub enum SyncError {
    /// A move intent that does not map onto any legal move
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The participant lacks write authority for this mutation
    #[error("write denied: {0}")]
    WriteDenied(&'static str),

    /// `submit_promotion` without a suspended promotion move
    #[error("no promotion is pending")]
    NoPendingPromotion,

    /// History navigation target outside `[-1, len - 1]`
    #[error("history index {index} out of range (len {len})")]
    CursorOutOfRange { index: isize, len: usize },

    /// Malformed or internally inconsistent incoming shared state
    #[error("remote state rejected: {0}")]
    RemoteSync(String),

    /// Unparseable injected PGN/FEN
    #[error("unreadable input: {0}")]
    InputFormat(String),

    /// Outbound publish to the room store failed
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
