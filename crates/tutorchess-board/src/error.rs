//! Error types for the board crate

use thiserror::Error;

/// Errors produced by position construction and move application
#[derive(Error, Debug)]
pub enum BoardError {
    /// Malformed or illegal FEN input (two kings, impossible en passant, ...)
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// A move that is not in the legal set of the current position
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A SAN token that does not parse or does not match a legal move
    #[error("unreadable SAN '{san}': {reason}")]
    BadSan { san: String, reason: String },
}

/// Result type alias for board operations
pub type BoardResult<T> = Result<T, BoardError>;
