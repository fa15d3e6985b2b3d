//! Chess rules for TutorChess - position validation, legality and notation
//!
//! This crate wraps the `shakmaty` rules engine behind [`BoardPosition`],
//! making it the single source of truth for all chess logic in a tutoring
//! session.
//!
//! # Architecture
//!
//! The board crate is authoritative for:
//! - FEN parsing and emission
//! - Legal move generation (pins, checks, castling, en passant)
//! - SAN generation with disambiguation and check/mate suffixes
//! - Check/checkmate/stalemate/draw detection
//!
//! The sync layer is responsible for:
//! - History and cursor bookkeeping
//! - Deciding which moves are allowed to happen at all (write authority)
//! - Replicating accepted positions to the shared store
//!
//! A [`BoardPosition`] is only ever constructed from the standard starting
//! position, a validated FEN, or a legal move applied to another
//! `BoardPosition`, so every value is reachable through legal play.

mod error;
mod position;

pub use error::{BoardError, BoardResult};
pub use position::{BoardPosition, MoveKind, MoveLookup};

// Re-export the shakmaty vocabulary the sync layer speaks.
pub use shakmaty::{Color, Move, Role, Square};
