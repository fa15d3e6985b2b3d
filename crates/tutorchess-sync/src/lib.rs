//! Collaborative chess-position synchronization for TutorChess
//!
//! Keeps a teacher's and a student's views of a live position, move history
//! and board annotations consistent against a shared, eventually-delivered,
//! last-write-wins room store - with no central arbiter. Authority is a
//! convention enforced by role, not a server.
//!
//! # Architecture
//!
//! [`SessionController`] is the single synchronous gate for one room:
//! - local intents (attempt a move, navigate history, reset, annotate) and
//!   remote store events both funnel into it,
//! - it exclusively owns one [`tutorchess_board::BoardPosition`] and one
//!   [`MoveHistory`] per session,
//! - every accepted mutation pushes the complete derived [`RoomState`]
//!   through the [`RemoteStore`] port,
//! - every incoming [`RoomState`] replaces position, history and cursor
//!   together, atomically, never partially.
//!
//! One event is processed to completion before the next, whether locally or
//! remotely sourced; that serialization is what makes locks unnecessary.
//!
//! The rendering layer is read-only with respect to this state: it consumes
//! [`BoardView`] and submits intents rather than direct mutations.

mod controller;
mod error;
mod history;
pub mod pgn;
mod room;
mod store;

pub use controller::{
    AppliedMove, BoardView, MoveOutcome, RemoteOutcome, Role, SessionController, WriteAuthority,
};
pub use error::{SyncError, SyncResult};
pub use history::{HistoryEntry, MoveHistory};
pub use room::{Chapter, Orientation, RoomState, Shape, StateFingerprint};
pub use store::{InMemoryStore, RemoteStore};
