//! Shared room state - the wire shape every participant reads and writes
//!
//! [`RoomState`] is the full projection of one session: position, history,
//! cursor, annotations and chapter material. The authoritative participant
//! creates it on first use of a room; every accepted mutation overwrites it
//! wholesale; all participants read it reactively. It is never concurrently
//! mutated - each update replaces the previous document at the room-id
//! granularity (last write wins).
//!
//! Field names are camelCase on the wire to match the hosted document store
//! the rest of the product talks to.

use serde::{Deserialize, Serialize};
use tutorchess_board::Color;

/// Which side faces the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    pub fn toggle(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

impl From<Color> for Orientation {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Orientation::White,
            Color::Black => Orientation::Black,
        }
    }
}

/// An ephemeral board drawing: circle (no `dest`) or arrow
///
/// Shapes are per-position annotation, not part of permanent history; every
/// accepted move clears them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub orig: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    pub brush: String,
}

/// Prepared lesson material: a named PGN the teacher can switch to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub pgn: String,
}

/// The complete shared projection of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<(String, String)>,
    pub orientation: Orientation,
    /// SAN per ply
    pub history: Vec<String>,
    /// FEN snapshots; always `history.len() + 1` long
    pub fen_history: Vec<String>,
    /// Cursor into `history`; `-1` is the initial position
    pub current_index: i64,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_chapter_index: Option<usize>,
}

impl RoomState {
    /// The identity a participant compares incoming updates against to
    /// recognize the round-trip echo of its own write
    pub fn fingerprint(&self) -> StateFingerprint {
        StateFingerprint {
            fen: self.fen.clone(),
            current_index: self.current_index,
            history_len: self.history.len(),
        }
    }
}

/// Anti-feedback-loop identity of a pushed [`RoomState`]
///
/// Deliberately coarse: fen + cursor + history length. Shape or comment
/// edits by the other side must NOT be mistaken for an echo, so they are
/// excluded; a state matching all three fields displays identically anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFingerprint {
    fen: String,
    current_index: i64,
    history_len: usize,
}
