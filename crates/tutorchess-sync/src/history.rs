//! Move history with a navigation cursor
//!
//! Maintains two length-linked records of a session: the SAN move list and
//! the FEN snapshot after every ply, plus a cursor for time-travel
//! navigation. The cursor ranges over `[-1, len - 1]`, where `-1` denotes
//! the initial position.
//!
//! # Branch policy
//!
//! Recording a move while the cursor is behind the tip **truncates** every
//! entry after the cursor before appending - a destructive branch-overwrite,
//! not a fork. No redo tree is kept: reviewing history and then moving
//! discards the original continuation. This is deliberate; a tutoring
//! session wants one shared line, not a variation forest.
//!
//! # Invariants
//!
//! - wire projection: `fens().len() == sans().len() + 1`
//! - `fens()[i + 1]` is the position after applying `sans()[i]` to `fens()[i]`
//! - `-1 <= cursor <= len - 1`; the displayed position is `fens()[cursor + 1]`

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// One ply: the SAN string and the FEN snapshot after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub san: String,
    pub fen: String,
}

/// Ordered move/snapshot pairs plus the navigation cursor
#[derive(Debug, Clone)]
pub struct MoveHistory {
    initial_fen: String,
    entries: Vec<HistoryEntry>,
    cursor: isize,
}

impl MoveHistory {
    /// Empty history rooted at `initial_fen`, cursor at the initial position
    pub fn new(initial_fen: impl Into<String>) -> Self {
        Self {
            initial_fen: initial_fen.into(),
            entries: Vec::new(),
            cursor: -1,
        }
    }

    /// Number of recorded plies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cursor value in `[-1, len - 1]`
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Whether the cursor sits on the latest recorded ply
    pub fn at_tip(&self) -> bool {
        self.cursor == self.entries.len() as isize - 1
    }

    /// Whether the cursor has been navigated back from the tip
    pub fn behind_tip(&self) -> bool {
        !self.at_tip()
    }

    /// FEN of the position the cursor points at
    pub fn current_fen(&self) -> &str {
        self.fen_at(self.cursor)
            .unwrap_or(self.initial_fen.as_str())
    }

    /// FEN snapshot for an arbitrary cursor value, without moving the cursor
    pub fn fen_at(&self, index: isize) -> SyncResult<&str> {
        if index == -1 {
            return Ok(&self.initial_fen);
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|e| e.fen.as_str())
            .ok_or(SyncError::CursorOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// The FEN the history is rooted at
    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    /// Record a ply at the cursor
    ///
    /// At the tip this appends; behind the tip it first discards every entry
    /// after the cursor (see the branch policy above). The cursor always
    /// ends on the new tip.
    pub fn record(&mut self, san: impl Into<String>, fen: impl Into<String>) {
        let keep = (self.cursor + 1) as usize;
        if keep < self.entries.len() {
            info!(
                "[HISTORY] branch overwrite: discarding {} plies after index {}",
                self.entries.len() - keep,
                self.cursor
            );
            self.entries.truncate(keep);
        }
        self.entries.push(HistoryEntry {
            san: san.into(),
            fen: fen.into(),
        });
        self.cursor = self.entries.len() as isize - 1;
    }

    /// Move the cursor without touching the entries
    ///
    /// Out-of-range targets are rejected with no side effect; callers are
    /// expected to clamp before calling.
    pub fn go_to(&mut self, index: isize) -> SyncResult<()> {
        if index < -1 || index >= self.entries.len() as isize {
            return Err(SyncError::CursorOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        debug!("[HISTORY] cursor {} -> {}", self.cursor, index);
        self.cursor = index;
        Ok(())
    }

    /// Clear to a single initial snapshot; irreversible for the session
    pub fn reset(&mut self, initial_fen: impl Into<String>) {
        self.initial_fen = initial_fen.into();
        self.entries.clear();
        self.cursor = -1;
    }

    /// Wire projection: SAN per ply
    pub fn sans(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.san.clone()).collect()
    }

    /// Wire projection: initial FEN followed by the snapshot after every ply
    pub fn fens(&self) -> Vec<String> {
        let mut fens = Vec::with_capacity(self.entries.len() + 1);
        fens.push(self.initial_fen.clone());
        fens.extend(self.entries.iter().map(|e| e.fen.clone()));
        fens
    }

    /// Rebuild a history from the wire arrays, validating the invariants
    ///
    /// Rejects length-unlinked arrays and out-of-range cursors with
    /// [`SyncError::RemoteSync`]; the caller treats that as unreadable
    /// remote state and keeps what it has.
    pub fn from_wire(
        history: &[String],
        fen_history: &[String],
        current_index: i64,
    ) -> SyncResult<Self> {
        if fen_history.len() != history.len() + 1 {
            return Err(SyncError::RemoteSync(format!(
                "length-linked histories expected, got {} moves / {} snapshots",
                history.len(),
                fen_history.len()
            )));
        }
        if current_index < -1 || current_index >= history.len() as i64 {
            return Err(SyncError::RemoteSync(format!(
                "cursor {} out of range for {} moves",
                current_index,
                history.len()
            )));
        }
        let entries = history
            .iter()
            .zip(fen_history.iter().skip(1))
            .map(|(san, fen)| HistoryEntry {
                san: san.clone(),
                fen: fen.clone(),
            })
            .collect();
        Ok(Self {
            initial_fen: fen_history[0].clone(),
            entries,
            cursor: current_index as isize,
        })
    }
}
