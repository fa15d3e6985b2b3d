//! Session controller - the reconciliation state machine
//!
//! One [`SessionController`] per participant per room. It is the single
//! synchronous gate for all engine/history mutation and the single source of
//! outbound writes. Two input channels feed it:
//!
//! - local intents from the UI collaborator: [`SessionController::attempt_move`],
//!   [`SessionController::navigate`], [`SessionController::reset`],
//!   annotation and ingestion calls - synchronous;
//! - remote store events: [`SessionController::apply_remote`] - arbitrary
//!   timing and order, at-least-once delivery assumed.
//!
//! # Why no locks
//!
//! A local move and an interleaved remote update cannot produce a
//! partially-consistent state: local appends always truncate-then-append
//! relative to the controller's own last-known cursor, and remote updates
//! always replace position, histories and cursor together or not at all.
//! Full-state replacement substitutes for distributed locking.
//!
//! # Authority
//!
//! There is no server arbitrating writes. [`WriteAuthority`] is the single
//! capability gate: moving while reviewing history, broadcasting navigation,
//! propagating annotations and resets all consult the same `can_write` flag
//! derived from the participant's role. Nothing else in the crate compares
//! roles.

use tracing::{debug, info, warn};
use tutorchess_board::{BoardPosition, Color, MoveKind, MoveLookup, Role as PieceRole, Square};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::history::MoveHistory;
use crate::pgn::{self, ImportedGame};
use crate::room::{Chapter, Orientation, RoomState, Shape, StateFingerprint};
use crate::store::RemoteStore;

/// Session role of the local participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The authoritative participant; mutates and broadcasts canonical state
    Teacher,
    /// Follows the canonical state; may move at the tip, navigates locally
    Student,
}

/// The centralized capability gate (see module docs)
#[derive(Debug, Clone, Copy)]
pub struct WriteAuthority {
    can_write: bool,
}

impl WriteAuthority {
    pub fn for_role(role: Role) -> Self {
        Self {
            can_write: role == Role::Teacher,
        }
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }
}

/// Feedback for an accepted move - the side-effect notification channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub san: String,
    pub kind: MoveKind,
    /// The opponent is now in check
    pub check: bool,
    /// The move ended the game
    pub game_over: bool,
}

/// Result of a local move intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was accepted, recorded and published
    Applied(AppliedMove),
    /// A promotion piece is required; the move is suspended until
    /// [`SessionController::submit_promotion`] supplies one
    PromotionPending,
}

/// Result of feeding a remote update through the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The update matched the last local push; nothing was re-derived
    OwnEcho,
    /// The incoming state was adopted wholesale
    Applied,
}

/// Read-only snapshot for the rendering layer
#[derive(Debug, Clone)]
pub struct BoardView {
    pub fen: String,
    pub turn: Color,
    pub check: bool,
    pub game_over: bool,
    pub dests: std::collections::HashMap<Square, Vec<Square>>,
    pub last_move: Option<(String, String)>,
    pub orientation: Orientation,
    pub current_index: i64,
    pub sans: Vec<String>,
}

/// A move suspended between promotion detection and piece selection
#[derive(Debug, Clone, Copy)]
struct PendingPromotion {
    from: Square,
    to: Square,
}

/// The reconciliation controller for one room
pub struct SessionController<S: RemoteStore> {
    session_id: Uuid,
    board: BoardPosition,
    history: MoveHistory,
    orientation: Orientation,
    shapes: Vec<Shape>,
    comment: Option<String>,
    chapters: Vec<Chapter>,
    active_chapter: Option<usize>,
    last_move: Option<(String, String)>,
    authority: WriteAuthority,
    store: S,
    last_pushed: Option<StateFingerprint>,
    pending_promotion: Option<PendingPromotion>,
}

impl<S: RemoteStore> SessionController<S> {
    /// Controller at the standard starting position
    pub fn new(role: Role, store: S) -> Self {
        let board = BoardPosition::startpos();
        let history = MoveHistory::new(board.fen());
        let session_id = Uuid::new_v4();
        info!("[SYNC] session {session_id} created as {role:?}");
        Self {
            session_id,
            board,
            history,
            orientation: Orientation::White,
            shapes: Vec::new(),
            comment: None,
            chapters: Vec::new(),
            active_chapter: None,
            last_move: None,
            authority: WriteAuthority::for_role(role),
            store,
            last_pushed: None,
            pending_promotion: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// `LOCAL_USER_MOVE`: attempt a move on the displayed position
    ///
    /// Rejections never mutate: the UI snaps back by re-reading [`Self::view`]
    /// in the same tick. A promotion-eligible move suspends until
    /// [`Self::submit_promotion`].
    pub fn attempt_move(&mut self, from: Square, to: Square) -> SyncResult<MoveOutcome> {
        if self.history.behind_tip() && !self.authority.can_write() {
            warn!("[SYNC] move {from}{to} denied: reviewing history without write authority");
            return Err(SyncError::WriteDenied(
                "only the teacher may move while the cursor is behind the tip",
            ));
        }
        // A fresh intent supersedes any suspended promotion.
        self.pending_promotion = None;

        match self.board.classify(from, to, None) {
            MoveLookup::NeedsPromotion => {
                info!("[SYNC] {from}{to} needs a promotion piece, suspending");
                self.pending_promotion = Some(PendingPromotion { from, to });
                Ok(MoveOutcome::PromotionPending)
            }
            MoveLookup::Legal(m) => self.commit_move(&m),
            MoveLookup::Illegal => {
                warn!("[SYNC] rejected illegal move {from}{to}");
                Err(SyncError::IllegalMove(format!("{from}{to}")))
            }
        }
    }

    /// Complete a suspended promotion with the selected piece
    pub fn submit_promotion(&mut self, piece: PieceRole) -> SyncResult<MoveOutcome> {
        let pending = self
            .pending_promotion
            .take()
            .ok_or(SyncError::NoPendingPromotion)?;
        match self.board.classify(pending.from, pending.to, Some(piece)) {
            MoveLookup::Legal(m) => self.commit_move(&m),
            _ => Err(SyncError::IllegalMove(format!(
                "{}{}={piece:?}",
                pending.from, pending.to
            ))),
        }
    }

    /// Abandon a suspended promotion (e.g. the selector was dismissed)
    pub fn cancel_promotion(&mut self) {
        self.pending_promotion = None;
    }

    /// `LOCAL_NAV`: move the cursor, loading the matching snapshot
    ///
    /// The target is clamped into `[-1, len - 1]`. Pure cursor move - the
    /// entries are untouched. Only the authoritative participant's
    /// navigation is broadcast; everyone else navigates locally.
    pub fn navigate(&mut self, target: i64) -> SyncResult<()> {
        let clamped = (target.clamp(-1, self.history.len() as i64 - 1)) as isize;
        let board = BoardPosition::from_fen(self.history.fen_at(clamped)?)
            .map_err(|e| SyncError::RemoteSync(format!("unreadable snapshot: {e}")))?;
        self.history.go_to(clamped)?;
        self.board = board;
        self.pending_promotion = None;
        debug!("[SYNC] navigated to ply {clamped}");
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// `LOCAL_RESET`: back to the standard starting position
    ///
    /// Irreversible for the session. Broadcast only with write authority so
    /// a student resetting their view cannot clobber the shared room.
    pub fn reset(&mut self) -> SyncResult<()> {
        let board = BoardPosition::startpos();
        self.history.reset(board.fen());
        self.board = board;
        self.shapes.clear();
        self.comment = None;
        self.last_move = None;
        self.pending_promotion = None;
        info!("[SYNC] session reset");
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// `REMOTE_UPDATE`: reconcile an incoming room document
    ///
    /// Idempotent and order-tolerant. The round-trip echo of this
    /// controller's own write is recognized by fingerprint and skipped.
    /// Everything else is adopted verbatim - remote state is authoritative
    /// for display - but only after the replacement position and history
    /// have been fully built: a malformed document returns
    /// [`SyncError::RemoteSync`] with local state untouched.
    pub fn apply_remote(&mut self, incoming: RoomState) -> SyncResult<RemoteOutcome> {
        if self.last_pushed.as_ref() == Some(&incoming.fingerprint()) {
            debug!("[SYNC] ignoring echo of own push");
            return Ok(RemoteOutcome::OwnEcho);
        }

        let board = BoardPosition::from_fen(&incoming.fen)
            .map_err(|e| SyncError::RemoteSync(format!("unreadable fen: {e}")))?;
        let history = MoveHistory::from_wire(
            &incoming.history,
            &incoming.fen_history,
            incoming.current_index,
        )?;
        if history.current_fen() != incoming.fen {
            return Err(SyncError::RemoteSync(
                "displayed fen disagrees with the cursor snapshot".into(),
            ));
        }

        // Everything validated; commit as one unit.
        self.board = board;
        self.history = history;
        self.orientation = incoming.orientation;
        if self.shapes != incoming.shapes {
            self.shapes = incoming.shapes;
        }
        self.comment = incoming.comment;
        self.chapters = incoming.chapters;
        self.active_chapter = incoming.active_chapter_index;
        self.last_move = incoming.last_move;
        self.pending_promotion = None;
        info!(
            "[SYNC] adopted remote state: {} plies, cursor {}",
            self.history.len(),
            self.history.cursor()
        );
        Ok(RemoteOutcome::Applied)
    }

    /// Replace the annotation shapes
    ///
    /// Always applied locally; propagated only with write authority
    /// (annotations are the teacher's channel).
    pub fn set_shapes(&mut self, shapes: Vec<Shape>) -> SyncResult<()> {
        self.shapes = shapes;
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// Set or clear the room comment; gated like shapes
    pub fn set_comment(&mut self, comment: Option<String>) -> SyncResult<()> {
        self.comment = comment;
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// Flip the board orientation; gated like shapes
    pub fn toggle_orientation(&mut self) -> SyncResult<()> {
        self.orientation = self.orientation.toggle();
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// Load a position or game from a raw FEN
    pub fn load_fen(&mut self, fen: &str) -> SyncResult<()> {
        let board =
            BoardPosition::from_fen(fen).map_err(|e| SyncError::InputFormat(e.to_string()))?;
        self.install(ImportedGame {
            fen: board.fen(),
            history: MoveHistory::new(board.fen()),
            last_move: None,
            comment: None,
        })
    }

    /// Load a full game from a (possibly messy) PGN
    pub fn load_pgn(&mut self, input: &str) -> SyncResult<()> {
        let imported = pgn::parse_game(input)?;
        self.install(imported)
    }

    /// Replace the prepared chapter list; gated like shapes
    pub fn set_chapters(&mut self, chapters: Vec<Chapter>) -> SyncResult<()> {
        self.chapters = chapters;
        if self.active_chapter.is_some_and(|i| i >= self.chapters.len()) {
            self.active_chapter = None;
        }
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    /// Switch to a prepared chapter, loading its PGN
    pub fn select_chapter(&mut self, index: usize) -> SyncResult<()> {
        let chapter = self.chapters.get(index).ok_or_else(|| {
            SyncError::InputFormat(format!(
                "chapter {index} out of range ({} chapters)",
                self.chapters.len()
            ))
        })?;
        let imported = pgn::parse_game(&chapter.pgn)?;
        self.active_chapter = Some(index);
        info!("[SYNC] switched to chapter {index}");
        self.install(imported)
    }

    /// Retry the outbound push after a failed publish
    ///
    /// The core never retries on its own; durability is the store's job once
    /// a write succeeds, and retry timing is the caller's.
    pub fn republish(&mut self) -> SyncResult<()> {
        self.publish()
    }

    /// The UI collaborator contract: everything the rendering layer reads
    pub fn view(&self) -> BoardView {
        BoardView {
            fen: self.board.fen(),
            turn: self.board.turn(),
            check: self.board.is_check(),
            game_over: self.board.is_game_over(),
            dests: self.board.legal_destinations(),
            last_move: self.last_move.clone(),
            orientation: self.orientation,
            current_index: self.history.cursor() as i64,
            sans: self.history.sans(),
        }
    }

    /// The full shared projection this controller would publish
    pub fn room_state(&self) -> RoomState {
        RoomState {
            fen: self.board.fen(),
            last_move: self.last_move.clone(),
            orientation: self.orientation,
            history: self.history.sans(),
            fen_history: self.history.fens(),
            current_index: self.history.cursor() as i64,
            shapes: self.shapes.clone(),
            comment: self.comment.clone(),
            chapters: self.chapters.clone(),
            active_chapter_index: self.active_chapter,
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The underlying store, mainly for embedders and test doubles
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, record and publish one accepted move
    fn commit_move(&mut self, m: &tutorchess_board::Move) -> SyncResult<MoveOutcome> {
        let san = self.board.san(m);
        let kind = self.board.describe(m);
        let (from, to) = self.board.endpoints(m);
        let next = self
            .board
            .apply(m)
            .map_err(|e| SyncError::IllegalMove(e.to_string()))?;

        let check = next.is_check();
        let game_over = next.is_game_over();
        self.history.record(san.clone(), next.fen());
        self.board = next;
        self.shapes.clear();
        self.last_move = Some((from.to_string(), to.to_string()));
        self.pending_promotion = None;

        info!(
            "[SYNC] played {san} ({kind:?}), ply {}{}",
            self.history.len(),
            if game_over { ", game over" } else { "" }
        );
        self.publish()?;
        Ok(MoveOutcome::Applied(AppliedMove {
            san,
            kind,
            check,
            game_over,
        }))
    }

    /// Install an imported game wholesale and publish it
    fn install(&mut self, imported: ImportedGame) -> SyncResult<()> {
        self.board = BoardPosition::from_fen(&imported.fen)
            .map_err(|e| SyncError::InputFormat(e.to_string()))?;
        self.history = imported.history;
        self.last_move = imported.last_move;
        self.comment = imported.comment;
        self.shapes.clear();
        self.pending_promotion = None;
        info!("[SYNC] installed game: {} plies", self.history.len());
        if self.authority.can_write() {
            self.publish()?;
        }
        Ok(())
    }

    fn publish(&mut self) -> SyncResult<()> {
        let state = self.room_state();
        self.store.publish(&state)?;
        self.last_pushed = Some(state.fingerprint());
        Ok(())
    }
}
