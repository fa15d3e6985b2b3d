//! Position wrapper over the shakmaty rules engine
//!
//! [`BoardPosition`] is immutable from the caller's point of view: `apply`
//! returns a new position and never touches the receiver, so a rejected move
//! leaves no trace. The sync layer validates prospective moves against the
//! value it already holds and only swaps it out once a move is accepted.
//!
//! # Coordinate conventions
//!
//! UIs speak in origin/destination squares, and for castling they send the
//! king's two-file hop (e1->g1). Shakmaty represents castling as
//! king-takes-rook internally, so this module translates between the two at
//! the boundary: `classify` accepts the UI convention, and
//! `legal_destinations` reports it.

use std::collections::HashMap;

use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    CastlingMode, CastlingSide, Chess, Color, EnPassantMode, Move, Outcome, Position, Role, Square,
};
use tracing::debug;

use crate::error::{BoardError, BoardResult};

/// How a legal move changes the board, for the feedback channel
///
/// The session controller reports this alongside an accepted move so that
/// collaborating layers (sounds, toasts, lesson telemetry) can distinguish
/// captures from quiet moves without re-deriving anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Quiet,
    Capture,
    Castle,
    EnPassant,
    Promotion,
    PromotionCapture,
}

/// Result of resolving a (from, to, promotion) intent against a position
#[derive(Debug, Clone)]
pub enum MoveLookup {
    /// The intent maps onto exactly this legal move
    Legal(Move),
    /// A pawn reaches the far rank and no promotion piece was supplied;
    /// the caller must solicit one and resubmit
    NeedsPromotion,
    /// No legal move matches the intent
    Illegal,
}

/// A legal chess position with full rules support
#[derive(Debug, Clone)]
pub struct BoardPosition {
    pos: Chess,
}

impl Default for BoardPosition {
    fn default() -> Self {
        Self::startpos()
    }
}

impl BoardPosition {
    /// The standard starting position
    pub fn startpos() -> Self {
        Self {
            pos: Chess::default(),
        }
    }

    /// Parse and validate a FEN string
    ///
    /// Fails with [`BoardError::InvalidPosition`] on syntactically malformed
    /// input and on positions that violate the rules (missing or extra
    /// kings, side not to move already delivering check, impossible
    /// en-passant squares, ...).
    pub fn from_fen(fen: &str) -> BoardResult<Self> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| BoardError::InvalidPosition(format!("{fen:?}: {e}")))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| BoardError::InvalidPosition(format!("{fen:?}: {e}")))?;
        Ok(Self { pos })
    }

    /// Canonical FEN for this position
    pub fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    /// The side to move
    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    /// Whether the side to move is in check
    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    /// Whether the game has ended
    ///
    /// Covers checkmate, stalemate, insufficient material, and the 50-move
    /// rule via the halfmove clock.
    pub fn is_game_over(&self) -> bool {
        self.pos.is_game_over() || self.pos.halfmoves() >= 100
    }

    /// Decisive or drawn outcome, if the game has ended by rule
    pub fn outcome(&self) -> Option<Outcome> {
        self.pos.outcome()
    }

    /// Map every origin square to its full set of legal destinations
    ///
    /// Computed from complete legal move generation, not pseudo-legal
    /// filtering. Castling destinations use the king-hop convention.
    pub fn legal_destinations(&self) -> HashMap<Square, Vec<Square>> {
        let mut dests: HashMap<Square, Vec<Square>> = HashMap::new();
        for m in self.pos.legal_moves() {
            let Some(from) = m.from() else {
                continue;
            };
            let to = self.ui_destination(&m);
            let entry = dests.entry(from).or_default();
            // Promotion generates one move per piece; one destination is enough.
            if !entry.contains(&to) {
                entry.push(to);
            }
        }
        dests
    }

    /// Resolve a UI move intent against the legal move set
    pub fn classify(&self, from: Square, to: Square, promotion: Option<Role>) -> MoveLookup {
        let candidates: Vec<Move> = self
            .pos
            .legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(from) && self.ui_destination(m) == to)
            .collect();

        if candidates.is_empty() {
            return MoveLookup::Illegal;
        }

        if candidates.iter().all(|m| m.promotion().is_some()) {
            return match promotion {
                None => MoveLookup::NeedsPromotion,
                Some(role) => candidates
                    .into_iter()
                    .find(|m| m.promotion() == Some(role))
                    .map_or(MoveLookup::Illegal, MoveLookup::Legal),
            };
        }

        // Non-promotion move; a stray promotion piece from the UI is ignored.
        match candidates.into_iter().next() {
            Some(m) => MoveLookup::Legal(m),
            None => MoveLookup::Illegal,
        }
    }

    /// Whether a move is in the legal set of this position
    pub fn is_legal(&self, m: &Move) -> bool {
        self.pos.legal_moves().contains(m)
    }

    /// Apply a legal move, returning the successor position
    ///
    /// Non-mutating: the receiver is untouched whether or not the move is
    /// accepted.
    pub fn apply(&self, m: &Move) -> BoardResult<BoardPosition> {
        if !self.is_legal(m) {
            return Err(BoardError::IllegalMove(format!(
                "{m:?} is not legal in {}",
                self.fen()
            )));
        }
        let mut next = self.pos.clone();
        next.play_unchecked(m);
        debug!("[BOARD] applied {m:?}");
        Ok(BoardPosition { pos: next })
    }

    /// SAN for a legal move, computed against the pre-move position
    ///
    /// Includes file/rank disambiguation and the `+`/`#` suffix.
    pub fn san(&self, m: &Move) -> String {
        SanPlus::from_move(self.pos.clone(), m).to_string()
    }

    /// Resolve a SAN token against this position (PGN replay path)
    pub fn san_to_move(&self, san: &str) -> BoardResult<Move> {
        let parsed: San = san.parse().map_err(|e| BoardError::BadSan {
            san: san.to_string(),
            reason: format!("{e}"),
        })?;
        parsed.to_move(&self.pos).map_err(|e| BoardError::BadSan {
            san: san.to_string(),
            reason: format!("{e}"),
        })
    }

    /// Describe a move for the feedback channel
    pub fn describe(&self, m: &Move) -> MoveKind {
        match m {
            Move::Castle { .. } => MoveKind::Castle,
            Move::EnPassant { .. } => MoveKind::EnPassant,
            _ if m.is_promotion() && m.is_capture() => MoveKind::PromotionCapture,
            _ if m.is_promotion() => MoveKind::Promotion,
            _ if m.is_capture() => MoveKind::Capture,
            _ => MoveKind::Quiet,
        }
    }

    /// Origin and destination in the UI convention (king hop for castling)
    pub fn endpoints(&self, m: &Move) -> (Square, Square) {
        (m.from().unwrap_or_else(|| m.to()), self.ui_destination(m))
    }

    /// Destination square as the UI sees it (king hop for castling)
    fn ui_destination(&self, m: &Move) -> Square {
        match *m {
            Move::Castle { king, rook } => {
                let side = if rook.file() > king.file() {
                    CastlingSide::KingSide
                } else {
                    CastlingSide::QueenSide
                };
                side.king_to(self.pos.turn())
            }
            _ => m.to(),
        }
    }
}
