//! Tolerant PGN/FEN ingestion
//!
//! Accepts a raw FEN or a full PGN, including the slightly-off-standard PGNs
//! real tools emit: clock/eval/arrow command tokens inside comments
//! (`[%clk 0:03:00]`, `[%eval -0.32]`, `[%csl Gd4]`, `[%cal Ge2e4]`),
//! numeric annotation glyphs, nested variations and glued move numbers.
//!
//! The approach is a small tokenizer rather than regex stripping: command
//! tokens are dropped from comments while the human-authored free text
//! around them is preserved, variations are skipped by depth counting, and
//! every remaining SAN token is replayed through the rules engine so the
//! result is a fully validated history.
//!
//! Failure ladder: a PGN whose movetext cannot be replayed falls back to its
//! `[FEN "..."]` tag if one is present; if that fails too the input is
//! rejected with [`crate::SyncError::InputFormat`] and no state changes.

use tracing::{debug, warn};
use tutorchess_board::BoardPosition;

use crate::error::{SyncError, SyncResult};
use crate::history::MoveHistory;

/// A validated, replayed game ready for the controller to install
#[derive(Debug, Clone)]
pub struct ImportedGame {
    /// History with the cursor at the tip
    pub history: MoveHistory,
    /// FEN of the tip position
    pub fen: String,
    /// Endpoints of the final move, if any ply was imported
    pub last_move: Option<(String, String)>,
    /// Human comment following the final move, if any
    pub comment: Option<String>,
}

impl ImportedGame {
    fn position_only(board: &BoardPosition) -> Self {
        let fen = board.fen();
        Self {
            history: MoveHistory::new(fen.clone()),
            fen,
            last_move: None,
            comment: None,
        }
    }
}

/// Ingest a raw FEN or a full PGN
pub fn parse_game(input: &str) -> SyncResult<ImportedGame> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SyncError::InputFormat("empty input".into()));
    }

    // A bare FEN is accepted directly.
    if let Ok(board) = BoardPosition::from_fen(input) {
        debug!("[PGN] input is a raw FEN");
        return Ok(ImportedGame::position_only(&board));
    }

    let (headers, movetext) = split_headers(input);
    let fen_tag = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("FEN"))
        .map(|(_, v)| v.as_str());

    let start = match fen_tag {
        Some(fen) => BoardPosition::from_fen(fen).ok(),
        None => Some(BoardPosition::startpos()),
    };

    let replayed = start
        .as_ref()
        .ok_or_else(|| SyncError::InputFormat("unreadable FEN tag".into()))
        .and_then(|s| replay_movetext(s, &movetext));

    match replayed {
        Ok(game) => Ok(game),
        Err(e) => {
            // Fall back to the embedded FEN tag before giving up entirely.
            if let Some(board) = fen_tag.and_then(|fen| BoardPosition::from_fen(fen).ok()) {
                warn!("[PGN] movetext rejected ({e}); falling back to FEN tag");
                return Ok(ImportedGame::position_only(&board));
            }
            Err(e)
        }
    }
}

/// Strip command tokens from a comment, preserving the human text
pub fn sanitize_comment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' && chars.peek() == Some(&'%') {
            // Command token: drop through the closing bracket.
            for inner in chars.by_ref() {
                if inner == ']' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split tag-pair header lines from the movetext
fn split_headers(input: &str) -> (Vec<(String, String)>, String) {
    let mut headers = Vec::new();
    let mut movetext = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if movetext.is_empty() {
            if let Some(pair) = parse_tag_pair(trimmed) {
                headers.push(pair);
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
        }
        movetext.push_str(line);
        movetext.push('\n');
    }
    (headers, movetext)
}

fn parse_tag_pair(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (key, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((key.to_string(), value.to_string()))
}

fn replay_movetext(start: &BoardPosition, movetext: &str) -> SyncResult<ImportedGame> {
    let mut board = start.clone();
    let mut history = MoveHistory::new(start.fen());
    let mut last_move = None;
    let mut trailing_comment: Option<String> = None;
    let mut depth = 0usize;
    let mut any_token = false;

    let mut chars = movetext.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut raw = String::new();
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                    raw.push(inner);
                }
                if depth == 0 {
                    let human = sanitize_comment(&raw);
                    if !human.is_empty() {
                        trailing_comment = Some(human);
                    }
                }
            }
            ';' => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '$' => {
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    chars.next();
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                let mut token = String::new();
                token.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '{' | '(' | ')' | ';') {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                if depth > 0 {
                    continue;
                }
                any_token = true;
                if let Some(san) = move_token(&token) {
                    let m = board.san_to_move(&san).map_err(|e| {
                        SyncError::InputFormat(format!("ply {}: {e}", history.len() + 1))
                    })?;
                    let (from, to) = board.endpoints(&m);
                    // Normalize through our own SAN so suffixes are consistent.
                    let san = board.san(&m);
                    board = board
                        .apply(&m)
                        .map_err(|e| SyncError::InputFormat(e.to_string()))?;
                    history.record(san, board.fen());
                    last_move = Some((from.to_string(), to.to_string()));
                    trailing_comment = None;
                }
            }
        }
    }

    if !any_token && history.is_empty() {
        return Err(SyncError::InputFormat("no movetext".into()));
    }

    debug!("[PGN] replayed {} plies", history.len());
    Ok(ImportedGame {
        fen: board.fen(),
        history,
        last_move,
        comment: trailing_comment,
    })
}

/// Extract the SAN portion of a movetext token, or `None` for non-moves
///
/// Handles move numbers (`12.`, `12...`, and glued forms like `12.e4`),
/// game results, and `!`/`?` suffixes. Castling written with zeros is
/// normalized to the letter form.
fn move_token(token: &str) -> Option<String> {
    match token {
        "1-0" | "0-1" | "1/2-1/2" | "*" => return None,
        _ => {}
    }
    // Strip a leading move number (`12.`, `12...`, glued `12.e4`). Only a
    // digits-then-dots prefix counts, so the zeros of `0-0` survive.
    let rest = match token.find('.') {
        Some(dot) if token[..dot].bytes().all(|b| b.is_ascii_digit()) => {
            token[dot..].trim_start_matches('.')
        }
        _ => token,
    };
    if rest.is_empty() {
        return None;
    }
    let rest = rest.trim_end_matches(['!', '?']);
    if rest.is_empty() {
        return None;
    }
    if rest.starts_with("0-0") {
        return Some(rest.replace('0', "O"));
    }
    Some(rest.to_string())
}
