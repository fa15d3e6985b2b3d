//! Integration tests for FEN/PGN ingestion
//!
//! Feeds the parser the kind of material teachers actually paste: annotated
//! PGNs with clock and eval command tokens, NAGs, nested variations, games
//! starting from a FEN tag, and plain FENs. Also exercises the fallback
//! ladder and rejection behavior through the controller.

use tutorchess_sync::pgn::{parse_game, sanitize_comment};
use tutorchess_sync::{InMemoryStore, Role, SessionController, SyncError};

const RUY_LOPEZ: &str = r#"[Event "Lesson 3"]
[Site "tutorchess"]
[White "Coach"]
[Black "Pupil"]
[Result "1-0"]

1. e4 {[%clk 0:03:00] the classical reply is e5} e5 $1 2. Nf3
(2. f4 {the King's Gambit} exf4) 2... Nc6 3. Bb5 {[%eval 0.33] the Ruy
Lopez, cornerstone of open games} 1-0"#;

#[test]
fn annotated_pgn_replays_to_a_validated_history() {
    let game = parse_game(RUY_LOPEZ).unwrap();

    assert_eq!(game.history.sans(), vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    assert_eq!(game.history.cursor(), 4);
    assert_eq!(game.history.fens().len(), 6);
    assert_eq!(game.fen, game.history.current_fen());
    assert_eq!(game.last_move, Some(("f1".into(), "b5".into())));
    // Command tokens stripped, prose kept; only the comment trailing the
    // final mainline move survives.
    assert_eq!(
        game.comment.as_deref(),
        Some("the Ruy Lopez, cornerstone of open games")
    );
}

#[test]
fn variations_do_not_leak_into_the_mainline() {
    let game = parse_game("1. d4 (1. e4 e5 (1... c5 2. Nf3)) 1... d5 2. c4 *").unwrap();
    assert_eq!(game.history.sans(), vec!["d4", "d5", "c4"]);
}

#[test]
fn zero_castling_and_glued_numbers_are_tolerated() {
    let game = parse_game("1.e4 e5 2.Nf3 Nc6 3.Bc4 Bc5 4.0-0 Nf6").unwrap();
    assert_eq!(
        game.history.sans(),
        vec!["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O", "Nf6"]
    );
}

#[test]
fn games_start_from_an_embedded_fen_tag() {
    let input = r#"[Event "Promotion drill"]
[FEN "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1"]
[SetUp "1"]

1. e8=Q Kh6 *"#;
    let game = parse_game(input).unwrap();
    assert_eq!(game.history.sans(), vec!["e8=Q", "Kh6"]);
    assert_eq!(
        game.history.initial_fen(),
        "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1"
    );
}

#[test]
fn broken_movetext_falls_back_to_the_fen_tag() {
    let input = r#"[FEN "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1"]

1. Qxz9 nonsense"#;
    let game = parse_game(input).unwrap();
    assert!(game.history.is_empty());
    assert_eq!(game.fen, "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1");
    assert_eq!(game.last_move, None);
}

#[test]
fn a_raw_fen_is_accepted_directly() {
    let game = parse_game("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
        .unwrap();
    assert!(game.history.is_empty());
    assert_eq!(
        game.fen,
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
    );
}

#[test]
fn illegal_mainline_moves_are_rejected_with_the_ply_number() {
    let err = parse_game("1. e4 e5 2. Ke3 Ke7").unwrap_err();
    match err {
        SyncError::InputFormat(msg) => assert!(msg.contains("ply 3"), "got: {msg}"),
        other => panic!("expected input-format error, got {other:?}"),
    }
}

#[test]
fn garbage_is_rejected() {
    assert!(matches!(
        parse_game("not chess at all"),
        Err(SyncError::InputFormat(_))
    ));
    assert!(matches!(parse_game("   "), Err(SyncError::InputFormat(_))));
}

#[test]
fn comment_sanitizer_preserves_interleaved_prose() {
    assert_eq!(
        sanitize_comment("[%clk 0:01:30] watch the d-file [%cal Gd1d8]"),
        "watch the d-file"
    );
}

#[test]
fn controller_install_replaces_state_and_rejection_preserves_it() {
    let mut ctrl = SessionController::new(Role::Teacher, InMemoryStore::new());
    ctrl.load_pgn(RUY_LOPEZ).unwrap();

    let view = ctrl.view();
    assert_eq!(view.sans, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    assert_eq!(view.current_index, 4);
    assert_eq!(
        ctrl.comment(),
        Some("the Ruy Lopez, cornerstone of open games")
    );
    let before = ctrl.room_state();
    let pushes = ctrl.store().publish_count();

    assert!(matches!(
        ctrl.load_pgn("garbage input"),
        Err(SyncError::InputFormat(_))
    ));
    assert_eq!(ctrl.room_state(), before);
    assert_eq!(ctrl.store().publish_count(), pushes);
}

#[test]
fn student_ingestion_stays_local() {
    let mut follower = SessionController::new(Role::Student, InMemoryStore::new());
    follower.load_pgn("1. e4 e5 *").unwrap();
    assert_eq!(follower.view().sans, vec!["e4", "e5"]);
    assert_eq!(follower.store().publish_count(), 0);
}
