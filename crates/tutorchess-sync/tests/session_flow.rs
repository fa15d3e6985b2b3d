//! Integration tests for the session controller
//!
//! Drives teacher and student controllers against in-memory stores through
//! the scenarios the sync layer must survive: move acceptance and rejection,
//! history branching, promotion suspension, authority gating, remote
//! reconciliation and publish failure.

use tutorchess_board::{MoveKind, Role as PieceRole, Square};
use tutorchess_sync::{
    Chapter, InMemoryStore, MoveOutcome, RemoteOutcome, RemoteStore, Role, RoomState,
    SessionController, Shape, SyncError,
};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn teacher() -> SessionController<InMemoryStore> {
    SessionController::new(Role::Teacher, InMemoryStore::new())
}

fn student() -> SessionController<InMemoryStore> {
    SessionController::new(Role::Student, InMemoryStore::new())
}

/// Play a sequence of (from, to) pairs, panicking on any rejection
fn play(ctrl: &mut SessionController<InMemoryStore>, moves: &[(&str, &str)]) {
    for (from, to) in moves {
        match ctrl.attempt_move(sq(from), sq(to)) {
            Ok(MoveOutcome::Applied(_)) => {}
            other => panic!("move {from}{to} not applied: {other:?}"),
        }
    }
}

#[test]
fn first_move_produces_the_reference_state() {
    let mut ctrl = teacher();
    let outcome = ctrl.attempt_move(sq("e2"), sq("e4")).unwrap();

    match outcome {
        MoveOutcome::Applied(applied) => {
            assert_eq!(applied.san, "e4");
            assert_eq!(applied.kind, MoveKind::Quiet);
            assert!(!applied.check);
            assert!(!applied.game_over);
        }
        other => panic!("expected applied move, got {other:?}"),
    }

    let state = ctrl.room_state();
    assert_eq!(state.fen, AFTER_E4);
    assert_eq!(state.history, vec!["e4"]);
    assert_eq!(state.fen_history.len(), 2);
    assert_eq!(state.current_index, 0);
    assert_eq!(state.last_move, Some(("e2".into(), "e4".into())));

    // The publish mirrors the local projection exactly.
    assert_eq!(ctrl.store().publish_count(), 1);
    assert_eq!(ctrl.store().latest(), Some(&state));
}

#[test]
fn illegal_move_changes_nothing_and_publishes_nothing() {
    let mut ctrl = teacher();
    let before = ctrl.room_state();

    let err = ctrl.attempt_move(sq("e2"), sq("e5")).unwrap_err();
    assert!(matches!(err, SyncError::IllegalMove(_)));

    // Snap-back contract: the canonical position is immediately readable.
    assert_eq!(ctrl.room_state(), before);
    assert_eq!(ctrl.view().fen, START_FEN);
    assert_eq!(ctrl.store().publish_count(), 0);
}

#[test]
fn moving_behind_the_tip_overwrites_the_branch() {
    let mut ctrl = teacher();
    play(
        &mut ctrl,
        &[
            ("e2", "e4"),
            ("e7", "e5"),
            ("g1", "f3"),
            ("b8", "c6"),
            ("f1", "b5"),
        ],
    );
    ctrl.navigate(2).unwrap();

    // After 1.e4 e5 2.Nf3 it is Black to move.
    play(&mut ctrl, &[("g8", "f6")]);

    let state = ctrl.room_state();
    assert_eq!(state.history, vec!["e4", "e5", "Nf3", "Nf6"]);
    assert_eq!(state.current_index, 3);
    assert_eq!(state.fen_history.len(), 5);
}

#[test]
fn moving_from_the_initial_position_discards_all_history() {
    let mut ctrl = teacher();
    play(&mut ctrl, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
    ctrl.navigate(-1).unwrap();
    play(&mut ctrl, &[("d2", "d4")]);

    let state = ctrl.room_state();
    assert_eq!(state.history, vec!["d4"]);
    assert_eq!(state.current_index, 0);
}

#[test]
fn navigation_targets_are_clamped() {
    let mut ctrl = teacher();
    play(&mut ctrl, &[("e2", "e4"), ("e7", "e5")]);

    ctrl.navigate(99).unwrap();
    assert_eq!(ctrl.view().current_index, 1);

    ctrl.navigate(-99).unwrap();
    assert_eq!(ctrl.view().current_index, -1);
    assert_eq!(ctrl.view().fen, START_FEN);
}

#[test]
fn promotion_suspends_until_a_piece_is_chosen() {
    let mut ctrl = teacher();
    ctrl.load_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let before = ctrl.room_state();
    let pushes_before = ctrl.store().publish_count();

    // Nothing mutates or publishes until the piece arrives.
    let outcome = ctrl.attempt_move(sq("e7"), sq("e8")).unwrap();
    assert_eq!(outcome, MoveOutcome::PromotionPending);
    assert_eq!(ctrl.room_state(), before);
    assert_eq!(ctrl.store().publish_count(), pushes_before);

    match ctrl.submit_promotion(PieceRole::Queen).unwrap() {
        MoveOutcome::Applied(applied) => {
            assert_eq!(applied.san, "e8=Q");
            assert_eq!(applied.kind, MoveKind::Promotion);
        }
        other => panic!("expected applied promotion, got {other:?}"),
    }
    assert_eq!(ctrl.room_state().history, vec!["e8=Q"]);
}

#[test]
fn promotion_submission_requires_a_suspended_move() {
    let mut ctrl = teacher();
    let err = ctrl.submit_promotion(PieceRole::Queen).unwrap_err();
    assert!(matches!(err, SyncError::NoPendingPromotion));
}

#[test]
fn own_echo_is_recognized_and_skipped() {
    let mut ctrl = teacher();
    play(&mut ctrl, &[("e2", "e4")]);

    let echo = ctrl.store().latest().cloned().unwrap();
    assert_eq!(ctrl.apply_remote(echo).unwrap(), RemoteOutcome::OwnEcho);
}

#[test]
fn duplicate_remote_delivery_is_idempotent() {
    let mut tutor = teacher();
    play(&mut tutor, &[("e2", "e4")]);
    let payload = tutor.room_state();

    let mut follower = student();
    assert_eq!(
        follower.apply_remote(payload.clone()).unwrap(),
        RemoteOutcome::Applied
    );
    let after_first = follower.room_state();
    assert_eq!(
        follower.apply_remote(payload).unwrap(),
        RemoteOutcome::Applied
    );
    assert_eq!(follower.room_state(), after_first);
}

#[test]
fn remote_state_is_adopted_wholesale() {
    let mut tutor = teacher();
    play(&mut tutor, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
    tutor.navigate(1).unwrap();

    let mut follower = student();
    follower.apply_remote(tutor.room_state()).unwrap();

    let view = follower.view();
    assert_eq!(view.fen, tutor.view().fen);
    assert_eq!(view.current_index, 1);
    assert_eq!(view.sans, vec!["e4", "e5", "Nf3"]);
}

#[test]
fn malformed_remote_state_is_rejected_without_partial_application() {
    let mut ctrl = teacher();
    play(&mut ctrl, &[("e2", "e4")]);
    let before = ctrl.room_state();

    // Unreadable FEN.
    let mut bad = before.clone();
    bad.fen = "definitely not a fen".into();
    bad.current_index = -1;
    assert!(matches!(
        ctrl.apply_remote(bad),
        Err(SyncError::RemoteSync(_))
    ));

    // Length-unlinked histories.
    let mut unlinked = before.clone();
    unlinked.fen_history.pop();
    unlinked.fen = START_FEN.into();
    assert!(matches!(
        ctrl.apply_remote(unlinked),
        Err(SyncError::RemoteSync(_))
    ));

    // Displayed position disagreeing with the cursor snapshot.
    let mut skewed = before.clone();
    skewed.fen = START_FEN.into();
    assert!(matches!(
        ctrl.apply_remote(skewed),
        Err(SyncError::RemoteSync(_))
    ));

    assert_eq!(ctrl.room_state(), before);
}

#[test]
fn students_cannot_move_while_reviewing_history() {
    let mut tutor = teacher();
    play(&mut tutor, &[("e2", "e4"), ("e7", "e5")]);

    let mut follower = student();
    follower.apply_remote(tutor.room_state()).unwrap();
    follower.navigate(-1).unwrap();

    let err = follower.attempt_move(sq("d2"), sq("d4")).unwrap_err();
    assert!(matches!(err, SyncError::WriteDenied(_)));
    assert_eq!(follower.view().fen, START_FEN);
}

#[test]
fn student_navigation_and_annotations_stay_local() {
    let mut follower = student();
    // A student move at the tip is allowed and shared.
    play(&mut follower, &[("e2", "e4")]);
    assert_eq!(follower.store().publish_count(), 1);

    follower.navigate(-1).unwrap();
    follower.toggle_orientation().unwrap();
    follower
        .set_shapes(vec![Shape {
            orig: "d4".into(),
            dest: None,
            brush: "red".into(),
        }])
        .unwrap();
    follower.set_comment(Some("my note".into())).unwrap();

    // All applied locally, none published.
    assert_eq!(follower.view().current_index, -1);
    assert_eq!(follower.shapes().len(), 1);
    assert_eq!(follower.comment(), Some("my note"));
    assert_eq!(follower.store().publish_count(), 1);
}

#[test]
fn shapes_are_ephemeral_per_position() {
    let mut tutor = teacher();
    tutor
        .set_shapes(vec![Shape {
            orig: "e4".into(),
            dest: Some("e5".into()),
            brush: "green".into(),
        }])
        .unwrap();
    assert_eq!(tutor.shapes().len(), 1);

    play(&mut tutor, &[("e2", "e4")]);
    assert!(tutor.shapes().is_empty());
    assert!(tutor.store().latest().unwrap().shapes.is_empty());
}

/// A store that fails its first publish after being armed
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_next: bool,
}

impl RemoteStore for FlakyStore {
    fn publish(&mut self, state: &RoomState) -> Result<(), SyncError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SyncError::Publish("store unavailable".into()));
        }
        self.inner.publish(state)
    }
}

#[test]
fn publish_failure_keeps_the_local_move_and_republish_recovers() {
    let store = FlakyStore {
        inner: InMemoryStore::new(),
        fail_next: true,
    };
    let mut ctrl = SessionController::new(Role::Teacher, store);

    // The write fails but the local mutation stands; no automatic retry.
    let err = ctrl.attempt_move(sq("e2"), sq("e4")).unwrap_err();
    assert!(matches!(err, SyncError::Publish(_)));
    assert_eq!(ctrl.view().fen, AFTER_E4);
    assert_eq!(ctrl.store().inner.publish_count(), 0);

    // An explicit republish completes the push.
    ctrl.republish().unwrap();
    assert_eq!(ctrl.store().inner.latest().unwrap().fen, AFTER_E4);
}

#[test]
fn reset_returns_the_session_to_the_start() {
    let mut ctrl = teacher();
    play(&mut ctrl, &[("e2", "e4"), ("e7", "e5")]);
    ctrl.reset().unwrap();

    let state = ctrl.room_state();
    assert_eq!(state.fen, START_FEN);
    assert!(state.history.is_empty());
    assert_eq!(state.current_index, -1);
    assert_eq!(state.last_move, None);
    assert_eq!(ctrl.store().latest(), Some(&state));
}

#[test]
fn chapters_switch_through_the_ingestion_path() {
    let mut tutor = teacher();
    tutor
        .set_chapters(vec![
            Chapter {
                name: "Open games".into(),
                pgn: "1. e4 e5 *".into(),
            },
            Chapter {
                name: "Endgame study".into(),
                pgn: "8/4P1k1/8/8/8/8/8/4K3 w - - 0 1".into(),
            },
        ])
        .unwrap();

    tutor.select_chapter(0).unwrap();
    assert_eq!(tutor.view().sans, vec!["e4", "e5"]);
    assert_eq!(tutor.room_state().active_chapter_index, Some(0));

    tutor.select_chapter(1).unwrap();
    assert!(tutor.view().sans.is_empty());
    assert_eq!(tutor.room_state().active_chapter_index, Some(1));

    assert!(matches!(
        tutor.select_chapter(7),
        Err(SyncError::InputFormat(_))
    ));
}
