//! Integration tests for the game state machine

use arcade_tetris::core::{Board, GameEvent, GameState, Phase};
use arcade_tetris::types::{GameAction, LineClearEvent, PieceKind};

/// Redeem every pending clear right away, returning the clear events seen.
fn settle(state: &mut GameState) -> Vec<LineClearEvent> {
    let mut seen = Vec::new();
    loop {
        let events = state.take_events();
        if events.is_empty() {
            return seen;
        }
        for event in events {
            if let GameEvent::LinesCleared { ticket, event } = event {
                seen.push(event);
                assert!(state.finish_line_clear(ticket));
            }
        }
    }
}

#[test]
fn test_game_lifecycle() {
    let mut state = GameState::new(12345);
    assert!(!state.started());

    state.start();
    assert!(state.started());
    assert!(state.active().is_some());
    assert!(!state.game_over());
    assert!(!state.paused());
    assert_eq!(state.phase(), Phase::Falling);
}

#[test]
fn test_hard_drop_i_on_empty_board() {
    let mut state = GameState::with_board(9, Board::new(), PieceKind::I);
    state.start();
    state.apply_action(GameAction::HardDrop);
    assert!(settle(&mut state).is_empty());

    let board = state.board();
    assert_eq!(board.filled_count(), 4);
    assert_eq!(board.row(19).iter().filter(|c| c.is_some()).count(), 4);
    assert!(!state.game_over());
}

#[test]
fn test_tetris_from_single_column_well() {
    let board = Board::from_rows(&[
        "IIIIIIIII.",
        "IIIIIIIII.",
        "IIIIIIIII.",
        "IIIIIIIII.",
    ]);
    let mut state = GameState::with_board(3, board, PieceKind::I);
    state.start();

    state.apply_action(GameAction::Rotate);
    while state.apply_action(GameAction::MoveRight) {}
    let before = state.score();
    state.apply_action(GameAction::HardDrop);
    let drop_bonus = state.score() - before;

    let events = settle(&mut state);
    assert_eq!(events, vec![LineClearEvent { lines: 4 }]);
    assert!(events[0].is_tetris());
    assert_eq!(state.score(), before + drop_bonus + 800 * state.level());
    assert_eq!(state.lines(), 4);
    assert!(state.board().is_empty());
}

#[test]
fn test_pause_toggles_and_blocks_moves() {
    let mut state = GameState::new(1);
    state.start();
    let before = state.active();

    assert!(state.apply_action(GameAction::TogglePause));
    assert!(!state.apply_action(GameAction::MoveLeft));
    assert!(!state.apply_action(GameAction::HardDrop));
    assert_eq!(state.active(), before);

    assert!(state.apply_action(GameAction::TogglePause));
    assert!(state.apply_action(GameAction::SoftDrop));
}

#[test]
fn test_play_until_game_over_then_reset() {
    let mut state = GameState::new(2024);
    state.start();

    let mut last_score = 0;
    let mut last_level = 1;
    let mut drops = 0;
    while !state.game_over() {
        state.apply_action(GameAction::HardDrop);
        settle(&mut state);

        assert!(state.score() >= last_score);
        assert!(state.level() >= last_level);
        last_score = state.score();
        last_level = state.level();

        drops += 1;
        assert!(drops < 1000, "stacking in the middle must end the game");
    }

    assert!(state.active().is_none());
    assert_eq!(state.phase(), Phase::GameOver);
    assert!(!state.apply_action(GameAction::MoveLeft));

    assert!(state.apply_action(GameAction::Reset));
    assert!(!state.game_over());
    assert!(!state.paused());
    assert_eq!(state.score(), 0);
    assert_eq!(state.lines(), 0);
    assert_eq!(state.level(), 1);
    assert_eq!(state.board().filled_count(), 0);
    assert!(state.active().is_some());
}

#[test]
fn test_same_seed_same_game() {
    let play = |seed| {
        let mut state = GameState::new(seed);
        state.start();
        for i in 0..30 {
            if i % 3 == 0 {
                state.apply_action(GameAction::MoveLeft);
            }
            state.apply_action(GameAction::HardDrop);
            settle(&mut state);
        }
        (state.score(), state.board().clone())
    };
    assert_eq!(play(77), play(77));
}
