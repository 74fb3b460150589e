//! Engine runtime tests on a paused tokio clock

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use arcade_tetris::core::{Board, GameState};
use arcade_tetris::engine::{AudioSink, EngineConfig, Frame, GameEngine, GameHandle};
use arcade_tetris::store::{BestScoreStore, MemoryStore};
use arcade_tetris::types::{GameAction, LineClearEvent, PieceKind, TETRIS_SCORE_KEY};

#[derive(Clone, Default)]
struct RecordingAudio(Arc<Mutex<Vec<LineClearEvent>>>);

impl AudioSink for RecordingAudio {
    fn line_clear(&mut self, event: LineClearEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Clone, Default)]
struct SharedStore(Arc<Mutex<MemoryStore>>);

impl BestScoreStore for SharedStore {
    fn best_score(&self, key: &str) -> u32 {
        self.0.lock().unwrap().best_score(key)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        self.0.lock().unwrap().set_best_score(key, score)
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        best_path: None,
        ..EngineConfig::default()
    }
}

async fn wait_for(handle: &GameHandle, pred: impl FnMut(&Frame) -> bool) -> Frame {
    let mut frames = handle.frames();
    let frame = timeout(Duration::from_secs(120), frames.wait_for(pred))
        .await
        .expect("frame predicate timed out")
        .expect("engine stopped");
    *frame
}

fn one_gap_board() -> Board {
    Board::from_rows(&["IIII..IIII"])
}

#[tokio::test(start_paused = true)]
async fn test_engine_publishes_started_game() {
    let (handle, _task) = GameEngine::new(&test_config()).spawn(GameState::new(5));
    let frame = wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    assert_eq!(frame.snapshot.score, 0);
    assert_eq!(frame.snapshot.level, 1);
    assert_eq!(frame.best_score, 0);
}

#[tokio::test(start_paused = true)]
async fn test_gravity_moves_piece_once_per_interval() {
    let state = GameState::with_board(1, Board::new(), PieceKind::O);
    let (handle, _task) = GameEngine::new(&test_config()).spawn(state);

    wait_for(&handle, |f| f.snapshot.active.map(|a| a.y) == Some(0)).await;
    let start = Instant::now();
    wait_for(&handle, |f| f.snapshot.active.map(|a| a.y) == Some(1)).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");

    wait_for(&handle, |f| f.snapshot.active.map(|a| a.y) == Some(2)).await;
    assert!(start.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_line_clear_commits_after_delay() {
    let audio = RecordingAudio::default();
    let state = GameState::with_board(1, one_gap_board(), PieceKind::O);
    let (handle, _task) = GameEngine::new(&test_config())
        .with_audio(audio.clone())
        .spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();

    let flashing = wait_for(&handle, |f| f.snapshot.is_clearing()).await;
    let start = Instant::now();
    assert!(flashing.snapshot.clearing[19]);
    assert!(flashing.snapshot.active.is_none());
    assert_eq!(flashing.snapshot.lines, 0);

    // Input during the clear is discarded.
    handle.send(GameAction::MoveLeft).await.unwrap();

    let done = wait_for(&handle, |f| f.snapshot.lines == 1).await;
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert!(!done.snapshot.is_clearing());
    assert!(done.snapshot.active.is_some());
    assert_eq!(done.snapshot.score, 36 + 100);
    assert_eq!(done.best_score, 136);

    assert_eq!(*audio.0.lock().unwrap(), vec![LineClearEvent { lines: 1 }]);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_pending_clear() {
    let state = GameState::with_board(1, one_gap_board(), PieceKind::O);
    let (handle, _task) = GameEngine::new(&test_config()).spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();
    wait_for(&handle, |f| f.snapshot.is_clearing()).await;

    handle.send(GameAction::Reset).await.unwrap();
    let fresh = wait_for(&handle, |f| f.snapshot.generation == 1).await;
    assert_eq!(fresh.snapshot.score, 0);
    assert!(!fresh.snapshot.is_clearing());

    sleep(Duration::from_millis(500)).await;
    let frame = handle.frame();
    assert_eq!(frame.snapshot.lines, 0);
    assert_eq!(frame.snapshot.generation, 1);
    // The best score from the first game survives the reset.
    assert_eq!(frame.best_score, 36);
}

#[tokio::test(start_paused = true)]
async fn test_best_score_loaded_and_only_raised() {
    let store = SharedStore::default();
    store.clone().set_best_score(TETRIS_SCORE_KEY, 5000);

    let state = GameState::with_board(1, Board::new(), PieceKind::I);
    let (handle, _task) = GameEngine::new(&test_config())
        .with_store(store.clone())
        .spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();
    let frame = wait_for(&handle, |f| f.snapshot.score > 0).await;

    assert_eq!(frame.snapshot.score, 38);
    assert_eq!(frame.best_score, 5000);
    assert_eq!(store.best_score(TETRIS_SCORE_KEY), 5000);
}

#[tokio::test(start_paused = true)]
async fn test_new_best_is_written_through() {
    let store = SharedStore::default();
    let state = GameState::with_board(1, Board::new(), PieceKind::I);
    let (handle, task) = GameEngine::new(&test_config())
        .with_store(store.clone())
        .spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();
    wait_for(&handle, |f| f.best_score == 38).await;

    // The writer flushes the latest best before the engine task ends.
    handle.shutdown().await;
    task.await.unwrap();
    assert_eq!(store.best_score(TETRIS_SCORE_KEY), 38);
}

/// Store whose writes block until the test lets them through
struct GatedStore {
    release: std::sync::mpsc::Receiver<()>,
    written: Arc<Mutex<Vec<u32>>>,
}

impl BestScoreStore for GatedStore {
    fn best_score(&self, _key: &str) -> u32 {
        0
    }

    fn set_best_score(&mut self, _key: &str, score: u32) {
        let _ = self.release.recv();
        self.written.lock().unwrap().push(score);
    }
}

#[tokio::test]
async fn test_blocked_store_does_not_stall_game() {
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let written = Arc::new(Mutex::new(Vec::new()));
    let store = GatedStore {
        release: release_rx,
        written: written.clone(),
    };
    let state = GameState::with_board(1, Board::new(), PieceKind::I);
    let (handle, task) = GameEngine::new(&test_config()).with_store(store).spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();
    let dropped = wait_for(&handle, |f| f.best_score == 38).await;
    let x = dropped.snapshot.active.expect("next piece").x;

    // The first write is stuck; play goes on regardless.
    handle.send(GameAction::MoveLeft).await.unwrap();
    let moved = timeout(
        Duration::from_secs(2),
        wait_for(&handle, |f| f.snapshot.active.map(|a| a.x) == Some(x - 1)),
    )
    .await
    .expect("engine stalled behind the store");
    assert_eq!(moved.best_score, 38);
    assert!(written.lock().unwrap().is_empty());

    release_tx.send(()).unwrap();
    handle.shutdown().await;
    task.await.unwrap();
    assert_eq!(*written.lock().unwrap(), vec![38]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_pending_clear() {
    let state = GameState::with_board(1, one_gap_board(), PieceKind::O);
    let (handle, _task) = GameEngine::new(&test_config()).spawn(state);

    wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    handle.send(GameAction::HardDrop).await.unwrap();
    wait_for(&handle, |f| f.snapshot.is_clearing()).await;
    sleep(Duration::from_millis(100)).await;

    handle.send(GameAction::TogglePause).await.unwrap();
    wait_for(&handle, |f| f.snapshot.paused).await;
    sleep(Duration::from_secs(3)).await;

    let held = handle.frame();
    assert!(held.snapshot.paused);
    assert!(held.snapshot.clearing[19]);
    assert_eq!(held.snapshot.lines, 0);
    assert_eq!(held.snapshot.score, 36);
    assert!(held.snapshot.active.is_none());

    handle.send(GameAction::TogglePause).await.unwrap();
    wait_for(&handle, |f| !f.snapshot.paused).await;
    let resumed = Instant::now();
    let done = wait_for(&handle, |f| f.snapshot.lines == 1).await;

    // Only the unspent part of the delay runs after the resume.
    let elapsed = resumed.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
    assert_eq!(done.snapshot.score, 136);
    assert!(done.snapshot.active.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_gravity_speeds_up_at_level_two() {
    // Seed 363 deals four more O pieces after the first.
    let board = Board::from_rows(&["IIII..IIII"; 10]);
    let state = GameState::with_board(363, board, PieceKind::O);
    let (handle, _task) = GameEngine::new(&test_config()).spawn(state);

    for cleared in (0..10).step_by(2) {
        let ready = wait_for(&handle, |f| {
            f.snapshot.lines == cleared && f.snapshot.active.is_some()
        })
        .await;
        assert_eq!(ready.snapshot.active.map(|a| a.kind), Some(PieceKind::O));
        assert_eq!(ready.snapshot.level, 1);
        handle.send(GameAction::HardDrop).await.unwrap();
    }

    let fresh = wait_for(&handle, |f| {
        f.snapshot.lines == 10 && f.snapshot.active.is_some()
    })
    .await;
    let start = Instant::now();
    assert_eq!(fresh.snapshot.level, 2);
    assert!(fresh.snapshot.board.iter().flatten().all(|&c| c == 0));
    assert_eq!(fresh.snapshot.active.map(|a| a.y), Some(0));

    wait_for(&handle, |f| f.snapshot.active.map(|a| a.y) == Some(1)).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_gravity() {
    let (handle, _task) = GameEngine::new(&test_config()).spawn(GameState::new(11));
    let start = wait_for(&handle, |f| f.snapshot.active.is_some()).await;

    handle.send(GameAction::TogglePause).await.unwrap();
    wait_for(&handle, |f| f.snapshot.paused).await;

    sleep(Duration::from_secs(5)).await;
    let frame = handle.frame();
    assert_eq!(frame.snapshot.active, start.snapshot.active);

    handle.send(GameAction::TogglePause).await.unwrap();
    wait_for(&handle, |f| f.snapshot.active.map(|a| a.y) == Some(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_ghost_starts_hidden_when_configured() {
    let mut state = GameState::new(3);
    state.set_ghost_enabled(false);
    let (handle, _task) = GameEngine::new(&test_config()).spawn(state);

    let frame = wait_for(&handle, |f| f.snapshot.active.is_some()).await;
    assert!(!frame.snapshot.ghost_enabled);
    assert_eq!(frame.snapshot.ghost_y, None);

    handle.send(GameAction::ToggleGhost).await.unwrap();
    let frame = wait_for(&handle, |f| f.snapshot.ghost_enabled).await;
    assert!(frame.snapshot.ghost_y.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_engine() {
    let (handle, task) = GameEngine::new(&test_config()).spawn(GameState::new(1));
    wait_for(&handle, |f| f.snapshot.active.is_some()).await;

    handle.shutdown().await;
    task.await.unwrap();
    assert!(handle.send(GameAction::MoveLeft).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_engine() {
    let (handle, task) = GameEngine::new(&test_config()).spawn(GameState::new(1));
    let other = handle.clone();
    drop(handle);
    drop(other);
    timeout(Duration::from_secs(1), task)
        .await
        .expect("engine should stop")
        .unwrap();
}
