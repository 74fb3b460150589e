//! Terminal Tetris runner (default binary).
//!
//! The engine task owns the game; a blocking thread reads crossterm key
//! events and forwards commands; the main task redraws on every published
//! frame using the framebuffer renderer.

use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::prelude::*;

use arcade_tetris::core::GameState;
use arcade_tetris::engine::{AudioSink, EngineConfig, GameEngine, GameHandle};
use arcade_tetris::input::{map_key, should_quit};
use arcade_tetris::store::{BestScoreStore, JsonFileStore, MemoryStore};
use arcade_tetris::term::{GameView, TerminalRenderer, Viewport};
use arcade_tetris::types::LineClearEvent;

/// How long the input thread waits for a key before checking for shutdown
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Messages from the input thread and the audio hook to the render loop
#[derive(Debug)]
enum UiEvent {
    Resize,
    Quit,
    Bell,
}

/// Rings the terminal bell for four-row clears.
///
/// The bell is written by the render loop so it never interleaves with a frame.
struct BellAudio {
    ui: mpsc::UnboundedSender<UiEvent>,
}

impl AudioSink for BellAudio {
    fn line_clear(&mut self, event: LineClearEvent) {
        if event.is_tetris() {
            let _ = self.ui.send(UiEvent::Bell);
        }
    }
}

fn init_tracing(config: &EngineConfig) -> Result<()> {
    // The terminal is in raw mode while playing, so logs only go to a file.
    let Some(path) = config.log_path.as_deref() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {path}"))?;
    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .try_init()
        .context("install tracing subscriber")?;
    info!(level = %level, "logging initialized");
    Ok(())
}

fn open_store(config: &EngineConfig) -> Box<dyn BestScoreStore> {
    let Some(path) = config.best_path.as_ref() else {
        return Box::new(MemoryStore::new());
    };
    match JsonFileStore::open(path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = ?e, "best score file unusable, keeping scores in memory");
            Box::new(MemoryStore::new())
        }
    }
}

/// Blocking key reader; exits on quit or when the engine goes away.
fn spawn_input_thread(handle: GameHandle, ui: mpsc::UnboundedSender<UiEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        if ui.is_closed() {
            return;
        }
        match event::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "input poll failed");
                let _ = ui.send(UiEvent::Quit);
                return;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) => {
                if should_quit(key) {
                    let _ = ui.send(UiEvent::Quit);
                    return;
                }
                let game_over = handle.frame().snapshot.game_over;
                if let Some(action) = map_key(key, game_over) {
                    if handle.blocking_send(action).is_err() {
                        return;
                    }
                }
            }
            Ok(Event::Resize(_, _)) => {
                let _ = ui.send(UiEvent::Resize);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "input read failed");
                let _ = ui.send(UiEvent::Quit);
                return;
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::from_env();
    init_tracing(&config)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config).await;

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

async fn run(term: &mut TerminalRenderer, config: &EngineConfig) -> Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    let mut state = GameState::new(config.seed_or_clock());
    state.set_ghost_enabled(config.ghost);

    let (handle, engine_task) = GameEngine::new(config)
        .with_store(open_store(config))
        .with_audio(BellAudio { ui: ui_tx.clone() })
        .spawn(state);

    let input = spawn_input_thread(handle.clone(), ui_tx);

    let view = GameView::default();
    let mut fb = arcade_tetris::term::FrameBuffer::new(0, 0);
    let mut frames = handle.frames();

    loop {
        let frame = *frames.borrow_and_update();
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&frame.snapshot, frame.best_score, Viewport::new(w, h), &mut fb);
        term.draw_swap(&mut fb)?;

        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            msg = ui_rx.recv() => match msg {
                Some(UiEvent::Resize) => term.invalidate(),
                Some(UiEvent::Bell) => term.bell()?,
                Some(UiEvent::Quit) | None => break,
            },
        }
    }

    handle.shutdown().await;
    drop(ui_rx);
    engine_task.await.context("engine task")?;
    let _ = tokio::task::spawn_blocking(move || input.join()).await;
    info!("bye");
    Ok(())
}
