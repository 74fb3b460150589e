//! Game loop runtime.
//!
//! One tokio task owns the [`GameState`]. Commands arrive over a bounded
//! channel, gravity is a deadline awaited in the same `select!`, and a
//! deferred line clear is a short-lived task that posts its ticket back.
//! Every change is published as a [`Frame`] on a watch channel.
//!
//! New best scores go to a separate writer task over a watch channel, so a
//! slow store never holds up the game; only the latest value is written.

use std::future::pending;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use arcade_tetris_core::{ClearTicket, GameEvent, GameSnapshot, GameState};
use arcade_tetris_store::{BestScoreStore, MemoryStore};
use arcade_tetris_types::{GameAction, TETRIS_SCORE_KEY};

use crate::audio::{AudioSink, NoopAudio};
use crate::config::EngineConfig;

/// What the presentation layer sees after each change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub snapshot: GameSnapshot,
    pub best_score: u32,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Action(GameAction),
    Shutdown,
}

/// Cloneable sender side of a running engine.
///
/// The engine stops once every handle is dropped or on [`GameHandle::shutdown`].
#[derive(Debug, Clone)]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    frames: watch::Receiver<Frame>,
}

impl GameHandle {
    /// Queue an action, waiting for channel capacity
    pub async fn send(&self, action: GameAction) -> Result<()> {
        self.commands
            .send(Command::Action(action))
            .await
            .map_err(|_| anyhow!("game engine stopped"))
    }

    /// Queue an action from a thread outside the runtime.
    ///
    /// Must not be called from async code.
    pub fn blocking_send(&self, action: GameAction) -> Result<()> {
        self.commands
            .blocking_send(Command::Action(action))
            .map_err(|_| anyhow!("game engine stopped"))
    }

    /// Latest published frame
    pub fn frame(&self) -> Frame {
        *self.frames.borrow()
    }

    /// A receiver that wakes on every published frame
    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }

    /// Ask the engine task to stop; a no-op if it already has.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// Builder for the engine task
pub struct GameEngine {
    store: Box<dyn BestScoreStore>,
    audio: Box<dyn AudioSink>,
    clear_delay: Duration,
    max_pending: usize,
}

impl GameEngine {
    /// Engine with an in-memory store and no audio
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            audio: Box::new(NoopAudio),
            clear_delay: Duration::from_millis(config.clear_delay_ms as u64),
            max_pending: config.max_pending_commands.max(1),
        }
    }

    pub fn with_store(mut self, store: impl BestScoreStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Start the engine task on the current tokio runtime.
    ///
    /// The state is started if it was not already.
    pub fn spawn(self, state: GameState) -> (GameHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(self.max_pending);
        let (clear_tx, clear_rx) = mpsc::unbounded_channel();

        let best = self.store.best_score(TETRIS_SCORE_KEY);
        let (frame_tx, frame_rx) = watch::channel(Frame {
            snapshot: state.snapshot(),
            best_score: best,
        });
        let (best_tx, best_rx) = watch::channel(best);
        let writer = tokio::spawn(write_best_scores(self.store, best_rx));

        let actor = Actor {
            state,
            audio: self.audio,
            best,
            best_tx,
            writer,
            clear_delay: self.clear_delay,
            frame_tx,
            clear_tx,
            clear: None,
            gravity_at: None,
            gravity_level: 0,
        };
        let task = tokio::spawn(actor.run(cmd_rx, clear_rx));

        (
            GameHandle {
                commands: cmd_tx,
                frames: frame_rx,
            },
            task,
        )
    }
}

/// Persist each new best on the blocking pool until the engine stops.
///
/// The last value sent before shutdown is still written.
async fn write_best_scores(mut store: Box<dyn BestScoreStore>, mut best: watch::Receiver<u32>) {
    while best.changed().await.is_ok() {
        let score = *best.borrow_and_update();
        let write = tokio::task::spawn_blocking(move || {
            store.set_best_score(TETRIS_SCORE_KEY, score);
            store
        });
        match write.await {
            Ok(back) => store = back,
            Err(e) => {
                warn!(error = %e, score, "best score writer failed");
                return;
            }
        }
    }
}

/// Line clear waiting out its delay
enum PendingClear {
    /// Timer task running; the ticket comes back over the clear channel.
    Running {
        ticket: ClearTicket,
        due: Instant,
        task: JoinHandle<()>,
    },
    /// Held while paused with the delay still owed.
    Held { ticket: ClearTicket, left: Duration },
}

impl PendingClear {
    fn abort(self) {
        if let PendingClear::Running { task, .. } = self {
            task.abort();
        }
    }
}

struct Actor {
    state: GameState,
    audio: Box<dyn AudioSink>,
    best: u32,
    best_tx: watch::Sender<u32>,
    writer: JoinHandle<()>,
    clear_delay: Duration,
    frame_tx: watch::Sender<Frame>,
    clear_tx: mpsc::UnboundedSender<ClearTicket>,
    clear: Option<PendingClear>,
    gravity_at: Option<Instant>,
    /// Level the current gravity deadline was armed for
    gravity_level: u32,
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut clears: mpsc::UnboundedReceiver<ClearTicket>,
    ) {
        self.state.start();
        info!(seed = self.state.seed(), best = self.best, "game engine started");
        self.settle();

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Action(action)) => self.on_action(action),
                    Some(Command::Shutdown) | None => break,
                },
                Some(ticket) = clears.recv() => self.on_clear(ticket),
                _ = sleep_until_opt(self.gravity_at) => self.on_gravity(),
            }
        }

        if let Some(clear) = self.clear.take() {
            clear.abort();
        }
        info!(score = self.state.score(), "game engine stopped");

        let Actor { best_tx, writer, .. } = self;
        drop(best_tx);
        if let Err(e) = writer.await {
            warn!(error = %e, "best score writer stopped early");
        }
    }

    fn on_action(&mut self, action: GameAction) {
        if !self.state.apply_action(action) {
            return;
        }
        debug!(action = action.as_str(), "applied");

        match action {
            GameAction::Reset => {
                if let Some(clear) = self.clear.take() {
                    clear.abort();
                }
                self.gravity_at = None;
                info!(generation = self.state.generation(), "game reset");
            }
            GameAction::TogglePause if self.state.paused() => self.hold_clear(),
            GameAction::TogglePause => self.resume_clear(),
            _ => {}
        }
        self.settle();
    }

    fn on_clear(&mut self, ticket: ClearTicket) {
        if ticket.generation() != self.state.generation() {
            debug!(generation = ticket.generation(), "stale clear ticket ignored");
            return;
        }
        if self.state.paused() {
            // Sent just before the pause landed; nothing is owed on resume.
            if self.clear.is_none() {
                self.clear = Some(PendingClear::Held {
                    ticket,
                    left: Duration::ZERO,
                });
            }
            return;
        }
        if let Some(clear) = self.clear.take() {
            clear.abort();
        }
        if !self.state.finish_line_clear(ticket) {
            debug!(generation = ticket.generation(), "no clear pending for ticket");
            return;
        }
        debug!(
            lines = self.state.lines(),
            level = self.state.level(),
            score = self.state.score(),
            "line clear committed"
        );
        self.settle();
    }

    fn on_gravity(&mut self) {
        self.gravity_at = None;
        self.state.gravity_step();
        self.settle();
    }

    /// React to events, persist a new best, re-arm gravity and publish.
    fn settle(&mut self) {
        for event in self.state.take_events() {
            match event {
                GameEvent::LinesCleared { ticket, event } => {
                    debug!(lines = event.lines, tetris = event.is_tetris(), "rows complete");
                    self.audio.line_clear(event);
                    self.schedule_clear(ticket);
                }
                GameEvent::GameOver => {
                    info!(
                        score = self.state.score(),
                        lines = self.state.lines(),
                        level = self.state.level(),
                        "game over"
                    );
                }
            }
        }

        let score = self.state.score();
        if score > self.best {
            self.best = score;
            self.best_tx.send_replace(score);
        }

        self.arm_gravity();

        self.frame_tx.send_replace(Frame {
            snapshot: self.state.snapshot(),
            best_score: self.best,
        });
    }

    fn schedule_clear(&mut self, ticket: ClearTicket) {
        self.start_clear_timer(ticket, self.clear_delay);
    }

    fn start_clear_timer(&mut self, ticket: ClearTicket, delay: Duration) {
        if let Some(clear) = self.clear.take() {
            clear.abort();
        }
        let tx = self.clear_tx.clone();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(ticket);
        });
        self.clear = Some(PendingClear::Running {
            ticket,
            due: Instant::now() + delay,
            task,
        });
    }

    /// Stop the clear timer, keeping the delay still owed.
    fn hold_clear(&mut self) {
        self.clear = match self.clear.take() {
            Some(PendingClear::Running { ticket, due, task }) => {
                task.abort();
                let left = due.saturating_duration_since(Instant::now());
                debug!(left_ms = left.as_millis() as u64, "line clear held");
                Some(PendingClear::Held { ticket, left })
            }
            other => other,
        };
    }

    fn resume_clear(&mut self) {
        match self.clear.take() {
            Some(PendingClear::Held { ticket, left }) => self.start_clear_timer(ticket, left),
            other => self.clear = other,
        }
    }

    /// Keep one deadline while a piece falls; restart it when the level changes.
    fn arm_gravity(&mut self) {
        if !self.state.gravity_active() {
            self.gravity_at = None;
            return;
        }
        let level = self.state.level();
        if self.gravity_at.is_none() || self.gravity_level != level {
            let interval = Duration::from_millis(self.state.drop_interval_ms() as u64);
            self.gravity_at = Some(Instant::now() + interval);
            self.gravity_level = level;
        }
    }
}
