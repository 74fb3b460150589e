//! Async game loop around the core state machine.
//!
//! # Example
//!
//! ```no_run
//! use arcade_tetris_core::GameState;
//! use arcade_tetris_engine::{EngineConfig, GameEngine};
//! use arcade_tetris_types::GameAction;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env();
//! let state = GameState::new(config.seed_or_clock());
//! let (handle, task) = GameEngine::new(&config).spawn(state);
//!
//! handle.send(GameAction::HardDrop).await?;
//! let frame = handle.frame();
//! println!("score {} best {}", frame.snapshot.score, frame.best_score);
//!
//! handle.shutdown().await;
//! task.await?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod runtime;

pub use audio::{AudioSink, NoopAudio};
pub use config::{EngineConfig, BEST_PATH_NONE};
pub use runtime::{Frame, GameEngine, GameHandle};
