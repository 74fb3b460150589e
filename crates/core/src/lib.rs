//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the game rules and the synchronous state machine.
//! It has **zero dependencies** on terminals, timers or I/O:
//!
//! - **Deterministic**: same seed, same piece sequence
//! - **Portable**: runs under the async runtime, in tests or in a benchmark
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid, complete-row detection and row removal
//! - [`pieces`]: tetromino shape matrices, rotation and the spawn rule
//! - [`placement`]: validity checks, lock merges, ghost projection, wall kicks
//! - [`scoring`]: line points, hard drop bonus, levels and gravity speed
//! - [`rng`]: seeded uniform piece generator
//! - [`game_state`]: the phase machine tying it all together
//! - [`snapshot`]: `Copy` view of a game for presentation
//!
//! # Game Rules
//!
//! - Pieces spawn centered on row 0; a blocked spawn ends the game.
//! - Rotation is clockwise only, trying kicks of -1, +1, -2, +2 columns.
//! - Completed rows stay visible until the runtime redeems the
//!   [`ClearTicket`], then score `[0, 100, 300, 500, 800][n] * level`.
//! - Hard drop scores 2 points per row; level is `lines / 10 + 1`.
//!
//! # Example
//!
//! ```
//! use arcade_tetris_core::{GameAction, GameEvent, GameState};
//!
//! let mut game = GameState::new(12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::Rotate);
//! game.apply_action(GameAction::HardDrop);
//!
//! // Hard drop awards points
//! assert!(game.score() > 0);
//!
//! // Deferred clears surface as events carrying a ticket
//! for event in game.take_events() {
//!     if let GameEvent::LinesCleared { ticket, .. } = event {
//!         game.finish_line_clear(ticket);
//!     }
//! }
//! ```

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod placement;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use arcade_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, RowSet};
pub use game_state::{ClearTicket, GameEvent, GameState, Phase};
pub use pieces::{shape_of, spawn_x, Piece, Shape};
pub use placement::{is_valid_placement, merge_into_board, project_ghost, try_rotate};
pub use rng::{PieceGenerator, SimpleRng};
pub use scoring::{drop_interval_ms, hard_drop_points, level_for_lines, line_clear_points};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
pub use types::{Cell, GameAction, LineClearEvent, PieceKind};
