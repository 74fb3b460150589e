//! Terminal input (engine-facing).
//!
//! Maps `crossterm` key events into [`crate::types::GameAction`]. Key repeat
//! comes from the terminal itself; every press is one command.

pub mod map;

pub use arcade_tetris_types as types;

pub use map::{map_key, should_quit};
