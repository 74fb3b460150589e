//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer: snapshots are drawn into a plain
//! framebuffer, which is then diffed and flushed to the terminal with
//! crossterm. No widget toolkit.
//!
//! - [`GameView`] is pure and testable
//! - Board cells are 2 columns wide to keep them roughly square

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use arcade_tetris_core as core;
pub use arcade_tetris_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{piece_color, AnchorY, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
