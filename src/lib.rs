//! Arcade Tetris (workspace facade crate).
//!
//! Re-exports the member crates under one name:
//! `arcade_tetris::{core, engine, input, store, term, types}`. The
//! implementation lives in dedicated crates under `crates/`.

pub use arcade_tetris_core as core;
pub use arcade_tetris_engine as engine;
pub use arcade_tetris_input as input;
pub use arcade_tetris_store as store;
pub use arcade_tetris_term as term;
pub use arcade_tetris_types as types;
