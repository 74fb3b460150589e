use crate::pieces::{Piece, Shape};
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i8,
    pub y: i8,
}

impl ActiveSnapshot {
    /// Absolute board cells of the piece
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> {
        Piece::from(*self).cells()
    }

    /// Cells of the piece moved down to `y`
    pub fn cells_at_row(&self, y: i8) -> impl Iterator<Item = (i8, i8)> {
        Piece::from(*self).at_row(y).cells()
    }
}

impl From<Piece> for ActiveSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            kind: value.kind,
            shape: value.shape,
            x: value.x,
            y: value.y,
        }
    }
}

impl From<ActiveSnapshot> for Piece {
    fn from(value: ActiveSnapshot) -> Self {
        Self {
            kind: value.kind,
            shape: value.shape,
            x: value.x,
            y: value.y,
        }
    }
}

/// Everything a presentation layer needs for one frame.
///
/// Plain `Copy` data: board cells are piece codes (0 is empty, see
/// [`PieceKind::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub board: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub active: Option<ActiveSnapshot>,
    /// Landing row of the active piece, `None` when the ghost is hidden
    pub ghost_y: Option<i8>,
    pub next: PieceKind,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub game_over: bool,
    pub paused: bool,
    pub ghost_enabled: bool,
    /// Rows flashing before removal
    pub clearing: [bool; BOARD_HEIGHT as usize],
    pub generation: u64,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn playable(&self) -> bool {
        !self.game_over && !self.paused
    }

    pub fn is_clearing(&self) -> bool {
        self.clearing.iter().any(|&row| row)
    }

    /// Kind locked at (x, y), if any
    pub fn cell(&self, x: usize, y: usize) -> Option<PieceKind> {
        self.board
            .get(y)
            .and_then(|row| row.get(x))
            .and_then(|&code| PieceKind::from_code(code))
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            ghost_y: None,
            next: PieceKind::I,
            score: 0,
            lines: 0,
            level: 1,
            game_over: false,
            paused: false,
            ghost_enabled: true,
            clearing: [false; BOARD_HEIGHT as usize],
            generation: 0,
        }
    }
}
