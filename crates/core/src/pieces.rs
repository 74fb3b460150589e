//! Pieces module - tetromino catalog, shape matrices and the spawn rule
//!
//! Shapes are tight bounding-box matrices (I is 1x4, O is 2x2, the rest 2x3).
//! Rotating transposes the matrix, so a rotated shape is a new value and the
//! catalog entries are never edited.

use crate::types::{PieceKind, BOARD_WIDTH};

/// Largest side of a shape matrix
pub const MAX_SHAPE_SIDE: u8 = 4;

/// An occupancy matrix of at most 4x4 cells, stored as a row-major bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: u8,
    cols: u8,
    bits: u16,
}

impl Shape {
    /// Build a shape from rows of 0/1 cells.
    ///
    /// Rows or columns beyond [`MAX_SHAPE_SIDE`] are ignored; the column
    /// count is taken from the first row.
    pub fn from_matrix(matrix: &[&[u8]]) -> Self {
        let rows = matrix.len().min(MAX_SHAPE_SIDE as usize) as u8;
        let cols = matrix
            .first()
            .map_or(0, |r| r.len().min(MAX_SHAPE_SIDE as usize)) as u8;
        let mut shape = Self { rows, cols, bits: 0 };
        for (r, row) in matrix.iter().take(rows as usize).enumerate() {
            for (c, &v) in row.iter().take(cols as usize).enumerate() {
                if v != 0 {
                    shape.bits |= Self::bit(r as u8, c as u8);
                }
            }
        }
        shape
    }

    #[inline(always)]
    fn bit(row: u8, col: u8) -> u16 {
        1 << (row * MAX_SHAPE_SIDE + col)
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn is_filled(&self, row: u8, col: u8) -> bool {
        row < self.rows && col < self.cols && self.bits & Self::bit(row, col) != 0
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Occupied cells as `(dx, dy)` offsets from the top-left corner
    pub fn cells(self) -> impl Iterator<Item = (i8, i8)> {
        (0..self.rows).flat_map(move |r| {
            (0..self.cols)
                .filter(move |&c| self.is_filled(r, c))
                .map(move |c| (c as i8, r as i8))
        })
    }

    /// 90° clockwise rotation: rows become columns.
    ///
    /// ```
    /// use arcade_tetris_core::{shape_of, PieceKind};
    ///
    /// let i = shape_of(PieceKind::I);
    /// let vertical = i.rotate_cw();
    /// assert_eq!((vertical.rows(), vertical.cols()), (4, 1));
    /// assert_eq!(vertical.rotate_cw().rotate_cw().rotate_cw(), i);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        let mut out = Self {
            rows: self.cols,
            cols: self.rows,
            bits: 0,
        };
        for r in 0..out.rows {
            for c in 0..out.cols {
                if self.is_filled(self.rows - 1 - c, r) {
                    out.bits |= Self::bit(r, c);
                }
            }
        }
        out
    }
}

/// Catalog shape for a piece kind, in spawn orientation
pub fn shape_of(kind: PieceKind) -> Shape {
    match kind {
        PieceKind::I => Shape::from_matrix(&[&[1, 1, 1, 1]]),
        PieceKind::O => Shape::from_matrix(&[&[1, 1], &[1, 1]]),
        PieceKind::T => Shape::from_matrix(&[&[0, 1, 0], &[1, 1, 1]]),
        PieceKind::S => Shape::from_matrix(&[&[0, 1, 1], &[1, 1, 0]]),
        PieceKind::Z => Shape::from_matrix(&[&[1, 1, 0], &[0, 1, 1]]),
        PieceKind::J => Shape::from_matrix(&[&[1, 0, 0], &[1, 1, 1]]),
        PieceKind::L => Shape::from_matrix(&[&[0, 0, 1], &[1, 1, 1]]),
    }
}

/// Spawn column: horizontally centered, rounding toward the left
pub fn spawn_x(shape: &Shape) -> i8 {
    (BOARD_WIDTH / 2) as i8 - (shape.cols() / 2) as i8
}

/// A piece in play: shape, identity and top-left position on the board.
///
/// Pieces are values; every move or rotation produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i8,
    pub y: i8,
}

impl Piece {
    /// Create a piece at the spawn position (centered, row 0)
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = shape_of(kind);
        Self {
            kind,
            shape,
            x: spawn_x(&shape),
            y: 0,
        }
    }

    /// Same piece offset by (dx, dy)
    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Same piece moved to row `y`
    pub fn at_row(&self, y: i8) -> Self {
        Self { y, ..*self }
    }

    /// Same position with a different shape
    pub fn with_shape(&self, shape: Shape) -> Self {
        Self { shape, ..*self }
    }

    /// Absolute board coordinates of the occupied cells
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> {
        let (x, y) = (self.x, self.y);
        self.shape.cells().map(move |(dx, dy)| (x + dx, y + dy))
    }
}
