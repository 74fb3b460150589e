//! Collision and placement - validity, locking merges, ghost projection and
//! rotation with wall kicks.
//!
//! Every function here is pure: pieces and boards go in, new values come out.

use crate::board::Board;
use crate::pieces::Piece;
use crate::types::{BOARD_HEIGHT, BOARD_WIDTH, WALL_KICKS};

/// Whether `piece` fits on `board`.
///
/// Each occupied cell must be inside the side walls and above the floor.
/// Cells in rows above the top edge (negative y) skip the occupancy check,
/// so pieces may poke out of the top while spawning or rotating.
pub fn is_valid_placement(piece: &Piece, board: &Board) -> bool {
    piece.cells().all(|(x, y)| {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return false;
        }
        y < 0 || board.is_valid(x, y)
    })
}

/// Copy of `board` with the piece stamped in.
///
/// Cells above the top edge are dropped. Pieces only ever move down or
/// sideways from row 0, so in practice every cell lands on the board.
pub fn merge_into_board(piece: &Piece, board: &Board) -> Board {
    let mut merged = board.clone();
    for (x, y) in piece.cells() {
        debug_assert!(y >= 0, "locked {:?} above the board", piece.kind);
        if y >= 0 {
            merged.set(x, y, Some(piece.kind));
        }
    }
    merged
}

/// Lowest row the piece can fall to from where it is.
///
/// Returns the current row when the piece cannot move down at all.
pub fn project_ghost(piece: &Piece, board: &Board) -> i8 {
    let mut y = piece.y;
    while is_valid_placement(&piece.at_row(y + 1), board) {
        y += 1;
    }
    y
}

/// Rotate clockwise in place, falling back to horizontal kicks.
///
/// Tries the unchanged position first, then each offset in [`WALL_KICKS`].
/// Returns `None` when nothing fits.
pub fn try_rotate(piece: &Piece, board: &Board) -> Option<Piece> {
    let rotated = piece.with_shape(piece.shape.rotate_cw());
    if is_valid_placement(&rotated, board) {
        return Some(rotated);
    }
    WALL_KICKS
        .iter()
        .map(|&dx| rotated.shifted(dx, 0))
        .find(|kicked| is_valid_placement(kicked, board))
}
