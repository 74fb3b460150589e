//! Game state module - manages the complete game state
//!
//! This module ties together the board, the piece catalog, placement rules,
//! the piece generator and scoring. It owns the phase machine
//! (spawn, fall, lock, clear) and the command guards, but no timers: the
//! runtime decides when gravity fires and when a pending clear is redeemed.

use arrayvec::ArrayVec;

use crate::board::{Board, RowSet};
use crate::pieces::Piece;
use crate::placement::{is_valid_placement, merge_into_board, project_ghost, try_rotate};
use crate::rng::PieceGenerator;
use crate::scoring::{drop_interval_ms, hard_drop_points, level_for_lines, line_clear_points};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::{GameAction, LineClearEvent, PieceKind, BOARD_HEIGHT, START_LEVEL};

/// Token for a deferred line clear.
///
/// Issued when a lock completes rows; redeeming it with
/// [`GameState::finish_line_clear`] removes the rows. Tickets from a game that
/// has since been reset are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearTicket {
    generation: u64,
}

impl ClearTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Something the runtime has to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Rows are flashing; schedule `ticket` after the clear delay.
    LinesCleared {
        ticket: ClearTicket,
        event: LineClearEvent,
    },
    /// The next piece could not spawn.
    GameOver,
}

/// Where the game is in its cycle, derived from state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No current piece yet; one spawns on the next opportunity.
    Spawning,
    /// A piece is falling under gravity.
    Falling,
    /// Complete rows are shown until their ticket is redeemed.
    ClearingLines,
    Paused,
    GameOver,
}

/// Capacity of the event buffer returned by [`GameState::take_events`]
pub const MAX_PENDING_EVENTS: usize = 4;

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    active: Option<Piece>,
    generator: PieceGenerator,
    score: u32,
    lines: u32,
    level: u32,
    game_over: bool,
    paused: bool,
    ghost_enabled: bool,
    started: bool,
    /// Rows awaiting removal; empty unless a clear is pending.
    clearing: RowSet,
    /// Bumped on every reset so stale clear tickets are ignored.
    generation: u64,
    events: ArrayVec<GameEvent, MAX_PENDING_EVENTS>,
}

impl GameState {
    /// Create a new game with the given RNG seed
    pub fn new(seed: u32) -> Self {
        Self::from_parts(Board::new(), PieceGenerator::new(seed))
    }

    /// Game on a prepared board whose first spawn is `next`.
    ///
    /// Mostly useful for scenario tests and benchmarks.
    pub fn with_board(seed: u32, board: Board, next: PieceKind) -> Self {
        Self::from_parts(board, PieceGenerator::with_next(seed, next))
    }

    fn from_parts(board: Board, generator: PieceGenerator) -> Self {
        Self {
            board,
            active: None,
            generator,
            score: 0,
            lines: 0,
            level: START_LEVEL,
            game_over: false,
            paused: false,
            ghost_enabled: true,
            started: false,
            clearing: RowSet::new(),
            generation: 0,
            events: ArrayVec::new(),
        }
    }

    /// Start the game and spawn the first piece
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.spawn_piece();
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn ghost_enabled(&self) -> bool {
        self.ghost_enabled
    }

    /// Starts hidden or shown; [`GameAction::ToggleGhost`] flips it in play.
    pub fn set_ghost_enabled(&mut self, enabled: bool) {
        self.ghost_enabled = enabled;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    /// Kind that spawns next
    pub fn next_kind(&self) -> PieceKind {
        self.generator.peek()
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Rows currently flashing before removal
    pub fn clearing_rows(&self) -> &[u8] {
        &self.clearing
    }

    pub fn is_clearing(&self) -> bool {
        !self.clearing.is_empty()
    }

    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::GameOver
        } else if self.paused {
            Phase::Paused
        } else if self.is_clearing() {
            Phase::ClearingLines
        } else if self.active.is_some() {
            Phase::Falling
        } else {
            Phase::Spawning
        }
    }

    /// Whether the gravity timer should be running
    pub fn gravity_active(&self) -> bool {
        self.started && self.phase() == Phase::Falling
    }

    /// Current gravity interval based on level
    pub fn drop_interval_ms(&self) -> u32 {
        drop_interval_ms(self.level)
    }

    /// Row the current piece would land on
    pub fn ghost_y(&self) -> Option<i8> {
        let active = self.active?;
        Some(project_ghost(&active, &self.board))
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_u8_grid(&mut out.board);

        out.active = self.active.map(ActiveSnapshot::from);
        out.ghost_y = if self.ghost_enabled {
            self.ghost_y()
        } else {
            None
        };
        out.next = self.generator.peek();
        out.score = self.score;
        out.lines = self.lines;
        out.level = self.level;
        out.game_over = self.game_over;
        out.paused = self.paused;
        out.ghost_enabled = self.ghost_enabled;
        out.clearing = [false; BOARD_HEIGHT as usize];
        for &y in &self.clearing {
            out.clearing[y as usize] = true;
        }
        out.generation = self.generation;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Take the events raised since the last call
    pub fn take_events(&mut self) -> ArrayVec<GameEvent, MAX_PENDING_EVENTS> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        // Events are drained after every command, so the buffer never fills in practice.
        let _ = self.events.try_push(event);
    }

    /// Spawn the announced next piece.
    ///
    /// Returns false when a piece is already in play, a clear is pending, the
    /// game is over, or the spawn position is blocked (which ends the game).
    pub fn spawn_piece(&mut self) -> bool {
        if self.game_over || self.active.is_some() || self.is_clearing() {
            return false;
        }

        let piece = Piece::spawn(self.generator.draw());
        if !is_valid_placement(&piece, &self.board) {
            self.game_over = true;
            self.emit(GameEvent::GameOver);
            return false;
        }

        self.active = Some(piece);
        true
    }

    /// Whether piece commands are currently honored
    fn accepts_input(&self) -> bool {
        self.started && !self.game_over && !self.paused && !self.is_clearing()
    }

    /// Try to move the active piece
    fn try_move(&mut self, dx: i8, dy: i8) -> bool {
        let Some(active) = self.active else {
            return false;
        };

        let moved = active.shifted(dx, dy);
        if is_valid_placement(&moved, &self.board) {
            self.active = Some(moved);
            return true;
        }
        false
    }

    fn rotate(&mut self) -> bool {
        let Some(active) = self.active else {
            return false;
        };

        match try_rotate(&active, &self.board) {
            Some(rotated) => {
                self.active = Some(rotated);
                true
            }
            None => false,
        }
    }

    /// One row down, locking when blocked
    fn step_down(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        if !self.try_move(0, 1) {
            self.lock_piece();
        }
        true
    }

    /// Drop to the landing row and lock, scoring 2 points per row skipped
    fn hard_drop(&mut self) -> bool {
        let Some(active) = self.active else {
            return false;
        };

        let landing = project_ghost(&active, &self.board);
        let distance = (landing - active.y).max(0) as u32;
        self.score = self.score.saturating_add(hard_drop_points(distance));
        self.active = Some(active.at_row(landing));
        self.lock_piece();
        true
    }

    /// Lock the active piece onto the board.
    ///
    /// Without complete rows the next piece spawns at once. Otherwise the rows
    /// are recorded as clearing and a [`GameEvent::LinesCleared`] carries the
    /// ticket that finishes the clear.
    pub fn lock_piece(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.board = merge_into_board(&active, &self.board);

        let rows = self.board.complete_rows();
        if rows.is_empty() {
            self.spawn_piece();
            return;
        }

        let event = LineClearEvent {
            lines: rows.len() as u8,
        };
        self.clearing = rows;
        self.emit(GameEvent::LinesCleared {
            ticket: ClearTicket {
                generation: self.generation,
            },
            event,
        });
    }

    /// Remove the clearing rows, score them and spawn the next piece.
    ///
    /// Points use the level in effect before the new lines count. Returns
    /// false for a ticket from an earlier game, when no clear is pending, or
    /// while paused; a refused ticket stays valid for a later call.
    pub fn finish_line_clear(&mut self, ticket: ClearTicket) -> bool {
        if self.paused || ticket.generation != self.generation || !self.is_clearing() {
            return false;
        }

        let removed = self.board.remove_rows(&self.clearing);
        self.clearing.clear();

        self.score = self
            .score
            .saturating_add(line_clear_points(removed, self.level));
        self.lines = self.lines.saturating_add(removed as u32);
        self.level = level_for_lines(self.lines);

        self.spawn_piece();
        true
    }

    /// One gravity tick: move down a row or lock.
    ///
    /// Does nothing unless a piece is falling and the game is running.
    pub fn gravity_step(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.step_down()
    }

    /// Start over with an empty board.
    ///
    /// The ghost preference and the generator carry over; any pending clear
    /// ticket becomes stale.
    pub fn reset(&mut self) {
        self.board.clear();
        self.active = None;
        self.score = 0;
        self.lines = 0;
        self.level = START_LEVEL;
        self.game_over = false;
        self.paused = false;
        self.clearing.clear();
        self.events.clear();
        self.generation = self.generation.wrapping_add(1);
        self.started = true;
        self.spawn_piece();
    }

    /// Apply a game action.
    ///
    /// Returns whether anything changed. Piece commands and the ghost toggle
    /// are ignored while paused, clearing or after game over; after game over
    /// only reset does anything.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        if action.is_guarded() && !self.accepts_input() {
            return false;
        }

        match action {
            GameAction::MoveLeft => self.try_move(-1, 0),
            GameAction::MoveRight => self.try_move(1, 0),
            GameAction::SoftDrop => self.step_down(),
            GameAction::Rotate => self.rotate(),
            GameAction::HardDrop => self.hard_drop(),
            GameAction::ToggleGhost => {
                self.ghost_enabled = !self.ghost_enabled;
                true
            }
            GameAction::TogglePause => {
                if self.game_over {
                    return false;
                }
                self.paused = !self.paused;
                true
            }
            GameAction::Reset => {
                self.reset();
                true
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_ticket(state: &mut GameState) -> (ClearTicket, LineClearEvent) {
        state
            .take_events()
            .into_iter()
            .find_map(|e| match e {
                GameEvent::LinesCleared { ticket, event } => Some((ticket, event)),
                GameEvent::GameOver => None,
            })
            .expect("a line clear should be pending")
    }

    #[test]
    fn test_new_game_state() {
        let state = GameState::new(12345);

        assert!(!state.started());
        assert!(!state.game_over());
        assert!(!state.paused());
        assert!(state.ghost_enabled());
        assert_eq!(state.score(), 0);
        assert_eq!(state.level(), 1);
        assert_eq!(state.lines(), 0);
        assert_eq!(state.generation(), 0);
        assert!(state.active().is_none());
        assert_eq!(state.phase(), Phase::Spawning);
    }

    #[test]
    fn test_game_start_spawns_announced_piece() {
        let mut state = GameState::new(12345);
        let announced = state.next_kind();
        state.start();

        let active = state.active().expect("piece after start");
        assert_eq!(active.kind, announced);
        assert_eq!(active.y, 0);
        assert_eq!(state.phase(), Phase::Falling);
        assert!(state.gravity_active());
    }

    #[test]
    fn test_commands_ignored_before_start() {
        let mut state = GameState::new(1);
        assert!(!state.apply_action(GameAction::MoveLeft));
        assert!(!state.gravity_step());
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let mut state = GameState::with_board(1, Board::new(), PieceKind::O);
        state.start();
        for _ in 0..4 {
            assert!(state.apply_action(GameAction::MoveLeft));
        }
        assert_eq!(state.active().map(|p| p.x), Some(0));
        assert!(!state.apply_action(GameAction::MoveLeft));
    }

    #[test]
    fn test_hard_drop_i_on_empty_board() {
        let mut state = GameState::with_board(1, Board::new(), PieceKind::I);
        state.start();
        assert!(state.apply_action(GameAction::HardDrop));

        assert_eq!(state.board().filled_count(), 4);
        assert!((3..7).all(|x| state.board().is_occupied(x, 19)));
        assert_eq!(state.score(), 38);
        assert!(!state.game_over());
        assert!(state.active().is_some());
    }

    #[test]
    fn test_soft_drop_locks_when_blocked() {
        let mut state = GameState::with_board(1, Board::new(), PieceKind::O);
        state.start();
        for _ in 0..18 {
            assert!(state.apply_action(GameAction::SoftDrop));
        }
        assert_eq!(state.active().map(|p| p.y), Some(18));
        assert_eq!(state.board().filled_count(), 0);

        assert!(state.apply_action(GameAction::SoftDrop));
        assert_eq!(state.board().filled_count(), 4);
        assert_eq!(state.active().map(|p| p.y), Some(0));
        // Soft drops are not scored.
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_gravity_step_locks_at_floor() {
        let mut state = GameState::with_board(1, Board::new(), PieceKind::I);
        state.start();
        for _ in 0..19 {
            state.gravity_step();
        }
        assert_eq!(state.active().map(|p| p.y), Some(19));
        state.gravity_step();
        assert_eq!(state.board().filled_count(), 4);
    }

    #[test]
    fn test_line_clear_is_two_phase() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        assert!(state.apply_action(GameAction::HardDrop));

        assert_eq!(state.phase(), Phase::ClearingLines);
        assert_eq!(state.clearing_rows(), &[19]);
        assert!(state.active().is_none());
        // Cells stay visible while the row flashes.
        assert_eq!(state.board().filled_count(), 12);

        let score_after_drop = state.score();
        let (ticket, event) = pending_ticket(&mut state);
        assert_eq!(event.lines, 1);

        assert!(state.finish_line_clear(ticket));
        assert_eq!(state.lines(), 1);
        assert_eq!(state.score(), score_after_drop + 100);
        assert_eq!(state.board().filled_count(), 2);
        assert!(state.active().is_some());
        assert!(!state.is_clearing());
    }

    #[test]
    fn test_input_ignored_while_clearing() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        state.apply_action(GameAction::HardDrop);

        assert!(!state.apply_action(GameAction::MoveLeft));
        assert!(!state.apply_action(GameAction::HardDrop));
        assert!(!state.apply_action(GameAction::ToggleGhost));
        assert!(!state.gravity_step());
        assert!(!state.spawn_piece());
        assert!(state.apply_action(GameAction::TogglePause));
    }

    #[test]
    fn test_tetris_in_well() {
        let board = Board::from_rows(&[
            "IIIIIIIII.",
            "IIIIIIIII.",
            "IIIIIIIII.",
            "IIIIIIIII.",
        ]);
        let mut state = GameState::with_board(1, board, PieceKind::I);
        state.start();
        assert!(state.apply_action(GameAction::Rotate));
        let vertical = state.active().expect("active");
        assert_eq!(vertical.shape.cols(), 1);
        let to_wall = 9 - vertical.x;
        for _ in 0..to_wall {
            assert!(state.apply_action(GameAction::MoveRight));
        }

        let before = state.score();
        state.apply_action(GameAction::HardDrop);
        let (ticket, event) = pending_ticket(&mut state);
        assert!(event.is_tetris());
        assert_eq!(state.clearing_rows(), &[16, 17, 18, 19]);

        let drop_bonus = state.score() - before;
        assert!(state.finish_line_clear(ticket));
        assert_eq!(state.score(), before + drop_bonus + 800);
        assert!(state.board().is_empty());
        assert_eq!(state.lines(), 4);
    }

    #[test]
    fn test_line_points_use_level_before_clear() {
        let board = Board::from_rows(&["IIIIIIIII."]);
        let mut state = GameState::with_board(1, board, PieceKind::I);
        state.start();
        state.lines = 9;
        state.level = level_for_lines(9);

        state.apply_action(GameAction::Rotate);
        for _ in 0..6 {
            state.apply_action(GameAction::MoveRight);
        }
        let before = state.score();
        state.apply_action(GameAction::HardDrop);
        let bonus = state.score() - before;
        let (ticket, _) = pending_ticket(&mut state);
        state.finish_line_clear(ticket);

        assert_eq!(state.level(), 2);
        assert_eq!(state.score(), before + bonus + 100);
        assert_eq!(state.drop_interval_ms(), 900);
    }

    #[test]
    fn test_spawn_blocked_is_game_over() {
        let board = Board::from_rows(&[
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
            "IIIIIIIII.",
            ".IIIIIIIII",
        ]);
        let mut state = GameState::with_board(1, board, PieceKind::T);
        state.start();

        assert!(state.game_over());
        assert!(state.active().is_none());
        assert_eq!(state.phase(), Phase::GameOver);
        assert_eq!(state.take_events().as_slice(), &[GameEvent::GameOver]);
        assert!(!state.apply_action(GameAction::HardDrop));
        assert!(!state.gravity_active());
    }

    #[test]
    fn test_reset_after_game_over() {
        let board = Board::from_rows(&["TTTTTTTTT."; 20]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        assert!(state.game_over());
        state.apply_action(GameAction::ToggleGhost);
        assert!(state.ghost_enabled());

        assert!(state.apply_action(GameAction::Reset));
        assert!(!state.game_over());
        assert!(!state.paused());
        assert_eq!(state.score(), 0);
        assert_eq!(state.lines(), 0);
        assert_eq!(state.level(), 1);
        assert!(state.board().is_empty());
        assert!(state.active().is_some());
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn test_stale_ticket_rejected_after_reset() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        state.apply_action(GameAction::HardDrop);
        let (ticket, _) = pending_ticket(&mut state);

        state.apply_action(GameAction::Reset);
        assert!(!state.finish_line_clear(ticket));
        assert_eq!(state.lines(), 0);
        assert_eq!(state.score(), 0);
        assert!(!state.is_clearing());
    }

    #[test]
    fn test_ticket_redeemed_once() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        state.apply_action(GameAction::HardDrop);
        let (ticket, _) = pending_ticket(&mut state);

        assert!(state.finish_line_clear(ticket));
        assert!(!state.finish_line_clear(ticket));
        assert_eq!(state.lines(), 1);
    }

    #[test]
    fn test_pause_holds_pending_clear() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        state.apply_action(GameAction::HardDrop);
        let (ticket, _) = pending_ticket(&mut state);
        let score_after_drop = state.score();

        assert!(state.apply_action(GameAction::TogglePause));
        assert!(!state.finish_line_clear(ticket));
        assert_eq!(state.score(), score_after_drop);
        assert_eq!(state.lines(), 0);
        assert_eq!(state.clearing_rows(), &[19]);
        assert!(state.active().is_none());
        assert_eq!(state.phase(), Phase::Paused);

        assert!(state.apply_action(GameAction::TogglePause));
        assert!(state.finish_line_clear(ticket));
        assert_eq!(state.score(), score_after_drop + 100);
        assert_eq!(state.lines(), 1);
        assert!(state.active().is_some());
    }

    #[test]
    fn test_pause_ignored_after_game_over() {
        let board = Board::from_rows(&["TTTTTTTTT."; 20]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        assert!(state.game_over());

        assert!(!state.apply_action(GameAction::TogglePause));
        assert!(!state.paused());
        assert_eq!(state.phase(), Phase::GameOver);
    }

    #[test]
    fn test_pause_blocks_gravity_and_moves() {
        let mut state = GameState::new(7);
        state.start();
        assert!(state.apply_action(GameAction::TogglePause));
        assert_eq!(state.phase(), Phase::Paused);
        assert!(!state.gravity_active());
        assert!(!state.gravity_step());
        assert!(!state.apply_action(GameAction::Rotate));

        assert!(state.apply_action(GameAction::TogglePause));
        assert!(state.gravity_step());
    }

    #[test]
    fn test_snapshot_hides_ghost_when_disabled() {
        let mut state = GameState::with_board(1, Board::new(), PieceKind::I);
        state.start();
        assert_eq!(state.snapshot().ghost_y, Some(19));

        state.apply_action(GameAction::ToggleGhost);
        let snap = state.snapshot();
        assert!(!snap.ghost_enabled);
        assert_eq!(snap.ghost_y, None);
        assert!(snap.active.is_some());
    }

    #[test]
    fn test_snapshot_marks_clearing_rows() {
        let board = Board::from_rows(&["IIII..IIII"]);
        let mut state = GameState::with_board(1, board, PieceKind::O);
        state.start();
        state.apply_action(GameAction::HardDrop);

        let snap = state.snapshot();
        assert!(snap.clearing[19]);
        assert!(!snap.clearing[18]);
        assert_eq!(snap.board[19][4], PieceKind::O.code());
    }
}
