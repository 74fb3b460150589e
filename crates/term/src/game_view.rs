//! GameView: maps a [`GameSnapshot`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{shape_of, ActiveSnapshot, GameSnapshot};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

const WELL_BG: Rgb = Rgb::new(30, 30, 40);
const PANEL_BG: Rgb = Rgb::new(0, 0, 0);

/// Side panel needs at least this many columns
const MIN_PANEL_W: u16 = 12;

/// Key help shown under the stats when there is room
const CONTROLS: [&str; 7] = [
    "←→  move",
    "↑   rotate",
    "↓   soft drop",
    "SPC hard drop",
    "P   pause",
    "G   ghost",
    "R   restart",
];

/// A lightweight terminal renderer for the Tetris game.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 roughly squares the cells in most terminal fonts.
        Self {
            cell_w: 2,
            cell_h: 1,
            anchor_y: AnchorY::Center,
        }
    }
}

/// Screen placement of the well for one frame
#[derive(Debug, Clone, Copy)]
struct Layout {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Render a frame into an existing framebuffer.
    ///
    /// Callers can reuse one framebuffer across frames; it is resized to the
    /// viewport as needed.
    pub fn render_into(
        &self,
        snap: &GameSnapshot,
        best_score: u32,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let layout = self.layout(viewport);
        let bg = CellStyle {
            fg: Rgb::new(80, 80, 90),
            bg: WELL_BG,
            bold: false,
            dim: false,
        };
        fb.fill_rect(layout.x + 1, layout.y + 1, layout.w - 2, layout.h - 2, ' ', bg);
        self.draw_border(fb, layout);

        for y in 0..BOARD_HEIGHT as u16 {
            if snap.clearing[y as usize] {
                self.draw_clearing_row(fb, layout, y);
                continue;
            }
            for x in 0..BOARD_WIDTH as u16 {
                match snap.cell(x as usize, y as usize) {
                    Some(kind) => self.draw_block(fb, layout, x, y, kind),
                    None => self.draw_empty_cell(fb, layout, x, y),
                }
            }
        }

        if let Some(active) = snap.active {
            if let Some(ghost_y) = snap.ghost_y {
                self.draw_ghost(fb, layout, &active, ghost_y);
            }
            for (x, y) in active.cells() {
                if let Some((x, y)) = on_board(x, y) {
                    self.draw_block(fb, layout, x, y, active.kind);
                }
            }
        }

        self.draw_side_panel(fb, snap, best_score, viewport, layout);

        if snap.game_over {
            self.draw_overlay(fb, layout, "GAME OVER", Some("Press Enter"));
        } else if snap.paused {
            self.draw_overlay(fb, layout, "PAUSED", Some("P to resume"));
        } else if snap.clearing.iter().filter(|&&row| row).count() >= 4 {
            self.draw_overlay(fb, layout, "TETRIS!", None);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, best_score: u32, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, best_score, viewport, &mut fb);
        fb
    }

    fn layout(&self, viewport: Viewport) -> Layout {
        let w = (BOARD_WIDTH as u16) * self.cell_w + 2;
        let h = (BOARD_HEIGHT as u16) * self.cell_h + 2;
        // Leave room for the panel to the right when centering.
        let total_w = w + 2 + MIN_PANEL_W + 4;
        let x = viewport.width.saturating_sub(total_w) / 2;
        let y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(h) / 2,
            AnchorY::Top => 0,
        };
        Layout { x, y, w, h }
    }

    fn draw_border(&self, fb: &mut FrameBuffer, l: Layout) {
        let style = CellStyle {
            fg: Rgb::new(200, 200, 200),
            bg: PANEL_BG,
            bold: false,
            dim: false,
        };
        let (x, y, w, h) = (l.x, l.y, l.w, l.h);

        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);
        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn fill_cell_rect(&self, fb: &mut FrameBuffer, l: Layout, x: u16, y: u16, ch: char, style: CellStyle) {
        let px = l.x + 1 + x * self.cell_w;
        let py = l.y + 1 + y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_empty_cell(&self, fb: &mut FrameBuffer, l: Layout, x: u16, y: u16) {
        let style = CellStyle {
            fg: Rgb::new(90, 90, 100),
            bg: WELL_BG,
            bold: false,
            dim: true,
        };
        self.fill_cell_rect(fb, l, x, y, '·', style);
    }

    fn draw_block(&self, fb: &mut FrameBuffer, l: Layout, x: u16, y: u16, kind: PieceKind) {
        let style = CellStyle {
            fg: piece_color(kind),
            bg: WELL_BG,
            bold: true,
            dim: false,
        };
        self.fill_cell_rect(fb, l, x, y, '█', style);
    }

    fn draw_ghost(&self, fb: &mut FrameBuffer, l: Layout, active: &ActiveSnapshot, ghost_y: i8) {
        let style = CellStyle {
            fg: piece_color(active.kind).scaled(1, 2),
            bg: WELL_BG,
            bold: false,
            dim: true,
        };
        for (x, y) in active.cells_at_row(ghost_y) {
            if let Some((x, y)) = on_board(x, y) {
                self.fill_cell_rect(fb, l, x, y, '░', style);
            }
        }
    }

    fn draw_clearing_row(&self, fb: &mut FrameBuffer, l: Layout, y: u16) {
        let style = CellStyle {
            fg: Rgb::new(255, 255, 255),
            bg: Rgb::new(120, 120, 140),
            bold: true,
            dim: false,
        };
        for x in 0..BOARD_WIDTH as u16 {
            self.fill_cell_rect(fb, l, x, y, '▓', style);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        best_score: u32,
        viewport: Viewport,
        l: Layout,
    ) {
        let panel_x = l.x.saturating_add(l.w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < MIN_PANEL_W {
            return;
        }

        let label = CellStyle {
            fg: Rgb::new(220, 220, 220),
            bg: PANEL_BG,
            bold: true,
            dim: false,
        };
        let value = CellStyle {
            fg: Rgb::new(200, 200, 200),
            bg: PANEL_BG,
            bold: false,
            dim: false,
        };

        let mut y = l.y;
        fb.put_str(panel_x, y, "NEXT", label);
        y = y.saturating_add(1);
        let preview = shape_of(snap.next);
        let block = CellStyle {
            fg: piece_color(snap.next),
            bg: PANEL_BG,
            bold: true,
            dim: false,
        };
        for (dx, dy) in preview.cells() {
            let px = panel_x + (dx as u16) * 2;
            fb.put_str(px, y + dy as u16, "██", block);
        }
        y = y.saturating_add(preview.rows() as u16 + 1);

        for (name, number) in [
            ("SCORE", snap.score),
            ("BEST", best_score),
            ("LINES", snap.lines),
            ("LEVEL", snap.level),
        ] {
            fb.put_str(panel_x, y, name, label);
            fb.put_u32(panel_x, y + 1, number, value);
            y = y.saturating_add(3);
        }

        fb.put_str(panel_x, y, "GHOST", label);
        fb.put_str(
            panel_x + 6,
            y,
            if snap.ghost_enabled { "on" } else { "off" },
            value,
        );
        y = y.saturating_add(2);

        let help = CellStyle { dim: true, ..value };
        if y.saturating_add(CONTROLS.len() as u16) <= viewport.height {
            for line in CONTROLS {
                fb.put_str(panel_x, y, line, help);
                y += 1;
            }
        }
    }

    fn draw_overlay(&self, fb: &mut FrameBuffer, l: Layout, title: &str, hint: Option<&str>) {
        let style = CellStyle {
            fg: Rgb::new(255, 255, 255),
            bg: PANEL_BG,
            bold: true,
            dim: false,
        };
        let mid_y = l.y.saturating_add(l.h / 2).saturating_sub(1);
        let centered = |text: &str| {
            let text_w = text.chars().count() as u16;
            l.x.saturating_add(l.w.saturating_sub(text_w) / 2)
        };
        fb.put_str(centered(title), mid_y, title, style);
        if let Some(hint) = hint {
            let hint_style = CellStyle { bold: false, ..style };
            fb.put_str(centered(hint), mid_y + 2, hint, hint_style);
        }
    }
}

/// Display color for a piece kind
pub fn piece_color(kind: PieceKind) -> Rgb {
    Rgb::from_hex(kind.color_hex()).unwrap_or(Rgb::new(220, 220, 220))
}

fn on_board(x: i8, y: i8) -> Option<(u16, u16)> {
    if x >= 0 && x < BOARD_WIDTH as i8 && y >= 0 && y < BOARD_HEIGHT as i8 {
        Some((x as u16, y as u16))
    } else {
        None
    }
}
