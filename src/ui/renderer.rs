/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is two terminal columns wide. Actors are drawn at
/// half-cell horizontal resolution so steps and bounces read as motion.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{ActorId, BoxColor, BoxId, Facing, TargetId};
use crate::domain::grid::{GridPos, Vec2};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, so inter-row
    /// gaps match cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const STATUS_ROW: usize = 1;
const MAP_ROW: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const FLOOR_BG: Color = Color::Rgb { r: 38, g: 36, b: 48 };
const WALL_BG: Color = Color::Rgb { r: 90, g: 84, b: 100 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

fn box_rgb(color: BoxColor) -> Color {
    match color {
        BoxColor::Red => Color::Rgb { r: 210, g: 60, b: 60 },
        BoxColor::Green => Color::Rgb { r: 60, g: 190, b: 80 },
        BoxColor::Blue => Color::Rgb { r: 70, g: 110, b: 230 },
        BoxColor::Yellow => Color::Rgb { r: 230, g: 200, b: 50 },
    }
}

/// Terminal column (half-cell resolution) and row of a world position.
fn screen_pos(pos: Vec2, origin_x: usize) -> Option<(usize, usize)> {
    let col = (pos.x * CELL_W as f32).round() as i64 + origin_x as i64;
    let row = pos.y.round() as i64 + MAP_ROW as i64;
    (col >= 0 && row >= 0).then(|| (col as usize, row as usize))
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Returns true if the terminal size changed.
    fn sync_size(&mut self, force: bool) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let changed = tw as usize != self.term_w || th as usize != self.term_h;
        if changed || force {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // force a full repaint
            self.back.cells.fill(Cell::INVALID);
        }
        changed
    }

    pub fn render(&mut self, world: &WorldState, pad_connected: bool) -> io::Result<()> {
        let resized = self.sync_size(false);
        let phase_changed = self.last_phase != Some(world.phase);
        if resized || phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::GameComplete => self.compose_game_complete(world),
            _ => {
                self.compose_hud(world, pad_connected);
                let bottom = self.compose_board(world);
                self.compose_footer(world, bottom);
            }
        }
        if world.paused {
            self.compose_banner("PAUSED", "P: resume   Esc: quit");
        } else if world.phase == Phase::LevelComplete {
            self.compose_banner("ROOM CLEAR", "Enter: next room   R: replay");
        } else if world.phase == Phase::TimedOut {
            self.compose_banner("TIME UP", "Enter / R: try again");
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState, pad_connected: bool) {
        let timer = match w.time_remaining() {
            Some(t) if w.timer.is_frozen() => {
                format!("{:>4.0}s (frozen {:.0}s)", t.ceil(), w.timer.frozen_for().ceil())
            }
            Some(t) => format!("{:>4.0}s", t.ceil()),
            None => "  --".to_string(),
        };
        let (boxes, box_total) = w.box_counts();
        let (spots, spot_total) = w.player_counts();
        let hud = format!(
            " Room {}/{}  {}  | Time {}  Boxes {}/{}  Spots {}/{}  Coins {} ",
            w.current_level + 1, w.total_levels, w.level_name,
            timer, boxes, box_total, spots, spot_total, w.records.coins,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let grab = if w.is_dragging() { "[Space] Release" } else { "[Space] Grab" };
        let freeze = if w.boosters.freeze_available() { "ready" } else { "used" };
        let speed = if w.boosters.speed_active() {
            format!("{:.0}s", w.boosters.speed_left().ceil())
        } else if w.boosters.speed_available() {
            "ready".to_string()
        } else {
            "used".to_string()
        };
        let status = format!(
            " {}  Undo:{}  [F]reeze {}  [T]urbo {}  {}{}",
            grab,
            w.undo_depth(),
            freeze,
            speed,
            if w.checkpoint.is_some() { "[C]heckpoint set" } else { "[C]heckpoint" },
            if pad_connected { "  (pad)" } else { "" },
        );
        self.front.put_str(0, STATUS_ROW, &status, Color::Rgb { r: 180, g: 180, b: 200 }, Color::Reset);
    }

    /// Draw terrain, targets and actors. Returns the first row below the map.
    fn compose_board(&mut self, w: &WorldState) -> usize {
        let origin_x = (self.front.width.saturating_sub(w.width * CELL_W)) / 2;

        for y in 0..w.height {
            for x in 0..w.width {
                let cell = GridPos::new(x as i32, y as i32);
                let bg = if w.map().is_wall(cell) { WALL_BG } else { FLOOR_BG };
                let col = origin_x + x * CELL_W;
                for dx in 0..CELL_W {
                    self.front.set(col + dx, MAP_ROW + y, Cell::new(' ', Color::White, bg));
                }
            }
        }

        for (i, point) in w.box_points.iter().enumerate() {
            let fg = box_rgb(point.required);
            let glyph = if w.target_occupied(TargetId::Box(i)) { "**" } else { "::" };
            self.put_at(point.cell.to_world(), origin_x, glyph, fg, FLOOR_BG);
        }
        for (i, point) in w.player_points.iter().enumerate() {
            let fg = if w.target_occupied(TargetId::Player(i)) {
                Color::White
            } else {
                Color::Rgb { r: 150, g: 150, b: 170 }
            };
            self.put_at(point.cell.to_world(), origin_x, "<>", fg, FLOOR_BG);
        }

        for id in (0..w.crates.len()).map(BoxId) {
            let (Some(pos), Some(color)) = (w.box_pos(id), w.box_color(id)) else {
                continue;
            };
            let (glyph, fg) = if w.is_busy(ActorId::Box(id)) {
                ("==", Color::White)
            } else if w.is_grabbed(id) {
                ("##", Color::White)
            } else if w.is_highlighted(id) {
                ("[]", Color::White)
            } else {
                ("  ", Color::Black)
            };
            self.put_at(pos, origin_x, glyph, fg, box_rgb(color));
        }

        let glyph = match (w.facing(), w.is_busy(ActorId::Player)) {
            (Facing::Left, false) => "<@",
            (Facing::Right, false) => "@>",
            (Facing::Left, true) => "<o",
            (Facing::Right, true) => "o>",
        };
        self.put_at(w.player_pos(), origin_x, glyph, Color::Rgb { r: 120, g: 230, b: 255 }, FLOOR_BG);

        MAP_ROW + w.height + 1
    }

    fn put_at(&mut self, pos: Vec2, origin_x: usize, glyph: &str, fg: Color, bg: Color) {
        if let Some((col, row)) = screen_pos(pos, origin_x) {
            self.front.put_str(col, row, glyph, fg, bg);
        }
    }

    fn compose_footer(&mut self, w: &WorldState, row: usize) {
        if !w.message.is_empty() && row < self.front.height {
            self.front.fill_row(row, MSG_BG);
            self.front.put_str(1, row, &w.message, Color::Black, MSG_BG);
        }
        let help = " Move: arrows/WASD  Grab: Space/H  Undo: U/Z  Reset: R  Pause: P  Quit: Esc";
        self.front.put_str(0, row + 2, help, Color::DarkGrey, Color::Reset);
    }

    /// Centered two-line box over the board.
    fn compose_banner(&mut self, title: &str, hint: &str) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = title.len().max(hint.len()) + 6;
        let x0 = self.front.width.saturating_sub(box_w) / 2;
        let y0 = MAP_ROW + 1;
        for y in y0..y0 + 4 {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        self.front.put_str(x0 + (box_w - title.len()) / 2, y0 + 1, title, hdr, dim);
        self.front.put_str(x0 + 3, y0 + 2, hint, Color::Rgb { r: 100, g: 200, b: 255 }, dim);
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let green = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(4, 4, "+--------------------------------+", gold, Color::Reset);
        self.front.put_str(4, 5, "|     ALL ROOMS TIDIED UP!       |", gold, Color::Reset);
        self.front.put_str(4, 6, "+--------------------------------+", gold, Color::Reset);
        let rooms = format!("Rooms cleared: {}", w.total_levels);
        let coins = format!("Coins earned:  {}", w.records.coins);
        self.front.put_str(6, 8, &rooms, Color::White, Color::Reset);
        self.front.put_str(6, 9, &coins, Color::White, Color::Reset);
        self.front.put_str(6, 11, "Enter: play again   Esc: quit", green, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_cell_columns() {
        assert_eq!(screen_pos(Vec2::new(0.0, 0.0), 4), Some((4, MAP_ROW)));
        assert_eq!(screen_pos(Vec2::new(1.0, 2.0), 4), Some((6, MAP_ROW + 2)));
        // mid-step: one column over
        assert_eq!(screen_pos(Vec2::new(1.5, 2.0), 4), Some((7, MAP_ROW + 2)));
        assert_eq!(screen_pos(Vec2::new(-3.0, 0.0), 0), None);
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(1, 0, "abc", Color::White, Color::Reset);
        assert_eq!(fb.get(1, 0).ch, 'a');
        assert_eq!(fb.get(2, 0).ch, 'b');
        assert_eq!(fb.get(2, 0).bg, Cell::BASE_BG);
    }
}
