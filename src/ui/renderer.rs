/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each board coordinate takes two terminal columns. The right column is
/// the "bridge": filled with the jelly color when the cell is joined to its
/// right neighbor, a dark gap otherwise, so separate jellies read apart.

use std::collections::HashMap;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::{Cell as GridCell, Dir};
use crate::domain::color::Color as JellyColor;
use crate::sim::event::Frame;
use crate::sim::session::Session;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so row gaps
    /// on VTE terminals match the cell color.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
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

const WALL_BG: Color = Color::Rgb { r: 78, g: 78, b: 96 };
const GAP_BG: Color = Color::Rgb { r: 14, g: 14, b: 22 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const SOLVED_BG: Color = Color::Rgb { r: 40, g: 140, b: 60 };

fn jelly_rgb(color: JellyColor) -> Color {
    match color {
        JellyColor::Red => Color::Rgb { r: 214, g: 58, b: 58 },
        JellyColor::Green => Color::Rgb { r: 66, g: 184, b: 82 },
        JellyColor::Blue => Color::Rgb { r: 62, g: 104, b: 226 },
        JellyColor::Yellow => Color::Rgb { r: 228, g: 196, b: 52 },
        JellyColor::Numbered(n) => {
            let v = 34 + n * 9;
            Color::Rgb { r: v, g: v, b: v + 8 }
        }
    }
}

fn arrow(dir: Dir) -> char {
    match dir {
        Dir::Left => '◀',
        Dir::Right => '▶',
        Dir::Up => '▲',
        Dir::Down => '▼',
    }
}

// ── Renderer ──

/// Each board cell = 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// One placed jelly cell, resolved from a frame.
#[derive(Clone, Copy)]
struct Placed {
    color: JellyColor,
    joined: [bool; 4],
    immovable: bool,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal column of board x = 0, from the last render.
    map_col: usize,
    map_w: usize,
    map_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            map_col: 0,
            map_w: 0,
            map_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Repaint everything on the next render.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.invalidate();
    }

    /// Board coordinate under a terminal position, per the last render.
    pub fn screen_to_grid(&self, column: u16, row: u16) -> Option<(i32, i32)> {
        let (col, row) = (column as usize, row as usize);
        if col < self.map_col || row < MAP_ROW {
            return None;
        }
        let gx = (col - self.map_col) / CELL_W;
        let gy = row - MAP_ROW;
        (gx < self.map_w && gy < self.map_h).then_some((gx as i32, gy as i32))
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose(session);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &Session) {
        let frame = s.view();
        let board = s.stage.board();
        self.map_w = board.grid.width();
        self.map_h = board.grid.height();
        self.map_col = self.term_w.saturating_sub(self.map_w * CELL_W) / 2;

        self.compose_hud(s);

        // ── Board ──
        let placed = place(&frame);
        for (x, y, cell) in board.grid.iter() {
            let col = self.map_col + x as usize * CELL_W;
            let row = MAP_ROW + y as usize;
            match (cell, placed.get(&(x, y))) {
                (GridCell::Wall, _) => {
                    self.front.set(col, row, Cell::new(' ', Color::White, WALL_BG));
                    self.front.set(col + 1, row, Cell::new(' ', Color::White, WALL_BG));
                }
                (_, Some(p)) => self.compose_jelly(p, col, row),
                _ => {}
            }
        }

        self.compose_markers(&frame);
        self.compose_cursor(s);

        // ── Message bar ──
        let msg_row = MAP_ROW + self.map_h + 1;
        if !s.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, &s.message, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + self.map_h + 3;
        if help_row < self.front.height {
            let help = " Arrows/WASD:Cursor  Z/X:Slide  U:Undo  R:Reset  E:Export  N/P:Level  Q:Quit  Mouse:L/R click";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
        }
    }

    fn compose_hud(&mut self, s: &Session) {
        let solved = s.show_solved();
        let bg = if solved { SOLVED_BG } else { HUD_BG };
        let hud = format!(
            " {:<10}  [{}/{}]  Moves:{:<4}  Blocks:{}/{}  {}",
            s.level_name(),
            s.current + 1,
            s.levels.len(),
            s.stage.moves(),
            s.stage.num_blocks(),
            s.stage.num_colors(),
            if solved { "SOLVED!  [N] next level" } else { "" },
        );
        self.front.fill_row(HUD_ROW, bg);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, bg);
    }

    fn compose_jelly(&mut self, p: &Placed, col: usize, row: usize) {
        let bg = jelly_rgb(p.color);
        let glyph = match p.color {
            JellyColor::Numbered(n) => (b'0' + n) as char,
            _ if p.immovable => '▪',
            _ => ' ',
        };
        self.front.set(col, row, Cell::new(glyph, Color::White, bg));
        let bridge = if p.joined[Dir::Right.index()] { bg } else { GAP_BG };
        self.front.set(col + 1, row, Cell::new(' ', Color::White, bridge));
    }

    fn compose_markers(&mut self, frame: &Frame) {
        for g in &frame.growers {
            let Some((col, row)) = self.screen_pos(g.x, g.y) else { continue };
            let bg = self.front.get(col, row).bg;
            self.front.set(col, row, Cell::new(arrow(g.dir), jelly_rgb(g.color), bg));
        }
        for a in &frame.anchors {
            let Some((col, row)) = self.screen_pos(a.x, a.y) else { continue };
            let bg = self.front.get(col + 1, row).bg;
            let fg = if a.pending { Color::DarkGrey } else { Color::White };
            // Anchors show on the bridge column, pointing at what holds them.
            self.front.set(col + 1, row, Cell::new(arrow(a.dir), fg, bg));
        }
    }

    fn compose_cursor(&mut self, s: &Session) {
        if s.is_busy() {
            return;
        }
        let (cx, cy) = s.cursor;
        let Some((col, row)) = self.screen_pos(cx, cy) else { return };
        for c in [col, col + 1] {
            let under = self.front.get(c, row);
            self.front.set(c, row, Cell::new(under.ch, Color::Black, invert(under.bg)));
        }
    }

    fn screen_pos(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if x < 0 || y < 0 || x as usize >= self.map_w || y as usize >= self.map_h {
            return None;
        }
        Some((self.map_col + x as usize * CELL_W, MAP_ROW + y as usize))
    }
}

/// Resolve every jelly cell in a frame to its board coordinate.
fn place(frame: &Frame) -> HashMap<(i32, i32), Placed> {
    let mut out = HashMap::new();
    for j in &frame.jellies {
        for c in &j.cells {
            let pos = (j.origin.0 + c.offset.0, j.origin.1 + c.offset.1);
            out.insert(pos, Placed { color: c.color, joined: c.joined, immovable: j.immovable });
        }
    }
    out
}

/// Cursor highlight: lighten dark backgrounds, keep light ones light.
fn invert(bg: Color) -> Color {
    match bg {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: r.saturating_add(120),
            g: g.saturating_add(120),
            b: b.saturating_add(120),
        },
        _ => Color::Grey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelDescriptor;
    use crate::sim::stage::Stage;

    #[test]
    fn place_resolves_offsets() {
        let mut l = LevelDescriptor::from_rows(&["rg ", "   "]);
        l.anchors.push(crate::sim::level::AnchorSpec { x: 0, y: 0, dir: Dir::Right, delayed: false });
        let stage = Stage::load(&l).unwrap();
        let placed = place(&stage.board().frame(crate::sim::event::Phase::Sliding));
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[&(1, 0)].color, JellyColor::Green);
        assert!(placed[&(0, 0)].joined[Dir::Right.index()]);
    }

    #[test]
    fn numbered_colors_get_distinct_shades() {
        assert_ne!(jelly_rgb(JellyColor::Numbered(0)), jelly_rgb(JellyColor::Numbered(9)));
    }
}
