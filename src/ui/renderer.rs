/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (a grid of Cells)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker from full-screen redraws, which matters for
/// the first-person view where most of the screen repaints every frame.
///
/// Two composers share the buffer machinery: the top-down map composer
/// draws world cells directly (2 terminal columns per tile), and the
/// first-person composer rasterizes the projector's primitive list
/// (1 ray column per terminal column).

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::event::Event;
use crate::domain::raycast::{self, Camera, Frame, Primitive, Projection, Rgb, Shape};
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, ViewMode, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, and
    /// for Clear, so inter-row gap pixels match the cell color on
    /// VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position diffs dirty.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
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
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each top-down game cell spans 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_FG: Color = Color::Black;
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<(Phase, ViewMode)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState, proj: &Projection) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Viewport dimensions from terminal size
        let reserved_rows = MAP_ROW + 4; // HUD + gap + msg + help
        let view_h = if self.term_h > reserved_rows { self.term_h - reserved_rows } else { 1 };
        world.camera.view_w = (self.term_w / CELL_W).min(world.grid.width().max(1));
        world.camera.view_h = view_h.min(world.grid.height().max(1));

        // Screen change (phase or view mode) → clear for a clean slate
        let screen = (world.phase, world.view_mode);
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        if world.phase == Phase::Playing {
            let (px, py) = (world.player.x, world.player.y);
            world
                .camera
                .follow(px, py, world.grid.width(), world.grid.height());
        }

        self.front.clear();

        match (world.phase, world.view_mode) {
            (Phase::Title, _) => self.compose_title(world),
            (Phase::Playing, ViewMode::TopDown) => self.compose_top_down(world),
            (Phase::Playing, ViewMode::FirstPerson) => {
                self.compose_first_person(world, proj, view_h)
            }
        }

        if world.paused {
            self.compose_pause_overlay();
        }

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

        // Explicit base colors at frame start; ResetColor would fall
        // back to the terminal default and cause line artifacts.
        queue!(
            self.writer,
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

    // ── Top-down view ──

    fn compose_top_down(&mut self, w: &WorldState) {
        let cam = &w.camera;

        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(" Score:{:<7}  [2D]  TAB:3D view ", w.score);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        for vy in 0..cam.view_h {
            let wy = cam.y + vy as i32;
            let row = MAP_ROW + vy;
            if row >= self.front.height {
                break;
            }
            for vx in 0..cam.view_w {
                let wx = cam.x + vx as i32;
                let col = vx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                self.compose_tile(w, wx, wy, col, row);
            }
        }

        self.compose_message_bar(w, MAP_ROW + cam.view_h + 1);

        let help_row = MAP_ROW + cam.view_h + 3;
        if help_row < self.front.height {
            let help = " Arrows/WASD:Move  SPACE:Swing  TAB:View  R:New dungeon  F1:Pause  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// One world cell of the top-down map → 2 terminal columns.
    fn compose_tile(&mut self, w: &WorldState, wx: i32, wy: i32, col: usize, row: usize) {
        // Void outside the world
        if !w.grid.in_bounds(wx, wy) {
            self.front.set(col, row, Cell::BLANK);
            self.front.set(col + 1, row, Cell::BLANK);
            return;
        }

        // Player on top of everything
        if w.player.x == wx && w.player.y == wy {
            let arrow = match w.player.facing {
                (1, 0) => '>',
                (-1, 0) => '<',
                (0, -1) => '^',
                _ => 'v',
            };
            let fg = Color::Rgb { r: 255, g: 224, b: 102 };
            self.front.set(col, row, Cell::new('@', fg, Color::Reset));
            self.front.set(col + 1, row, Cell::new(arrow, fg, Color::Reset));
            return;
        }

        let tile = w.grid.at(wx, wy);

        // Revealed events sit on floor tiles
        if tile == Tile::Floor {
            let event = w.events.at(wx, wy);
            if event != Event::None {
                let (c0, mut fg) = match event {
                    Event::CheapTreasure => ('o', rgb(raycast::CHEAP_COLOR)),
                    Event::ExpensiveTreasure => ('◆', rgb(raycast::EXPENSIVE_COLOR)),
                    Event::Trap => ('▲', rgb(raycast::TRAP_COLOR)),
                    Event::None => unreachable!(),
                };
                // Armed traps flash while their fuse burns
                if event == Event::Trap
                    && w.fuse_at(wx, wy).is_some()
                    && (w.anim_tick / 2) % 2 == 0
                {
                    fg = Color::White;
                }
                self.front.set(col, row, Cell::new(c0, fg, Color::Reset));
                self.front.set(col + 1, row, Cell::new(' ', fg, Color::Reset));
                return;
            }
        }

        let (c0, c1, fg, bg) = match tile {
            Tile::Wall => ('▓', '▓', Color::Rgb { r: 90, g: 90, b: 102 }, Color::Rgb { r: 45, g: 45, b: 52 }),
            Tile::Floor => ('·', ' ', Color::Rgb { r: 110, g: 110, b: 110 }, Color::Rgb { r: 30, g: 30, b: 36 }),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    // ── First-person view ──

    fn compose_first_person(&mut self, w: &WorldState, proj: &Projection, view_h: usize) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " Score:{:<7}  N W [{}] E S  [3D]  TAB:2D view ",
            w.score,
            w.view.compass(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let cols = self.front.width;
        let rows = view_h;
        if cols == 0 || rows == 0 {
            return;
        }

        let cam = Camera::at_tile(w.player.x, w.player.y, w.view.angle());
        let frame = raycast::project(
            &w.grid,
            &w.events,
            cam,
            proj,
            cols as f32,
            rows as f32,
            cols,
        );
        self.rasterize(&frame, MAP_ROW, rows);
        self.compose_minimap(w, MAP_ROW);

        self.compose_message_bar(w, MAP_ROW + rows + 1);

        let help_row = MAP_ROW + rows + 3;
        if help_row < self.front.height {
            let help = " ←→:Turn  ↑↓:Walk  SPACE:Swing  TAB:View  R:New dungeon  F1:Pause  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Paint the projector's primitives into the buffer. One surface
    /// unit = one terminal cell; primitives arrive back-to-front.
    fn rasterize(&mut self, frame: &Frame, top: usize, rows: usize) {
        for prim in &frame.prims {
            match *prim {
                Primitive::Rect { x, y, w, h, color } => {
                    let x0 = x.floor().max(0.0) as usize;
                    let x1 = ((x + w).ceil() as usize).min(frame.width as usize);
                    let y0 = y.floor().max(0.0) as usize;
                    let y1 = ((y + h).ceil() as usize).min(rows);
                    for cy in y0..y1 {
                        for cx in x0..x1 {
                            self.front.set(cx, top + cy, Cell::new(' ', Color::White, rgb(color)));
                        }
                    }
                }
                Primitive::Icon { shape, cx, cy, size, color } => {
                    let px = cx.round().max(0.0) as usize;
                    let py = cy.round().max(0.0) as usize;
                    if px >= frame.width as usize || py >= rows {
                        continue;
                    }
                    let ch = icon_glyph(shape, size);
                    let under = self.front.get(px, top + py);
                    self.front.set(px, top + py, Cell::new(ch, rgb(color), under.bg));
                }
            }
        }
    }

    /// Small always-on map in the top-right corner of the 3D view,
    /// 1 terminal cell per tile.
    fn compose_minimap(&mut self, w: &WorldState, top: usize) {
        let gw = w.grid.width();
        let gh = w.grid.height();
        if gw + 1 > self.front.width {
            return;
        }
        let left = self.front.width - gw - 1;
        for y in 0..gh {
            let row = top + y;
            if row >= self.front.height {
                break;
            }
            for x in 0..gw {
                let cell = if (w.player.x, w.player.y) == (x as i32, y as i32) {
                    Cell::new('@', Color::Rgb { r: 255, g: 224, b: 102 }, Color::Rgb { r: 24, g: 24, b: 24 })
                } else {
                    match w.grid.at(x as i32, y as i32) {
                        Tile::Wall => Cell::new('▓', Color::Rgb { r: 70, g: 70, b: 80 }, Color::Rgb { r: 24, g: 24, b: 24 }),
                        Tile::Floor => Cell::new('·', Color::Rgb { r: 150, g: 150, b: 150 }, Color::Rgb { r: 24, g: 24, b: 24 }),
                    }
                };
                self.front.set(left + x, row, cell);
            }
        }
    }

    // ── Shared chrome ──

    fn compose_message_bar(&mut self, w: &WorldState, row: usize) {
        if row < self.front.height && !w.message.is_empty() {
            self.front.fill_row(row, MSG_BG);
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_str(0, row, &msg, MSG_FG, MSG_BG);
        }
    }

    // ── Title screen ──

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  __  __           _                   __  __ _                 ",
            r" |  \/  | _  _  __| |_  ___  _ _  _  _|  \/  (_) _ _   ___  _ _ ",
            r" | |\/| || || |(_-<|  _|/ -_)| '_|| || | |\/| | || ' \ / -_)| '_|",
            r" |_|  |_| \_, |/__/ \__|\___||_|   \_, |_|  |_|_||_||_|\___||_|  ",
            r"          |__/                     |__/                          ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, Color::Rgb { r: 230, g: 210, b: 138 }, Color::Reset);
        }

        let subtitle = "◈◈  Break walls. Grab gems. Mind the traps.  ◈◈";
        self.front.put_str(8, 8, subtitle, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);

        let menu_base = 11;
        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(8, menu_base, "ENTER   Descend (top-down)", hi, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  3     Descend (first-person)", Color::Rgb { r: 100, g: 200, b: 255 }, Color::Reset);
        self.front.put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move            SPACE  Swing pick",
            "  TAB           Switch view     R      New dungeon",
            "  F1 Pause      ESC Title",
            "  (first-person: ←→ turn, ↑↓ walk)",
        ];
        let help_base = menu_base + 4;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { Color::Rgb { r: 255, g: 200, b: 50 } } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        if w.score > 0 {
            let last = format!("Last run: {} points", w.score);
            self.front.put_str(8, help_base + help.len() + 1, &last, Color::DarkGrey, Color::Reset);
        }

        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            self.compose_message_bar(w, msg_row);
        }
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let w = self.front.width;
        let cx = w.saturating_sub(21) / 2;
        let cy = (self.front.height / 2).saturating_sub(1);
        self.front.put_str(cx, cy, "╔═══════════════════╗", hdr, dim);
        self.front.put_str(cx, cy + 1, "║      PAUSED       ║", hdr, dim);
        self.front.put_str(cx, cy + 2, "╚═══════════════════╝", hdr, dim);
    }
}

fn icon_glyph(shape: Shape, size: f32) -> char {
    match (shape, size >= 3.0) {
        (Shape::Circle, true) => '●',
        (Shape::Circle, false) => '•',
        (Shape::Diamond, true) => '◆',
        (Shape::Diamond, false) => '◇',
        (Shape::Triangle, true) => '▲',
        (Shape::Triangle, false) => '△',
    }
}
