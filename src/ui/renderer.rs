/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// The terminal is treated as a low-resolution framebuffer of
/// `cols × PX_PER_COL` by `rows × PX_PER_ROW` pixels. Quads are projected
/// to NDC, then rasterised by testing every covered cell center against the
/// inverse of the quad's matrix, so rotated quads come out right.
///
/// How a frame works:
///   1. `begin_frame` clears the `front` buffer (and handles resizes)
///   2. Draw calls paint into `front`
///   3. `present` compares each cell with `back` (previous frame), emits
///      terminal commands only for changed cells, flushes once, then swaps

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor, ResetColor},
    terminal::{self, Clear, ClearType},
};
use glam::{Mat3, UVec2, Vec2};
use tracing::{debug, info};

use crate::backend::{
    BackendError, Quad, RenderBackend, Rgb, Sprite, SpriteKind, SpriteLoader, WindowBackend, WHITE,
};

/// Virtual pixels per terminal cell. Cells are roughly twice as tall as wide.
const PX_PER_COL: u32 = 8;
const PX_PER_ROW: u32 = 16;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Rgb,
    bg: Rgb,
}

impl Cell {
    /// Explicit dark background for all empty cells, so the gaps between
    /// terminal rows match the cell color.
    const BASE_BG: Rgb = Rgb::new(22, 22, 35);

    const BLANK: Cell = Cell { ch: ' ', fg: WHITE, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer; differs from any real cell.
    const INVALID: Cell = Cell { ch: '?', fg: Rgb::new(255, 0, 255), bg: Rgb::new(255, 0, 255) };
}

fn term_color(c: Rgb) -> Color {
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

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            self.cells.get_mut(y * self.width + x)
        } else {
            None
        }
    }

    /// Write a string starting at (x, y), keeping each cell's background.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Rgb) {
        for (i, ch) in s.chars().enumerate() {
            if let Some(cell) = self.cell_mut(x + i, y) {
                cell.ch = ch;
                cell.fg = fg;
            }
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Framebuffer pixels per world unit; the logical width always spans the terminal.
    density: f32,
    logical_width: f32,
    next_sprite: u32,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new(logical_width: f32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            density: 1.0,
            logical_width: logical_width.max(1.0),
            next_sprite: 0,
            keyboard_enhanced: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(term_color(Cell::BASE_BG)),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        info!(
            "terminal {}x{}, density {:.3}, key releases {}",
            self.term_w, self.term_h, self.density, self.keyboard_enhanced
        );
        Ok(self.keyboard_enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.density = (w as u32 * PX_PER_COL) as f32 / self.logical_width;
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Start a new frame: pick up terminal resizes and clear the canvas.
    pub fn begin_frame(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            debug!("terminal resized to {tw}x{th}");
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(term_color(Cell::BASE_BG)), Clear(ClearType::All))?;
        }
        self.front.clear();
        Ok(())
    }

    /// Status line on the bottom terminal row, in screen space.
    pub fn draw_status(&mut self, text: &str) {
        let row = self.term_h.saturating_sub(1);
        for x in 0..self.term_w {
            if let Some(cell) = self.front.cell_mut(x, row) {
                *cell = Cell { ch: ' ', fg: WHITE, bg: Rgb::new(10, 10, 18) };
            }
        }
        self.front.put_str(1, row, text, Rgb::new(170, 170, 190));
    }

    /// Diff, emit and swap.
    pub fn present(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = WHITE;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;

        queue!(
            self.writer,
            SetForegroundColor(term_color(last_fg)),
            SetBackgroundColor(term_color(last_bg)),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(term_color(cell.fg)))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(term_color(cell.bg)))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
            }
            // the cursor wraps unpredictably at the right edge
            need_move = true;
        }

        self.writer.flush()
    }

    // ── Projection helpers ──

    fn ndc_to_cell(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.term_w as f32,
            (1.0 - ndc.y) * 0.5 * self.term_h as f32,
        )
    }

    fn cell_to_ndc(&self, cell: Vec2) -> Vec2 {
        Vec2::new(
            cell.x / self.term_w as f32 * 2.0 - 1.0,
            1.0 - cell.y / self.term_h as f32 * 2.0,
        )
    }
}

fn glyph(kind: SpriteKind, flip_x: bool) -> Option<char> {
    match kind {
        SpriteKind::Character => Some('●'),
        SpriteKind::Spotter => Some('◉'),
        SpriteKind::Wanderer if flip_x => Some('◀'),
        SpriteKind::Wanderer => Some('▶'),
        SpriteKind::Trophy => Some('★'),
        SpriteKind::Pointer => Some('▸'),
        SpriteKind::Tile => None,
    }
}

impl SpriteLoader for Renderer {
    /// Terminal sprites are glyph tables; acquiring one never fails.
    fn load_sprite(&mut self, kind: SpriteKind) -> Result<Sprite, BackendError> {
        self.next_sprite += 1;
        Ok(Sprite { id: self.next_sprite, kind })
    }
}

impl RenderBackend for Renderer {
    fn draw_quad(&mut self, projection: &Mat3, quad: Quad<'_>) {
        if self.term_w == 0 || self.term_h == 0 {
            return;
        }
        let to_ndc = *projection * quad.transform;
        if to_ndc.determinant().abs() < f32::EPSILON {
            return;
        }
        let to_local = to_ndc.inverse();

        let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)]
            .map(|(x, y)| self.ndc_to_cell(to_ndc.transform_point2(Vec2::new(x, y))));
        let lo = corners.iter().fold(Vec2::splat(f32::MAX), |a, c| a.min(*c));
        let hi = corners.iter().fold(Vec2::splat(f32::MIN), |a, c| a.max(*c));
        let x0 = lo.x.floor().max(0.0) as usize;
        let y0 = lo.y.floor().max(0.0) as usize;
        let x1 = (hi.x.ceil().max(0.0) as usize).min(self.term_w);
        let y1 = (hi.y.ceil().max(0.0) as usize).min(self.term_h);

        let center = self.ndc_to_cell(to_ndc.transform_point2(Vec2::ZERO)).floor();
        let mark = quad.sprite.and_then(|s| glyph(s.kind, quad.flip_x));

        for y in y0..y1 {
            for x in x0..x1 {
                let ndc = self.cell_to_ndc(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                let local = to_local.transform_point2(ndc);
                if local.x.abs() > 0.5 || local.y.abs() > 0.5 {
                    continue;
                }
                let Some(cell) = self.front.cell_mut(x, y) else { continue };
                match (quad.sprite, mark) {
                    // tiles paint the ground
                    (Some(_), None) => cell.bg = quad.tint,
                    // untextured quads are translucent overlays
                    (None, _) => cell.bg = cell.bg.mix(quad.tint, 0.45),
                    (Some(_), Some(ch)) => {
                        cell.bg = cell.bg.mix(quad.tint, 0.65);
                        if x as f32 == center.x && y as f32 == center.y {
                            cell.ch = ch;
                            cell.fg = WHITE;
                        }
                    }
                }
            }
        }
    }

    fn draw_text(&mut self, projection: &Mat3, at: Vec2, text: &str, tint: Rgb) {
        let pos = self.ndc_to_cell(projection.transform_point2(at)).round();
        if pos.x < 0.0 || pos.y < 0.0 {
            return;
        }
        self.front.put_str(pos.x as usize, pos.y as usize, text, tint);
    }
}

impl WindowBackend for Renderer {
    fn framebuffer_size(&self) -> UVec2 {
        UVec2::new(self.term_w as u32 * PX_PER_COL, self.term_h as u32 * PX_PER_ROW)
    }

    fn pixel_density(&self) -> f32 {
        self.density
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::{orthographic, Transform};

    /// A renderer with a canvas but no terminal attached.
    fn canvas(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new(w as f32);
        r.term_w = w;
        r.term_h = h;
        r.front.resize(w, h);
        r.back.resize(w, h);
        r
    }

    fn painted(r: &Renderer) -> usize {
        r.front.cells.iter().filter(|c| c.bg != Cell::BASE_BG).count()
    }

    #[test]
    fn tile_quad_fills_its_cells() {
        let mut r = canvas(40, 20);
        let proj = orthographic(0.0, 0.0, 40.0, 20.0);
        let sprite = r.load_sprite(SpriteKind::Tile).unwrap();
        let transform = Transform::new().translate(Vec2::new(5.0, 5.0)).scale(Vec2::splat(4.0)).matrix();
        r.draw_quad(&proj, Quad { sprite: Some(&sprite), transform, tint: Rgb::new(1, 2, 3), flip_x: false });
        assert_eq!(painted(&r), 16);
        assert_eq!(r.front.get(3, 3).bg, Rgb::new(1, 2, 3));
        assert_eq!(r.front.get(7, 7).bg, Cell::BASE_BG);
    }

    #[test]
    fn offscreen_quads_are_clipped() {
        let mut r = canvas(10, 10);
        let proj = orthographic(0.0, 0.0, 10.0, 10.0);
        let transform = Transform::new().translate(Vec2::new(-50.0, 3.0)).scale(Vec2::splat(4.0)).matrix();
        r.draw_quad(&proj, Quad { sprite: None, transform, tint: WHITE, flip_x: false });
        assert_eq!(painted(&r), 0);
    }

    #[test]
    fn entity_glyph_lands_on_center_cell() {
        let mut r = canvas(20, 20);
        let proj = orthographic(0.0, 0.0, 20.0, 20.0);
        let sprite = r.load_sprite(SpriteKind::Wanderer).unwrap();
        let transform = Transform::new().translate(Vec2::new(10.5, 10.5)).scale(Vec2::splat(3.0)).matrix();
        r.draw_quad(&proj, Quad { sprite: Some(&sprite), transform, tint: WHITE, flip_x: true });
        assert_eq!(r.front.get(10, 10).ch, '◀');
    }

    #[test]
    fn text_keeps_background() {
        let mut r = canvas(20, 5);
        let proj = orthographic(0.0, 0.0, 20.0, 5.0);
        r.draw_text(&proj, Vec2::new(2.0, 1.0), "hi", WHITE);
        assert_eq!(r.front.get(2, 1).ch, 'h');
        assert_eq!(r.front.get(3, 1).ch, 'i');
        assert_eq!(r.front.get(3, 1).bg, Cell::BASE_BG);
    }

    #[test]
    fn framebuffer_reports_virtual_pixels() {
        let r = canvas(100, 40);
        assert_eq!(r.framebuffer_size(), UVec2::new(800, 640));
    }
}
