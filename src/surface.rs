//! Drawing surface.
//!
//! The renderer only talks to [`Surface`]. [`FrameBuffer`] is the terminal
//! implementation: an RGB pixel grid two pixels per character cell tall, written
//! out with half-block glyphs. All coordinates are canvas units; `scale` canvas
//! units map onto one terminal pixel.

use crate::color::Rgba;
use glam::Vec2;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear {
        start: Vec2,
        end: Vec2,
        from: Rgba,
        to: Rgba,
    },
}

impl Paint {
    fn color_at(&self, p: Vec2) -> Rgba {
        match *self {
            Paint::Solid(c) => c,
            Paint::Linear { start, end, from, to } => {
                let axis = end - start;
                let len_sq = axis.length_squared();
                if len_sq <= f32::EPSILON {
                    return from;
                }
                let t = (p - start).dot(axis) / len_sq;
                from.lerp(to, t)
            }
        }
    }
}

pub trait Surface {
    /// Canvas size in canvas units.
    fn size(&self) -> (f32, f32);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    /// Radial gradient disc; stop offsets run 0 (centre) to 1 (`radius`).
    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[GradientStop]);
    /// Text horizontally centred on `anchor`.
    fn fill_text(&mut self, text: &str, anchor: Vec2, color: Rgba);
}

/// Colour of a gradient at `t`, interpolating between the surrounding stops.
pub fn sample_stops(stops: &[GradientStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub col: i32,
    pub row: i32,
    pub text: String,
    pub color: Rgba,
}

/// Longest line we rasterise, in pixels.
const MAX_LINE_STEPS: f32 = 4096.0;

pub struct FrameBuffer {
    width: usize,
    height: usize,
    scale: f32,
    pixels: Vec<(f32, f32, f32)>,
    overlay: Vec<TextRun>,
    output_buf: Vec<u8>,
}

impl FrameBuffer {
    /// `None` when the terminal reports no usable area yet.
    pub fn new(cols: u16, rows: u16, scale: f32) -> Option<Self> {
        if cols == 0 || rows == 0 || !(scale > 0.0) {
            return None;
        }
        let width = cols as usize;
        let height = rows as usize * 2;
        Some(Self {
            width,
            height,
            scale,
            pixels: vec![(0.0, 0.0, 0.0); width * height],
            overlay: Vec::new(),
            output_buf: Vec::with_capacity(width * height * 25),
        })
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.width = cols.max(1) as usize;
        self.height = rows.max(1) as usize * 2;
        self.pixels = vec![(0.0, 0.0, 0.0); self.width * self.height];
        self.overlay.clear();
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Terminal cell to canvas units.
    pub fn cell_to_canvas(&self, col: u16, row: u16) -> Vec2 {
        Vec2::new(col as f32 * self.scale, row as f32 * 2.0 * self.scale)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = self.pixels[y * self.width + x];
        Some((to_u8(p.0), to_u8(p.1), to_u8(p.2)))
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.overlay
    }

    fn to_px(&self, p: Vec2) -> Vec2 {
        p / self.scale
    }

    fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height || color.a <= 0.0 {
            return;
        }
        let a = color.a.min(1.0);
        let (r, g, b) = color.channels();
        let px = &mut self.pixels[y as usize * self.width + x as usize];
        px.0 = px.0 * (1.0 - a) + r * a;
        px.1 = px.1 * (1.0 - a) + g * a;
        px.2 = px.2 * (1.0 - a) + b * a;
    }

    /// Write the frame and any text overlay, then drop the overlay.
    pub fn present<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top_color: (u8, u8, u8) = (255, 255, 255);
        let mut prev_bot_color: (u8, u8, u8) = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_idx = y * self.width + x;
                let bot_idx = if y + 1 < self.height {
                    (y + 1) * self.width + x
                } else {
                    top_idx
                };

                let top = self.pixels[top_idx];
                let bot = self.pixels[bot_idx];
                let top_color = (to_u8(top.0), to_u8(top.1), to_u8(top.2));
                let bot_color = (to_u8(bot.0), to_u8(bot.1), to_u8(bot.2));

                if top_color != prev_top_color {
                    write!(
                        self.output_buf,
                        "\x1b[48;2;{};{};{}m",
                        top_color.0, top_color.1, top_color.2
                    )?;
                    prev_top_color = top_color;
                }
                if bot_color != prev_bot_color {
                    write!(
                        self.output_buf,
                        "\x1b[38;2;{};{};{}m",
                        bot_color.0, bot_color.1, bot_color.2
                    )?;
                    prev_bot_color = bot_color;
                }

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top_color = (255, 255, 255);
            prev_bot_color = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        let overlay = std::mem::take(&mut self.overlay);
        for run in &overlay {
            self.write_text_run(run)?;
        }
        self.output_buf.extend_from_slice(b"\x1b[0m");

        out.write_all(&self.output_buf)?;
        out.flush()
    }

    fn write_text_run(&mut self, run: &TextRun) -> std::io::Result<()> {
        let rows = self.height / 2;
        if run.row < 0 || run.row as usize >= rows {
            return Ok(());
        }
        let mut positioned = false;
        for (i, ch) in run.text.chars().enumerate() {
            let col = run.col + i as i32;
            if col < 0 {
                continue;
            }
            if col as usize >= self.width {
                break;
            }
            if !positioned {
                write!(self.output_buf, "\x1b[{};{}H", run.row + 1, col + 1)?;
                positioned = true;
            }
            // Text sits on the cell's upper pixel colour.
            let under = self.pixels[run.row as usize * 2 * self.width + col as usize];
            let (r, g, b) = run.color.channels();
            let a = run.color.a;
            write!(
                self.output_buf,
                "\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}",
                to_u8(under.0),
                to_u8(under.1),
                to_u8(under.2),
                to_u8(under.0 * (1.0 - a) + r * a),
                to_u8(under.1 * (1.0 - a) + g * a),
                to_u8(under.2 * (1.0 - a) + b * a),
                ch
            )?;
        }
        Ok(())
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl Surface for FrameBuffer {
    fn size(&self) -> (f32, f32) {
        (self.width as f32 * self.scale, self.height as f32 * self.scale)
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint) {
        let min = self.to_px(origin);
        let max = self.to_px(origin + size);
        let x0 = min.x.floor().max(0.0) as i32;
        let y0 = min.y.floor().max(0.0) as i32;
        let x1 = max.x.ceil().min(self.width as f32) as i32;
        let y1 = max.y.ceil().min(self.height as f32) as i32;

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * self.scale;
                self.blend(x, y, paint.color_at(center));
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        let a = self.to_px(from);
        let b = self.to_px(to);
        let delta = b - a;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().clamp(1.0, MAX_LINE_STEPS);
        let thickness = (width / self.scale).round().max(1.0) as i32;
        let half = thickness / 2;

        let mut last = None;
        for i in 0..=steps as i32 {
            let p = a + delta * (i as f32 / steps);
            let cell = (p.x.floor() as i32, p.y.floor() as i32);
            if last == Some(cell) {
                continue;
            }
            last = Some(cell);
            for oy in 0..thickness {
                for ox in 0..thickness {
                    self.blend(cell.0 + ox - half, cell.1 + oy - half, color);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let c = self.to_px(center);
        let r = radius / self.scale;

        if r < 0.75 {
            // Sub-pixel point: fold the covered fraction into alpha.
            let coverage = (r * 2.0).clamp(0.2, 1.0);
            self.blend(c.x.floor() as i32, c.y.floor() as i32, color.fade(coverage));
            return;
        }

        let x0 = (c.x - r).floor() as i32;
        let x1 = (c.x + r).ceil() as i32;
        let y0 = (c.y - r).floor() as i32;
        let y1 = (c.y + r).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                let coverage = (r + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color.fade(coverage));
                }
            }
        }
    }

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[GradientStop]) {
        let c = self.to_px(center);
        let r = radius / self.scale;
        if r < 0.5 {
            self.blend(c.x.floor() as i32, c.y.floor() as i32, sample_stops(stops, 0.5));
            return;
        }

        let x0 = (c.x - r).floor() as i32;
        let x1 = (c.x + r).ceil() as i32;
        let y0 = (c.y - r).floor() as i32;
        let y1 = (c.y + r).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                if d <= r {
                    self.blend(x, y, sample_stops(stops, d / r));
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, anchor: Vec2, color: Rgba) {
        let p = self.to_px(anchor);
        let len = text.chars().count() as i32;
        self.overlay.push(TextRun {
            col: p.x.round() as i32 - len / 2,
            row: (p.y / 2.0).floor() as i32,
            text: text.to_string(),
            color,
        });
    }
}
