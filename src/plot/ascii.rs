//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Line series are drawn first so point markers overlay them. Each series gets
//! a glyph by position (`o + x * #` for points, `-` solid, `.` dashed lines)
//! and a legend row under the grid.

use std::io::Write;

use crate::domain::{DisplayRequest, LineStyle, Marker, Series};
use crate::error::AppError;
use crate::plot::Renderer;

const POINT_GLYPHS: [char; 5] = ['o', '+', 'x', '*', '#'];

/// Writes each request as a text plot to `out`.
pub struct AsciiRenderer<W: Write> {
    out: W,
    width: usize,
    height: usize,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W, width: usize, height: usize) -> Self {
        Self { out, width, height }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn render(&mut self, request: &DisplayRequest) -> Result<(), AppError> {
        let txt = render_ascii(request, self.width, self.height);
        writeln!(self.out, "{txt}").map_err(|e| AppError::new(2, format!("Failed to write plot: {e}")))
    }
}

/// Render `request` on a `width x height` character grid.
pub fn render_ascii(request: &DisplayRequest, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let ((x_min, x_max), (y_min, y_max)) = match request.bounds() {
        Some((x, y)) => (widen_if_flat(x[0], x[1]), pad_range(y[0], y[1], 0.05)),
        None => ((0.0, 1.0), (0.0, 1.0)),
    };

    let mut grid = vec![vec![' '; width]; height];

    for s in &request.series {
        if let Some(ch) = line_glyph(s) {
            draw_polyline(&mut grid, s, ch, x_min, x_max, y_min, y_max);
        }
    }
    for (i, s) in request.series.iter().enumerate() {
        if s.marker == Marker::Point {
            let ch = POINT_GLYPHS[i % POINT_GLYPHS.len()];
            for (x, y) in s.finite_pairs() {
                let col = map_x(x, x_min, x_max, width);
                let row = map_y(y, y_min, y_max, height);
                grid[row][col] = ch;
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{} | x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n",
        request.title
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (i, s) in request.series.iter().enumerate() {
        let glyph = match s.marker {
            Marker::Point => POINT_GLYPHS[i % POINT_GLYPHS.len()],
            Marker::None => line_glyph(s).unwrap_or(' '),
        };
        out.push_str(&format!("{glyph} {}\n", s.label));
    }
    out
}

fn line_glyph(s: &Series) -> Option<char> {
    match s.line {
        LineStyle::None => None,
        LineStyle::Solid => Some('-'),
        LineStyle::Dashed => Some('.'),
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn widen_if_flat(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], s: &Series, ch: char, x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for (x, y) in s.finite_pairs() {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None => {
                if grid[row][col] == ' ' {
                    grid[row][col] = ch;
                }
            }
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let (r, c) = (y0 as usize, x0 as usize);
        if y0 >= 0 && r < grid.len() && x0 >= 0 && c < grid[0].len() && grid[r][c] == ' ' {
            grid[r][c] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
