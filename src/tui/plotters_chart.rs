//! Plotters-powered chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`, so the same `DisplayRequest` that becomes an SVG
//! can be browsed in a terminal.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::{DisplayRequest, LineStyle, Marker, SeriesColor};

/// Render-only view of one display request.
///
/// Bounds are computed outside the render call so `render()` only draws.
pub struct DisplayChart<'a> {
    pub request: &'a DisplayRequest,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// High-contrast colors for dark terminals. Black becomes white.
pub fn terminal_rgb(color: Option<SeriesColor>, index: usize) -> (u8, u8, u8) {
    match color {
        Some(SeriesColor::Blue) => (0, 255, 255),
        Some(SeriesColor::Red) => (255, 80, 80),
        Some(SeriesColor::Green) => (0, 255, 0),
        Some(SeriesColor::Black) => (255, 255, 255),
        None => [(0, 255, 255), (255, 80, 80), (0, 255, 0), (255, 255, 0)][index % 4],
    }
}

impl<'a> Widget for DisplayChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let request = self.request;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines clutter a terminal; axes are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (i, s) in request.series.iter().enumerate() {
                let (r, g, b) = terminal_rgb(s.color, i);
                let color = RGBColor(r, g, b);

                if s.line != LineStyle::None {
                    chart.draw_series(LineSeries::new(s.finite_pairs(), &color))?;
                }
                // `Circle` radii are mapped incorrectly by the ratatui backend,
                // so points are single pixels.
                if s.marker == Marker::Point {
                    chart.draw_series(s.finite_pairs().map(|p| Pixel::new(p, color)))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
