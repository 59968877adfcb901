//! SVG figures via Plotters.
//!
//! Each request becomes one file: its own `save_path` when set, otherwise
//! `<dir>/figure_<n>.svg` with `n` counting rendered figures.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::domain::{DisplayRequest, LegendLocation, LineStyle, Marker, SeriesColor};
use crate::error::AppError;
use crate::plot::Renderer;

const PALETTE: [SeriesColor; 4] = [SeriesColor::Blue, SeriesColor::Red, SeriesColor::Green, SeriesColor::Black];

pub struct SvgRenderer {
    dir: Option<PathBuf>,
    size: (u32, u32),
    written: Vec<PathBuf>,
}

impl SvgRenderer {
    pub fn new(dir: Option<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            dir,
            size: (width.max(100), height.max(100)),
            written: Vec::new(),
        }
    }

    /// Files written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn target_path(&self, request: &DisplayRequest) -> Result<PathBuf, AppError> {
        if let Some(p) = &request.save_path {
            return Ok(p.clone());
        }
        match &self.dir {
            Some(dir) => Ok(dir.join(format!("figure_{}.svg", self.written.len()))),
            None => Err(AppError::new(
                2,
                format!("No output path for figure '{}' (set --svg-dir)", request.title),
            )),
        }
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, request: &DisplayRequest) -> Result<(), AppError> {
        let path = self.target_path(request)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", parent.display())))?;
        }
        draw_svg(&path, request, self.size)
            .map_err(|e| AppError::new(4, format!("Failed to render '{}': {e}", path.display())))?;
        info!(path = %path.display(), title = %request.title, "wrote figure");
        self.written.push(path);
        Ok(())
    }
}

/// Axis ranges with a little padding. Equal aspect puts both axes on
/// their common range so `y = x` is a diagonal.
fn axis_ranges(request: &DisplayRequest) -> ([f64; 2], [f64; 2]) {
    let (mut x, mut y) = request.bounds().unwrap_or(([0.0, 1.0], [0.0, 1.0]));
    if request.equal_aspect {
        let lo = x[0].min(y[0]);
        let hi = x[1].max(y[1]);
        x = [lo, hi];
        y = [lo, hi];
    }
    (pad(x), pad(y))
}

fn pad(r: [f64; 2]) -> [f64; 2] {
    let span = r[1] - r[0];
    let p = if span > 0.0 { span * 0.05 } else { 0.5 };
    [r[0] - p, r[1] + p]
}

fn draw_svg(path: &Path, request: &DisplayRequest, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (xr, yr) = axis_ranges(request);
    let mut chart = ChartBuilder::on(&root)
        .caption(&request.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(xr[0]..xr[1], yr[0]..yr[1])?;

    chart
        .configure_mesh()
        .x_desc(&request.x_label)
        .y_desc(&request.y_label)
        .draw()?;

    for (i, s) in request.series.iter().enumerate() {
        let (r, g, b) = s.color.unwrap_or(PALETTE[i % PALETTE.len()]).rgb();
        let color = RGBColor(r, g, b).mix(s.alpha);
        let pairs: Vec<(f64, f64)> = s.finite_pairs().collect();

        match s.line {
            LineStyle::Solid => {
                chart
                    .draw_series(LineSeries::new(pairs.iter().copied(), color.stroke_width(2)))?
                    .label(s.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
            LineStyle::Dashed => {
                // Every other segment.
                chart
                    .draw_series(
                        pairs
                            .windows(2)
                            .step_by(2)
                            .map(|w| PathElement::new(vec![w[0], w[1]], color.stroke_width(2))),
                    )?
                    .label(s.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 8, y)], color.stroke_width(2)));
            }
            LineStyle::None => {}
        }

        if s.marker == Marker::Point {
            let anno = chart.draw_series(pairs.iter().map(|&p| Circle::new(p, 2, color.filled())))?;
            if s.line == LineStyle::None {
                anno.label(s.label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(match request.legend {
            LegendLocation::Best => SeriesLabelPosition::UpperRight,
            LegendLocation::UpperLeft => SeriesLabelPosition::UpperLeft,
        })
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
