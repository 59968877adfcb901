//! Ratatui-based terminal viewer.
//!
//! Browses a list of display requests (usually loaded from a display JSON):
//! one figure at a time, with its series legend and axis ranges.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::domain::{DisplayRequest, Marker};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{DisplayChart, terminal_rgb};

/// Start the viewer.
pub fn run(displays: Vec<DisplayRequest>) -> Result<(), AppError> {
    if displays.is_empty() {
        return Err(AppError::new(3, "Display file holds no figures."));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(displays);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    displays: Vec<DisplayRequest>,
    index: usize,
}

impl App {
    fn new(displays: Vec<DisplayRequest>) -> Self {
        Self { displays, index: 0 }
    }

    fn current(&self) -> &DisplayRequest {
        &self.displays[self.index]
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n = self.displays.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => self.index = (self.index + 1) % n,
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => self.index = (self.index + n - 1) % n,
            KeyCode::Home => self.index = 0,
            KeyCode::End => self.index = n - 1,
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let req = self.current();
        let mut lines = vec![Line::from(vec![
            Span::styled("dp", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" figure {}/{}: ", self.index + 1, self.displays.len())),
            Span::styled(req.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ])];

        let mut legend = Vec::new();
        for (i, s) in req.series.iter().enumerate() {
            let (r, g, b) = terminal_rgb(s.color, i);
            let glyph = if s.marker == Marker::Point { "• " } else { "─ " };
            legend.push(Span::styled(glyph, Style::default().fg(Color::Rgb(r, g, b))));
            legend.push(Span::raw(format!("{}   ", s.label)));
        }
        lines.push(Line::from(legend));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let req = self.current();
        let Some((x_bounds, y_bounds)) = chart_bounds(req) else {
            let msg = Paragraph::new("No finite points to draw.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        frame.render_widget(
            DisplayChart {
                request: req,
                x_bounds,
                y_bounds,
            },
            chart_rect,
        );
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, req, x_bounds, y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ figure  Home/End first/last  q quit";
        let p = Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray))))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Padded data bounds; equal-aspect figures share one range on both axes.
fn chart_bounds(req: &DisplayRequest) -> Option<([f64; 2], [f64; 2])> {
    let (mut x, mut y) = req.bounds()?;
    if req.equal_aspect {
        let lo = x[0].min(y[0]);
        let hi = x[1].max(y[1]);
        x = [lo, hi];
        y = [lo, hi];
    }
    Some((pad(x), pad(y)))
}

fn pad(r: [f64; 2]) -> [f64; 2] {
    let span = r[1] - r[0];
    let p = if span > 0.0 { span * 0.05 } else { 0.5 };
    [r[0] - p, r[1] + p]
}

fn fmt_tick(v: f64, span: f64) -> String {
    if span >= 100.0 {
        format!("{v:.0}")
    } else if span >= 1.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.3}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    req: &DisplayRequest,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let x_span = x_bounds[1] - x_bounds[0];
    let y_span = y_bounds[1] - y_bounds[0];

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_tick(x_bounds[0] + u * x_span, x_span);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_tick(y_bounds[0] + u * y_span, y_span);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    let x_label = Paragraph::new(req.x_label.as_str())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label =
        Paragraph::new(req.y_label.as_str()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;

    fn figures(n: usize) -> Vec<DisplayRequest> {
        (0..n)
            .map(|i| {
                let mut r = DisplayRequest::new(format!("fig {i}"), "x", "y");
                r.push(Series::points("a", vec![0.0, 1.0], vec![0.0, 2.0]));
                r
            })
            .collect()
    }

    #[test]
    fn navigation_wraps_around() {
        let mut app = App::new(figures(3));
        assert!(!app.handle_key(KeyCode::Left));
        assert_eq!(app.index, 2);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.index, 0);
        app.handle_key(KeyCode::End);
        assert_eq!(app.current().title, "fig 2");
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn layout_reserves_axis_space_only_when_room() {
        let (rect, insets) = chart_layout(Rect::new(0, 0, 80, 30));
        assert!(insets.is_some());
        assert_eq!(rect, Rect::new(8, 1, 70, 27));

        let small = Rect::new(0, 0, 15, 6);
        assert_eq!(chart_layout(small), (small, None));
    }

    #[test]
    fn equal_aspect_bounds_match() {
        let mut req = figures(1).remove(0);
        req.equal_aspect = true;
        let (x, y) = chart_bounds(&req).unwrap();
        assert_eq!(x, y);
        assert_eq!(chart_bounds(&DisplayRequest::new("e", "x", "y")), None);
    }

    #[test]
    fn draws_into_test_backend() {
        let backend = ratatui::backend::TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let app = App::new(figures(2));
        terminal.draw(|f| app.draw(f)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("figure 1/2"));
    }
}
