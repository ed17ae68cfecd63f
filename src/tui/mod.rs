//! Ratatui-based interactive chart view.
//!
//! Shows one page's series at a time; when the key filter matched several pages,
//! `←/→` cycles between them.

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
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::error::AppError;
use crate::plot::{PlotSeries, fmt_day_label};

mod plotters_chart;

use plotters_chart::PageViewsChart;

/// Start the interactive view over `series` (must not be empty).
pub fn run(series: Vec<PlotSeries>) -> Result<(), AppError> {
    if series.is_empty() {
        return Err(AppError::new(3, "No series to display."));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(series);
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
    series: Vec<PlotSeries>,
    selected: usize,
}

impl App {
    fn new(series: Vec<PlotSeries>) -> Self {
        Self { series, selected: 0 }
    }

    fn current(&self) -> Option<&PlotSeries> {
        self.series.get(self.selected)
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

            if !event::poll(Duration::from_millis(100)).map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
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

    /// Returns `true` when the view should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Char('n') => self.step(1),
            KeyCode::Left | KeyCode::Char('p') => self.step(-1),
            _ => {}
        }
        false
    }

    fn step(&mut self, delta: isize) {
        let n = self.series.len();
        if n == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(n as isize) as usize;
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
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("pv", Style::default().fg(Color::Cyan)),
            Span::raw(" page views"),
        ]));
        if let Some(series) = self.current() {
            lines.push(Line::from(Span::styled(
                header_summary(series, self.selected, self.series.len()),
                Style::default().fg(Color::Gray),
            )));
        }
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self.current().map(|s| s.key.as_str()).unwrap_or("-");
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(series) = self.current() else {
            return;
        };

        let points = series.numeric_points();
        let widget = PageViewsChart {
            points: &points,
            x_bounds: series.x_bounds(),
            y_bounds: series.y_bounds(),
            x_label: "date",
            y_label: "views",
            fmt_x: fmt_day_label,
            fmt_y: fmt_axis_views,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ previous/next page  q quit";
        let p = Paragraph::new(Line::from(Span::styled(help, Style::default().fg(Color::Gray))))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn header_summary(series: &PlotSeries, index: usize, total: usize) -> String {
    let first = series.points.first().map(|(d, _)| d.to_string()).unwrap_or_else(|| "-".to_string());
    let last = series.points.last().map(|(d, _)| d.to_string()).unwrap_or_else(|| "-".to_string());
    let views: f64 = series.points.iter().map(|(_, v)| v).sum();
    format!(
        "page {}/{total}: {} | {first} → {last} | days={} | views={views:.0}",
        index + 1,
        series.key,
        series.points.len(),
    )
}

fn fmt_axis_views(v: f64) -> String {
    format!("{v:.0}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn series(key: &str) -> PlotSeries {
        let d1 = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        PlotSeries {
            key: key.to_string(),
            points: vec![(d1, 3.0), (d2, 4.0)],
        }
    }

    #[test]
    fn arrows_cycle_through_matches() {
        let mut app = App::new(vec![series("/a/"), series("/b/"), series("/c/")]);
        assert!(!app.handle_key(KeyCode::Left));
        assert_eq!(app.current().map(|s| s.key.as_str()), Some("/c/"));
        app.handle_key(KeyCode::Right);
        assert_eq!(app.current().map(|s| s.key.as_str()), Some("/a/"));
        app.handle_key(KeyCode::Right);
        assert_eq!(app.current().map(|s| s.key.as_str()), Some("/b/"));
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn header_shows_span_and_total() {
        let text = header_summary(&series("/services/"), 0, 2);
        assert_eq!(text, "page 1/2: /services/ | 2015-01-01 → 2015-01-02 | days=2 | views=7");
    }

    #[test]
    fn empty_series_is_rejected_before_touching_terminal() {
        let err = run(Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
