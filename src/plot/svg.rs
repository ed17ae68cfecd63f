//! One SVG line chart per page.

use std::collections::HashMap;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use super::series::{PlotSeries, fmt_day_label, series_file_stem};
use crate::error::AppError;

const CHART_SIZE: (u32, u32) = (960, 540);

/// Render every series into `out_dir`, returning the written paths in series order.
///
/// Files are named after the key with path separators stripped (`/services/` ->
/// `services.svg`); a repeated stem gets a numeric suffix.
pub fn render_all(series: &[PlotSeries], out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(out_dir)
        .map_err(|e| AppError::new(2, format!("Failed to create plot dir '{}': {e}", out_dir.display())))?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut written = Vec::with_capacity(series.len());

    for s in series {
        let stem = series_file_stem(&s.key);
        let count = seen.entry(stem.clone()).or_insert(0);
        *count += 1;
        let file_name = if *count == 1 {
            format!("{stem}.svg")
        } else {
            format!("{stem}-{count}.svg")
        };

        let path = out_dir.join(file_name);
        render_series_svg(s, &path)?;
        debug!(key = %s.key, points = s.points.len(), path = %path.display(), "chart written");
        written.push(path);
    }

    Ok(written)
}

/// Render one series as a dated line chart.
pub fn render_series_svg(series: &PlotSeries, path: &Path) -> Result<(), AppError> {
    draw_chart(series, path)
        .map_err(|e| AppError::new(4, format!("Failed to render chart '{}': {e}", path.display())))
}

fn draw_chart(series: &PlotSeries, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let [x0, x1] = series.x_bounds();
    let [y0, y1] = series.y_bounds();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&series.key, ("sans-serif", 20).into_font())
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("date")
        .y_desc("page views")
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|v| fmt_day_label(*v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(LineSeries::new(series.numeric_points(), &BLUE))?;

    root.present()?;
    Ok(())
}
