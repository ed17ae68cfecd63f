//! Plain-text run summaries printed after each command.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::app::pipeline::ExtractSummary;
use crate::domain::ExtractConfig;
use crate::io::LineError;

/// Summary of a finished extraction run.
pub fn format_extract_summary(summary: &ExtractSummary, config: &ExtractConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} → {} ({} days queried)",
        config.table_id, config.range.start, config.range.end, summary.days_queried
    );
    let _ = writeln!(
        out,
        "rows: {} seen, {} written to {} (marker {})",
        summary.rows_seen,
        summary.records_written,
        config.output.display(),
        config.marker
    );
    if !summary.days_empty.is_empty() {
        let _ = writeln!(out, "days without rows: {}", summary.days_empty.len());
    }
    for (day, err) in &summary.days_skipped {
        let _ = writeln!(out, "skipped {day}: {err}");
    }
    out.trim_end().to_string()
}

/// Summary of a plotting run.
pub fn format_plot_summary(written: &[PathBuf], line_errors: &[LineError]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "charts written: {}", written.len());
    for path in written {
        let _ = writeln!(out, "  {}", path.display());
    }
    if !line_errors.is_empty() {
        let _ = writeln!(out, "lines skipped: {}", line_errors.len());
        for err in line_errors.iter().take(5) {
            let _ = writeln!(out, "  line {}: {}", err.line, err.message);
        }
    }
    out.trim_end().to_string()
}
