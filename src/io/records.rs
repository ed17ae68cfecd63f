//! Tab-separated output records.
//!
//! One line per retained report row: the row's fields minus the leading
//! path-level field, then the query day, joined by tabs. The extraction run is
//! the only writer; the plotter reads the file back after the run has exited.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{format_day, parse_day};
use crate::error::AppError;

/// Keep a row when `marker` appears in any of its fields.
///
/// This is a substring match, deliberately wider than requiring a field equal
/// to the marker: an exact field still matches, and so does a longer path
/// level that embeds it.
pub fn retain_row(row: &[String], marker: &str) -> bool {
    row.iter().any(|field| field.contains(marker))
}

/// A retained row, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub fields: Vec<String>,
}

impl OutputRecord {
    /// Drop the leading field (the constant path-level marker) and append `day`.
    pub fn from_row(row: &[String], day: NaiveDate) -> Self {
        let mut fields: Vec<String> = row.iter().skip(1).cloned().collect();
        fields.push(format_day(day));
        Self { fields }
    }
}

/// Per-day write outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayWrite {
    pub rows_seen: usize,
    pub written: usize,
}

/// Run-scoped writer over the output file.
pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
    written: usize,
}

impl RecordWriter<File> {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Never)
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        Self { inner, written: 0 }
    }

    pub fn write_record(&mut self, record: &OutputRecord) -> io::Result<()> {
        self.inner.write_record(&record.fields).map_err(io::Error::from)?;
        self.written += 1;
        Ok(())
    }

    /// Filter one day's rows by `marker` and write the survivors.
    pub fn write_day(&mut self, rows: &[Vec<String>], day: NaiveDate, marker: &str) -> io::Result<DayWrite> {
        let mut outcome = DayWrite {
            rows_seen: rows.len(),
            written: 0,
        };
        for row in rows.iter().filter(|row| retain_row(row, marker)) {
            self.write_record(&OutputRecord::from_row(row, day))?;
            outcome.written += 1;
        }
        Ok(outcome)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn records_written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

/// One parsed line of the output file, as the plotter sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRecord {
    /// Leading field (third-level page path).
    pub key: String,
    pub value: f64,
    pub day: NaiveDate,
}

/// A line the plotter could not use.
#[derive(Debug, Clone)]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordsFile {
    pub records: Vec<PlotRecord>,
    pub line_errors: Vec<LineError>,
}

/// Read an output file back: key = first field, value = second, day = last.
///
/// Bad lines are collected in `line_errors` rather than failing the read.
pub fn read_records(path: &Path) -> Result<RecordsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open records '{}': {e}", path.display())))?;
    read_records_from(file)
}

pub fn read_records_from<R: io::Read>(reader: R) -> Result<RecordsFile, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut out = RecordsFile::default();
    for (idx, result) in reader.records().enumerate() {
        let line = result
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.line_errors.push(LineError {
                    line,
                    message: format!("TSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_plot_record(&record) {
            Ok(rec) => out.records.push(rec),
            Err(message) => out.line_errors.push(LineError { line, message }),
        }
    }
    Ok(out)
}

fn parse_plot_record(record: &csv::StringRecord) -> Result<PlotRecord, String> {
    if record.len() < 3 {
        return Err(format!("expected at least 3 fields, got {}", record.len()));
    }
    let key = record.get(0).unwrap_or_default().trim().to_string();
    let raw_value = record.get(1).unwrap_or_default().trim();
    let value = raw_value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid value '{raw_value}'"))?;
    let day = parse_day(record.get(record.len() - 1).unwrap_or_default())?;
    Ok(PlotRecord { key, value, day })
}
