//! The extraction pipeline shared by every front-end.
//!
//! Day range -> one report query per day -> marker filter -> tab-separated file.
//!
//! Days are processed strictly in order, one blocking request at a time, and the
//! output is flushed after every day so a failed run leaves the earlier days on
//! disk.

use std::fs::File;
use std::io::Write;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::data::{ReportError, ReportQuery, ReportSource};
use crate::domain::{ExtractConfig, FailurePolicy};
use crate::error::AppError;
use crate::io::RecordWriter;

/// Printed once for every day whose result set has no rows.
pub const NO_ROWS_NOTICE: &str = "No Rows Found";

/// Counters for a completed (or skip-tolerant) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub days_queried: usize,
    pub days_empty: Vec<NaiveDate>,
    pub days_skipped: Vec<(NaiveDate, ReportError)>,
    pub rows_seen: usize,
    pub records_written: usize,
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The query for `day` failed and the policy said to stop.
    Report { day: NaiveDate, source: ReportError },
    /// Writing to the output file or the notice stream failed.
    Output { target: String, message: String },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report { day, source } => write!(f, "{source} (query date {day})"),
            Self::Output { target, message } => write!(f, "Failed to write {target}: {message}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Report { source, .. } => Some(source),
            Self::Output { .. } => None,
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Report { day, source } => {
                let base = AppError::from(source);
                AppError::new(base.exit_code(), format!("{base} (query date {day})"))
            }
            ExtractError::Output { target, message } => {
                AppError::new(2, format!("Failed to write {target}: {message}"))
            }
        }
    }
}

/// Create (truncate) `config.output` and run the whole range into it.
///
/// The file is flushed and closed on every exit path, including an aborted run.
pub fn extract_to_file<S, N>(source: &S, config: &ExtractConfig, notices: &mut N) -> Result<ExtractSummary, ExtractError>
where
    S: ReportSource + ?Sized,
    N: Write,
{
    let target = config.output.display().to_string();
    let mut writer = RecordWriter::<File>::create(&config.output).map_err(|e| ExtractError::Output {
        target: target.clone(),
        message: e.to_string(),
    })?;

    let result = run_extraction(source, config, &mut writer, notices);

    let closed = writer.into_inner().map_err(|e| ExtractError::Output {
        target,
        message: e.to_string(),
    });

    // A query failure outranks a close failure.
    let summary = result?;
    closed?;
    Ok(summary)
}

/// Walk `config.range`, query each day, and write the matching rows.
pub fn run_extraction<S, W, N>(
    source: &S,
    config: &ExtractConfig,
    writer: &mut RecordWriter<W>,
    notices: &mut N,
) -> Result<ExtractSummary, ExtractError>
where
    S: ReportSource + ?Sized,
    W: Write,
    N: Write,
{
    let target = config.output.display().to_string();
    let output_err = |e: std::io::Error| ExtractError::Output {
        target: target.clone(),
        message: e.to_string(),
    };

    info!(
        table_id = %config.table_id,
        start = %config.range.start,
        end = %config.range.end,
        days = config.range.len(),
        "starting extraction"
    );

    let mut summary = ExtractSummary::default();

    for day in config.range.days() {
        let query = ReportQuery::single_day(config, day);
        summary.days_queried += 1;

        let response = match source.fetch(&query) {
            Ok(resp) => resp,
            Err(err) => {
                let is_auth = matches!(err, ReportError::Authorization(_));
                if config.on_error == FailurePolicy::SkipDay && !is_auth {
                    warn!(%day, error = %err, "skipping day");
                    summary.days_skipped.push((day, err));
                    continue;
                }
                return Err(ExtractError::Report { day, source: err });
            }
        };

        if response.contains_sampled_data {
            debug!(%day, "response contains sampled data");
        }
        let truncated = response.truncated_by();
        if truncated > 0 {
            warn!(%day, truncated, cap = config.max_results, "result set exceeds page cap; extra rows dropped");
        }

        if response.rows.is_empty() {
            writeln!(notices, "{NO_ROWS_NOTICE}").map_err(|e| ExtractError::Output {
                target: "notices".to_string(),
                message: e.to_string(),
            })?;
            summary.days_empty.push(day);
            continue;
        }

        let outcome = writer
            .write_day(&response.rows, day, &config.marker)
            .map_err(&output_err)?;
        writer.flush().map_err(&output_err)?;

        debug!(%day, rows = outcome.rows_seen, written = outcome.written, "day processed");
        summary.rows_seen += outcome.rows_seen;
        summary.records_written += outcome.written;
    }

    info!(
        days = summary.days_queried,
        empty = summary.days_empty.len(),
        skipped = summary.days_skipped.len(),
        records = summary.records_written,
        "extraction finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::data::ReportResponse;
    use crate::domain::DateRange;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    /// Canned responses per day; records every query it sees.
    #[derive(Default)]
    struct FakeSource {
        responses: HashMap<NaiveDate, Result<ReportResponse, ReportError>>,
        seen: RefCell<Vec<ReportQuery>>,
    }

    impl FakeSource {
        fn with(mut self, day: NaiveDate, resp: Result<ReportResponse, ReportError>) -> Self {
            self.responses.insert(day, resp);
            self
        }
    }

    impl ReportSource for FakeSource {
        fn fetch(&self, query: &ReportQuery) -> Result<ReportResponse, ReportError> {
            self.seen.borrow_mut().push(query.clone());
            self.responses
                .get(&query.start_date)
                .cloned()
                .unwrap_or_else(|| Ok(ReportResponse::default()))
        }
    }

    fn config_for(dir: &tempfile::TempDir, start: NaiveDate, end: NaiveDate) -> ExtractConfig {
        let mut config = ExtractConfig::for_table("ga:1234");
        config.range = DateRange::new(start, end);
        config.output = dir.path().join("2015.txt");
        config
    }

    #[test]
    fn two_day_scenario_writes_one_record_and_one_notice() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_for(&dir, day(2015, 1, 1), day(2015, 1, 2));
        let source = FakeSource::default().with(
            day(2015, 1, 1),
            Ok(ReportResponse::from_rows(vec![
                row(&["/high-performance-computing/", "/services/", "17"]),
                row(&["/research-it/", "/about/", "3"]),
            ])),
        );

        let mut notices = Vec::new();
        let summary = extract_to_file(&source, &config, &mut notices).unwrap();

        assert_eq!(
            std::fs::read_to_string(&config.output).unwrap(),
            "/services/\t17\t2015-01-01\n"
        );
        assert_eq!(String::from_utf8(notices).unwrap(), "No Rows Found\n");
        assert_eq!(summary.days_queried, 2);
        assert_eq!(summary.days_empty, vec![day(2015, 1, 2)]);
        assert_eq!(summary.rows_seen, 2);
        assert_eq!(summary.records_written, 1);
    }

    #[test]
    fn every_query_is_a_single_day_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_for(&dir, day(2015, 2, 27), day(2015, 3, 2));
        let source = FakeSource::default();

        extract_to_file(&source, &config, &mut std::io::sink()).unwrap();

        let seen = source.seen.borrow();
        let days: Vec<NaiveDate> = seen.iter().map(|q| q.start_date).collect();
        assert_eq!(days, vec![day(2015, 2, 27), day(2015, 2, 28), day(2015, 3, 1), day(2015, 3, 2)]);
        assert!(seen.iter().all(|q| q.start_date == q.end_date));
        assert!(seen.iter().all(|q| q.max_results == 5000 && q.start_index == 1));
    }

    #[test]
    fn rerun_truncates_and_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_for(&dir, day(2015, 3, 1), day(2015, 3, 2));
        let source = FakeSource::default()
            .with(
                day(2015, 3, 1),
                Ok(ReportResponse::from_rows(vec![row(&["/high-performance-computing/", "/a/", "1"])])),
            )
            .with(
                day(2015, 3, 2),
                Ok(ReportResponse::from_rows(vec![row(&["X", "/high-performance-computing/", "42"])])),
            );

        std::fs::write(&config.output, "").unwrap();
        extract_to_file(&source, &config, &mut std::io::sink()).unwrap();
        let first = std::fs::read_to_string(&config.output).unwrap();
        extract_to_file(&source, &config, &mut std::io::sink()).unwrap();
        let second = std::fs::read_to_string(&config.output).unwrap();

        assert_eq!(first, "/a/\t1\t2015-03-01\n/high-performance-computing/\t42\t2015-03-02\n");
        assert_eq!(first, second);
    }

    #[test]
    fn abort_keeps_earlier_days_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_for(&dir, day(2015, 1, 1), day(2015, 1, 3));
        let api_error = ReportError::Api {
            status: 500,
            reason: "backendError".to_string(),
        };
        let source = FakeSource::default()
            .with(
                day(2015, 1, 1),
                Ok(ReportResponse::from_rows(vec![row(&["/high-performance-computing/", "/a/", "9"])])),
            )
            .with(day(2015, 1, 2), Err(api_error.clone()));

        let err = extract_to_file(&source, &config, &mut std::io::sink()).unwrap_err();

        assert_eq!(
            err,
            ExtractError::Report {
                day: day(2015, 1, 2),
                source: api_error
            }
        );
        // Day three is never queried.
        assert_eq!(source.seen.borrow().len(), 2);
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "/a/\t9\t2015-01-01\n");
    }

    #[test]
    fn skip_policy_continues_past_api_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config_for(&dir, day(2015, 1, 1), day(2015, 1, 3));
        config.on_error = FailurePolicy::SkipDay;
        let source = FakeSource::default()
            .with(
                day(2015, 1, 2),
                Err(ReportError::Transport("connection reset".to_string())),
            )
            .with(
                day(2015, 1, 3),
                Ok(ReportResponse::from_rows(vec![row(&["/high-performance-computing/", "/b/", "2"])])),
            );

        let summary = extract_to_file(&source, &config, &mut std::io::sink()).unwrap();

        assert_eq!(summary.days_skipped.len(), 1);
        assert_eq!(summary.days_skipped[0].0, day(2015, 1, 2));
        assert_eq!(summary.records_written, 1);
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "/b/\t2\t2015-01-03\n");
    }

    #[test]
    fn authorization_aborts_even_when_skipping() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config_for(&dir, day(2015, 1, 1), day(2015, 1, 3));
        config.on_error = FailurePolicy::SkipDay;
        let source = FakeSource::default().with(
            day(2015, 1, 1),
            Err(ReportError::Authorization("authError".to_string())),
        );

        let err = extract_to_file(&source, &config, &mut std::io::sink()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Report {
                source: ReportError::Authorization(_),
                ..
            }
        ));
        assert_eq!(source.seen.borrow().len(), 1);

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 5);
    }

    #[test]
    fn inverted_range_queries_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_for(&dir, day(2015, 1, 2), day(2015, 1, 1));
        let source = FakeSource::default();

        let summary = extract_to_file(&source, &config, &mut std::io::sink()).unwrap();

        assert_eq!(summary, ExtractSummary::default());
        assert!(source.seen.borrow().is_empty());
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "");
    }
}
