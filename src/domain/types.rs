//! Run configuration for the extraction pipeline.
//!
//! The reporting query is fixed: page views broken down by the second and third
//! levels of the page path, one day per request. The values live in
//! `ExtractConfig` rather than inline literals so the pipeline and its tests can
//! see exactly what a run asks for.

use std::path::PathBuf;

use chrono::NaiveDate;

use super::dates::DateRange;

pub const DEFAULT_METRICS: &str = "ga:pageviews";
pub const DEFAULT_DIMENSIONS: &str = "ga:pagePathLevel2,ga:pagePathLevel3";
pub const DEFAULT_START_INDEX: u32 = 1;
pub const DEFAULT_MAX_RESULTS: u32 = 5000;

/// Only pages under this path segment are kept.
pub const DEFAULT_MARKER: &str = "/high-performance-computing/";

/// Output file for the default 2015 range.
pub const DEFAULT_OUTPUT: &str = "2015.txt";

/// What the pipeline does when a single day's query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run at the first failing day.
    #[default]
    Abort,
    /// Log the failure and continue with the next day.
    ///
    /// Authorization failures still abort: every later day would fail the same way.
    SkipDay,
}

/// Everything one extraction run needs.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Profile table id, `ga:<profile id>`.
    pub table_id: String,
    pub range: DateRange,
    pub metrics: String,
    pub dimensions: String,
    pub start_index: u32,
    pub max_results: u32,
    /// Substring a row must contain (in any field) to be written.
    pub marker: String,
    /// Truncated and rewritten on every run.
    pub output: PathBuf,
    pub on_error: FailurePolicy,
}

impl ExtractConfig {
    /// Compiled-in query shape for the given profile: calendar year 2015.
    pub fn for_table(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            range: DateRange::new(default_start(), default_end()),
            metrics: DEFAULT_METRICS.to_string(),
            dimensions: DEFAULT_DIMENSIONS.to_string(),
            start_index: DEFAULT_START_INDEX,
            max_results: DEFAULT_MAX_RESULTS,
            marker: DEFAULT_MARKER.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            on_error: FailurePolicy::Abort,
        }
    }
}

// The HPC pages first went live on 2014-09-18; the default run covers 2015 only.
fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 12, 31).unwrap_or(NaiveDate::MIN)
}
