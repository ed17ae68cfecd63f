//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the extraction pipeline against the reporting API
//! - reads the records back and plots them

use std::io;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FetchArgs, PlotArgs};
use crate::data::{AnalyticsClient, ReportQuery};
use crate::domain::{ExtractConfig, FailurePolicy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pv` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `pv ga:1234` behaves like `pv fetch ga:1234`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fetch(args) => handle_fetch(args),
        Command::Plot(args) => handle_plot(args),
    }
}

/// Logs go to stderr so stdout carries only notices and summaries.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "hpc_pageviews=info".into()))
        .with_writer(io::stderr)
        .try_init();
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = extract_config_from_args(&args);

    // Reject a malformed table id before the output file is truncated.
    ReportQuery::single_day(&config, config.range.start).validate()?;

    let client = AnalyticsClient::from_env()?;

    let summary = {
        let mut notices = io::stdout().lock();
        pipeline::extract_to_file(&client, &config, &mut notices)?
    };

    println!("{}", crate::report::format_extract_summary(&summary, &config));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_records(&args.input)?;
    for err in &file.line_errors {
        warn!(line = err.line, "skipping record: {}", err.message);
    }
    if file.records.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable records in '{}'.", args.input.display()),
        ));
    }

    let series = crate::plot::group_series(&file.records);

    if let Some(page) = &args.page {
        let matching = crate::plot::filter_series(series, page);
        if matching.is_empty() {
            return Err(AppError::new(3, format!("No page matches '{page}'.")));
        }
        return crate::tui::run(matching);
    }

    let written = crate::plot::render_all(&series, &args.out_dir)?;
    println!("{}", crate::report::format_plot_summary(&written, &file.line_errors));
    Ok(())
}

/// Compiled-in query shape for the requested profile, plus the CLI's failure policy.
pub fn extract_config_from_args(args: &FetchArgs) -> ExtractConfig {
    let mut config = ExtractConfig::for_table(args.table_id.trim());
    if args.skip_failed_days {
        config.on_error = FailurePolicy::SkipDay;
    }
    config
}

/// Rewrite argv so a bare table id runs `fetch`.
///
/// Rules:
/// - `pv`                        -> unchanged (clap prints usage)
/// - `pv --help/--version/-h`    -> unchanged (show top-level help/version)
/// - `pv fetch|plot ...`         -> unchanged
/// - `pv ga:1234 ...`            -> `pv fetch ga:1234 ...`
/// - `pv --skip-failed-days ...` -> `pv fetch --skip-failed-days ...`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fetch" | "plot");
    if is_subcommand {
        return argv;
    }

    argv.insert(1, "fetch".to_string());
    argv
}
