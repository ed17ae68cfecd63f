//! Command-line parsing for the page-view extractor and plotter.
//!
//! Argument parsing and command dispatch stay separate from the pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_OUTPUT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pv",
    version,
    about = "Daily page-view extraction from the Analytics Core Reporting API, with per-page plots"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query every day of the range and write matching rows as tab-separated records.
    ///
    /// `pv ga:1234` is shorthand for `pv fetch ga:1234`. Needs GA_ACCESS_TOKEN in the
    /// environment or in `.env`.
    Fetch(FetchArgs),
    /// Plot the records written by `fetch`: one SVG per page, or an interactive view.
    Plot(PlotArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// The table ID of the profile you wish to access. Format is ga:xxx where xxx is your profile ID.
    #[arg(value_name = "TABLE_ID")]
    pub table_id: String,

    /// Log and skip days whose query fails instead of stopping the run.
    ///
    /// Authorization failures always stop the run.
    #[arg(long)]
    pub skip_failed_days: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Records file produced by `pv fetch`.
    #[arg(short, long, value_name = "TSV", default_value = DEFAULT_OUTPUT)]
    pub input: PathBuf,

    /// Directory for the per-page SVG charts.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Open an interactive chart for pages whose path contains this text.
    #[arg(long, value_name = "TEXT")]
    pub page: Option<String>,
}
