//! `hpc-pageviews` library crate.
//!
//! The binary (`pv`) is a thin wrapper around this library so that:
//!
//! - the extraction pipeline is testable against a fake report source
//! - plotting can run on its own, long after the extraction process exited

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
