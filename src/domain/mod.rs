//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - inclusive day ranges and the `YYYY-MM-DD` day format (`DateRange`)
//! - the run configuration with its compiled-in query shape (`ExtractConfig`)

pub mod dates;
pub mod types;

pub use dates::*;
pub use types::*;
