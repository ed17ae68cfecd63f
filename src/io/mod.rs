//! Input/output helpers.
//!
//! - row filtering and the tab-separated output file (`records`)

pub mod records;

pub use records::*;
