//! Offline plotting of the output file.
//!
//! Runs after extraction has finished: read the records back, group them per
//! page, and draw one chart per page (`svg`) or an interactive view (`crate::tui`).

pub mod series;
pub mod svg;

pub use series::*;
pub use svg::*;
