//! Remote data access.

pub mod analytics;

pub use analytics::{AnalyticsClient, ReportError, ReportQuery, ReportResponse, ReportSource};
