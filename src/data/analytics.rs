//! Google Analytics Core Reporting API (v3) integration.
//!
//! The pipeline only ever talks to a `ReportSource`; `AnalyticsClient` is the
//! production implementation backed by an already-authorized bearer token.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{ExtractConfig, format_day};

const BASE_URL: &str = "https://www.googleapis.com/analytics/v3/data/ga";
const MAX_RESULTS_LIMIT: u32 = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_VAR: &str = "GA_ACCESS_TOKEN";
const BASE_URL_VAR: &str = "GA_API_BASE";

/// 403 reasons that mean the token itself is bad rather than the request.
const AUTH_REASONS: [&str; 3] = ["authError", "invalidCredentials", "expired"];

/// Why a single report query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The query parameters are malformed; nothing was sent.
    QueryConstruction(String),
    /// The service answered with a non-success status.
    Api { status: u16, reason: String },
    /// Credentials are missing, revoked, or expired.
    Authorization(String),
    /// The request never completed or the response could not be decoded.
    Transport(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueryConstruction(msg) => {
                write!(f, "There was an error in constructing your query : {msg}")
            }
            Self::Api { status, reason } => {
                write!(f, "Arg, there was an API error : {status} : {reason}")
            }
            Self::Authorization(msg) => write!(
                f,
                "The credentials have been revoked or expired, please re-run the application to re-authorize ({msg})"
            ),
            Self::Transport(msg) => write!(f, "Report request failed: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

/// One report request: a fixed metric/dimension set over a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub table_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: String,
    pub dimensions: String,
    pub start_index: u32,
    pub max_results: u32,
}

impl ReportQuery {
    /// Query scoped to exactly one day (`start_date == end_date == day`).
    pub fn single_day(config: &ExtractConfig, day: NaiveDate) -> Self {
        Self {
            table_id: config.table_id.clone(),
            start_date: day,
            end_date: day,
            metrics: config.metrics.clone(),
            dimensions: config.dimensions.clone(),
            start_index: config.start_index,
            max_results: config.max_results,
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let profile = self.table_id.strip_prefix("ga:").ok_or_else(|| {
            ReportError::QueryConstruction(format!(
                "table id '{}' must have the form ga:<profile id>",
                self.table_id
            ))
        })?;
        if profile.is_empty() || !profile.chars().all(|c| c.is_ascii_digit()) {
            return Err(ReportError::QueryConstruction(format!(
                "table id '{}' must have a numeric profile id",
                self.table_id
            )));
        }
        if self.metrics.trim().is_empty() {
            return Err(ReportError::QueryConstruction("at least one metric is required".to_string()));
        }
        if self.start_index < 1 {
            return Err(ReportError::QueryConstruction("start index is 1-based".to_string()));
        }
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(ReportError::QueryConstruction(format!(
                "max results must be within 1..={MAX_RESULTS_LIMIT}, got {}",
                self.max_results
            )));
        }
        if self.start_date > self.end_date {
            return Err(ReportError::QueryConstruction(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    /// Query-string parameters as the v3 endpoint names them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ids", self.table_id.clone()),
            ("start-date", format_day(self.start_date)),
            ("end-date", format_day(self.end_date)),
            ("metrics", self.metrics.clone()),
        ];
        if !self.dimensions.trim().is_empty() {
            params.push(("dimensions", self.dimensions.clone()));
        }
        params.push(("start-index", self.start_index.to_string()));
        params.push(("max-results", self.max_results.to_string()));
        params
    }
}

/// Rows returned for one query. Absent `rows` means an empty result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportResponse {
    pub rows: Vec<Vec<String>>,
    /// Total matching rows on the server, which can exceed `rows.len()`
    /// when the page cap is hit.
    pub total_results: Option<u64>,
    pub contains_sampled_data: bool,
}

impl ReportResponse {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let total_results = Some(rows.len() as u64);
        Self {
            rows,
            total_results,
            contains_sampled_data: false,
        }
    }

    /// Server-side rows that did not fit in this page.
    pub fn truncated_by(&self) -> u64 {
        self.total_results
            .map(|total| total.saturating_sub(self.rows.len() as u64))
            .unwrap_or(0)
    }
}

/// The authenticated session the pipeline queries, one call per day.
pub trait ReportSource {
    fn fetch(&self, query: &ReportQuery) -> Result<ReportResponse, ReportError>;
}

pub struct AnalyticsClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl AnalyticsClient {
    /// Build a client from `GA_ACCESS_TOKEN` (and optionally `GA_API_BASE`),
    /// reading `.env` first when present.
    pub fn from_env() -> Result<Self, ReportError> {
        dotenvy::dotenv().ok();
        let access_token = std::env::var(TOKEN_VAR)
            .map_err(|_| ReportError::Authorization(format!("missing {TOKEN_VAR} in environment (.env)")))?;
        let base_url = std::env::var(BASE_URL_VAR).unwrap_or_else(|_| BASE_URL.to_string());
        Self::new(access_token, base_url)
    }

    pub fn new(access_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ReportError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ReportError::Authorization(format!("{TOKEN_VAR} is empty")));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReportError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            access_token,
            base_url: base_url.into(),
        })
    }
}

impl ReportSource for AnalyticsClient {
    fn fetch(&self, query: &ReportQuery) -> Result<ReportResponse, ReportError> {
        query.validate()?;

        let resp = self
            .client
            .get(&self.base_url)
            .bearer_auth(&self.access_token)
            .query(&query.params())
            .send()
            .map_err(|e| ReportError::Transport(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body: DataResponse = resp
            .json()
            .map_err(|e| ReportError::Transport(format!("failed to parse report response: {e}")))?;

        Ok(body.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataResponse {
    #[serde(default)]
    rows: Option<Vec<Vec<String>>>,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    contains_sampled_data: bool,
}

impl From<DataResponse> for ReportResponse {
    fn from(raw: DataResponse) -> Self {
        Self {
            rows: raw.rows.unwrap_or_default(),
            total_results: raw.total_results,
            contains_sampled_data: raw.contains_sampled_data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

/// Map a non-success response onto `Authorization` or `Api`.
fn classify_failure(status: StatusCode, body: &str) -> ReportError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reason = envelope
        .as_ref()
        .and_then(|env| env.error.errors.iter().find_map(|item| item.reason.clone()))
        .or_else(|| envelope.as_ref().and_then(|env| env.error.message.clone()))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    let is_auth = status == StatusCode::UNAUTHORIZED
        || (status == StatusCode::FORBIDDEN && AUTH_REASONS.contains(&reason.as_str()));

    if is_auth {
        ReportError::Authorization(reason)
    } else {
        ReportError::Api {
            status: status.as_u16(),
            reason,
        }
    }
}
