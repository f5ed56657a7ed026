//! Runtime configuration loaded from `config.toml`.
//!
//! The externally-defined keys (`URL`, `TOKEN`, `X-API-KEY`,
//! `START_TIME`, `END_TIME`) keep their interface spelling; tool
//! settings are optional and defaulted. Nothing reads ambient process
//! state — the parsed [`Config`] is passed explicitly to every
//! component that needs it.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::retry::{FailurePolicy, RetryPolicy};
use crate::window::TimeRange;

/// Exporter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Indexer base URL.
    #[serde(rename = "URL")]
    pub url: String,

    /// Indexer API token; an empty string sends no token header.
    #[serde(rename = "TOKEN")]
    pub token: String,

    /// Extra `X-API-KEY` header for gateway providers; omitted when
    /// absent or empty.
    #[serde(rename = "X-API-KEY", default)]
    pub x_api_key: Option<String>,

    /// Lower bound of the export range, RFC 3339.
    ///
    /// Used verbatim as the query bound and in the summary echo; parsed
    /// for window partitioning.
    #[serde(rename = "START_TIME")]
    pub start_time: String,

    /// Upper bound of the export range, RFC 3339.
    #[serde(rename = "END_TIME")]
    pub end_time: String,

    /// Window granularity in seconds.
    #[serde(rename = "WINDOW_SECS", default = "default_window_secs")]
    pub window_secs: u32,

    /// Per-page record bound passed through to the indexer on every
    /// page request.
    #[serde(rename = "PAGE_LIMIT", default = "default_page_limit")]
    pub page_limit: u64,

    /// Attempt bound for one remote call.
    #[serde(rename = "MAX_ATTEMPTS", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// What an exhausted per-address retry does to the rest of a
    /// balance sweep.
    #[serde(rename = "ON_ERROR", default = "default_on_error")]
    pub on_error: FailurePolicy,
}

const fn default_window_secs() -> u32 {
    3600
}

const fn default_page_limit() -> u64 {
    1000
}

const fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_ATTEMPTS
}

const fn default_on_error() -> FailurePolicy {
    FailurePolicy::FailFast
}

impl Config {
    /// Load and parse the configuration file.
    ///
    /// # Errors
    ///
    /// A missing or malformed file is fatal: the required keys have no
    /// defaults, and nothing network-facing runs without them.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The configured export range, parsed and validated.
    ///
    /// # Errors
    ///
    /// Unparseable timestamps or `START_TIME >= END_TIME`.
    pub fn range(&self) -> Result<TimeRange> {
        let start = parse_time(&self.start_time).context("START_TIME")?;
        let end = parse_time(&self.end_time).context("END_TIME")?;
        TimeRange::new(start, end)
    }
}

/// Parse an RFC 3339 config timestamp into UTC.
fn parse_time(text: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("invalid RFC 3339 timestamp {text:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}
