//! Error types for the benchmark engine and the crawler adapters
//!
//! Two families:
//!
//! - [`CrawlError`] is what a crawler adapter returns. The iteration runner
//!   contains it and records it as data on the failed iteration.
//! - [`BenchmarkError`] is a fault in the harness itself. It propagates to the
//!   caller and aborts the whole run.

use thiserror::Error;

/// Failure of a single crawl or scrape call
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0}")]
    Request(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out after {timeout_ms}ms loading {url}")]
    Timeout { url: String, timeout_ms: u64 },
}

impl From<reqwest::Error> for CrawlError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CrawlError::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            };
        }
        CrawlError::Request(err.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for CrawlError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CrawlError::Browser(err.to_string())
    }
}

/// Fault inside the harness, never caused by a crawler
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Cannot aggregate an empty set of benchmark results")]
    EmptyAggregationInput,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Memory sampler failed: {0}")]
    SamplerFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = BenchmarkError> = std::result::Result<T, E>;
