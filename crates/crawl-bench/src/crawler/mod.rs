//! Crawler adapters behind one contract
//!
//! Two engines are benchmarked against each other:
//!
//! - [`BrowserCrawler`]: drives headless Chrome through chromiumoxide, so
//!   every page is fully rendered (scripts, styles, subresources).
//! - [`HttpCrawler`]: plain HTTP requests with reqwest and DOM parsing with
//!   scraper, no rendering at all.
//!
//! Both implement [`Crawler`]. The benchmark engine only ever sees the trait
//! and selects an implementation through [`CrawlerKind`], so test doubles can
//! stand in for either engine.

mod browser;
mod frontier;
mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BenchmarkConfig, HarnessSettings};
use crate::error::{BenchmarkError, CrawlError};

pub use browser::BrowserCrawler;
pub use frontier::{normalize_link, CrawlFrontier, FrontierEntry};
pub use http::HttpCrawler;

/// Identity of a crawler engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlerKind {
    /// Full-browser automation, accepted as `a` on the command line
    Browser,
    /// HTTP fetch plus HTML parsing, accepted as `b`
    Http,
}

impl CrawlerKind {
    pub const ALL: [CrawlerKind; 2] = [CrawlerKind::Browser, CrawlerKind::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlerKind::Browser => "browser",
            CrawlerKind::Http => "http",
        }
    }
}

impl fmt::Display for CrawlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlerKind {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "a" => Ok(CrawlerKind::Browser),
            "http" | "b" => Ok(CrawlerKind::Http),
            other => Err(BenchmarkError::InvalidConfig(format!(
                "unknown crawler '{}', expected browser or http",
                other
            ))),
        }
    }
}

/// Which crawlers a run benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrawlerSelection {
    Browser,
    Http,
    #[default]
    Both,
}

impl CrawlerSelection {
    /// Selected kinds in run order; browser always precedes http
    pub fn kinds(&self) -> Vec<CrawlerKind> {
        match self {
            CrawlerSelection::Browser => vec![CrawlerKind::Browser],
            CrawlerSelection::Http => vec![CrawlerKind::Http],
            CrawlerSelection::Both => CrawlerKind::ALL.to_vec(),
        }
    }
}

impl From<CrawlerKind> for CrawlerSelection {
    fn from(kind: CrawlerKind) -> Self {
        match kind {
            CrawlerKind::Browser => CrawlerSelection::Browser,
            CrawlerKind::Http => CrawlerSelection::Http,
        }
    }
}

impl FromStr for CrawlerSelection {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("both") {
            return Ok(CrawlerSelection::Both);
        }
        s.parse::<CrawlerKind>().map(CrawlerSelection::from)
    }
}

/// Limits a single crawl call must respect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub max_pages: u32,
    pub max_depth: u32,
    /// Per-page timeout
    pub timeout: Duration,
    /// Overrides the crawler's own concurrency cap when set
    pub max_concurrency: Option<usize>,
}

impl From<&BenchmarkConfig> for CrawlOptions {
    fn from(config: &BenchmarkConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            timeout: config.timeout(),
            max_concurrency: None,
        }
    }
}

/// Per-page metadata captured by a crawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// HTTP status of the document response, when the engine exposes it
    pub status_code: Option<u16>,
    pub timestamp: DateTime<Utc>,
    /// Link distance from the seed URL
    pub depth: u32,
    /// Length of `html_content` in bytes
    pub content_length: usize,
}

/// One crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub html_content: String,
    pub metadata: PageMetadata,
}

/// Coarse metadata for a whole crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlMetadata {
    pub original_url: String,
    pub total_pages: usize,
    pub completed_at: DateTime<Utc>,
    /// Crawler-measured wall time in milliseconds
    pub execution_time: u64,
}

/// Everything a crawl returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub items: Vec<PageRecord>,
    pub metadata: CrawlMetadata,
}

/// The contract every crawler engine implements
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Crawl from `url`, following same-host links within the option limits
    async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<ExtractedData, CrawlError>;

    /// Fetch exactly one page without following links
    async fn scrap(&self, url: &str, options: &CrawlOptions) -> Result<PageRecord, CrawlError>;
}

/// One crawler per kind
#[derive(Clone)]
pub struct Crawlers {
    browser: Arc<dyn Crawler>,
    http: Arc<dyn Crawler>,
}

impl Crawlers {
    pub fn new(browser: Arc<dyn Crawler>, http: Arc<dyn Crawler>) -> Self {
        Self { browser, http }
    }

    /// Production crawlers configured from harness settings
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_settings(settings: &HarnessSettings) -> Result<Self, CrawlError> {
        let browser = BrowserCrawler::new(settings.browser_concurrency)
            .with_chrome_path(settings.chrome_path.clone());
        let http = HttpCrawler::new(settings.http_concurrency)?;
        Ok(Self::new(Arc::new(browser), Arc::new(http)))
    }

    pub fn get(&self, kind: CrawlerKind) -> &dyn Crawler {
        match kind {
            CrawlerKind::Browser => self.browser.as_ref(),
            CrawlerKind::Http => self.http.as_ref(),
        }
    }
}
