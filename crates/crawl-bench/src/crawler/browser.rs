//! Full-browser crawler driven through the Chrome DevTools Protocol
//!
//! Every `crawl` call launches its own headless Chrome, so browser start-up
//! and shutdown are part of what gets measured, exactly as a real crawl
//! would pay for them. Pages are loaded in separate tabs, at most
//! `max_concurrency` at a time.

use async_trait::async_trait;
use chrono::Utc;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::frontier::{self, CrawlFrontier, FetchedPage, FrontierEntry};
use super::{CrawlMetadata, CrawlOptions, Crawler, ExtractedData, PageMetadata, PageRecord};
use crate::error::CrawlError;

/// Absolute hrefs of every anchor, as resolved by the browser
const COLLECT_LINKS_JS: &str =
    "Array.from(document.querySelectorAll('a[href]')).map(a => a.href)";

/// Status of the main document response (Chrome 109+)
const RESPONSE_STATUS_JS: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.responseStatus ? nav.responseStatus : null; \
})()";

static LAUNCH_ID: AtomicU64 = AtomicU64::new(0);

/// A running browser and the task pumping its CDP events
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(chrome_path: Option<&PathBuf>) -> Result<Self, CrawlError> {
        // Unique profile per launch; Chrome locks its user-data dir
        let user_data_dir = std::env::temp_dir().join(format!(
            "crawl-bench-{}-{}",
            std::process::id(),
            LAUNCH_ID.fetch_add(1, Ordering::SeqCst)
        ));

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&user_data_dir)
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--no-first-run");
        if let Some(path) = chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(CrawlError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(user_data_dir = %user_data_dir.display(), "Browser launched");
        Ok(Self {
            browser,
            handler,
            user_data_dir,
        })
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser cleanly");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        let _ = std::fs::remove_dir_all(&self.user_data_dir);
    }
}

/// Crawler that renders every page in headless Chrome
pub struct BrowserCrawler {
    max_concurrency: usize,
    chrome_path: Option<PathBuf>,
}

impl BrowserCrawler {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            chrome_path: None,
        }
    }

    /// Use a specific Chrome/Chromium binary instead of auto-detection
    pub fn with_chrome_path(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_path = path;
        self
    }

    async fn fetch(
        browser: &Browser,
        entry: FrontierEntry,
        timeout: Duration,
    ) -> Result<FetchedPage, CrawlError> {
        let page = browser.new_page("about:blank").await?;
        let outcome = tokio::time::timeout(timeout, load_page(&page, &entry)).await;
        if let Err(e) = page.close().await {
            debug!(url = %entry.url, error = %e, "Failed to close tab");
        }

        match outcome {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout {
                url: entry.url,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

async fn load_page(page: &Page, entry: &FrontierEntry) -> Result<FetchedPage, CrawlError> {
    page.goto(entry.url.as_str()).await?;

    let final_url = page.url().await?.unwrap_or_else(|| entry.url.clone());
    let title = page.get_title().await?.unwrap_or_default();
    let html = page.content().await?;
    let links: Vec<String> = page
        .evaluate(COLLECT_LINKS_JS)
        .await?
        .into_value()
        .map_err(|e| CrawlError::Browser(format!("Unexpected link list: {}", e)))?;
    let status_code = match page.evaluate(RESPONSE_STATUS_JS).await {
        Ok(result) => result.into_value::<Option<u16>>().ok().flatten(),
        Err(_) => None,
    };

    if let Some(status) = status_code.filter(|s| *s >= 400) {
        return Err(CrawlError::Status {
            url: final_url,
            status,
        });
    }

    Ok(FetchedPage {
        record: PageRecord {
            url: final_url.clone(),
            title,
            metadata: PageMetadata {
                status_code,
                timestamp: Utc::now(),
                depth: entry.depth,
                content_length: html.len(),
            },
            html_content: html,
        },
        final_url,
        links,
    })
}

#[async_trait]
impl Crawler for BrowserCrawler {
    #[instrument(skip(self, options), fields(crawler = "browser"))]
    async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<ExtractedData, CrawlError> {
        let started = Instant::now();
        let frontier = CrawlFrontier::new(url, options.max_pages, options.max_depth)?;
        let concurrency = options.max_concurrency.unwrap_or(self.max_concurrency);

        let session = BrowserSession::launch(self.chrome_path.as_ref()).await?;
        let timeout = options.timeout;
        let browser = &session.browser;
        let outcome = frontier::drive(frontier, concurrency, move |entry| {
            Self::fetch(browser, entry, timeout)
        })
        .await;
        session.shutdown().await;

        let items = outcome?;
        let execution_time = started.elapsed().as_millis() as u64;
        info!(pages = items.len(), execution_time, "Browser crawl finished");

        Ok(ExtractedData {
            metadata: CrawlMetadata {
                original_url: url.to_string(),
                total_pages: items.len(),
                completed_at: Utc::now(),
                execution_time,
            },
            items,
        })
    }

    #[instrument(skip(self, options), fields(crawler = "browser"))]
    async fn scrap(&self, url: &str, options: &CrawlOptions) -> Result<PageRecord, CrawlError> {
        let frontier = CrawlFrontier::new(url, 1, 0)?;
        let entry = FrontierEntry {
            url: frontier.seed().to_string(),
            depth: 0,
        };

        let session = BrowserSession::launch(self.chrome_path.as_ref()).await?;
        let outcome = Self::fetch(&session.browser, entry, options.timeout).await;
        session.shutdown().await;

        Ok(outcome?.record)
    }
}
