//! Lightweight crawler: reqwest for transport, scraper for the DOM

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::frontier::{self, CrawlFrontier, FetchedPage, FrontierEntry};
use super::{CrawlMetadata, CrawlOptions, Crawler, ExtractedData, PageMetadata, PageRecord};
use crate::error::CrawlError;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

const USER_AGENT: &str = concat!("crawl-bench/", env!("CARGO_PKG_VERSION"));

/// Title and raw hrefs of an HTML document
pub(crate) fn parse_html(body: &str) -> (String, Vec<String>) {
    let document = Html::parse_document(body);
    let title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let links = document
        .select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    (title, links)
}

/// Crawler that never renders: one GET per page, links read from static HTML
pub struct HttpCrawler {
    client: Client,
    max_concurrency: usize,
}

impl HttpCrawler {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed (for
    /// example when no TLS backend is available).
    pub fn new(max_concurrency: usize) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CrawlError::Request(e.to_string()))?;
        Ok(Self {
            client,
            max_concurrency: max_concurrency.max(1),
        })
    }

    async fn fetch(
        &self,
        entry: FrontierEntry,
        timeout: Duration,
    ) -> Result<FetchedPage, CrawlError> {
        let response = self
            .client
            .get(&entry.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, &entry.url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: entry.url,
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, &entry.url, timeout))?;
        let (title, links) = parse_html(&body);

        Ok(FetchedPage {
            record: PageRecord {
                url: final_url.clone(),
                title,
                metadata: PageMetadata {
                    status_code: Some(status.as_u16()),
                    timestamp: Utc::now(),
                    depth: entry.depth,
                    content_length: body.len(),
                },
                html_content: body,
            },
            final_url,
            links,
        })
    }
}

fn request_error(err: reqwest::Error, url: &str, timeout: Duration) -> CrawlError {
    if err.is_timeout() {
        return CrawlError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };
    }
    CrawlError::from(err)
}

#[async_trait]
impl Crawler for HttpCrawler {
    #[instrument(skip(self, options), fields(crawler = "http"))]
    async fn crawl(&self, url: &str, options: &CrawlOptions) -> Result<ExtractedData, CrawlError> {
        let started = Instant::now();
        let frontier = CrawlFrontier::new(url, options.max_pages, options.max_depth)?;
        let concurrency = options.max_concurrency.unwrap_or(self.max_concurrency);
        debug!(concurrency, "Starting HTTP crawl");

        let timeout = options.timeout;
        let items = frontier::drive(frontier, concurrency, move |entry| self.fetch(entry, timeout))
            .await?;

        let execution_time = started.elapsed().as_millis() as u64;
        info!(pages = items.len(), execution_time, "HTTP crawl finished");

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

    #[instrument(skip(self, options), fields(crawler = "http"))]
    async fn scrap(&self, url: &str, options: &CrawlOptions) -> Result<PageRecord, CrawlError> {
        let frontier = CrawlFrontier::new(url, 1, 0)?;
        let entry = FrontierEntry {
            url: frontier.seed().to_string(),
            depth: 0,
        };
        Ok(self.fetch(entry, options.timeout).await?.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_html_extracts_title_and_links() {
        let html = r#"
            <html>
              <head><title>  Example Domain </title></head>
              <body>
                <a href="/one">One</a>
                <a href="https://other.org">Other</a>
                <a name="anchor-without-href">Nothing</a>
              </body>
            </html>
        "#;
        let (title, links) = parse_html(html);
        assert_eq!(title, "Example Domain");
        assert_eq!(links, vec!["/one", "https://other.org"]);
    }

    #[test]
    fn test_parse_html_without_title() {
        let (title, links) = parse_html("<p>plain</p>");
        assert_eq!(title, "");
        assert!(links.is_empty());
    }

    #[test]
    fn test_concurrency_floor_is_one() {
        let crawler = HttpCrawler::new(0).unwrap();
        assert_eq!(crawler.max_concurrency, 1);
    }
}
