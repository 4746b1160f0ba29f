//! Breadth-first crawl frontier shared by both engines
//!
//! A frontier belongs to exactly one `crawl` call. It owns the visited set,
//! the depth-tagged queue and the page budget, so nothing about a crawl
//! outlives the call that created it.

use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use tracing::{debug, warn};
use url::Url;

use super::PageRecord;
use crate::error::CrawlError;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// Resolve `href` against `base` and keep it only if it is a crawlable
/// http(s) URL. The fragment is dropped because it never names a different
/// document.
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[derive(Debug)]
pub struct CrawlFrontier {
    seed: Url,
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    max_pages: usize,
    max_depth: u32,
    processed: usize,
}

impl CrawlFrontier {
    /// Start a frontier holding only the seed URL at depth 0
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidUrl`] if the seed is not an absolute
    /// http(s) URL.
    pub fn new(seed: &str, max_pages: u32, max_depth: u32) -> Result<Self, CrawlError> {
        let mut parsed = Url::parse(seed).map_err(|e| CrawlError::InvalidUrl {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidUrl {
                url: seed.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        parsed.set_fragment(None);

        let mut frontier = Self {
            seed: parsed.clone(),
            queue: VecDeque::new(),
            seen: HashSet::new(),
            max_pages: max_pages as usize,
            max_depth,
            processed: 0,
        };
        frontier.seen.insert(parsed.to_string());
        frontier.queue.push_back(FrontierEntry {
            url: parsed.to_string(),
            depth: 0,
        });
        Ok(frontier)
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn remaining_budget(&self) -> usize {
        self.max_pages.saturating_sub(self.processed)
    }

    /// True once the budget is spent or nothing is left to fetch
    pub fn is_done(&self) -> bool {
        self.remaining_budget() == 0 || self.queue.is_empty()
    }

    /// Take up to `concurrency` entries, never more than the budget left.
    ///
    /// Entries handed out are not charged against the budget until
    /// [`record_page`](Self::record_page) is called, so failed fetches leave
    /// room for other URLs.
    pub fn next_batch(&mut self, concurrency: usize) -> Vec<FrontierEntry> {
        let take = concurrency.max(1).min(self.remaining_budget());
        let mut batch = Vec::with_capacity(take);
        while batch.len() < take {
            match self.queue.pop_front() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    /// Charge one successfully processed page against the budget.
    ///
    /// Returns `false` when the budget was already spent; the caller should
    /// drop the page.
    pub fn record_page(&mut self) -> bool {
        if self.processed >= self.max_pages {
            return false;
        }
        self.processed += 1;
        true
    }

    /// Queue same-host links found on `from`. Returns how many were new.
    pub fn enqueue_links<'a, I>(&mut self, from: &FrontierEntry, links: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        if from.depth >= self.max_depth {
            return 0;
        }
        let Ok(base) = Url::parse(&from.url) else {
            return 0;
        };

        let mut added = 0;
        for href in links {
            let Some(url) = normalize_link(&base, href) else {
                continue;
            };
            if url.host_str() != self.seed.host_str() {
                continue;
            }
            let key = url.to_string();
            if self.seen.insert(key.clone()) {
                self.queue.push_back(FrontierEntry {
                    url: key,
                    depth: from.depth + 1,
                });
                added += 1;
            }
        }
        added
    }
}

/// A fetched page together with the raw hrefs found on it
#[derive(Debug)]
pub(crate) struct FetchedPage {
    pub record: PageRecord,
    /// Base for resolving `links`; differs from the requested URL after redirects
    pub final_url: String,
    pub links: Vec<String>,
}

/// Run a breadth-first crawl, fetching each batch with `fetch`.
///
/// A failure on the seed page fails the whole crawl. Failures further down
/// are logged and skipped; the page budget is only charged for pages that
/// were fetched successfully.
pub(crate) async fn drive<F, Fut>(
    mut frontier: CrawlFrontier,
    concurrency: usize,
    fetch: F,
) -> Result<Vec<PageRecord>, CrawlError>
where
    F: Fn(FrontierEntry) -> Fut,
    Fut: Future<Output = Result<FetchedPage, CrawlError>>,
{
    let concurrency = concurrency.max(1);
    let mut pages = Vec::new();

    while !frontier.is_done() {
        let batch = frontier.next_batch(concurrency);
        let outcomes: Vec<_> = stream::iter(batch)
            .map(|entry| {
                let fut = fetch(entry.clone());
                async move { (entry, fut.await) }
            })
            .buffered(concurrency)
            .collect()
            .await;

        for (entry, outcome) in outcomes {
            match outcome {
                Ok(page) => {
                    if !frontier.record_page() {
                        break;
                    }
                    let base = FrontierEntry {
                        url: page.final_url,
                        depth: entry.depth,
                    };
                    let added =
                        frontier.enqueue_links(&base, page.links.iter().map(String::as_str));
                    debug!(url = %entry.url, depth = entry.depth, added, "Page processed");
                    pages.push(page.record);
                }
                Err(e) if entry.depth == 0 => return Err(e),
                Err(e) => warn!(url = %entry.url, error = %e, "Skipping page"),
            }
        }
    }

    Ok(pages)
}
