//! Per-iteration measurement records

use serde::{Deserialize, Serialize};

use crate::config::BenchmarkConfig;
use crate::crawler::{CrawlerKind, PageRecord};

/// Timing, throughput and memory for one iteration (or an average of several)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkMetrics {
    /// Wall-clock start, milliseconds since the Unix epoch
    pub start_time: u64,
    /// Wall-clock end, milliseconds since the Unix epoch
    pub end_time: u64,
    /// Elapsed milliseconds
    pub duration: u64,
    pub pages_processed: u64,
    /// 1 when the crawl call failed, 0 otherwise
    pub pages_failed: u64,
    /// Peak memory added during the iteration, in MB
    pub memory_used: f64,
    pub errors: Vec<String>,
}

impl BenchmarkMetrics {
    pub fn succeeded(&self) -> bool {
        self.pages_failed == 0 && self.errors.is_empty()
    }
}

/// Complete record of one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub crawler_type: CrawlerKind,
    pub config: BenchmarkConfig,
    pub metrics: BenchmarkMetrics,
    /// Pages returned by the crawler; empty for a failed iteration
    pub results: Vec<PageRecord>,
    /// 0-based position within this crawler's iterations
    pub iteration: u32,
}
