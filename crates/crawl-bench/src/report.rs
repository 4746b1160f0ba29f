//! Final report assembly
//!
//! Assembly is pure: it combines the raw results, the configuration and the
//! comparison (when there is one) and stamps a generation time. Writing the
//! report anywhere is the [`reporter`](crate::reporter) module's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::average_result;
use crate::compare::{compare_results, ComparisonResult};
use crate::config::BenchmarkConfig;
use crate::crawler::CrawlerKind;
use crate::error::Result;
use crate::metrics::BenchmarkResult;

/// Everything a benchmark run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub timestamp: DateTime<Utc>,
    pub config: BenchmarkConfig,
    /// Every iteration in run order (crawler-major, iteration-minor)
    pub results: Vec<BenchmarkResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

impl BenchmarkReport {
    /// Combine the parts into a report stamped with the current time
    pub fn assemble(
        config: BenchmarkConfig,
        results: Vec<BenchmarkResult>,
        comparison: Option<ComparisonResult>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            config,
            results,
            comparison,
        }
    }

    /// Build the report, deriving the comparison from `results`
    ///
    /// # Errors
    ///
    /// Propagates aggregation failures.
    pub fn from_results(config: BenchmarkConfig, results: Vec<BenchmarkResult>) -> Result<Self> {
        let comparison = compare_results(&results)?;
        Ok(Self::assemble(config, results, comparison))
    }

    /// Iterations of one crawler, in run order
    pub fn results_for(&self, kind: CrawlerKind) -> impl Iterator<Item = &BenchmarkResult> {
        self.results.iter().filter(move |r| r.crawler_type == kind)
    }

    /// Averaged result for one crawler, `None` if it did not run
    pub fn aggregate_for(&self, kind: CrawlerKind) -> Result<Option<BenchmarkResult>> {
        let results: Vec<_> = self.results_for(kind).cloned().collect();
        if results.is_empty() {
            return Ok(None);
        }
        average_result(&results).map(Some)
    }

    /// Crawlers present in the report, in run order
    pub fn crawlers(&self) -> Vec<CrawlerKind> {
        let mut kinds: Vec<CrawlerKind> = Vec::new();
        for result in &self.results {
            if !kinds.contains(&result.crawler_type) {
                kinds.push(result.crawler_type);
            }
        }
        kinds
    }
}
