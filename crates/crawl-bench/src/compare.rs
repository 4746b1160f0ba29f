//! Cross-crawler comparison

use serde::{Deserialize, Serialize};

use crate::aggregate::average_result;
use crate::crawler::CrawlerKind;
use crate::error::Result;
use crate::metrics::BenchmarkResult;

/// Relative metrics between the averaged browser and http results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub browser: BenchmarkResult,
    pub http: BenchmarkResult,
    /// browser duration / http duration. Not finite when the http duration
    /// is zero; serialized as `null` in that case.
    #[serde(serialize_with = "finite_or_null", deserialize_with = "null_as_nan")]
    pub speedup: f64,
    /// http memory minus browser memory, in MB
    pub memory_difference: f64,
    /// http pages minus browser pages
    pub pages_difference: i64,
}

impl ComparisonResult {
    /// Derive the comparison from one averaged result per crawler
    pub fn from_averages(browser: BenchmarkResult, http: BenchmarkResult) -> Self {
        let speedup = browser.metrics.duration as f64 / http.metrics.duration as f64;
        let memory_difference = http.metrics.memory_used - browser.metrics.memory_used;
        let pages_difference =
            http.metrics.pages_processed as i64 - browser.metrics.pages_processed as i64;
        Self {
            browser,
            http,
            speedup,
            memory_difference,
            pages_difference,
        }
    }

    pub fn has_defined_speedup(&self) -> bool {
        self.speedup.is_finite()
    }
}

/// Compare crawlers over a mixed result list.
///
/// Returns `Ok(None)` unless both crawlers have at least one result.
///
/// # Errors
///
/// Propagates aggregation failures, which cannot happen for the non-empty
/// partitions built here.
pub fn compare_results(results: &[BenchmarkResult]) -> Result<Option<ComparisonResult>> {
    let of_kind = |kind: CrawlerKind| -> Vec<BenchmarkResult> {
        results
            .iter()
            .filter(|r| r.crawler_type == kind)
            .cloned()
            .collect()
    };
    let browser = of_kind(CrawlerKind::Browser);
    let http = of_kind(CrawlerKind::Http);

    if browser.is_empty() || http.is_empty() {
        return Ok(None);
    }

    Ok(Some(ComparisonResult::from_averages(
        average_result(&browser)?,
        average_result(&http)?,
    )))
}

fn finite_or_null<S: serde::Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn null_as_nan<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
