//! Averaging iterations of one crawler

use crate::error::{BenchmarkError, Result};
use crate::metrics::{BenchmarkMetrics, BenchmarkResult};

/// Round to `decimals` places, halves away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean_rounded<I: Iterator<Item = u64>>(values: I, count: usize) -> u64 {
    let sum: f64 = values.map(|v| v as f64).sum();
    (sum / count as f64).round() as u64
}

/// Average the metrics of a same-crawler result list.
///
/// - `duration`, `pages_processed`, `pages_failed`: mean, each rounded to the
///   nearest integer on its own.
/// - `memory_used`: mean rounded to two decimals.
/// - `errors`: every message of every input, in input order, duplicates kept.
/// - `start_time` is taken from the first input and `end_time` from the last,
///   by list position.
///
/// # Errors
///
/// Returns [`BenchmarkError::EmptyAggregationInput`] for an empty slice.
pub fn average_metrics(results: &[BenchmarkResult]) -> Result<BenchmarkMetrics> {
    let (Some(first), Some(last)) = (results.first(), results.last()) else {
        return Err(BenchmarkError::EmptyAggregationInput);
    };
    let n = results.len();
    let metrics = || results.iter().map(|r| &r.metrics);

    let memory_sum: f64 = metrics().map(|m| m.memory_used).sum();

    Ok(BenchmarkMetrics {
        start_time: first.metrics.start_time,
        end_time: last.metrics.end_time,
        duration: mean_rounded(metrics().map(|m| m.duration), n),
        pages_processed: mean_rounded(metrics().map(|m| m.pages_processed), n),
        pages_failed: mean_rounded(metrics().map(|m| m.pages_failed), n),
        memory_used: round_to(memory_sum / n as f64, 2),
        errors: metrics().flat_map(|m| m.errors.iter().cloned()).collect(),
    })
}

/// One result standing for all iterations of a crawler.
///
/// Identity, config and iteration index come from the first input; metrics
/// are averaged. Page records are not carried over since they already
/// appear on the per-iteration results.
///
/// # Errors
///
/// Returns [`BenchmarkError::EmptyAggregationInput`] for an empty slice.
pub fn average_result(results: &[BenchmarkResult]) -> Result<BenchmarkResult> {
    let metrics = average_metrics(results)?;
    let first = &results[0];
    Ok(BenchmarkResult {
        crawler_type: first.crawler_type,
        config: first.config.clone(),
        metrics,
        results: Vec::new(),
        iteration: first.iteration,
    })
}
