//! Plain-text reporter
//!
//! Layout: a header block with the configuration, then either one summary
//! section per crawler followed by the comparison, or a flat per-iteration
//! listing when there is nothing to compare.

use anyhow::Result;
use std::fmt::Write;

use crate::crawler::CrawlerKind;
use crate::metrics::{BenchmarkMetrics, BenchmarkResult};
use crate::report::BenchmarkReport;
use crate::stats::Spread;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Text format reporter
pub struct TextReporter;

impl TextReporter {
    pub fn format(report: &BenchmarkReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "CRAWLER BENCHMARK REPORT")?;
        writeln!(output, "{}", RULE)?;
        writeln!(output, "Generated:   {}", report.timestamp.to_rfc3339())?;
        writeln!(output, "URL:         {}", report.config.url)?;
        writeln!(output, "Max pages:   {}", report.config.max_pages)?;
        writeln!(output, "Max depth:   {}", report.config.max_depth)?;
        writeln!(output, "Iterations:  {}", report.config.iterations)?;
        writeln!(output, "Timeout:     {}ms", report.config.timeout_ms)?;
        let crawlers: Vec<String> = report
            .crawlers()
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        writeln!(output, "Crawlers:    {}", crawlers.join(", "))?;
        writeln!(output)?;

        match &report.comparison {
            Some(comparison) => {
                for (kind, averaged) in [
                    (CrawlerKind::Browser, &comparison.browser),
                    (CrawlerKind::Http, &comparison.http),
                ] {
                    let iterations: Vec<&BenchmarkResult> = report.results_for(kind).collect();
                    Self::format_summary(&mut output, kind, &averaged.metrics, &iterations)?;
                }

                writeln!(output, "{}", RULE)?;
                writeln!(output, "Comparison")?;
                writeln!(output, "{}", RULE)?;
                if comparison.has_defined_speedup() {
                    writeln!(
                        output,
                        "  Speedup:            {:.2}x (browser duration / http duration)",
                        comparison.speedup
                    )?;
                } else {
                    writeln!(output, "  Speedup:            n/a (http duration was 0ms)")?;
                }
                writeln!(
                    output,
                    "  Memory difference:  {:+.2} MB (http - browser)",
                    comparison.memory_difference
                )?;
                writeln!(
                    output,
                    "  Pages difference:   {:+} (http - browser)",
                    comparison.pages_difference
                )?;
            }
            None => {
                writeln!(output, "{}", RULE)?;
                writeln!(output, "Iterations")?;
                writeln!(output, "{}", RULE)?;
                for result in &report.results {
                    Self::format_iteration(&mut output, result)?;
                }
            }
        }

        Ok(output)
    }

    fn format_summary(
        output: &mut String,
        kind: CrawlerKind,
        averaged: &BenchmarkMetrics,
        iterations: &[&BenchmarkResult],
    ) -> Result<()> {
        writeln!(output, "{}", RULE)?;
        writeln!(output, "Crawler: {} ({} iterations)", kind, iterations.len())?;
        writeln!(output, "{}", RULE)?;
        writeln!(output, "  Average duration:   {}ms", averaged.duration)?;
        writeln!(output, "  Average pages:      {}", averaged.pages_processed)?;
        writeln!(output, "  Average failures:   {}", averaged.pages_failed)?;
        writeln!(output, "  Average memory:     {:.2} MB", averaged.memory_used)?;

        let durations: Vec<f64> = iterations
            .iter()
            .map(|r| r.metrics.duration as f64)
            .collect();
        if let Some(spread) = Spread::from_samples(&durations) {
            writeln!(
                output,
                "  Duration spread:    min {:.0}ms, median {:.0}ms, max {:.0}ms, std dev {:.1}ms",
                spread.min, spread.median, spread.max, spread.std_dev
            )?;
            let cv = spread.coefficient_of_variation();
            if cv.is_finite() {
                writeln!(output, "  Variation:          {:.1}%", cv * 100.0)?;
            }
        }

        if !averaged.errors.is_empty() {
            writeln!(output, "  Errors ({}):", averaged.errors.len())?;
            for error in &averaged.errors {
                writeln!(output, "    - {}", error)?;
            }
        }
        writeln!(output)?;
        Ok(())
    }

    fn format_iteration(output: &mut String, result: &BenchmarkResult) -> Result<()> {
        let metrics = &result.metrics;
        let status = if metrics.succeeded() { "ok" } else { "FAILED" };
        writeln!(
            output,
            "  {} #{}: {}ms, {} pages, {} failed, {:.2} MB [{}]",
            result.crawler_type,
            result.iteration + 1,
            metrics.duration,
            metrics.pages_processed,
            metrics.pages_failed,
            metrics.memory_used,
            status
        )?;
        for error in &metrics.errors {
            writeln!(output, "      error: {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::fixtures::{report, result};

    #[test]
    fn test_text_header_lists_config() {
        let report = report(vec![result(CrawlerKind::Http, 0, 10, None)]);
        let output = TextReporter::format(&report).unwrap();
        assert!(output.contains("URL:         https://example.com"));
        assert!(output.contains("Max pages:   10"));
        assert!(output.contains("Timeout:     30000ms"));
        assert!(output.contains("Crawlers:    http\n"));
    }

    #[test]
    fn test_text_comparison_summary() {
        let output = TextReporter::format(&report(vec![
            result(CrawlerKind::Browser, 0, 200, None),
            result(CrawlerKind::Browser, 1, 400, None),
            result(CrawlerKind::Http, 0, 100, None),
        ]))
        .unwrap();

        assert!(output.contains("Crawler: browser (2 iterations)"));
        assert!(output.contains("Crawler: http (1 iterations)"));
        assert!(output.contains("Average duration:   300ms"));
        assert!(output.contains("min 200ms, median 300ms, max 400ms"));
        assert!(output.contains("Crawlers:    browser, http\n"));
        // std dev 141.4 over a 300ms mean
        assert!(output.contains("Variation:          47.1%"));
        assert!(output.contains("Speedup:            3.00x"));
        assert!(output.contains("Memory difference:  +0.00 MB"));
        assert!(!output.contains("Iterations\n"));
    }

    #[test]
    fn test_text_undefined_speedup() {
        let output = TextReporter::format(&report(vec![
            result(CrawlerKind::Browser, 0, 200, None),
            result(CrawlerKind::Http, 0, 0, None),
        ]))
        .unwrap();
        assert!(output.contains("Speedup:            n/a"));
        // every http iteration took 0ms
        assert_eq!(output.matches("Variation:").count(), 1);
    }

    #[test]
    fn test_text_flat_listing_without_comparison() {
        let output = TextReporter::format(&report(vec![
            result(CrawlerKind::Browser, 0, 120, None),
            result(CrawlerKind::Browser, 1, 80, Some("connection refused")),
        ]))
        .unwrap();

        assert!(output.contains("browser #1: 120ms, 4 pages, 0 failed, 12.50 MB [ok]"));
        assert!(output.contains("browser #2: 80ms, 0 pages, 1 failed, 12.50 MB [FAILED]"));
        assert!(output.contains("error: connection refused"));
        assert!(!output.contains("Speedup"));
    }
}
