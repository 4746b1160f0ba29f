//! Benchmark execution
//!
//! The runner expands a configuration and a crawler selection into an
//! ordered list of iterations and executes them strictly one after another:
//!
//! ```text
//! selection = Both, iterations = 2
//!
//!   browser#0 ─▶ browser#1 ─▶ http#0 ─▶ http#1
//!      │
//!      ├─ baseline memory read, sampler reset
//!      ├─ periodic sampler task started
//!      ├─ crawler.crawl(url, options) awaited
//!      ├─ sampler stopped, one final sample
//!      └─ BenchmarkResult (success- or failure-shaped)
//! ```
//!
//! Iterations never overlap. Concurrency inside one crawl is up to the
//! crawler.
//!
//! A crawler failure is recorded on its iteration and the run continues.
//! Only faults in the harness itself abort a run.
//!
//! # Example
//!
//! ```no_run
//! use crawl_bench::config::EnvDefaults;
//! use crawl_bench::crawler::CrawlerSelection;
//! use crawl_bench::runner::BenchmarkRunner;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolved = EnvDefaults::from_env()?;
//! let runner = BenchmarkRunner::from_settings(&resolved.settings)?;
//! let report = runner.run_report(&resolved.config, CrawlerSelection::Both).await?;
//!
//! if let Some(comparison) = &report.comparison {
//!     println!("browser is {:.2}x slower", comparison.speedup);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::{BenchmarkConfig, HarnessSettings, DEFAULT_SAMPLE_INTERVAL_MS};
use crate::crawler::{CrawlOptions, CrawlerKind, CrawlerSelection, Crawlers};
use crate::error::{BenchmarkError, Result};
use crate::metrics::{BenchmarkMetrics, BenchmarkResult};
use crate::report::BenchmarkReport;
use crate::sampler::{MemoryProbe, MemorySampler, ProcessMemoryProbe};

/// Drives crawlers through measured iterations
pub struct BenchmarkRunner {
    crawlers: Crawlers,
    probe: Arc<dyn MemoryProbe>,
    sample_interval: Duration,
}

impl BenchmarkRunner {
    pub fn new(crawlers: Crawlers, probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            crawlers,
            probe,
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
        }
    }

    /// Production runner: real crawlers and a process memory probe
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client or the memory probe cannot be created.
    pub fn from_settings(settings: &HarnessSettings) -> Result<Self> {
        let crawlers = Crawlers::from_settings(settings).map_err(|e| {
            BenchmarkError::InvalidConfig(format!("cannot set up crawlers: {}", e))
        })?;
        let probe = ProcessMemoryProbe::new(settings.memory_scope)?;
        Ok(Self::new(crawlers, Arc::new(probe))
            .with_sample_interval(settings.sample_interval))
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Run one measured crawl and record it, whatever its outcome.
    ///
    /// A crawler error never escapes: it yields a result with
    /// `pages_failed = 1`, the error message, no pages, and the time and
    /// memory spent up to the failure.
    ///
    /// # Errors
    ///
    /// Only harness faults, such as the sampling task panicking.
    #[instrument(skip(self, kind, config), fields(crawler = %kind))]
    pub async fn run_iteration(
        &self,
        kind: CrawlerKind,
        config: &BenchmarkConfig,
        iteration: u32,
    ) -> Result<BenchmarkResult> {
        let sampler = Arc::new(MemorySampler::new(Arc::clone(&self.probe)));
        sampler.reset(sampler.read());

        let start_time = epoch_millis();
        let clock = Instant::now();
        let sampling = sampler.start_periodic(self.sample_interval);

        let outcome = self
            .crawlers
            .get(kind)
            .crawl(&config.url, &CrawlOptions::from(config))
            .await;

        let stopped = sampling.stop().await;
        sampler.sample();
        let duration = clock.elapsed().as_millis() as u64;
        stopped?;

        let memory_used = sampler.delta();
        debug!(
            baseline = sampler.baseline(),
            peak = sampler.peak(),
            memory_used,
            "Memory sampled"
        );

        let (pages, pages_failed, errors) = match outcome {
            Ok(data) => {
                info!(pages = data.items.len(), duration, memory_used, "Iteration completed");
                (data.items, 0, Vec::new())
            }
            Err(e) => {
                warn!(error = %e, duration, "Iteration failed");
                (Vec::new(), 1, vec![e.to_string()])
            }
        };

        Ok(BenchmarkResult {
            crawler_type: kind,
            config: config.clone(),
            metrics: BenchmarkMetrics {
                start_time,
                end_time: start_time + duration,
                duration,
                pages_processed: pages.len() as u64,
                pages_failed,
                memory_used,
                errors,
            },
            results: pages,
            iteration,
        })
    }

    /// Run every selected crawler for `config.iterations` iterations.
    ///
    /// Results come back crawler-major (browser before http) and
    /// iteration-minor.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidConfig`] before running anything if
    /// the configuration is invalid, or any harness fault raised while
    /// running.
    #[instrument(skip(self, config), fields(url = %config.url))]
    pub async fn run(
        &self,
        config: &BenchmarkConfig,
        selection: CrawlerSelection,
    ) -> Result<Vec<BenchmarkResult>> {
        config.validate()?;

        let kinds = selection.kinds();
        info!(
            crawlers = ?kinds,
            iterations = config.iterations,
            max_pages = config.max_pages,
            max_depth = config.max_depth,
            "Starting benchmark"
        );

        let mut results = Vec::with_capacity(kinds.len() * config.iterations as usize);
        for kind in kinds {
            for iteration in 0..config.iterations {
                info!(
                    "Running {} iteration {}/{}",
                    kind,
                    iteration + 1,
                    config.iterations
                );
                let result = self.run_iteration(kind, config, iteration).await?;
                results.push(result);
            }
        }

        let failed = results.iter().filter(|r| !r.metrics.succeeded()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Benchmark finished with failed iterations");
        } else {
            info!(total = results.len(), "Benchmark finished");
        }

        Ok(results)
    }

    /// [`run`](Self::run) followed by report assembly
    pub async fn run_report(
        &self,
        config: &BenchmarkConfig,
        selection: CrawlerSelection,
    ) -> Result<BenchmarkReport> {
        let results = self.run(config, selection).await?;
        BenchmarkReport::from_results(config.clone(), results)
    }
}

fn epoch_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlMetadata, Crawler, ExtractedData, PageRecord};
    use crate::error::CrawlError;
    use async_trait::async_trait;

    struct FixedProbe(f64);

    impl MemoryProbe for FixedProbe {
        fn current_usage_mb(&self) -> f64 {
            self.0
        }
    }

    struct EmptyCrawler;

    #[async_trait]
    impl Crawler for EmptyCrawler {
        async fn crawl(
            &self,
            url: &str,
            _: &CrawlOptions,
        ) -> std::result::Result<ExtractedData, CrawlError> {
            Ok(ExtractedData {
                items: vec![],
                metadata: CrawlMetadata {
                    original_url: url.to_string(),
                    total_pages: 0,
                    completed_at: Utc::now(),
                    execution_time: 0,
                },
            })
        }

        async fn scrap(
            &self,
            url: &str,
            _: &CrawlOptions,
        ) -> std::result::Result<PageRecord, CrawlError> {
            Err(CrawlError::Request(format!("no page at {}", url)))
        }
    }

    fn runner() -> BenchmarkRunner {
        let crawler: Arc<dyn Crawler> = Arc::new(EmptyCrawler);
        BenchmarkRunner::new(
            Crawlers::new(crawler.clone(), crawler),
            Arc::new(FixedProbe(50.0)),
        )
        .with_sample_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_invalid_config_fails_fast() {
        let config = BenchmarkConfig {
            iterations: 0,
            ..BenchmarkConfig::default()
        };
        let err = runner()
            .run(&config, CrawlerSelection::Both)
            .await
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_flat_memory_gives_zero_delta() {
        let result = runner()
            .run_iteration(CrawlerKind::Http, &BenchmarkConfig::default(), 0)
            .await
            .unwrap();
        assert_eq!(result.metrics.memory_used, 0.0);
        assert_eq!(result.metrics.pages_processed, 0);
        assert!(result.metrics.succeeded());
    }

    #[test]
    fn test_sample_interval_has_floor() {
        let runner = runner().with_sample_interval(Duration::ZERO);
        assert_eq!(runner.sample_interval, Duration::from_millis(1));
    }
}
