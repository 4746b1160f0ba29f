//! Crawler benchmark engine
//!
//! Measures two crawling strategies against the same target and compares
//! them: a headless browser that renders every page, and plain HTTP requests
//! with HTML parsing.
//!
//! # Features
//!
//! - **Sequential iterations**: each crawler runs N isolated, timed iterations
//! - **Peak memory sampling**: a background probe tracks the memory high-water
//!   mark while a crawl is in flight
//! - **Failure as data**: a failed crawl becomes a recorded iteration rather
//!   than aborting the run
//! - **Aggregation and comparison**: averaged metrics per crawler, speedup and
//!   memory/page differences between them
//! - **Output formats**: JSON and plain-text reports
//!
//! # Example
//!
//! ```no_run
//! use crawl_bench::{
//!     config::EnvDefaults,
//!     crawler::CrawlerSelection,
//!     reporter::{OutputFormat, ReportWriter, Reporter},
//!     runner::BenchmarkRunner,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolved = EnvDefaults::from_env()?;
//! let runner = BenchmarkRunner::from_settings(&resolved.settings)?;
//! let report = runner.run_report(&resolved.config, CrawlerSelection::Both).await?;
//!
//! Reporter::new(OutputFormat::Text).report(&report)?;
//! ReportWriter::persist(&report, &resolved.settings.results_dir)?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod sampler;
pub mod scenarios;
pub mod stats;

pub use compare::ComparisonResult;
pub use config::{BenchmarkConfig, HarnessSettings, ResolvedConfig};
pub use crawler::{Crawler, CrawlerKind, CrawlerSelection};
pub use error::{BenchmarkError, CrawlError, Result};
pub use metrics::{BenchmarkMetrics, BenchmarkResult};
pub use report::BenchmarkReport;
pub use reporter::{OutputFormat, Reporter};
pub use runner::BenchmarkRunner;
