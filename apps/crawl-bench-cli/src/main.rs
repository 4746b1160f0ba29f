//! Crawler benchmark CLI
//!
//! Resolves the run configuration, executes the benchmark, prints the report
//! to stdout and saves the JSON and text renderings.

use anyhow::{Context, Result};
use clap::Parser;
use crawl_bench::config::{ConfigFile, ConfigOverrides, EnvDefaults, ResolvedConfig};
use crawl_bench::crawler::CrawlerSelection;
use crawl_bench::reporter::{OutputFormat, ReportWriter, Reporter};
use crawl_bench::runner::BenchmarkRunner;
use crawl_bench::sampler::MemoryScope;
use crawl_bench::scenarios::{self, Scenario};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawl-bench")]
#[command(
    version,
    about = "Benchmark a headless-browser crawler against a plain HTTP crawler"
)]
struct Args {
    /// Seed URL to crawl
    #[arg(short, long)]
    url: Option<String>,

    /// Maximum pages per crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum link depth (the seed page is depth 0)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Iterations per crawler
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Per-page timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Crawler to benchmark: browser, http or both
    #[arg(short, long, default_value = "both")]
    crawler: String,

    /// Scenario preset (see --list-scenarios)
    #[arg(short, long, env = "CRAWL_BENCH_SCENARIO")]
    scenario: Option<String>,

    /// Print the scenario presets and exit
    #[arg(long)]
    list_scenarios: bool,

    /// TOML configuration file
    #[arg(long, env = "CRAWL_BENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Report printed to stdout: text, json or json-pretty
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Do not write report files
    #[arg(long)]
    no_save: bool,

    /// Chrome or Chromium executable for the browser crawler
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Memory accounting: process (harness only) or tree (harness and children)
    #[arg(long)]
    memory_scope: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            iterations: self.iterations,
            timeout_ms: self.timeout,
        }
    }

    /// Layer file, scenario and flags over `base`, in that order
    fn resolve(&self, mut resolved: ResolvedConfig) -> Result<ResolvedConfig> {
        if let Some(path) = &self.config {
            ConfigFile::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
                .apply(&mut resolved);
        }

        if let Some(name) = &self.scenario {
            Scenario::find(name)?.apply(&mut resolved.config);
        }

        self.overrides().apply(&mut resolved.config);

        let settings = &mut resolved.settings;
        if let Some(dir) = &self.results_dir {
            settings.results_dir = dir.clone();
        }
        if let Some(path) = &self.chrome_path {
            settings.chrome_path = Some(path.clone());
        }
        if let Some(scope) = &self.memory_scope {
            settings.memory_scope = scope.parse::<MemoryScope>()?;
        }

        resolved.config.validate()?;
        Ok(resolved)
    }

    fn selection(&self) -> Result<CrawlerSelection> {
        Ok(self.crawler.parse::<CrawlerSelection>()?)
    }

    fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse::<OutputFormat>().map_err(anyhow::Error::msg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_scenarios {
        print!("{}", scenarios::describe_all());
        return Ok(());
    }

    // stdout carries the report, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let resolved = args.resolve(EnvDefaults::from_env()?)?;
    let selection = args.selection()?;
    let format = args.output_format()?;

    tracing::info!("crawl-bench v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        url = %resolved.config.url,
        crawlers = ?selection.kinds(),
        "Benchmark configured"
    );

    let runner = BenchmarkRunner::from_settings(&resolved.settings)?;
    let report = runner.run_report(&resolved.config, selection).await?;

    Reporter::new(format).report(&report)?;

    if !args.no_save {
        ReportWriter::persist(&report, &resolved.settings.results_dir)?;
    }

    Ok(())
}
