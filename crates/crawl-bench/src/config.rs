//! Configuration resolution for benchmark runs
//!
//! A run is driven by two records:
//!
//! - [`BenchmarkConfig`]: what is measured (target URL, page and depth budget,
//!   iteration count, per-page timeout). It is copied verbatim into every
//!   result and into the final report.
//! - [`HarnessSettings`]: how the harness behaves (crawler concurrency caps,
//!   sampling cadence, memory scope, where reports go).
//!
//! Both are resolved once, before the engine runs, by layering sources in
//! increasing precedence: built-in defaults, environment variables, an
//! optional TOML file, a scenario preset and finally explicit overrides.
//! The engine itself never reads the environment.
//!
//! # Example
//!
//! ```
//! use crawl_bench::config::{ConfigFile, EnvDefaults};
//!
//! # fn example() -> anyhow::Result<()> {
//! let toml = r#"
//!     [benchmark]
//!     url = "https://example.com"
//!     iterations = 5
//!
//!     [harness]
//!     http_concurrency = 4
//! "#;
//! let file = ConfigFile::from_str(toml)?;
//!
//! let mut resolved = EnvDefaults::builtin();
//! file.apply(&mut resolved);
//! resolved.config.validate()?;
//! assert_eq!(resolved.config.iterations, 5);
//! assert_eq!(resolved.settings.http_concurrency, 4);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BenchmarkError, Result};
use crate::sampler::MemoryScope;

pub const DEFAULT_URL: &str = "https://example.com";
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_MAX_DEPTH: u32 = 2;
pub const DEFAULT_ITERATIONS: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BROWSER_CONCURRENCY: usize = 2;
pub const DEFAULT_HTTP_CONCURRENCY: usize = 10;
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// Immutable parameters of one benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkConfig {
    /// Seed URL handed to every crawler
    pub url: String,
    /// Upper bound on pages a crawler may process
    pub max_pages: u32,
    /// Link depth limit; the seed page is depth 0
    pub max_depth: u32,
    /// Iterations per crawler (at least 1)
    pub iterations: u32,
    /// Per-page timeout in milliseconds, enforced by the crawler
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            iterations: DEFAULT_ITERATIONS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BenchmarkConfig {
    /// Reject configurations the engine cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidConfig`] if any numeric field is zero
    /// or the URL is not an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.url).map_err(|e| {
            BenchmarkError::InvalidConfig(format!("url '{}' is not valid: {}", self.url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BenchmarkError::InvalidConfig(format!(
                "url '{}' must use http or https",
                self.url
            )));
        }
        if self.max_pages == 0 {
            return Err(BenchmarkError::InvalidConfig("maxPages must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(BenchmarkError::InvalidConfig("maxDepth must be at least 1".into()));
        }
        if self.iterations == 0 {
            return Err(BenchmarkError::InvalidConfig("iterations must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(BenchmarkError::InvalidConfig("timeout must be at least 1ms".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Harness behavior that is not part of the measured configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Concurrent tabs the browser crawler may open
    pub browser_concurrency: usize,
    /// Concurrent requests the HTTP crawler may issue
    pub http_concurrency: usize,
    /// Directory the report files are written to
    pub results_dir: PathBuf,
    /// Memory sampling cadence
    pub sample_interval: Duration,
    /// Which processes count towards memory usage
    pub memory_scope: MemoryScope,
    /// Explicit Chrome/Chromium executable, auto-detected when absent
    pub chrome_path: Option<PathBuf>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            browser_concurrency: DEFAULT_BROWSER_CONCURRENCY,
            http_concurrency: DEFAULT_HTTP_CONCURRENCY,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            memory_scope: MemoryScope::default(),
            chrome_path: None,
        }
    }
}

/// Fully resolved configuration handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedConfig {
    pub config: BenchmarkConfig,
    pub settings: HarnessSettings,
}

/// Environment-derived defaults
///
/// Every variable is optional. A variable that is present but does not parse
/// is an error rather than being silently ignored.
pub struct EnvDefaults;

impl EnvDefaults {
    pub const URL: &'static str = "CRAWL_BENCH_URL";
    pub const MAX_PAGES: &'static str = "CRAWL_BENCH_MAX_PAGES";
    pub const MAX_DEPTH: &'static str = "CRAWL_BENCH_MAX_DEPTH";
    pub const ITERATIONS: &'static str = "CRAWL_BENCH_ITERATIONS";
    pub const TIMEOUT_MS: &'static str = "CRAWL_BENCH_TIMEOUT_MS";
    pub const BROWSER_CONCURRENCY: &'static str = "CRAWL_BENCH_BROWSER_CONCURRENCY";
    pub const HTTP_CONCURRENCY: &'static str = "CRAWL_BENCH_HTTP_CONCURRENCY";
    pub const RESULTS_DIR: &'static str = "CRAWL_BENCH_RESULTS_DIR";
    pub const SAMPLE_INTERVAL_MS: &'static str = "CRAWL_BENCH_SAMPLE_INTERVAL_MS";
    pub const CHROME_PATH: &'static str = "CHROME_PATH";

    /// Built-in defaults with no environment applied
    pub fn builtin() -> ResolvedConfig {
        ResolvedConfig::default()
    }

    /// Resolve defaults from the process environment
    pub fn from_env() -> Result<ResolvedConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve defaults through an arbitrary lookup function
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidConfig`] naming the variable when a
    /// value is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<ResolvedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut resolved = Self::builtin();
        let config = &mut resolved.config;
        let settings = &mut resolved.settings;

        if let Some(url) = lookup(Self::URL).filter(|v| !v.trim().is_empty()) {
            config.url = url.trim().to_string();
        }
        if let Some(v) = parse_var(&lookup, Self::MAX_PAGES)? {
            config.max_pages = v;
        }
        if let Some(v) = parse_var(&lookup, Self::MAX_DEPTH)? {
            config.max_depth = v;
        }
        if let Some(v) = parse_var(&lookup, Self::ITERATIONS)? {
            config.iterations = v;
        }
        if let Some(v) = parse_var(&lookup, Self::TIMEOUT_MS)? {
            config.timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, Self::BROWSER_CONCURRENCY)? {
            settings.browser_concurrency = v;
        }
        if let Some(v) = parse_var(&lookup, Self::HTTP_CONCURRENCY)? {
            settings.http_concurrency = v;
        }
        if let Some(dir) = lookup(Self::RESULTS_DIR).filter(|v| !v.trim().is_empty()) {
            settings.results_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, Self::SAMPLE_INTERVAL_MS)? {
            settings.sample_interval = Duration::from_millis(ms);
        }
        if let Some(path) = lookup(Self::CHROME_PATH).filter(|v| !v.trim().is_empty()) {
            settings.chrome_path = Some(PathBuf::from(path));
        }

        Ok(resolved)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            BenchmarkError::InvalidConfig(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
    }
}

/// Partial benchmark configuration; `None` fields leave the target untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub max_pages: Option<u32>,
    pub max_depth: Option<u32>,
    pub iterations: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut BenchmarkConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(v) = self.max_pages {
            config.max_pages = v;
        }
        if let Some(v) = self.max_depth {
            config.max_depth = v;
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
    }
}

/// Partial harness settings read from a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessOverrides {
    pub browser_concurrency: Option<usize>,
    pub http_concurrency: Option<usize>,
    pub results_dir: Option<PathBuf>,
    pub sample_interval_ms: Option<u64>,
    pub memory_scope: Option<MemoryScope>,
    pub chrome_path: Option<PathBuf>,
}

impl HarnessOverrides {
    pub fn apply(&self, settings: &mut HarnessSettings) {
        if let Some(v) = self.browser_concurrency {
            settings.browser_concurrency = v;
        }
        if let Some(v) = self.http_concurrency {
            settings.http_concurrency = v;
        }
        if let Some(dir) = &self.results_dir {
            settings.results_dir = dir.clone();
        }
        if let Some(ms) = self.sample_interval_ms {
            settings.sample_interval = Duration::from_millis(ms);
        }
        if let Some(scope) = self.memory_scope {
            settings.memory_scope = scope;
        }
        if let Some(path) = &self.chrome_path {
            settings.chrome_path = Some(path.clone());
        }
    }
}

/// TOML configuration file
///
/// ```toml
/// [benchmark]
/// url = "https://docs.example.com"
/// max_pages = 25
/// max_depth = 2
/// iterations = 5
/// timeout_ms = 20000
///
/// [harness]
/// browser_concurrency = 2
/// http_concurrency = 8
/// results_dir = "results"
/// sample_interval_ms = 100
/// memory_scope = "tree"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub benchmark: ConfigOverrides,
    #[serde(default)]
    pub harness: HarnessOverrides,
}

impl ConfigFile {
    /// Load a configuration file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_str(&content).map_err(|e| match e {
            BenchmarkError::InvalidConfig(msg) => {
                BenchmarkError::InvalidConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse a configuration file from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BenchmarkError::InvalidConfig(e.to_string()))
    }

    pub fn apply(&self, resolved: &mut ResolvedConfig) {
        self.benchmark.apply(&mut resolved.config);
        self.harness.apply(&mut resolved.settings);
    }
}
