//! Scripted crawlers and memory probes for engine tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use crawl_bench::crawler::{
    CrawlMetadata, CrawlOptions, Crawler, CrawlerKind, Crawlers, ExtractedData, PageMetadata,
    PageRecord,
};
use crawl_bench::error::CrawlError;
use crawl_bench::runner::BenchmarkRunner;
use crawl_bench::sampler::MemoryProbe;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(5);

/// Simulated process memory shared by fake crawlers and [`LevelProbe`]
#[derive(Clone)]
pub struct MemoryLevel(Arc<Mutex<f64>>);

impl MemoryLevel {
    pub fn new(start_mb: f64) -> Self {
        Self(Arc::new(Mutex::new(start_mb)))
    }

    pub fn add(&self, mb: f64) {
        *self.0.lock() += mb;
    }

    pub fn get(&self) -> f64 {
        *self.0.lock()
    }
}

/// Reads the shared [`MemoryLevel`]
pub struct LevelProbe(pub MemoryLevel);

impl MemoryProbe for LevelProbe {
    fn current_usage_mb(&self) -> f64 {
        self.0.get()
    }
}

/// Replays scripted readings, repeating the last one when exhausted
pub struct ScriptedProbe(Mutex<VecDeque<f64>>);

impl ScriptedProbe {
    pub fn new(readings: &[f64]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(readings.iter().copied().collect())))
    }
}

impl MemoryProbe for ScriptedProbe {
    fn current_usage_mb(&self) -> f64 {
        let mut readings = self.0.lock();
        if readings.len() > 1 {
            readings.pop_front().unwrap_or(0.0)
        } else {
            readings.front().copied().unwrap_or(0.0)
        }
    }
}

/// What one crawl call does
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub pages: usize,
    /// Memory added during the call and never released
    pub memory_mb: f64,
    /// Memory held only while the call is in flight
    pub spike_mb: f64,
    pub error: Option<String>,
}

impl Step {
    pub fn ok(delay_ms: u64, pages: usize) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pages,
            memory_mb: 0.0,
            spike_mb: 0.0,
            error: None,
        }
    }

    pub fn fail(delay_ms: u64, message: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pages: 0,
            memory_mb: 0.0,
            spike_mb: 0.0,
            error: Some(message.to_string()),
        }
    }

    pub fn using(mut self, memory_mb: f64) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    /// Hold `spike_mb` for the duration of the call, release it before returning
    pub fn spiking(mut self, spike_mb: f64) -> Self {
        self.spike_mb = spike_mb;
        self
    }
}

/// Every crawl call made, in order
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(CrawlerKind, String)>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<(CrawlerKind, String)> {
        self.0.lock().clone()
    }

    pub fn kinds(&self) -> Vec<CrawlerKind> {
        self.0.lock().iter().map(|(kind, _)| *kind).collect()
    }
}

/// Crawler that plays back a script, one step per call
pub struct FakeCrawler {
    kind: CrawlerKind,
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    memory: MemoryLevel,
    log: CallLog,
}

impl FakeCrawler {
    pub fn new(
        kind: CrawlerKind,
        steps: Vec<Step>,
        memory: MemoryLevel,
        log: CallLog,
    ) -> Self {
        Self {
            kind,
            steps: Mutex::new(steps.into()),
            fallback: Step::ok(1, 1),
            memory,
            log,
        }
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn page(url: &str, index: usize) -> PageRecord {
    let html = format!("<html><title>Page {}</title></html>", index);
    PageRecord {
        url: format!("{}/page-{}", url.trim_end_matches('/'), index),
        title: format!("Page {}", index),
        metadata: PageMetadata {
            status_code: Some(200),
            timestamp: Utc::now(),
            depth: u32::from(index > 0),
            content_length: html.len(),
        },
        html_content: html,
    }
}

#[async_trait]
impl Crawler for FakeCrawler {
    async fn crawl(&self, url: &str, _options: &CrawlOptions) -> Result<ExtractedData, CrawlError> {
        self.log.0.lock().push((self.kind, url.to_string()));
        let step = self.next_step();

        self.memory.add(step.memory_mb + step.spike_mb);
        tokio::time::sleep(step.delay).await;
        self.memory.add(-step.spike_mb);

        if let Some(message) = step.error {
            return Err(CrawlError::Request(message));
        }

        let items: Vec<PageRecord> = (0..step.pages).map(|i| page(url, i)).collect();
        Ok(ExtractedData {
            metadata: CrawlMetadata {
                original_url: url.to_string(),
                total_pages: items.len(),
                completed_at: Utc::now(),
                execution_time: step.delay.as_millis() as u64,
            },
            items,
        })
    }

    async fn scrap(&self, url: &str, _options: &CrawlOptions) -> Result<PageRecord, CrawlError> {
        Ok(page(url, 0))
    }
}

/// Runner wired to scripted browser and http crawlers over a shared memory level
pub struct Harness {
    pub runner: BenchmarkRunner,
    pub log: CallLog,
    pub memory: MemoryLevel,
}

impl Harness {
    pub fn new(browser: Vec<Step>, http: Vec<Step>) -> Self {
        let log = CallLog::default();
        let memory = MemoryLevel::new(100.0);
        let crawlers = Crawlers::new(
            Arc::new(FakeCrawler::new(
                CrawlerKind::Browser,
                browser,
                memory.clone(),
                log.clone(),
            )),
            Arc::new(FakeCrawler::new(
                CrawlerKind::Http,
                http,
                memory.clone(),
                log.clone(),
            )),
        );
        let probe = Arc::new(LevelProbe(memory.clone()));
        let runner = BenchmarkRunner::new(crawlers, probe)
            .with_sample_interval(SAMPLE_INTERVAL);
        Self {
            runner,
            log,
            memory,
        }
    }

    /// Runner with the given probe instead of the shared memory level
    pub fn with_probe(
        browser: Vec<Step>,
        http: Vec<Step>,
        probe: Arc<dyn MemoryProbe>,
    ) -> BenchmarkRunner {
        let log = CallLog::default();
        let memory = MemoryLevel::new(0.0);
        let crawlers = Crawlers::new(
            Arc::new(FakeCrawler::new(
                CrawlerKind::Browser,
                browser,
                memory.clone(),
                log.clone(),
            )),
            Arc::new(FakeCrawler::new(CrawlerKind::Http, http, memory, log)),
        );
        BenchmarkRunner::new(crawlers, probe)
            .with_sample_interval(SAMPLE_INTERVAL)
    }
}
