//! Peak memory sampling
//!
//! Memory is probed on a fixed cadence while an iteration runs and only the
//! running peak is kept.
//!
//! ```text
//!   reset(baseline)      tick   tick   tick     stop + final sample
//!        │                │      │      │            │
//!   ─────┴────────────────┴──────┴──────┴────────────┴──▶ time
//!        └──────────── crawl in flight ─────────┘
//!
//!   memory delta = max(0, peak - baseline)
//! ```
//!
//! The probe runs as a separate tokio task cancelled through a
//! [`CancellationToken`]. The peak is stored as the bit pattern of an `f64`
//! in an atomic, so the task and the iteration runner never need a lock.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BenchmarkError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of memory readings, in megabytes
pub trait MemoryProbe: Send + Sync {
    fn current_usage_mb(&self) -> f64;
}

/// Which processes count towards a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryScope {
    /// Resident memory of the harness process only
    #[default]
    #[serde(rename = "process")]
    Process,
    /// Harness plus all descendants, such as a launched browser
    #[serde(rename = "tree")]
    ProcessTree,
}

impl std::str::FromStr for MemoryScope {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(MemoryScope::Process),
            "tree" | "process-tree" => Ok(MemoryScope::ProcessTree),
            other => Err(BenchmarkError::InvalidConfig(format!(
                "unknown memory scope '{}', expected process or tree",
                other
            ))),
        }
    }
}

/// Resident set size of the current process (optionally with descendants)
pub struct ProcessMemoryProbe {
    pid: Pid,
    scope: MemoryScope,
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    /// # Errors
    ///
    /// Returns [`BenchmarkError::SamplerFailed`] on platforms where the
    /// current process id cannot be determined.
    pub fn new(scope: MemoryScope) -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| BenchmarkError::SamplerFailed(e.to_string()))?;
        Ok(Self {
            pid,
            scope,
            system: Mutex::new(System::new()),
        })
    }

    fn tree_bytes(system: &System, root: Pid) -> u64 {
        let processes = system.processes();
        let mut total = 0;
        let mut pending = vec![root];
        while let Some(pid) = pending.pop() {
            if let Some(process) = processes.get(&pid) {
                total += process.memory();
            }
            pending.extend(
                processes
                    .iter()
                    .filter(|(_, p)| p.parent() == Some(pid))
                    .map(|(child, _)| *child),
            );
        }
        total
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn current_usage_mb(&self) -> f64 {
        let mut system = self.system.lock();
        let bytes = match self.scope {
            MemoryScope::Process => {
                system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
                system.process(self.pid).map(|p| p.memory()).unwrap_or(0)
            }
            MemoryScope::ProcessTree => {
                system.refresh_processes(ProcessesToUpdate::All, true);
                Self::tree_bytes(&system, self.pid)
            }
        };
        bytes as f64 / BYTES_PER_MB
    }
}

/// Running peak of memory readings
pub struct MemorySampler {
    probe: Arc<dyn MemoryProbe>,
    baseline: AtomicU64,
    peak: AtomicU64,
}

impl MemorySampler {
    pub fn new(probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            probe,
            baseline: AtomicU64::new(0f64.to_bits()),
            peak: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Read the probe without touching the peak
    pub fn read(&self) -> f64 {
        self.probe.current_usage_mb()
    }

    /// Start a new measurement window at `baseline`
    pub fn reset(&self, baseline: f64) {
        self.baseline.store(baseline.to_bits(), Ordering::SeqCst);
        self.peak.store(baseline.to_bits(), Ordering::SeqCst);
    }

    /// Take one reading and raise the peak if it is higher
    pub fn sample(&self) {
        let current = self.read();
        let _ = self
            .peak
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                let higher = current > f64::from_bits(bits);
                higher.then_some(current.to_bits())
            });
    }

    pub fn baseline(&self) -> f64 {
        f64::from_bits(self.baseline.load(Ordering::SeqCst))
    }

    pub fn peak(&self) -> f64 {
        f64::from_bits(self.peak.load(Ordering::SeqCst))
    }

    /// Memory added since the last reset, never negative
    pub fn delta(&self) -> f64 {
        (self.peak() - self.baseline()).max(0.0)
    }

    /// Spawn the periodic probe. The first tick fires after one `interval`.
    pub fn start_periodic(self: &Arc<Self>, interval: Duration) -> PeriodicSampling {
        let token = CancellationToken::new();
        let sampler = Arc::clone(self);
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => sampler.sample(),
                }
            }
        });

        PeriodicSampling {
            token,
            handle: Some(handle),
        }
    }
}

/// Handle to a running periodic probe
///
/// Dropping the handle cancels the probe.
pub struct PeriodicSampling {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSampling {
    /// Cancel the probe and wait for the task to finish
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::SamplerFailed`] if the probe task panicked.
    pub async fn stop(mut self) -> Result<()> {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.await.map_err(|e| {
                BenchmarkError::SamplerFailed(format!("sampling task did not finish: {}", e))
            })?;
        }
        debug!("Periodic sampling stopped");
        Ok(())
    }
}

impl Drop for PeriodicSampling {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
