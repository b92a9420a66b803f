//! Scan counters and the end-of-run summary.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct ScanStats {
    pub batches: AtomicU64,
    pub queries: AtomicU64,
    pub found: AtomicU64,
    pub banned: AtomicU64,
    /// Worker tasks that died before returning a suggestion.
    pub failed: AtomicU64,
    start: Instant,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self {
            batches: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            found: AtomicU64::new(0),
            banned: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start: Instant::now(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub batches: u64,
    pub queries: u64,
    pub found: u64,
    pub banned: u64,
    pub failed: u64,
    pub elapsed_secs: f64,
    pub rate: f64,
}

impl ScanStats {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.start.elapsed().as_secs_f64();
        let queries = self.queries.load(Ordering::Relaxed);
        StatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            queries,
            found: self.found.load(Ordering::Relaxed),
            banned: self.banned.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed_secs: elapsed,
            rate: if elapsed > 0.0 { queries as f64 / elapsed } else { 0.0 },
        }
    }

    pub fn log_summary(&self, discovered: usize) {
        let s = self.snapshot();
        info!(
            batches = s.batches,
            queries = s.queries,
            banned = s.banned,
            failed = s.failed,
            discovered,
            "scan finished in {:.1}s ({:.0} q/s)",
            s.elapsed_secs,
            s.rate
        );
    }
}
