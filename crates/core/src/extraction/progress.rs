//! Run-wide progress accounting
//!
//! Batches finish on different workers, so the tracker keeps its counters
//! behind a mutex and logs one summary line per completed batch with the
//! percentage, throughput and a rough ETA.

use std::time::{Duration, Instant};

use decant_common::resilience::{Clock, SystemClock};
use parking_lot::Mutex;
use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    successful: usize,
    failed: usize,
    batches: usize,
}

/// Snapshot of a finished run
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    pub total_ids: usize,
    pub successful: usize,
    pub failed: usize,
    pub batches: usize,
    pub elapsed: Duration,
    pub throughput_per_sec: f64,
}

/// Thread-safe progress counter for one extraction run
pub struct ProgressTracker<C: Clock = SystemClock> {
    clock: C,
    total_ids: usize,
    started: Instant,
    counters: Mutex<Counters>,
}

impl ProgressTracker<SystemClock> {
    pub fn new(total_ids: usize) -> Self {
        Self::with_clock(total_ids, SystemClock)
    }
}

impl<C: Clock> ProgressTracker<C> {
    pub fn with_clock(total_ids: usize, clock: C) -> Self {
        let started = clock.now();
        Self { clock, total_ids, started, counters: Mutex::new(Counters::default()) }
    }

    /// Fold one finished batch into the run counters and log the progress
    pub fn record_batch(&self, name: &str, successes: usize, failures: usize) {
        let (done, batches) = {
            let mut counters = self.counters.lock();
            counters.successful += successes;
            counters.failed += failures;
            counters.batches += 1;
            (counters.successful + counters.failed, counters.batches)
        };

        let percent = if self.total_ids == 0 {
            100.0
        } else {
            done as f64 * 100.0 / self.total_ids as f64
        };
        let elapsed = self.clock.now().saturating_duration_since(self.started);
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            done as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let remaining = self.total_ids.saturating_sub(done);
        let eta_secs =
            if throughput > 0.0 { (remaining as f64 / throughput).round() as u64 } else { 0 };

        info!(
            batch = name,
            completed = done,
            total = self.total_ids,
            batches,
            percent = (percent * 10.0).round() / 10.0,
            per_sec = (throughput * 10.0).round() / 10.0,
            eta_secs,
            "Batch finished"
        );
    }

    pub fn final_summary(&self) -> ProgressSummary {
        let counters = self.counters.lock();
        let elapsed = self.clock.now().saturating_duration_since(self.started);
        let done = counters.successful + counters.failed;
        let throughput_per_sec = if elapsed.as_secs_f64() > 0.0 {
            done as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        ProgressSummary {
            total_ids: self.total_ids,
            successful: counters.successful,
            failed: counters.failed,
            batches: counters.batches,
            elapsed,
            throughput_per_sec,
        }
    }
}
