//! Process-wide request statistics.
//!
//! `PipelineStats` counts finished requests, their average latency and the
//! failures per reason code, so a run of `model_execution_error`s can be
//! alarmed on. `StatsManager` serialises updates behind a mutex.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters over every request a pipeline has finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// The total number of requests processed.
    pub total_processed: usize,
    /// Requests that reached `Done`.
    pub successful: usize,
    /// Requests that ended in `Failed`.
    pub failed: usize,
    /// Failures keyed by reason code.
    pub failures_by_code: BTreeMap<&'static str, usize>,
    /// Average wall time per request in milliseconds.
    pub average_latency_ms: f64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_processed as f64) * 100.0
        }
    }

    /// Failures recorded under `code`.
    pub fn failures(&self, code: &str) -> usize {
        self.failures_by_code.get(code).copied().unwrap_or(0)
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Statistics:")?;
        writeln!(f, "  Total processed: {}", self.total_processed)?;
        writeln!(
            f,
            "  Successful: {} ({:.1}%)",
            self.successful,
            self.success_rate()
        )?;
        writeln!(f, "  Failed: {}", self.failed)?;
        for (code, count) in &self.failures_by_code {
            writeln!(f, "    {code}: {count}")?;
        }
        writeln!(f, "  Average latency: {:.2} ms", self.average_latency_ms)?;
        Ok(())
    }
}

/// Thread-safe owner of a [`PipelineStats`].
#[derive(Debug, Default)]
pub struct StatsManager {
    stats: Mutex<PipelineStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Counters stay meaningful even if a recording thread panicked.
    fn lock(&self) -> MutexGuard<'_, PipelineStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current statistics snapshot.
    pub fn get_stats(&self) -> PipelineStats {
        self.lock().clone()
    }

    /// Records one finished request; `failure` is its reason code if it failed.
    pub fn record(&self, failure: Option<&'static str>, latency_ms: f64) {
        let mut stats = self.lock();
        let previous_total = stats.total_processed;
        let new_total = previous_total + 1;

        stats.total_processed = new_total;
        match failure {
            None => stats.successful += 1,
            Some(code) => {
                stats.failed += 1;
                *stats.failures_by_code.entry(code).or_insert(0) += 1;
            }
        }
        let accumulated = stats.average_latency_ms * previous_total as f64;
        stats.average_latency_ms = (accumulated + latency_ms) / new_total as f64;
    }

    /// Resets the tracked statistics to their default state.
    pub fn reset_stats(&self) {
        *self.lock() = PipelineStats::default();
    }
}
