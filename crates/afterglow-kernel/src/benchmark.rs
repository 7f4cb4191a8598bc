//! Step timing utilities.
//!
//! [`StepStats`] accumulates per-generation wall time so drivers can report
//! throughput; [`Timer`] measures and logs a single span.

use std::time::{Duration, Instant};
use tracing::info;

/// A simple timer for measuring durations.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Creates and starts a new timer.
    #[must_use]
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    /// Returns the elapsed time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer and logs the elapsed time.
    pub fn stop_and_log(self) -> Duration {
        let elapsed = self.elapsed();
        info!("{}: {:.3}ms", self.label, elapsed.as_secs_f64() * 1000.0);
        elapsed
    }
}

/// Running totals over generation steps.
#[derive(Debug, Clone, Default)]
pub struct StepStats {
    /// Generations recorded
    pub generations: u64,
    /// Sum of step durations
    pub total: Duration,
    /// Duration of the most recent step
    pub last: Duration,
    /// Slowest step seen
    pub slowest: Duration,
}

impl StepStats {
    /// Creates empty stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one step.
    pub fn record(&mut self, elapsed: Duration) {
        self.generations += 1;
        self.total += elapsed;
        self.last = elapsed;
        self.slowest = self.slowest.max(elapsed);
    }

    /// Mean step time in milliseconds, 0 when nothing was recorded.
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        if self.generations == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1000.0 / self.generations as f64
    }

    /// Generations per second of step time, 0 when nothing was recorded.
    #[must_use]
    pub fn generations_per_second(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.generations as f64 / secs
    }

    /// Formats the stats as a human-readable line.
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{} generations: mean {:.3}ms, slowest {:.3}ms ({:.1} gen/s)",
            self.generations,
            self.mean_ms(),
            self.slowest.as_secs_f64() * 1000.0,
            self.generations_per_second()
        )
    }
}
