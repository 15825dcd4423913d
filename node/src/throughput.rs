//! Rolling transaction throughput over a time window.

use std::collections::VecDeque;
use std::sync::Arc;

use sdupi_types::Timestamp;
use sdupi_utils::Clock;

/// Samples kept when no explicit cap is given.
pub const DEFAULT_MAX_SAMPLES: usize = 1_000_000;

/// Records one timestamp per confirmed transaction and reports the rate
/// inside a trailing window.
pub struct MetricsTracker {
    /// Non-decreasing timestamps, oldest at the front.
    samples: VecDeque<Timestamp>,
    max_samples: usize,
    clock: Arc<dyn Clock>,
}

impl MetricsTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_samples(clock, DEFAULT_MAX_SAMPLES)
    }

    pub fn with_max_samples(clock: Arc<dyn Clock>, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples,
            clock,
        }
    }

    /// Record `transactions` confirmations at the current time.
    pub fn record(&mut self, transactions: usize) {
        let now = self.clock.now();
        self.record_at(transactions, now);
    }

    pub fn record_at(&mut self, transactions: usize, now: Timestamp) {
        if self.max_samples == 0 {
            return;
        }
        for _ in 0..transactions {
            if self.samples.len() >= self.max_samples {
                self.samples.pop_front();
            }
            self.samples.push_back(now);
        }
    }

    /// Transactions per second over the last `window_ms`.
    pub fn throughput(&mut self, window_ms: u64) -> f64 {
        let now = self.clock.now();
        self.throughput_at(window_ms, now)
    }

    /// Drop samples older than the window ending at `now`, then return
    /// `count / window_secs`. Zero for an empty buffer or window.
    pub fn throughput_at(&mut self, window_ms: u64, now: Timestamp) -> f64 {
        let cutoff = now.saturating_sub_millis(window_ms);
        while self.samples.front().is_some_and(|ts| *ts < cutoff) {
            self.samples.pop_front();
        }
        if self.samples.is_empty() || window_ms == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (window_ms as f64 / 1000.0)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }
}
