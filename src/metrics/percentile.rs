//! Rolling-percentile window.
//!
//! A deliberate simplification over a full decaying-histogram structure: no
//! such crate is in the dependency stack, so percentiles are read off a
//! sorted ring buffer of recent samples, pruned by age at
//! snapshot time. See DESIGN.md for the grounded rationale.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::constants::METRICS_WINDOW_SECS;

/// p50/p95/p99 read off a stage's rolling sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    /// Median latency, in milliseconds.
    pub p50: f64,
    /// 95th percentile latency, in milliseconds.
    pub p95: f64,
    /// 99th percentile latency, in milliseconds.
    pub p99: f64,
}

impl Percentiles {
    /// All-zero percentiles, returned when a window has no samples.
    pub const ZERO: Percentiles = Percentiles {
        p50: 0.0,
        p95: 0.0,
        p99: 0.0,
    };
}

/// A fixed-size ring buffer of `(timestamp_secs, value_ms)` samples, pruned
/// to a 5-minute window at read time.
pub struct RollingWindow {
    samples: Mutex<VecDeque<(i64, f64)>>,
    capacity: usize,
    window_secs: i64,
}

impl RollingWindow {
    /// Builds a window holding at most `capacity` samples from the last
    /// [`METRICS_WINDOW_SECS`] seconds.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            window_secs: METRICS_WINDOW_SECS,
        }
    }

    /// Records a new sample at `now` (unix seconds).
    pub fn record(&self, now: i64, value_ms: f64) {
        let mut samples = self.samples.lock();
        samples.push_back((now, value_ms));
        while samples.len() > self.capacity {
            samples.pop_front();
        }
    }

    /// Prunes samples older than the window and returns p50/p95/p99 over what remains.
    pub fn snapshot(&self, now: i64) -> Percentiles {
        let mut samples = self.samples.lock();
        let cutoff = now - self.window_secs;
        while let Some(&(ts, _)) = samples.front() {
            if ts < cutoff {
                samples.pop_front();
            } else {
                break;
            }
        }

        if samples.is_empty() {
            return Percentiles::ZERO;
        }

        let mut values: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let at = |p: f64| -> f64 {
            let idx = ((values.len() as f64 - 1.0) * p).round() as usize;
            values[idx.min(values.len() - 1)]
        };

        Percentiles {
            p50: at(0.50),
            p95: at(0.95),
            p99: at(0.99),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reports_zero_percentiles() {
        let window = RollingWindow::new(100);
        assert_eq!(window.snapshot(1_000), Percentiles::ZERO);
    }

    #[test]
    fn percentiles_reflect_recorded_samples() {
        let window = RollingWindow::new(100);
        for v in 1..=100 {
            window.record(1_000, v as f64);
        }
        let snap = window.snapshot(1_000);
        assert!((snap.p50 - 50.0).abs() <= 1.0);
        assert!(snap.p95 >= 94.0);
        assert!(snap.p99 >= 98.0);
    }

    #[test]
    fn samples_older_than_window_are_pruned() {
        let window = RollingWindow::new(100);
        window.record(0, 1_000.0);
        let snap = window.snapshot(0 + METRICS_WINDOW_SECS + 1);
        assert_eq!(snap, Percentiles::ZERO);
    }

    #[test]
    fn capacity_evicts_oldest_samples_first() {
        let window = RollingWindow::new(3);
        window.record(1, 1.0);
        window.record(1, 2.0);
        window.record(1, 3.0);
        window.record(1, 100.0);
        let snap = window.snapshot(1);
        // The value `1.0` should have been evicted; max observed is 100.0.
        assert_eq!(snap.p99, 100.0);
    }
}
