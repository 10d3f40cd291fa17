//! In-memory latency histogram for update pipeline instrumentation.
//! Records time from socket receive to aggregates recomputed in the consumer.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Percentile snapshot served by /stats/latency. Values in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

/// Shared latency stats. Consumer records, API reads.
/// Values stored in microseconds, 1us to 60s, 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

impl LatencyStats {
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 60_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    /// Record one socket-receive → stats-recomputed duration.
    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    /// Snapshot the current percentiles. Fields are None until the first
    /// sample lands.
    pub fn summary(&self) -> LatencySummary {
        let Ok(h) = self.inner.lock() else {
            return LatencySummary { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None, max_ms: None };
        };
        if h.len() == 0 {
            return LatencySummary { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None, max_ms: None };
        }
        let ms = |us: u64| us as f64 / 1000.0;
        LatencySummary {
            samples: h.len(),
            p50_ms: Some(ms(h.value_at_quantile(0.5))),
            p95_ms: Some(ms(h.value_at_quantile(0.95))),
            p99_ms: Some(ms(h.value_at_quantile(0.99))),
            max_ms: Some(ms(h.max())),
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_has_no_percentiles() {
        let stats = LatencyStats::new();
        let summary = stats.summary();
        assert_eq!(summary.samples, 0);
        assert!(summary.p50_ms.is_none());
    }

    #[test]
    fn recorded_durations_show_up() {
        let stats = LatencyStats::new();
        stats.record(Duration::from_millis(2));
        stats.record(Duration::from_millis(4));

        let summary = stats.summary();
        assert_eq!(summary.samples, 2);
        assert!(summary.p50_ms.unwrap() >= 1.0);
        assert!(summary.max_ms.unwrap() >= summary.p50_ms.unwrap());
    }
}
