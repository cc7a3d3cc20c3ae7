//! Thread-safe metrics aggregation (C2).
//!
//! `Stats` is the single sink every worker commits `AttackResult`s to. It is
//! modeled the same way the donor's `PercentileTracker` is: an
//! `hdrhistogram::Histogram` behind a single short-held mutex. Unlike the
//! donor's always-on `lazy_static` trackers, one `Stats` belongs to exactly
//! one `Engine` run, so concurrent test runs never share state.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;

use crate::result::AttackResult;

/// Lower/upper bounds (in microseconds) and significant-figure precision for
/// the latency distribution, per the data model: 1µs to 1 hour, 3 sig figs.
const HISTOGRAM_LOW: u64 = 1;
const HISTOGRAM_HIGH: u64 = 60 * 60 * 1_000_000; // 1 hour in microseconds
const HISTOGRAM_SIGFIGS: u8 = 3;

fn new_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(HISTOGRAM_LOW, HISTOGRAM_HIGH, HISTOGRAM_SIGFIGS)
        .expect("histogram bounds are valid constants")
}

struct StatsInner {
    total: u64,
    success: u64,
    error: u64,
    bytes_in: u64,
    bytes_out: u64,
    latencies: Histogram<u64>,
}

/// Thread-safe aggregate of every `AttackResult` committed during a run.
pub struct Stats {
    inner: Mutex<StatsInner>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatsInner {
                total: 0,
                success: 0,
                error: 0,
                bytes_in: 0,
                bytes_out: 0,
                latencies: new_histogram(),
            }),
        }
    }

    /// Commit one result. Atomic with respect to `Snapshot`: a concurrent
    /// snapshot either observes this Add in its entirety or not at all.
    pub fn add(&self, result: &AttackResult) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");

        inner.total += 1;
        if result.is_success() {
            inner.success += 1;
        } else {
            inner.error += 1;
        }
        inner.bytes_in += result.bytes_in;
        inner.bytes_out += result.bytes_out;

        let latency_us = result.latency.as_micros() as u64;
        if latency_us > 0 {
            let clamped = latency_us.clamp(HISTOGRAM_LOW, HISTOGRAM_HIGH);
            // Recording is infallible for values inside [low, high] given our
            // fixed bounds; clamp above guarantees that range.
            let _ = inner.latencies.record(clamped);
        }
    }

    /// Produce an independent copy of the counters and a merged copy of the
    /// latency distribution, without stalling writers beyond the lock
    /// acquisition itself.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().expect("stats mutex poisoned");

        let mut latencies = new_histogram();
        latencies
            .add(&inner.latencies)
            .expect("snapshot histogram shares bounds with the source");

        StatsSnapshot {
            total: inner.total,
            success: inner.success,
            error: inner.error,
            bytes_in: inner.bytes_in,
            bytes_out: inner.bytes_out,
            latencies,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// An independent copy of `Stats` taken at one instant.
#[derive(Clone)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub error: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    latencies: Histogram<u64>,
}

impl StatsSnapshot {
    pub fn empty() -> Self {
        Self {
            total: 0,
            success: 0,
            error: 0,
            bytes_in: 0,
            bytes_out: 0,
            latencies: new_histogram(),
        }
    }

    /// Success percentage, `0.0` when no requests were recorded.
    pub fn success_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    pub fn quantile(&self, p: f64) -> Duration {
        Duration::from_micros(self.latencies.value_at_quantile(p))
    }

    pub fn mean(&self) -> Duration {
        Duration::from_micros(self.latencies.mean() as u64)
    }

    pub fn max(&self) -> Duration {
        Duration::from_micros(self.latencies.max())
    }

    pub fn latency_count(&self) -> u64 {
        self.latencies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn result(code: u16, latency_ms: u64, error: Option<&str>) -> AttackResult {
        AttackResult {
            start: SystemTime::now(),
            latency: Duration::from_millis(latency_ms),
            code,
            bytes_in: 100,
            bytes_out: 10,
            error: error.map(str::to_owned),
        }
    }

    #[test]
    fn add_updates_success_and_error_counters() {
        let stats = Stats::new();
        stats.add(&result(200, 10, None));
        stats.add(&result(500, 20, None));
        stats.add(&result(0, 5, Some("timeout")));

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.success, 1);
        assert_eq!(snap.error, 2);
        assert_eq!(snap.success + snap.error, snap.total);
    }

    #[test]
    fn byte_counters_accumulate() {
        let stats = Stats::new();
        stats.add(&result(200, 1, None));
        stats.add(&result(200, 1, None));

        let snap = stats.snapshot();
        assert_eq!(snap.bytes_in, 200);
        assert_eq!(snap.bytes_out, 20);
    }

    #[test]
    fn latency_distribution_reflects_positive_samples_only() {
        let stats = Stats::new();
        stats.add(&result(200, 10, None));
        stats.add(&result(200, 0, None)); // zero latency must not be recorded

        let snap = stats.snapshot();
        assert_eq!(snap.latency_count(), 1);
    }

    #[test]
    fn empty_stats_quantiles_are_zero() {
        let snap = Stats::new().snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.quantile(0.99), Duration::from_micros(0));
        assert_eq!(snap.success_percent(), 0.0);
    }

    #[test]
    fn snapshotting_twice_with_no_intervening_add_is_stable() {
        let stats = Stats::new();
        stats.add(&result(200, 10, None));

        let a = stats.snapshot();
        let b = stats.snapshot();

        assert_eq!(a.total, b.total);
        assert_eq!(a.quantile(0.5), b.quantile(0.5));
        assert_eq!(a.mean(), b.mean());
    }

    #[test]
    fn merging_two_empty_snapshots_equals_empty_stats() {
        let empty = StatsSnapshot::empty();
        let fresh = Stats::new().snapshot();
        assert_eq!(empty.total, fresh.total);
        assert_eq!(empty.success, fresh.success);
        assert_eq!(empty.error, fresh.error);
    }

    #[test]
    fn concurrent_add_preserves_snapshot_atomicity() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(Stats::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for i in 0..2_000u64 {
                    let code = if i % 3 == 0 { 500 } else { 200 };
                    stats.add(&result(code, 1, None));
                }
            }));
        }

        // A 9th thread snapshots in a tight loop while Adds are in flight.
        let reader = {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..500 {
                    let snap = stats.snapshot();
                    assert!(snap.success <= snap.total);
                    assert_eq!(snap.success + snap.error, snap.total);
                }
            })
        };

        for h in handles {
            h.join().unwrap();
        }
        reader.join().unwrap();

        let snap = stats.snapshot();
        assert_eq!(snap.total, 16_000);
        assert_eq!(snap.success + snap.error, snap.total);
        assert_eq!(snap.latency_count(), snap.total);
    }
}
