//! Pipeline metrics
//!
//! Lightweight atomic counters shared by the dispatch loops, rule loops and
//! window managers. A snapshot is cheap and lock-free.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Raw records received from sources
    pub records_received: AtomicU64,

    /// Raw bytes received from sources
    pub bytes_received: AtomicU64,

    /// Records that matched an event type and were dispatched
    pub events_dispatched: AtomicU64,

    /// Records dropped because no event type matched
    pub decode_misses: AtomicU64,

    /// Rule invocations that emitted a record
    pub rule_outputs: AtomicU64,

    /// Rule invocations that emitted nothing
    pub rule_suppressions: AtomicU64,

    /// Window callbacks fired
    pub window_firings: AtomicU64,

    /// Window callbacks that returned an error
    pub window_errors: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            decode_misses: AtomicU64::new(0),
            rule_outputs: AtomicU64::new(0),
            rule_suppressions: AtomicU64::new(0),
            window_firings: AtomicU64::new(0),
            window_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self, bytes: u64) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_miss(&self) {
        self.decode_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rule_output(&self, emitted: bool) {
        if emitted {
            self.rule_outputs.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rule_suppressions.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_window_firing(&self) {
        self.window_firings.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_window_error(&self) {
        self.window_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            decode_misses: self.decode_misses.load(Ordering::Relaxed),
            rule_outputs: self.rule_outputs.load(Ordering::Relaxed),
            rule_suppressions: self.rule_suppressions.load(Ordering::Relaxed),
            window_firings: self.window_firings.load(Ordering::Relaxed),
            window_errors: self.window_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_received: u64,
    pub bytes_received: u64,
    pub events_dispatched: u64,
    pub decode_misses: u64,
    pub rule_outputs: u64,
    pub rule_suppressions: u64,
    pub window_firings: u64,
    pub window_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = PipelineMetrics::new();
        metrics.record_received(10);
        metrics.record_received(5);
        metrics.record_dispatched();
        metrics.record_decode_miss();
        metrics.record_rule_output(true);
        metrics.record_rule_output(false);
        metrics.record_window_firing();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_received, 2);
        assert_eq!(snapshot.bytes_received, 15);
        assert_eq!(snapshot.events_dispatched, 1);
        assert_eq!(snapshot.decode_misses, 1);
        assert_eq!(snapshot.rule_outputs, 1);
        assert_eq!(snapshot.rule_suppressions, 1);
        assert_eq!(snapshot.window_firings, 1);
        assert_eq!(snapshot.window_errors, 0);
    }
}
