//! Per-operation call metrics.
//!
//! Every facade operation submits exactly one observation, carrying the
//! operation name, its wall-clock duration, and whether it succeeded.
//! [`MetricsSink`] is the submission point; [`CallMetrics`] is the
//! in-process implementation backing the default facade.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use dashmap::DashMap;

/// Receives one observation per completed facade operation.
pub trait MetricsSink: Send + Sync {
    fn observe(&self, op: &'static str, elapsed: Duration, success: bool);
}

/// In-process metrics: call counters plus per-operation latency stats.
pub struct CallMetrics {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,

    op_latencies: DashMap<&'static str, LatencyStats>,
}

impl CallMetrics {
    pub fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            successful_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            op_latencies: DashMap::new(),
        }
    }

    /// Get a snapshot of the call counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
        }
    }

    /// Get latency stats for a specific operation.
    pub fn op_latency(&self, op: &str) -> Option<LatencySnapshot> {
        self.op_latencies.get(op).map(|stats| stats.snapshot())
    }

    /// Get latency stats for every operation observed so far.
    pub fn all_op_latencies(&self) -> Vec<(&'static str, LatencySnapshot)> {
        self.op_latencies
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect()
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.successful_calls.store(0, Ordering::Relaxed);
        self.failed_calls.store(0, Ordering::Relaxed);
        self.op_latencies.clear();
    }
}

impl MetricsSink for CallMetrics {
    fn observe(&self, op: &'static str, elapsed: Duration, success: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }

        self.op_latencies
            .entry(op)
            .or_insert_with(LatencyStats::new)
            .record(elapsed.as_millis() as u64);
    }
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-operation latency statistics.
struct LatencyStats {
    count: AtomicU64,
    total_ms: AtomicU64,
    min_ms: AtomicU64,
    max_ms: AtomicU64,
}

impl LatencyStats {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_ms: AtomicU64::new(0),
            min_ms: AtomicU64::new(u64::MAX),
            max_ms: AtomicU64::new(0),
        }
    }

    fn record(&self, ms: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
        self.min_ms.fetch_min(ms, Ordering::Relaxed);
        self.max_ms.fetch_max(ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LatencySnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total = self.total_ms.load(Ordering::Relaxed);
        let min = self.min_ms.load(Ordering::Relaxed);
        let max = self.max_ms.load(Ordering::Relaxed);

        LatencySnapshot {
            count,
            avg_ms: if count > 0 { total / count } else { 0 },
            min_ms: if min == u64::MAX { 0 } else { min },
            max_ms: max,
        }
    }
}

/// Snapshot of the call counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
}

impl MetricsSnapshot {
    /// Success rate as a percentage of completed calls.
    pub fn success_rate(&self) -> f64 {
        let completed = self.successful_calls + self.failed_calls;
        if completed == 0 {
            100.0
        } else {
            (self.successful_calls as f64 / completed as f64) * 100.0
        }
    }
}

/// Snapshot of latency statistics for one operation.
#[derive(Debug, Clone)]
pub struct LatencySnapshot {
    pub count: u64,
    pub avg_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}
