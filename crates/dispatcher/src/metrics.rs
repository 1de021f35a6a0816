//! Pool metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single worker pool
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Units accepted into the queue
    submitted_count: AtomicU64,
    /// Units that ran to completion
    completed_count: AtomicU64,
    /// Units that panicked while running
    panicked_count: AtomicU64,
    /// Submissions refused after close
    rejected_count: AtomicU64,
    /// Queued units dropped by a forced shutdown
    discarded_count: AtomicU64,
}

impl PoolMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn submitted_count(&self) -> u64 {
        self.submitted_count.load(Ordering::Relaxed)
    }

    pub fn inc_submitted_count(&self) {
        self.submitted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    pub fn inc_completed_count(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panicked_count(&self) -> u64 {
        self.panicked_count.load(Ordering::Relaxed)
    }

    pub fn inc_panicked_count(&self) {
        self.panicked_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded_count(&self) -> u64 {
        self.discarded_count.load(Ordering::Relaxed)
    }

    pub fn add_discarded_count(&self, count: u64) {
        self.discarded_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            queue_len: self.queue_len(),
            submitted_count: self.submitted_count(),
            completed_count: self.completed_count(),
            panicked_count: self.panicked_count(),
            rejected_count: self.rejected_count(),
            discarded_count: self.discarded_count(),
        }
    }
}

/// Snapshot of pool metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetricsSnapshot {
    pub queue_len: usize,
    pub submitted_count: u64,
    pub completed_count: u64,
    pub panicked_count: u64,
    pub rejected_count: u64,
    pub discarded_count: u64,
}

impl PoolMetricsSnapshot {
    /// Units that were accepted but have not finished (queued or running)
    pub fn outstanding(&self) -> u64 {
        self.submitted_count
            .saturating_sub(self.completed_count + self.panicked_count + self.discarded_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_outstanding() {
        let metrics = PoolMetrics::new();
        for _ in 0..5 {
            metrics.inc_submitted_count();
        }
        metrics.inc_completed_count();
        metrics.inc_panicked_count();
        metrics.add_discarded_count(2);
        metrics.inc_rejected_count();
        metrics.set_queue_len(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted_count, 5);
        assert_eq!(snapshot.rejected_count, 1);
        assert_eq!(snapshot.queue_len, 3);
        assert_eq!(snapshot.outstanding(), 1);
    }
}
