//! Dispatcher metrics
//!
//! Thin wrappers over the `metrics` facade so every crate records the same
//! names and labels. Without an installed recorder these calls are no-ops.

use std::collections::BTreeMap;

use contracts::Category;
use metrics::{counter, gauge, histogram};

/// Outcome of running one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Completed,
    Panicked,
}

impl UnitOutcome {
    fn as_str(self) -> &'static str {
        match self {
            UnitOutcome::Completed => "completed",
            UnitOutcome::Panicked => "panicked",
        }
    }
}

/// Record a unit of work accepted into a pool queue
pub fn record_unit_submitted(category: Category) {
    counter!(
        "dispatch_units_submitted_total",
        "category" => category.label()
    )
    .increment(1);
}

/// Record a unit of work that finished running on a worker
pub fn record_unit_executed(category: Category, outcome: UnitOutcome, duration_ms: f64) {
    counter!(
        "dispatch_units_executed_total",
        "category" => category.label(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        "dispatch_unit_duration_ms",
        "category" => category.label()
    )
    .record(duration_ms);
}

/// Record a submission refused because the dispatcher was closed
pub fn record_unit_rejected(category: Category) {
    counter!(
        "dispatch_units_rejected_total",
        "category" => category.label()
    )
    .increment(1);
}

/// Record queued units dropped by a forced shutdown
pub fn record_units_discarded(category: Category, count: usize) {
    if count > 0 {
        counter!(
            "dispatch_units_discarded_total",
            "category" => category.label()
        )
        .increment(count as u64);
    }
}

/// Record the current queue depth of a pool
pub fn record_queue_depth(category: Category, depth: usize) {
    gauge!(
        "dispatch_pool_queue_depth",
        "category" => category.label()
    )
    .set(depth as f64);
}

/// Record one graceful shutdown
pub fn record_shutdown(duration_ms: f64, pools_terminated: usize) {
    histogram!("dispatch_shutdown_duration_ms").record(duration_ms);
    gauge!("dispatch_pools_terminated").set(pools_terminated as f64);
}

/// Per-category latency aggregator
///
/// Keeps running statistics in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct LatencyAggregator {
    per_category: BTreeMap<Category, RunningStats>,
}

impl LatencyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one latency sample in milliseconds
    pub fn push(&mut self, category: Category, latency_ms: f64) {
        self.per_category
            .entry(category)
            .or_default()
            .push(latency_ms);
    }

    /// Summary for one category, `None` when nothing was recorded
    pub fn summary(&self, category: Category) -> Option<StatsSummary> {
        self.per_category.get(&category).map(StatsSummary::from)
    }

    /// Total number of samples across categories
    pub fn total_samples(&self) -> u64 {
        self.per_category.values().map(RunningStats::count).sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for LatencyAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Latency (ms) ===")?;
        for category in Category::ALL {
            match self.summary(category) {
                Some(summary) => writeln!(f, "{category}: {summary}")?,
                None => writeln!(f, "{category}: N/A")?,
            }
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
