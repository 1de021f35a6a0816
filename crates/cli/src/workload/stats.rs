//! Workload statistics.

use std::time::Duration;

use contracts::Category;
use dispatcher::PoolMetricsSnapshot;
use observability::LatencyAggregator;

/// Statistics from a workload run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Wall time from first submission to the end of shutdown
    pub duration: Duration,

    /// Time spent inside shutdown
    pub shutdown_duration: Duration,

    /// Submissions refused by the dispatcher
    pub rejected: u64,

    /// Per-pool counters, in category order
    pub pools: Vec<(Category, PoolMetricsSnapshot)>,

    /// Enqueue-to-finish latency per category
    pub latencies: LatencyAggregator,

    /// Dispatcher reported closed at the end
    pub closed: bool,

    /// Every pool terminated at the end
    pub terminated: bool,

    /// Shutdown was interrupted by a signal and forced
    pub interrupted: bool,
}

impl RunStats {
    pub fn completed(&self) -> u64 {
        self.pools.iter().map(|(_, m)| m.completed_count).sum()
    }

    pub fn panicked(&self) -> u64 {
        self.pools.iter().map(|(_, m)| m.panicked_count).sum()
    }

    pub fn discarded(&self) -> u64 {
        self.pools.iter().map(|(_, m)| m.discarded_count).sum()
    }

    /// Units finished per second of wall time
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            (self.completed() + self.panicked()) as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Dispatch Run Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.3}s", self.duration.as_secs_f64());
        println!("  Shutdown: {:.3}s", self.shutdown_duration.as_secs_f64());
        println!("  Completed: {}", self.completed());
        println!("  Panicked: {}", self.panicked());
        println!("  Discarded: {}", self.discarded());
        println!("  Rejected: {}", self.rejected);
        println!("  Throughput: {:.2} units/s", self.throughput());
        println!("  Closed: {}  Terminated: {}", self.closed, self.terminated);
        if self.interrupted {
            println!("  Shutdown was interrupted and forced");
        }

        println!("\nPools");
        for (category, metrics) in &self.pools {
            println!(
                "  {:<14} submitted={} completed={} panicked={} discarded={} rejected={}",
                category.label(),
                metrics.submitted_count,
                metrics.completed_count,
                metrics.panicked_count,
                metrics.discarded_count,
                metrics.rejected_count
            );
        }

        println!("\n{}", self.latencies);
    }
}
