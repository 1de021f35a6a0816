//! Workload runner - drives synthetic units of work through the dispatcher.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use contracts::{Category, DispatcherSettings, ShutdownBudget};
use dispatcher::Dispatcher;
use observability::LatencyAggregator;
use tracing::{info, warn};

use super::RunStats;
use crate::error::{CliError, Result};

/// Workload configuration
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub settings: DispatcherSettings,

    /// Units submitted to every category
    pub units_per_category: u64,

    /// Simulated work per unit
    pub work: Duration,

    /// Every Nth unit panics (None = never)
    pub panic_every: Option<u64>,

    pub shutdown_timeout: Duration,

    pub budget: ShutdownBudget,

    /// Force shutdown after the graceful phase
    pub force: bool,
}

/// Synthetic workload
pub struct Workload {
    config: WorkloadConfig,
}

impl Workload {
    pub fn new(config: WorkloadConfig) -> Self {
        Self { config }
    }

    /// Submit the workload, then shut the dispatcher down.
    ///
    /// If `interrupt` resolves during graceful shutdown, the remaining queued
    /// work is discarded with a forced shutdown.
    pub async fn run<S>(self, interrupt: S) -> Result<RunStats>
    where
        S: Future<Output = ()>,
    {
        let config = self.config;
        let dispatch_config = config.settings.dispatch_config()?;
        let dispatcher = Dispatcher::new(Some(dispatch_config))?;
        let latencies = Arc::new(Mutex::new(LatencyAggregator::new()));

        let started = Instant::now();
        let mut rejected = 0u64;
        let mut sequence = 0u64;

        for _ in 0..config.units_per_category {
            for category in Category::ALL {
                sequence += 1;
                let should_panic = config
                    .panic_every
                    .is_some_and(|every| every > 0 && sequence % every == 0);
                let job = unit_of_work(category, config.work, should_panic, &latencies);

                match dispatcher.dispatch(category, job) {
                    Ok(()) => {}
                    Err(e) if e.is_closed() => rejected += 1,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        info!(
            submitted = sequence - rejected,
            rejected, "Workload submitted, shutting down"
        );

        let shutdown_started = Instant::now();
        let mut interrupted = false;
        tokio::select! {
            _ = dispatcher.shutdown_with_budget(config.shutdown_timeout, config.budget) => {}
            _ = interrupt => {
                warn!("Interrupted during shutdown, discarding queued work");
                interrupted = true;
            }
        }

        if interrupted || config.force {
            dispatcher.shutdown_now().await;
        }
        let shutdown_duration = shutdown_started.elapsed();

        let latencies = Arc::try_unwrap(latencies)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .unwrap_or_else(|shared| {
                // Workers still running after a forced stop hold a reference
                let snapshot = shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                snapshot
            });

        if sequence > 0 && rejected == sequence {
            return Err(CliError::workload("every submission was rejected"));
        }

        Ok(RunStats {
            duration: started.elapsed(),
            shutdown_duration,
            rejected,
            pools: dispatcher.metrics_all(),
            latencies,
            closed: dispatcher.is_closed(),
            terminated: dispatcher.is_terminated(),
            interrupted,
        })
    }
}

fn unit_of_work(
    category: Category,
    work: Duration,
    should_panic: bool,
    latencies: &Arc<Mutex<LatencyAggregator>>,
) -> impl FnOnce() + Send + 'static {
    let latencies = Arc::clone(latencies);
    let enqueued = Instant::now();

    move || {
        if !work.is_zero() {
            std::thread::sleep(work);
        }
        if should_panic {
            panic!("synthetic {category} failure");
        }
        latencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(category, enqueued.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(units: u64) -> WorkloadConfig {
        WorkloadConfig {
            settings: DispatcherSettings::default(),
            units_per_category: units,
            work: Duration::ZERO,
            panic_every: None,
            shutdown_timeout: Duration::from_secs(5),
            budget: ShutdownBudget::PerPool,
            force: false,
        }
    }

    #[tokio::test]
    async fn test_workload_completes_everything() {
        let stats = Workload::new(config(10))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.completed(), 40);
        assert_eq!(stats.rejected, 0);
        assert!(stats.closed);
        assert!(stats.terminated);
        assert!(!stats.interrupted);
        assert_eq!(stats.latencies.total_samples(), 40);
    }

    #[tokio::test]
    async fn test_workload_counts_panics() {
        let mut cfg = config(5);
        cfg.panic_every = Some(4);

        let stats = Workload::new(cfg).run(std::future::pending()).await.unwrap();

        assert_eq!(stats.panicked(), 5);
        assert_eq!(stats.completed(), 15);
    }

    #[tokio::test]
    async fn test_interrupt_forces_shutdown() {
        let mut cfg = config(50);
        cfg.work = Duration::from_millis(20);

        let stats = Workload::new(cfg).run(async {}).await.unwrap();

        assert!(stats.interrupted);
        assert!(!stats.closed);
        assert!(stats.discarded() > 0);
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_before_running() {
        let mut cfg = config(1);
        cfg.settings.threads.signal = 0;

        let result = Workload::new(cfg).run(std::future::pending()).await;
        assert!(matches!(result, Err(CliError::Contract(_))));
    }
}
