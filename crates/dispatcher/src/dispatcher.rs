//! Dispatcher - routes units of work to per-category worker pools

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use contracts::{Category, DispatchConfig, ShutdownBudget};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::PoolMetricsSnapshot;
use crate::pool::{Job, WorkerPool};

/// Category-partitioned dispatch engine
///
/// Owns one isolated [`WorkerPool`] per [`Category`], so slow work in one
/// category never blocks another. Pools with a single worker run their work
/// in arrival order; larger pools give up that ordering for throughput. The
/// method-call pool defaults to four workers so a handler can submit a nested
/// method call and block on its result without starving the pool.
///
/// Shutdown is two-phase: [`Dispatcher::shutdown`] drains with a timeout and
/// marks the dispatcher closed, [`Dispatcher::shutdown_now`] drops whatever
/// is still queued.
pub struct Dispatcher {
    /// Indexed by `Category::index()`
    pools: [WorkerPool; Category::COUNT],
    closed: AtomicBool,
    /// Serializes graceful and forced shutdown
    lifecycle: Mutex<()>,
}

impl Dispatcher {
    /// Start all worker pools. `None` uses [`DispatchConfig::default`].
    ///
    /// # Errors
    /// `WorkerSpawn` if the OS refuses to start a worker thread.
    #[instrument(name = "dispatcher_new", skip(config))]
    pub fn new(config: Option<DispatchConfig>) -> Result<Self, DispatcherError> {
        let config = config.unwrap_or_default();

        let pools = [
            WorkerPool::spawn(Category::Signal, config.signal_thread_count())?,
            WorkerPool::spawn(Category::Error, config.error_thread_count())?,
            WorkerPool::spawn(Category::MethodCall, config.method_call_thread_count())?,
            WorkerPool::spawn(Category::MethodReturn, config.method_return_thread_count())?,
        ];

        info!(
            signal = config.signal_thread_count(),
            error = config.error_thread_count(),
            method_call = config.method_call_thread_count(),
            method_return = config.method_return_thread_count(),
            "Dispatcher started"
        );

        Ok(Self {
            pools,
            closed: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        })
    }

    fn pool(&self, category: Category) -> &WorkerPool {
        &self.pools[category.index()]
    }

    /// Run a signal handler
    pub fn exec_signal_handler<F>(&self, handler: F) -> Result<(), DispatcherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Category::Signal, handler)
    }

    /// Run an error handler
    pub fn exec_error_handler<F>(&self, handler: F) -> Result<(), DispatcherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Category::Error, handler)
    }

    /// Run a method-call handler
    pub fn exec_method_call_handler<F>(&self, handler: F) -> Result<(), DispatcherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Category::MethodCall, handler)
    }

    /// Run a method-return handler
    pub fn exec_method_return_handler<F>(&self, handler: F) -> Result<(), DispatcherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Category::MethodReturn, handler)
    }

    /// Run a handler in the given category's pool
    pub fn dispatch<F>(&self, category: Category, handler: F) -> Result<(), DispatcherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Some(category), Some(Box::new(handler)))
    }

    /// Shared submission routine.
    ///
    /// A missing category or job is ignored and returns `Ok(())`, even after
    /// close. Otherwise the job is queued and this returns immediately; a
    /// closed dispatcher, or a pool that is shutting down or terminated,
    /// yields [`DispatcherError::ServiceClosed`].
    pub fn execute(
        &self,
        category: Option<Category>,
        job: Option<Job>,
    ) -> Result<(), DispatcherError> {
        let (Some(category), Some(job)) = (category, job) else {
            return Ok(());
        };

        let pool = self.pool(category);
        if self.is_closed() || pool.is_shutdown() || pool.is_terminated() {
            return Err(pool.reject());
        }

        pool.submit(job)
    }

    /// Graceful shutdown with the timeout applied to each pool in turn.
    ///
    /// Total wait is bounded by `4 * timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        self.shutdown_with_budget(timeout, ShutdownBudget::PerPool)
            .await;
    }

    /// Graceful shutdown.
    ///
    /// Closes every pool to new work, waits for each pool (in category
    /// order) to drain within the budget, then marks the dispatcher closed
    /// whether or not every pool made it. Safe to call repeatedly and
    /// concurrently with [`Dispatcher::shutdown_now`].
    #[instrument(
        name = "dispatcher_shutdown",
        skip(self),
        fields(timeout_ms = timeout.as_millis() as u64)
    )]
    pub async fn shutdown_with_budget(&self, timeout: Duration, budget: ShutdownBudget) {
        let _guard = self.lifecycle.lock().await;
        let started = Instant::now();

        for pool in &self.pools {
            debug!(category = %pool.category(), "Shutting down worker pool");
            pool.close();
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut terminated = 0usize;
        for pool in &self.pools {
            let wait = match budget {
                ShutdownBudget::PerPool => timeout,
                ShutdownBudget::Shared => {
                    deadline.saturating_duration_since(tokio::time::Instant::now())
                }
            };

            if pool.await_termination(wait).await {
                terminated += 1;
            } else {
                warn!(
                    category = %pool.category(),
                    live_workers = pool.live_workers(),
                    wait_ms = wait.as_millis() as u64,
                    "Worker pool did not terminate in time"
                );
            }
        }

        self.closed.store(true, Ordering::Release);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_shutdown(elapsed_ms, terminated);
        info!(
            terminated,
            pools = self.pools.len(),
            elapsed_ms,
            "Dispatcher closed"
        );
    }

    /// Forced shutdown.
    ///
    /// Every pool that has not terminated is cancelled and loses its queued
    /// work; running units finish on their own. Does not mark the dispatcher
    /// closed, but the pools refuse new work from here on.
    #[instrument(name = "dispatcher_shutdown_now", skip(self))]
    pub async fn shutdown_now(&self) {
        let _guard = self.lifecycle.lock().await;

        for pool in &self.pools {
            if !pool.is_terminated() {
                let discarded = pool.shutdown_now();
                debug!(
                    category = %pool.category(),
                    discarded,
                    "Forcefully stopped worker pool"
                );
            }
        }
    }

    /// Set once graceful shutdown has completed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Every pool is closed and has no live workers
    pub fn is_terminated(&self) -> bool {
        self.pools.iter().all(WorkerPool::is_terminated)
    }

    /// Configured worker count for a category
    pub fn thread_count(&self, category: Category) -> usize {
        self.pool(category).size()
    }

    /// Metrics snapshot for one category
    pub fn metrics(&self, category: Category) -> PoolMetricsSnapshot {
        self.pool(category).metrics().snapshot()
    }

    /// Metrics snapshots for all categories, in category order
    pub fn metrics_all(&self) -> Vec<(Category, PoolMetricsSnapshot)> {
        self.pools
            .iter()
            .map(|pool| (pool.category(), pool.metrics().snapshot()))
            .collect()
    }
}
