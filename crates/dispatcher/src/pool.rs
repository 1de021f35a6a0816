//! WorkerPool - one category's isolated queue and worker threads

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_channel::{Receiver, Sender, TrySendError};
use contracts::Category;
use observability::UnitOutcome;
use tokio::sync::watch;
use tracing::{debug, debug_span, error};

use crate::error::DispatcherError;
use crate::metrics::PoolMetrics;

/// A unit of work: runs once on a worker thread and returns nothing
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size set of worker threads draining one FIFO queue
///
/// Lifecycle: running -> shutting down (closed to new work, queue still
/// drains) -> terminated (no live workers).
pub struct WorkerPool {
    category: Category,
    size: usize,
    tx: Sender<Job>,
    /// Kept so a forced shutdown can drop work nobody has picked up yet
    rx: Receiver<Job>,
    cancelled: Arc<AtomicBool>,
    live_workers: Arc<watch::Sender<usize>>,
    metrics: Arc<PoolMetrics>,
}

impl WorkerPool {
    /// Start `size` detached worker threads named `<category>-receiver-<n>`
    pub fn spawn(category: Category, size: usize) -> Result<Self, DispatcherError> {
        let (tx, rx) = async_channel::unbounded();
        let (live_workers, _) = watch::channel(0usize);

        let pool = Self {
            category,
            size,
            tx,
            rx,
            cancelled: Arc::new(AtomicBool::new(false)),
            live_workers: Arc::new(live_workers),
            metrics: Arc::new(PoolMetrics::new()),
        };

        for index in 0..size {
            pool.spawn_worker(index)?;
        }

        debug!(category = %category, workers = size, "Worker pool started");
        Ok(pool)
    }

    fn spawn_worker(&self, index: usize) -> Result<(), DispatcherError> {
        let worker = Worker {
            category: self.category,
            rx: self.rx.clone(),
            cancelled: Arc::clone(&self.cancelled),
            metrics: Arc::clone(&self.metrics),
            _live: LiveGuard::register(Arc::clone(&self.live_workers)),
        };

        // The JoinHandle is dropped on purpose: workers never hold the process open.
        thread::Builder::new()
            .name(format!("{}-receiver-{index}", self.category.label()))
            .spawn(move || worker.run())
            .map(drop)
            .map_err(|e| DispatcherError::worker_spawn(self.category, e))
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Configured number of workers
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn metrics(&self) -> &Arc<PoolMetrics> {
        &self.metrics
    }

    /// Workers still running
    pub fn live_workers(&self) -> usize {
        *self.live_workers.borrow()
    }

    /// Closed to new work (graceful or forced)
    pub fn is_shutdown(&self) -> bool {
        self.tx.is_closed()
    }

    /// Closed and every worker has exited
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown() && self.live_workers() == 0
    }

    /// Whether a forced shutdown was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Enqueue a unit of work without waiting for it to run
    pub fn submit(&self, job: Job) -> Result<(), DispatcherError> {
        match self.tx.try_send(job) {
            Ok(()) => {
                let depth = self.tx.len();
                self.metrics.inc_submitted_count();
                self.metrics.set_queue_len(depth);
                observability::record_unit_submitted(self.category);
                observability::record_queue_depth(self.category, depth);
                Ok(())
            }
            // Unbounded, so Full cannot happen; both mean "no longer accepting".
            Err(TrySendError::Closed(_)) | Err(TrySendError::Full(_)) => Err(self.reject()),
        }
    }

    /// Count a refused submission and build the matching error
    pub(crate) fn reject(&self) -> DispatcherError {
        self.metrics.inc_rejected_count();
        observability::record_unit_rejected(self.category);
        DispatcherError::service_closed(self.category)
    }

    /// Stop accepting new work; queued work keeps draining.
    ///
    /// Returns `false` if the pool was already closed.
    pub fn close(&self) -> bool {
        let newly_closed = self.tx.close();
        if newly_closed {
            debug!(category = %self.category, queued = self.tx.len(), "Worker pool closed");
        }
        newly_closed
    }

    /// Wait up to `timeout` for every worker to exit.
    ///
    /// Returns whether the pool terminated in time.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let mut live = self.live_workers.subscribe();
        let drained = async { live.wait_for(|workers| *workers == 0).await.map(drop) };

        match tokio::time::timeout(timeout, drained).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!(
                    category = %self.category,
                    error = %e,
                    "Interrupted while waiting for worker pool termination"
                );
                false
            }
            Err(_) => false,
        }
    }

    /// Close the pool, cancel pending work and drop everything still queued.
    ///
    /// Running units are not interrupted. Returns how many queued units were
    /// dropped.
    pub fn shutdown_now(&self) -> usize {
        self.cancelled.store(true, Ordering::Release);
        self.tx.close();

        let mut discarded = 0usize;
        while let Ok(job) = self.rx.try_recv() {
            drop(job);
            discarded += 1;
        }

        self.metrics.add_discarded_count(discarded as u64);
        self.metrics.set_queue_len(0);
        observability::record_units_discarded(self.category, discarded);
        discarded
    }
}

/// Keeps the pool's live-worker count in step with worker threads,
/// including threads that fail to start or unwind.
struct LiveGuard(Arc<watch::Sender<usize>>);

impl LiveGuard {
    fn register(counter: Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|workers| *workers += 1);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|workers| *workers = workers.saturating_sub(1));
    }
}

struct Worker {
    category: Category,
    rx: Receiver<Job>,
    cancelled: Arc<AtomicBool>,
    metrics: Arc<PoolMetrics>,
    _live: LiveGuard,
}

impl Worker {
    fn run(self) {
        debug!(category = %self.category, "Worker started");

        while let Ok(job) = self.rx.recv_blocking() {
            self.metrics.set_queue_len(self.rx.len());

            if self.cancelled.load(Ordering::Acquire) {
                self.metrics.add_discarded_count(1);
                observability::record_units_discarded(self.category, 1);
                continue;
            }

            self.execute(job);
        }

        debug!(category = %self.category, "Worker stopped");
    }

    fn execute(&self, job: Job) {
        let _span = debug_span!("unit_of_work", category = %self.category).entered();
        let started = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                self.metrics.inc_completed_count();
                UnitOutcome::Completed
            }
            Err(payload) => {
                self.metrics.inc_panicked_count();
                error!(
                    category = %self.category,
                    panic = %panic_message(payload.as_ref()),
                    "Unit of work panicked"
                );
                // Continue processing - don't let one unit take the worker down
                UnitOutcome::Panicked
            }
        };

        observability::record_unit_executed(
            self.category,
            outcome,
            started.elapsed().as_secs_f64() * 1000.0,
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::mpsc;

    fn counting_job(counter: &Arc<AtomicU64>) -> Job {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_pool_runs_submitted_work() {
        let pool = WorkerPool::spawn(Category::Signal, 1).unwrap();
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..5 {
            pool.submit(counting_job(&counter)).unwrap();
        }

        pool.close();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(pool.metrics().completed_count(), 5);
        assert!(pool.is_terminated());
    }

    #[tokio::test]
    async fn test_single_worker_preserves_order() {
        let pool = WorkerPool::spawn(Category::MethodReturn, 1).unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..20 {
            let tx = tx.clone();
            pool.submit(Box::new(move || {
                tx.send(i).unwrap();
            }))
            .unwrap();
        }

        pool.close();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        drop(tx);
        let seen: Vec<i32> = rx.iter().collect();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panic_does_not_kill_worker() {
        let pool = WorkerPool::spawn(Category::Error, 1).unwrap();
        let counter = Arc::new(AtomicU64::new(0));

        pool.submit(Box::new(|| panic!("handler exploded"))).unwrap();
        pool.submit(counting_job(&counter)).unwrap();

        pool.close();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.metrics().panicked_count(), 1);
        assert_eq!(pool.metrics().completed_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_after_close_is_rejected() {
        let pool = WorkerPool::spawn(Category::Signal, 1).unwrap();
        assert!(pool.close());
        assert!(!pool.close());

        let err = pool.submit(Box::new(|| {})).unwrap_err();
        assert!(err.is_closed());
        assert_eq!(pool.metrics().rejected_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_now_discards_queue() {
        let pool = WorkerPool::spawn(Category::Signal, 1).unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let counter = Arc::new(AtomicU64::new(0));

        pool.submit(Box::new(move || {
            started_tx.send(()).unwrap();
            let _ = gate_rx.recv();
        }))
        .unwrap();
        for _ in 0..3 {
            pool.submit(counting_job(&counter)).unwrap();
        }

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(pool.shutdown_now(), 3);
        assert!(pool.is_cancelled());
        drop(gate_tx);

        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(pool.metrics().discarded_count(), 3);
    }

    #[tokio::test]
    async fn test_await_termination_times_out_while_busy() {
        let pool = WorkerPool::spawn(Category::MethodCall, 2).unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        pool.submit(Box::new(move || {
            let _ = gate_rx.recv();
        }))
        .unwrap();

        pool.close();
        assert!(!pool.await_termination(Duration::from_millis(50)).await);
        assert!(pool.is_shutdown());
        assert!(!pool.is_terminated());

        drop(gate_tx);
        assert!(pool.await_termination(Duration::from_secs(5)).await);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = WorkerPool::spawn(Category::MethodCall, 1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }))
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("method-call-receiver-0"));
        assert_eq!(pool.size(), 1);
    }
}
