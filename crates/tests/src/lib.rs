//! # Integration Tests
//!
//! End-to-end behaviour of the dispatcher across crates:
//! - settings files feeding a running dispatcher
//! - category isolation and nested method calls
//! - graceful and forced shutdown

#[cfg(test)]
mod contract_tests {
    use contracts::{Category, ConfigVersion, DispatchConfig};

    #[test]
    fn test_default_layout() {
        let _ = ConfigVersion::V1;
        let config = DispatchConfig::default();
        let counts: Vec<usize> = Category::ALL
            .into_iter()
            .map(|c| config.thread_count(c))
            .collect();
        assert_eq!(counts, vec![1, 1, 4, 1]);
    }

    #[test]
    fn test_message_type_routing() {
        assert_eq!(Category::from_message_type(1), Some(Category::MethodCall));
        assert_eq!(Category::from_message_type(2), Some(Category::MethodReturn));
        assert_eq!(Category::from_message_type(3), Some(Category::Error));
        assert_eq!(Category::from_message_type(4), Some(Category::Signal));
        assert_eq!(Category::from_message_type(0), None);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{Category, DispatchConfig, ShutdownBudget};
    use dispatcher::Dispatcher;

    const WAIT: Duration = Duration::from_secs(5);

    /// Occupy a worker until the returned sender is dropped.
    ///
    /// Blocks until the job has actually started running.
    fn occupy(dispatcher: &Dispatcher, category: Category) -> mpsc::Sender<()> {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel();
        dispatcher
            .dispatch(category, move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
            })
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();
        release_tx
    }

    #[tokio::test]
    async fn test_every_category_runs_before_close() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let (tx, rx) = mpsc::channel();

        for category in Category::ALL {
            let tx = tx.clone();
            dispatcher
                .dispatch(category, move || tx.send(category).unwrap())
                .unwrap();
        }

        let mut seen: Vec<Category> = (0..Category::COUNT)
            .map(|_| rx.recv_timeout(WAIT).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, Category::ALL.to_vec());

        dispatcher.shutdown(WAIT).await;
        assert!(dispatcher.is_closed());
        assert!(dispatcher.is_terminated());
    }

    #[tokio::test]
    async fn test_blocked_category_does_not_stall_others() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let release = occupy(&dispatcher, Category::Error);

        // Queued behind the blocked error handler
        let (error_tx, error_rx) = mpsc::channel();
        dispatcher
            .exec_error_handler(move || error_tx.send(()).unwrap())
            .unwrap();

        let (call_tx, call_rx) = mpsc::channel();
        dispatcher
            .exec_method_call_handler(move || call_tx.send(()).unwrap())
            .unwrap();

        call_rx.recv_timeout(WAIT).unwrap();
        assert!(error_rx.try_recv().is_err());

        drop(release);
        error_rx.recv_timeout(WAIT).unwrap();
        dispatcher.shutdown(WAIT).await;
    }

    fn nested_method_call(dispatcher: &Arc<Dispatcher>, patience: Duration) -> bool {
        let (result_tx, result_rx) = mpsc::channel();
        let inner = Arc::clone(dispatcher);

        dispatcher
            .exec_method_call_handler(move || {
                let (reply_tx, reply_rx) = mpsc::channel();
                inner
                    .exec_method_call_handler(move || {
                        let _ = reply_tx.send(());
                    })
                    .unwrap();
                let answered = reply_rx.recv_timeout(patience).is_ok();
                result_tx.send(answered).unwrap();
            })
            .unwrap();

        result_rx.recv_timeout(WAIT).unwrap()
    }

    #[tokio::test]
    async fn test_nested_method_call_with_default_pool() {
        let dispatcher = Arc::new(Dispatcher::new(None).unwrap());
        assert!(nested_method_call(&dispatcher, WAIT));
        dispatcher.shutdown(WAIT).await;
    }

    #[tokio::test]
    async fn test_nested_method_call_starves_single_worker() {
        let config = DispatchConfig::builder()
            .with_method_call_thread_count(1)
            .build()
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(Some(config)).unwrap());

        assert!(!nested_method_call(&dispatcher, Duration::from_millis(200)));
        dispatcher.shutdown(WAIT).await;
    }

    #[tokio::test]
    async fn test_single_worker_keeps_order() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..50 {
            let tx = tx.clone();
            dispatcher
                .exec_signal_handler(move || tx.send(i).unwrap())
                .unwrap();
        }

        let order: Vec<i32> = (0..50).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
        dispatcher.shutdown(WAIT).await;
    }

    #[tokio::test]
    async fn test_panicking_unit_does_not_kill_worker() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let (tx, rx) = mpsc::channel();

        dispatcher
            .exec_method_return_handler(|| panic!("handler blew up"))
            .unwrap();
        dispatcher
            .exec_method_return_handler(move || tx.send(()).unwrap())
            .unwrap();

        rx.recv_timeout(WAIT).unwrap();
        dispatcher.shutdown(WAIT).await;

        let metrics = dispatcher.metrics(Category::MethodReturn);
        assert_eq!(metrics.panicked_count, 1);
        assert_eq!(metrics.completed_count, 1);
    }

    #[tokio::test]
    async fn test_absent_job_or_category_is_ignored() {
        let dispatcher = Dispatcher::new(None).unwrap();
        assert!(dispatcher.execute(None, Some(Box::new(|| {}))).is_ok());
        assert!(dispatcher.execute(Some(Category::Signal), None).is_ok());

        dispatcher.shutdown(WAIT).await;
        assert!(dispatcher.execute(None, None).is_ok());
        assert!(dispatcher.execute(Some(Category::Error), None).is_ok());
    }

    #[tokio::test]
    async fn test_forced_shutdown_discards_queued_work() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let release = occupy(&dispatcher, Category::Signal);

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            dispatcher
                .exec_signal_handler(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        dispatcher.shutdown_now().await;
        drop(release);

        assert!(!dispatcher.is_closed());
        let err = dispatcher.exec_signal_handler(|| {}).unwrap_err();
        assert!(err.is_closed());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.metrics(Category::Signal).discarded_count, 5);
    }

    #[tokio::test]
    async fn test_per_pool_budget_waits_for_each_pool() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let releases: Vec<_> = Category::ALL
            .into_iter()
            .map(|c| occupy(&dispatcher, c))
            .collect();

        let timeout = Duration::from_millis(100);
        let started = Instant::now();
        dispatcher.shutdown(timeout).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= timeout * Category::COUNT as u32, "{elapsed:?}");
        assert!(dispatcher.is_closed());
        assert!(!dispatcher.is_terminated());

        for category in Category::ALL {
            assert!(dispatcher.dispatch(category, || {}).unwrap_err().is_closed());
        }
        drop(releases);
    }

    #[tokio::test]
    async fn test_shared_budget_bounds_total_wait() {
        let dispatcher = Dispatcher::new(None).unwrap();
        let releases: Vec<_> = Category::ALL
            .into_iter()
            .map(|c| occupy(&dispatcher, c))
            .collect();

        let timeout = Duration::from_millis(100);
        let started = Instant::now();
        dispatcher
            .shutdown_with_budget(timeout, ShutdownBudget::Shared)
            .await;
        let elapsed = started.elapsed();

        assert!(elapsed >= timeout, "{elapsed:?}");
        assert!(elapsed < timeout * 3, "{elapsed:?}");
        assert!(dispatcher.is_closed());
        drop(releases);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_drains_queue() {
        let config = DispatchConfig::builder()
            .with_signal_thread_count(1)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(Some(config)).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let ran = Arc::clone(&ran);
            dispatcher
                .exec_signal_handler(move || {
                    std::thread::sleep(Duration::from_millis(1));
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        dispatcher.shutdown(WAIT).await;
        assert_eq!(ran.load(Ordering::SeqCst), 20);
        assert!(dispatcher.is_terminated());
    }

    #[tokio::test]
    async fn test_concurrent_shutdowns() {
        let dispatcher = Dispatcher::new(None).unwrap();
        for category in Category::ALL {
            dispatcher
                .dispatch(category, || std::thread::sleep(Duration::from_millis(10)))
                .unwrap();
        }

        tokio::join!(
            dispatcher.shutdown(Duration::from_secs(1)),
            dispatcher.shutdown_now(),
            dispatcher.shutdown(Duration::from_secs(1)),
        );

        assert!(dispatcher.is_closed());
        for category in Category::ALL {
            assert!(dispatcher.dispatch(category, || {}).is_err());
        }
    }

    #[tokio::test]
    async fn test_settings_file_to_dispatcher() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[threads]
method_call = 2
error = 3

[shutdown]
timeout_ms = 250
budget = "shared"
"#
        )
        .unwrap();

        let settings = config_loader::ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(settings.shutdown.budget, ShutdownBudget::Shared);

        let dispatcher = Dispatcher::new(Some(settings.dispatch_config().unwrap())).unwrap();
        assert_eq!(dispatcher.thread_count(Category::Signal), 1);
        assert_eq!(dispatcher.thread_count(Category::Error), 3);
        assert_eq!(dispatcher.thread_count(Category::MethodCall), 2);
        assert_eq!(dispatcher.thread_count(Category::MethodReturn), 1);

        dispatcher
            .shutdown_with_budget(settings.shutdown.timeout(), settings.shutdown.budget)
            .await;
        assert!(dispatcher.is_terminated());
    }

    #[test]
    fn test_zero_threads_rejected_from_settings() {
        let err = config_loader::ConfigLoader::load_from_str(
            "[threads]\nsignal = 0\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("threads.signal"));
    }
}

#[cfg(test)]
mod latency_tests {
    use contracts::Category;
    use observability::LatencyAggregator;

    #[test]
    fn test_latency_summary_per_category() {
        let mut latencies = LatencyAggregator::new();
        for ms in [1.0, 2.0, 3.0] {
            latencies.push(Category::MethodCall, ms);
        }
        latencies.push(Category::Signal, 10.0);

        let summary = latencies.summary(Category::MethodCall).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 2.0).abs() < 1e-10);
        assert_eq!(latencies.total_samples(), 4);
    }
}
