//! Dispatch configuration - worker counts per category

use crate::{Category, ContractError};

/// Default worker counts, indexed by [`Category::index`].
const DEFAULT_THREAD_COUNTS: [usize; Category::COUNT] = [1, 1, 4, 1];

/// Immutable worker-count configuration for the dispatcher.
///
/// Every count is at least 1. Pools with exactly one worker run their work
/// in arrival order; more workers trade that ordering for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    thread_counts: [usize; Category::COUNT],
}

impl DispatchConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder::new()
    }

    /// Worker count for the given category
    #[inline]
    pub fn thread_count(&self, category: Category) -> usize {
        self.thread_counts[category.index()]
    }

    pub fn signal_thread_count(&self) -> usize {
        self.thread_count(Category::Signal)
    }

    pub fn error_thread_count(&self) -> usize {
        self.thread_count(Category::Error)
    }

    pub fn method_call_thread_count(&self) -> usize {
        self.thread_count(Category::MethodCall)
    }

    pub fn method_return_thread_count(&self) -> usize {
        self.thread_count(Category::MethodReturn)
    }

    /// Total number of worker threads across all pools
    pub fn total_threads(&self) -> usize {
        self.thread_counts.iter().sum()
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            thread_counts: DEFAULT_THREAD_COUNTS,
        }
    }
}

/// Fluent builder for [`DispatchConfig`]
///
/// Setters accept any value; [`DispatchConfigBuilder::build`] rejects counts
/// below 1.
#[derive(Debug, Clone)]
pub struct DispatchConfigBuilder {
    thread_counts: [usize; Category::COUNT],
}

impl DispatchConfigBuilder {
    /// Create a builder preloaded with the default counts
    pub fn new() -> Self {
        Self {
            thread_counts: DEFAULT_THREAD_COUNTS,
        }
    }

    /// Set the worker count for any category
    pub fn with_thread_count(mut self, category: Category, threads: usize) -> Self {
        self.thread_counts[category.index()] = threads;
        self
    }

    /// Signal pool size. Values above 1 may deliver signals out of order.
    pub fn with_signal_thread_count(self, threads: usize) -> Self {
        self.with_thread_count(Category::Signal, threads)
    }

    /// Error pool size.
    pub fn with_error_thread_count(self, threads: usize) -> Self {
        self.with_thread_count(Category::Error, threads)
    }

    /// Method-call pool size. Must be above 1 for handlers that issue nested
    /// calls and wait for their replies.
    pub fn with_method_call_thread_count(self, threads: usize) -> Self {
        self.with_thread_count(Category::MethodCall, threads)
    }

    /// Method-return pool size.
    pub fn with_method_return_thread_count(self, threads: usize) -> Self {
        self.with_thread_count(Category::MethodReturn, threads)
    }

    /// Current (unvalidated) count for a category
    pub fn thread_count(&self, category: Category) -> usize {
        self.thread_counts[category.index()]
    }

    /// Validate and produce the configuration
    ///
    /// # Errors
    /// `ConfigValidation` naming the first category whose count is 0.
    pub fn build(&self) -> Result<DispatchConfig, ContractError> {
        for category in Category::ALL {
            let threads = self.thread_count(category);
            if threads == 0 {
                return Err(ContractError::config_validation(
                    format!("threads.{}", category.label().replace('-', "_")),
                    format!("thread count must be >= 1, got {threads}"),
                ));
            }
        }
        Ok(DispatchConfig {
            thread_counts: self.thread_counts,
        })
    }
}

impl Default for DispatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
