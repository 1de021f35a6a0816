//! # Dispatcher
//!
//! Category-partitioned dispatch engine.
//!
//! Responsibilities:
//! - Own one isolated worker pool per [`Category`]
//! - Accept units of work without blocking the caller
//! - Keep slow or recursive work in one category from starving the others
//! - Two-phase shutdown: drain with timeout, then force

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pool;

pub use contracts::{Category, DispatchConfig, DispatchConfigBuilder, ShutdownBudget};
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use metrics::{PoolMetrics, PoolMetricsSnapshot};
pub use pool::{Job, WorkerPool};
