//! Dispatcher error types

use contracts::Category;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The dispatcher (or the targeted pool) no longer accepts work
    #[error("dispatcher closed: {category} pool no longer accepts work")]
    ServiceClosed { category: Category },

    /// The OS refused to start a worker thread
    #[error("failed to spawn {category} worker thread: {source}")]
    WorkerSpawn {
        category: Category,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (from contract)
    #[error("config error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a service-closed error
    pub fn service_closed(category: Category) -> Self {
        Self::ServiceClosed { category }
    }

    /// Create a worker-spawn error
    pub fn worker_spawn(category: Category, source: std::io::Error) -> Self {
        Self::WorkerSpawn { category, source }
    }

    /// Whether this error means the dispatcher is shut down
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ServiceClosed { .. })
    }
}
