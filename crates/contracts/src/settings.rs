//! DispatcherSettings - Config Loader output
//!
//! File representation of the dispatcher: worker counts, shutdown policy and
//! the connection options that share the same builder.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    Category, ConnectionConfigBuilder, ContractError, DispatchConfig, DispatchConfigBuilder,
    Endianness, DEFAULT_CONNECT_TIMEOUT,
};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatcherSettings {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Worker counts per category
    #[serde(default)]
    pub threads: ThreadSettings,

    /// Shutdown policy
    #[serde(default)]
    pub shutdown: ShutdownSettings,

    /// Connection options (not read by the dispatcher)
    #[serde(default)]
    pub connection: ConnectionSettings,
}

/// Worker counts per category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSettings {
    #[serde(default = "default_single")]
    pub signal: usize,

    #[serde(default = "default_single")]
    pub error: usize,

    #[serde(default = "default_method_call")]
    pub method_call: usize,

    #[serde(default = "default_single")]
    pub method_return: usize,
}

fn default_single() -> usize {
    1
}

fn default_method_call() -> usize {
    4
}

impl ThreadSettings {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Signal => self.signal,
            Category::Error => self.error,
            Category::MethodCall => self.method_call,
            Category::MethodReturn => self.method_return,
        }
    }
}

impl Default for ThreadSettings {
    fn default() -> Self {
        Self {
            signal: default_single(),
            error: default_single(),
            method_call: default_method_call(),
            method_return: default_single(),
        }
    }
}

/// How the graceful-shutdown timeout is spent across pools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownBudget {
    /// Each pool gets the full timeout; total wait is bounded by
    /// `pools * timeout`
    #[default]
    PerPool,
    /// All pools share one deadline
    Shared,
}

/// Shutdown policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownSettings {
    /// Graceful-shutdown timeout in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub budget: ShutdownBudget,
}

fn default_shutdown_timeout_ms() -> u64 {
    5_000
}

impl ShutdownSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_shutdown_timeout_ms(),
            budget: ShutdownBudget::default(),
        }
    }
}

/// Connection options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub endianness: Endianness,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub weak_references: bool,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endianness: Endianness::native(),
            connect_timeout_ms: default_connect_timeout_ms(),
            weak_references: false,
        }
    }
}

impl DispatcherSettings {
    /// Worker-count builder seeded from the file
    pub fn threads_builder(&self) -> DispatchConfigBuilder {
        Category::ALL
            .into_iter()
            .fold(DispatchConfigBuilder::new(), |builder, category| {
                builder.with_thread_count(category, self.threads.get(category))
            })
    }

    /// Validated dispatch configuration
    pub fn dispatch_config(&self) -> Result<DispatchConfig, ContractError> {
        self.threads_builder().build()
    }

    /// Connection builder seeded from the file
    pub fn connection_builder(&self) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
            .with_endianness(self.connection.endianness)
            .with_connect_timeout(Duration::from_millis(self.connection.connect_timeout_ms))
            .with_weak_references(self.connection.weak_references)
            .with_dispatch_threads(self.threads_builder())
    }
}
