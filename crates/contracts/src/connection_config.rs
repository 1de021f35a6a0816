//! Connection-level options that travel alongside the dispatch configuration.
//!
//! None of these are read by the dispatcher itself; they are collected by the
//! same builder so a transport layer gets one value describing a connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::{ContractError, DispatchConfig, DispatchConfigBuilder};

/// Default connect timeout for TCP transports
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100_000);

/// Byte order used when marshalling messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Marker byte for big-endian messages
    pub const BIG_MARKER: u8 = b'B';
    /// Marker byte for little-endian messages
    pub const LITTLE_MARKER: u8 = b'l';

    /// Byte order of the running platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// Parse a marker byte; any other value is `None`
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            Self::BIG_MARKER => Some(Endianness::Big),
            Self::LITTLE_MARKER => Some(Endianness::Little),
            _ => None,
        }
    }

    pub const fn marker(self) -> u8 {
        match self {
            Endianness::Big => Self::BIG_MARKER,
            Endianness::Little => Self::LITTLE_MARKER,
        }
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Self::native()
    }
}

/// Notified when the owning connection goes away.
///
/// All methods default to no-ops so implementors pick what they need.
pub trait DisconnectCallback: Send + Sync {
    /// The transport failed and the connection was dropped
    fn on_error_disconnect(&self, _error: &io::Error) {}

    /// The remote side asked to disconnect
    fn on_requested_disconnect(&self, _connection_id: Option<u32>) {}

    /// The local side disconnected on purpose
    fn on_client_disconnect(&self) {}

    /// Closing the transport raised an error
    fn on_terminate_error(&self, _error: &io::Error) {}
}

/// Resolved connection configuration
#[derive(Clone)]
pub struct ConnectionConfig {
    pub endianness: Endianness,
    pub connect_timeout: Duration,
    pub weak_references: bool,
    pub disconnect_callback: Option<Arc<dyn DisconnectCallback>>,
    pub dispatch: DispatchConfig,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endianness", &self.endianness)
            .field("connect_timeout", &self.connect_timeout)
            .field("weak_references", &self.weak_references)
            .field("disconnect_callback", &self.disconnect_callback.is_some())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Fluent builder for [`ConnectionConfig`]
///
/// Worker counts are edited through [`ConnectionConfigBuilder::dispatch_threads`].
///
/// ```
/// use contracts::{Category, ConnectionConfigBuilder, Endianness};
///
/// let config = ConnectionConfigBuilder::new()
///     .with_endianness(Endianness::Big)
///     .dispatch_threads(|threads| threads.with_method_call_thread_count(8))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.dispatch.thread_count(Category::MethodCall), 8);
/// ```
#[derive(Clone)]
pub struct ConnectionConfigBuilder {
    endianness: Endianness,
    connect_timeout: Duration,
    weak_references: bool,
    disconnect_callback: Option<Arc<dyn DisconnectCallback>>,
    threads: DispatchConfigBuilder,
}

impl ConnectionConfigBuilder {
    pub fn new() -> Self {
        Self {
            endianness: Endianness::native(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            weak_references: false,
            disconnect_callback: None,
            threads: DispatchConfigBuilder::new(),
        }
    }

    /// Edit the nested worker-count builder
    pub fn dispatch_threads<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(DispatchConfigBuilder) -> DispatchConfigBuilder,
    {
        self.threads = configure(self.threads);
        self
    }

    /// Replace the nested worker-count builder wholesale
    pub fn with_dispatch_threads(mut self, threads: DispatchConfigBuilder) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Set the byte order from a raw marker byte.
    ///
    /// Unknown markers leave the current byte order untouched.
    pub fn with_endianness_marker(mut self, marker: u8) -> Self {
        if let Some(endianness) = Endianness::from_marker(marker) {
            self.endianness = endianness;
        }
        self
    }

    /// Connect timeout, only honoured by TCP transports
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_weak_references(mut self, enabled: bool) -> Self {
        self.weak_references = enabled;
        self
    }

    pub fn with_disconnect_callback(mut self, callback: Arc<dyn DisconnectCallback>) -> Self {
        self.disconnect_callback = Some(callback);
        self
    }

    /// Build only the dispatch part
    pub fn build_dispatch_config(&self) -> Result<DispatchConfig, ContractError> {
        self.threads.build()
    }

    /// # Errors
    /// Propagates worker-count validation failures.
    pub fn build(self) -> Result<ConnectionConfig, ContractError> {
        let dispatch = self.threads.build()?;
        Ok(ConnectionConfig {
            endianness: self.endianness,
            connect_timeout: self.connect_timeout,
            weak_references: self.weak_references,
            disconnect_callback: self.disconnect_callback,
            dispatch,
        })
    }
}

impl Default for ConnectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
