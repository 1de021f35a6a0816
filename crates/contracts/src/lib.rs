//! # Contracts
//!
//! Shared interface contracts: the dispatch categories, the configuration
//! values the dispatcher is built from, and the settings-file schema.
//! Every other crate in the workspace depends on this one, never the reverse.
//!
//! ## Configuration model
//! - [`DispatchConfig`] is produced by [`DispatchConfigBuilder`] (or defaulted)
//! - [`ConnectionConfigBuilder`] nests the thread builder together with
//!   transport options the dispatcher does not consume

mod category;
mod connection_config;
mod dispatch_config;
mod error;
mod settings;

pub use category::Category;
pub use connection_config::*;
pub use dispatch_config::{DispatchConfig, DispatchConfigBuilder};
pub use error::*;
pub use settings::*;
