//! # Pool Container
//!
//! Node configuration and the container that owns the running pool, its
//! ledger, endpoints and validator actors.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::{LogSnapshotSink, TxPoolContainer};
