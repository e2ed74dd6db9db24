//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `container/` - node configuration and the pool container
//! - `genesis/` - opening ledger state for the served shard

pub mod container;
pub mod genesis;

pub use container::{ConfigError, NodeConfig, TxPoolContainer};
pub use genesis::{GenesisBuilder, GenesisConfig, GenesisError};
