//! # Genesis Module
//!
//! Opening ledger state for the served shard.
//!
//! ## Initialization Sequence
//!
//! 1. Validate allocations (no duplicates, supply fits in `u64`)
//! 2. Build the genesis state and its digest
//! 3. Load it into the ledger before the pool server starts

pub mod builder;

pub use builder::{GenesisBlock, GenesisBuilder, GenesisConfig, GenesisError};
