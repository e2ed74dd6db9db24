//! Adapters layer for the transaction pool.
//!
//! Concrete implementations of the outbound ports.

pub mod ledger;

pub use ledger::*;
