//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors raised while building or encoding a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The unsigned body could not be encoded for hashing.
    #[error("Transaction encoding failed: {0}")]
    Encoding(String),
}
