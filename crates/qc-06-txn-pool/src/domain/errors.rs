//! Transaction pool error types.
//!
//! Per-transaction failures travel inside `TxOutcome`; they never take the
//! pool server down. `LedgerUnavailable` is the only fatal kind and is
//! raised at startup.

use super::entities::{Hash, ValidatorId};
use shared_types::short_hex;
use thiserror::Error;

/// Transaction pool error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TxPoolError {
    /// Hash already present in the pending or verified pool.
    #[error("Duplicate transaction: {}", short_hex(.0))]
    DuplicateTransaction(Hash),

    /// Pending + verified entries reached the configured capacity.
    #[error("Pool full at {capacity} transactions")]
    PoolFull { capacity: usize },

    /// A validator returned a failing verdict.
    #[error("Validation failed by {validator}: {reason}")]
    ValidationFailed { validator: ValidatorId, reason: String },

    /// Not every expected verdict arrived before the deadline.
    #[error("Validation timed out after {timeout_ms}ms")]
    ValidationTimeout { timeout_ms: u64 },

    /// No validator was available to check the transaction.
    #[error("No validator available")]
    ValidatorUnavailable,

    /// Ledger state could not be read. Fatal at startup.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The pool is draining or stopped.
    #[error("Transaction pool stopped")]
    PoolStopped,

    /// An endpoint inbox is at capacity.
    #[error("Mailbox full: {0}")]
    MailboxFull(&'static str),

    /// An endpoint inbox no longer has a consumer.
    #[error("Mailbox closed: {0}")]
    MailboxClosed(&'static str),

    /// A handle was registered under a role it does not serve.
    #[error("Handle does not serve role {role}")]
    RoleMismatch { role: &'static str },

    /// Unregistration of an identity the registry does not hold.
    #[error("Unknown validator: {0}")]
    UnknownValidator(ValidatorId),

    /// Configuration rejected by `TxPoolConfig::validate`.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TxPoolError {
    /// True for errors that describe a validation verdict rather than admission.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::ValidationTimeout { .. } | Self::ValidatorUnavailable
        )
    }
}

/// Errors reported by ledger adapters.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No genesis state has been loaded for the shard.
    #[error("Ledger not initialized for {0}")]
    NotInitialized(shared_types::ShardId),

    /// Genesis was already applied for the shard.
    #[error("Ledger already initialized for {0}")]
    AlreadyInitialized(shared_types::ShardId),

    /// Backend failure.
    #[error("Ledger backend error: {0}")]
    Backend(String),
}

impl From<LedgerError> for TxPoolError {
    fn from(err: LedgerError) -> Self {
        TxPoolError::LedgerUnavailable(err.to_string())
    }
}
