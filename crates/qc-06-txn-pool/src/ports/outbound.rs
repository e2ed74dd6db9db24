//! Outbound (Driven) ports for the transaction pool.
//!
//! These traits define dependencies on external systems that the pool
//! needs for operation.

use crate::domain::{Hash, LedgerError, PoolSnapshot, ShardId, Timestamp};
use shared_types::Address;

/// Account state as seen by the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountState {
    pub balance: u64,
    pub nonce: u32,
}

/// Ledger interface consumed by startup checks and stateful validation.
///
/// Implementations are shared across tasks and may block on I/O.
pub trait Ledger: Send + Sync {
    /// Current chain height of `shard`.
    ///
    /// # Errors
    /// `NotInitialized` until genesis has been applied for the shard.
    fn current_height(&self, shard: ShardId) -> Result<u64, LedgerError>;

    /// Looks up an account. `Ok(None)` if the address is unknown.
    fn account(&self, shard: ShardId, address: &Address) -> Result<Option<AccountState>, LedgerError>;

    /// True if `hash` is already committed on `shard`.
    fn contains_transaction(&self, shard: ShardId, hash: &Hash) -> Result<bool, LedgerError>;
}

/// Initial chain state for one shard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenesisState {
    pub shard: ShardId,
    pub timestamp: Timestamp,
    /// Opening balances.
    pub allocations: Vec<(Address, u64)>,
}

/// Supplies genesis state before the pool may accept traffic.
pub trait GenesisProvider: Send + Sync {
    fn genesis(&self, shard: ShardId) -> Result<GenesisState, LedgerError>;
}

/// Receives the pool contents when the server stops with `flush_on_stop`.
pub trait PoolSnapshotSink: Send + Sync {
    fn persist(&self, snapshot: &PoolSnapshot) -> Result<(), String>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
