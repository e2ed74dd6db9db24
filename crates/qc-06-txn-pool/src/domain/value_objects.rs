//! Value objects for the transaction pool.
//!
//! Outcomes, query replies and status snapshots handed across the pool boundary.

use super::entities::{Hash, Transaction, ValidationState, Verdict, ValidatorId};
use super::errors::TxPoolError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Final decision for one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Promoted into the verified pool.
    Accepted(Hash),
    /// Dropped. `error` says why.
    Rejected { hash: Hash, error: TxPoolError },
}

impl TxOutcome {
    pub fn hash(&self) -> Hash {
        match self {
            TxOutcome::Accepted(hash) => *hash,
            TxOutcome::Rejected { hash, .. } => *hash,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TxOutcome::Accepted(_))
    }

    pub fn error(&self) -> Option<&TxPoolError> {
        match self {
            TxOutcome::Accepted(_) => None,
            TxOutcome::Rejected { error, .. } => Some(error),
        }
    }
}

/// Which pool a query reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Pending,
    Verified,
}

/// Reply to a pool query: a count or an admission-ordered listing.
#[derive(Clone, Debug)]
pub enum QueryReply {
    Count(usize),
    Listing(Vec<Arc<Transaction>>),
}

impl QueryReply {
    /// Number of transactions the reply describes.
    pub fn len(&self) -> usize {
        match self {
            QueryReply::Count(n) => *n,
            QueryReply::Listing(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hashes of a listing, empty for a count.
    pub fn hashes(&self) -> Vec<Hash> {
        match self {
            QueryReply::Count(_) => Vec::new(),
            QueryReply::Listing(txs) => txs.iter().map(|tx| tx.hash()).collect(),
        }
    }
}

/// Where a known transaction currently is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Still being validated.
    Pending {
        state: ValidationState,
        expected: usize,
        responded: usize,
        verdicts: Vec<(ValidatorId, Verdict)>,
    },
    /// Passed every validator.
    Verified,
}

/// Pool status snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStatus {
    pub pending_count: usize,
    pub verified_count: usize,
    /// Records holding a worker slot.
    pub in_flight: usize,
    /// Records waiting for a worker slot.
    pub queued: usize,
    pub validators: usize,
}

/// Pool contents captured at one instant.
#[derive(Clone, Debug, Default)]
pub struct PoolSnapshot {
    pub pending: Vec<Arc<Transaction>>,
    pub verified: Vec<Arc<Transaction>>,
}

impl PoolSnapshot {
    pub fn len(&self) -> usize {
        self.pending.len() + self.verified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Running counters for the pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    pub received: AtomicU64,
    pub accepted: AtomicU64,
    pub rejected: AtomicU64,
    pub expired: AtomicU64,
    pub duplicates: AtomicU64,
    pub pool_full: AtomicU64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            pool_full: self.pool_full.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of `PoolStats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    pub received: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub expired: u64,
    pub duplicates: u64,
    pub pool_full: u64,
}
