//! # Transaction Pool - Pending and Verified Sets
//!
//! ## Data Structures
//!
//! - `pending`: admitted transactions still under validation
//! - `verified`: transactions every validator passed, eligible for block assembly
//!
//! ## Invariants Enforced
//!
//! - A hash is in at most one of {absent, pending, verified} (checked in `admit()`)
//! - Lifecycle is one-directional: pending → verified, never back
//! - Rejected or expired transactions leave entirely (`discard()`)
//! - Capacity covers pending + verified together

use super::entities::{Hash, Timestamp, Transaction};
use super::errors::TxPoolError;
use super::value_objects::{PoolKind, PoolSnapshot};
use std::collections::HashMap;
use std::sync::Arc;

/// A pooled transaction with admission metadata.
#[derive(Clone, Debug)]
pub struct PoolEntry {
    pub tx: Arc<Transaction>,
    /// Admission order, used for listings.
    pub seq: u64,
    pub admitted_at: Timestamp,
    pub verified_at: Option<Timestamp>,
}

/// Disjoint pending/verified maps keyed by transaction hash.
#[derive(Debug)]
pub struct TransactionPool {
    capacity: usize,
    pending: HashMap<Hash, PoolEntry>,
    verified: HashMap<Hash, PoolEntry>,
    next_seq: u64,
}

impl TransactionPool {
    /// Creates an empty pool holding at most `capacity` transactions.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: HashMap::new(),
            verified: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pending + verified entries.
    pub fn len(&self) -> usize {
        self.pending.len() + self.verified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Pending => self.pending.len(),
            PoolKind::Verified => self.verified.len(),
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.pending.contains_key(hash) || self.verified.contains_key(hash)
    }

    /// Which set holds `hash`, if any.
    pub fn location(&self, hash: &Hash) -> Option<PoolKind> {
        if self.pending.contains_key(hash) {
            Some(PoolKind::Pending)
        } else if self.verified.contains_key(hash) {
            Some(PoolKind::Verified)
        } else {
            None
        }
    }

    pub fn get(&self, hash: &Hash) -> Option<&PoolEntry> {
        self.pending.get(hash).or_else(|| self.verified.get(hash))
    }

    /// Admits a transaction into the pending set.
    ///
    /// # Errors
    /// - `DuplicateTransaction` if the hash is pending or verified
    /// - `PoolFull` if pending + verified is at capacity
    pub fn admit(&mut self, tx: Arc<Transaction>, now: Timestamp) -> Result<(), TxPoolError> {
        let hash = tx.hash();
        if self.contains(&hash) {
            return Err(TxPoolError::DuplicateTransaction(hash));
        }
        if self.len() >= self.capacity {
            return Err(TxPoolError::PoolFull {
                capacity: self.capacity,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(
            hash,
            PoolEntry {
                tx,
                seq,
                admitted_at: now,
                verified_at: None,
            },
        );
        Ok(())
    }

    /// Moves a pending transaction to the verified set.
    ///
    /// Returns false if the hash is not pending.
    pub fn promote(&mut self, hash: &Hash, now: Timestamp) -> bool {
        match self.pending.remove(hash) {
            Some(mut entry) => {
                entry.verified_at = Some(now);
                self.verified.insert(*hash, entry);
                true
            }
            None => false,
        }
    }

    /// Drops a pending transaction. Verified entries are never demoted or discarded here.
    pub fn discard(&mut self, hash: &Hash) -> Option<Arc<Transaction>> {
        self.pending.remove(hash).map(|entry| entry.tx)
    }

    /// Removes verified transactions consumed by block assembly.
    ///
    /// Returns the hashes that were actually removed.
    pub fn remove_committed(&mut self, hashes: &[Hash]) -> Vec<Hash> {
        hashes
            .iter()
            .filter(|hash| self.verified.remove(*hash).is_some())
            .copied()
            .collect()
    }

    /// Transactions of one set in admission order.
    pub fn listing(&self, kind: PoolKind) -> Vec<Arc<Transaction>> {
        let map = match kind {
            PoolKind::Pending => &self.pending,
            PoolKind::Verified => &self.verified,
        };
        let mut entries: Vec<&PoolEntry> = map.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.tx.clone()).collect()
    }

    /// Both sets at this instant.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            pending: self.listing(PoolKind::Pending),
            verified: self.listing(PoolKind::Verified),
        }
    }

    /// Empties the pool, returning what it held.
    pub fn clear(&mut self) -> PoolSnapshot {
        let snapshot = self.snapshot();
        self.pending.clear();
        self.verified.clear();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{MutableTransaction, Payload};

    fn create_tx(nonce: u32) -> Arc<Transaction> {
        let mut tx = MutableTransaction::new(Payload::InvokeCode { code: vec![] });
        tx.nonce = nonce;
        Arc::new(tx.into_immutable().unwrap())
    }

    // =========================================================================
    // ADMISSION TESTS
    // =========================================================================

    #[test]
    fn test_admit_goes_to_pending() {
        let mut pool = TransactionPool::new(10);
        let tx = create_tx(1);

        pool.admit(tx.clone(), 1000).unwrap();

        assert_eq!(pool.location(&tx.hash()), Some(PoolKind::Pending));
        assert_eq!(pool.count(PoolKind::Pending), 1);
        assert_eq!(pool.count(PoolKind::Verified), 0);
    }

    #[test]
    fn test_admit_rejects_duplicate_pending() {
        let mut pool = TransactionPool::new(10);
        let tx = create_tx(1);
        pool.admit(tx.clone(), 1000).unwrap();

        let result = pool.admit(tx.clone(), 1001);
        assert_eq!(result, Err(TxPoolError::DuplicateTransaction(tx.hash())));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_admit_rejects_duplicate_verified() {
        let mut pool = TransactionPool::new(10);
        let tx = create_tx(1);
        pool.admit(tx.clone(), 1000).unwrap();
        assert!(pool.promote(&tx.hash(), 1100));

        let result = pool.admit(tx.clone(), 1200);
        assert!(matches!(result, Err(TxPoolError::DuplicateTransaction(_))));
    }

    #[test]
    fn test_capacity_counts_both_sets() {
        let mut pool = TransactionPool::new(2);
        let a = create_tx(1);
        let b = create_tx(2);
        pool.admit(a.clone(), 1000).unwrap();
        pool.promote(&a.hash(), 1000);
        pool.admit(b, 1000).unwrap();

        let result = pool.admit(create_tx(3), 1000);
        assert_eq!(result, Err(TxPoolError::PoolFull { capacity: 2 }));
    }

    #[test]
    fn test_capacity_freed_by_discard() {
        let mut pool = TransactionPool::new(1);
        let a = create_tx(1);
        pool.admit(a.clone(), 1000).unwrap();
        assert!(pool.admit(create_tx(2), 1000).is_err());

        pool.discard(&a.hash());
        assert!(pool.admit(create_tx(2), 1000).is_ok());
    }

    // =========================================================================
    // LIFECYCLE TESTS
    // =========================================================================

    #[test]
    fn test_promote_moves_pending_to_verified() {
        let mut pool = TransactionPool::new(10);
        let tx = create_tx(1);
        pool.admit(tx.clone(), 1000).unwrap();

        assert!(pool.promote(&tx.hash(), 2000));

        assert_eq!(pool.location(&tx.hash()), Some(PoolKind::Verified));
        assert_eq!(pool.get(&tx.hash()).unwrap().verified_at, Some(2000));
    }

    #[test]
    fn test_promote_unknown_is_noop() {
        let mut pool = TransactionPool::new(10);
        assert!(!pool.promote(&[9; 32], 1000));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_discard_never_touches_verified() {
        let mut pool = TransactionPool::new(10);
        let tx = create_tx(1);
        pool.admit(tx.clone(), 1000).unwrap();
        pool.promote(&tx.hash(), 1000);

        assert!(pool.discard(&tx.hash()).is_none());
        assert_eq!(pool.location(&tx.hash()), Some(PoolKind::Verified));
    }

    #[test]
    fn test_remove_committed_only_removes_verified() {
        let mut pool = TransactionPool::new(10);
        let verified = create_tx(1);
        let pending = create_tx(2);
        pool.admit(verified.clone(), 1000).unwrap();
        pool.admit(pending.clone(), 1000).unwrap();
        pool.promote(&verified.hash(), 1000);

        let removed = pool.remove_committed(&[verified.hash(), pending.hash()]);

        assert_eq!(removed, vec![verified.hash()]);
        assert!(!pool.contains(&verified.hash()));
        assert!(pool.contains(&pending.hash()));
    }

    // =========================================================================
    // QUERY TESTS
    // =========================================================================

    #[test]
    fn test_listing_in_admission_order() {
        let mut pool = TransactionPool::new(10);
        let txs: Vec<_> = (1..=5).map(create_tx).collect();
        for tx in &txs {
            pool.admit(tx.clone(), 1000).unwrap();
        }

        let listed: Vec<Hash> = pool
            .listing(PoolKind::Pending)
            .iter()
            .map(|t| t.hash())
            .collect();
        let expected: Vec<Hash> = txs.iter().map(|t| t.hash()).collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_clear_returns_contents() {
        let mut pool = TransactionPool::new(10);
        let a = create_tx(1);
        pool.admit(a.clone(), 1000).unwrap();
        pool.promote(&a.hash(), 1000);
        pool.admit(create_tx(2), 1000).unwrap();

        let snapshot = pool.clear();

        assert_eq!(snapshot.verified.len(), 1);
        assert_eq!(snapshot.pending.len(), 1);
        assert!(pool.is_empty());
    }
}
