//! # Inbound Port - TxPoolApi
//!
//! Primary driving port exposing the transaction pool to the endpoints.
//!
//! | Method | Caller |
//! |--------|--------|
//! | `submit` | Ingress endpoint, local API |
//! | `query`, `tx_status`, `status` | Consensus query endpoint |
//! | `on_verdict`, `register_validator`, `unregister_validator` | Validator response endpoint |
//! | `remove_committed` | Block assembly |
//! | `stop` | Node runtime |

use crate::domain::{
    Capability, Hash, PoolKind, PoolStatus, QueryReply, Sender, Transaction, TxPoolError,
    TxStatus, ValidatorId, VerdictEffect, VerdictMessage,
};
use crate::ipc::{OutcomeNotice, SubmitTicket, ValidatorLink};
use async_trait::async_trait;
use std::sync::Arc;

/// Primary API for the transaction pool.
///
/// Every method except `stop` returns without waiting on validation.
#[async_trait]
pub trait TxPoolApi: Send + Sync {
    /// Admits a transaction and starts its validation.
    ///
    /// # Errors
    /// - `PoolStopped`: the server is draining or stopped
    /// - `DuplicateTransaction`: hash already pending or verified
    /// - `PoolFull`: pending + verified at capacity
    fn submit(&self, tx: Arc<Transaction>, sender: Sender) -> Result<SubmitTicket, TxPoolError>;

    /// Routes a notice to the registered network role.
    ///
    /// `Nil` senders are never notified.
    fn notify_sender(&self, notice: OutcomeNotice);

    /// Count or listing of one pool, taken under a single read.
    fn query(&self, kind: PoolKind, by_count: bool) -> QueryReply;

    fn get_transaction(&self, hash: &Hash) -> Option<Arc<Transaction>>;

    fn tx_status(&self, hash: &Hash) -> Option<TxStatus>;

    fn status(&self) -> PoolStatus;

    /// Adds (or replaces) a validator. Later dispatches include it.
    fn register_validator(
        &self,
        id: ValidatorId,
        capability: Capability,
        link: ValidatorLink,
    ) -> Result<(), TxPoolError>;

    /// Removes a validator from future dispatches.
    ///
    /// # Errors
    /// `UnknownValidator` if `id` is not registered.
    fn unregister_validator(&self, id: &ValidatorId, cancel_outstanding: bool)
        -> Result<(), TxPoolError>;

    /// Feeds one verdict into aggregation.
    fn on_verdict(&self, msg: VerdictMessage) -> VerdictEffect;

    /// Drops verified transactions consumed by block assembly.
    fn remove_committed(&self, hashes: &[Hash]) -> Vec<Hash>;

    /// Drains and tears down. Idempotent.
    async fn stop(&self);
}
