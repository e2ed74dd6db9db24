//! # IPC Message Payloads
//!
//! Messages carried by the three endpoint inboxes, the validator request
//! channel and the network notice channel.

use super::mailbox::VerifyRspHandle;
use crate::domain::{
    Capability, Hash, PoolStatus, QueryReply, Sender, ShardId, Transaction, TxOutcome,
    TxPoolError, TxStatus, ValidatorId, VerdictMessage,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Request to admit a transaction.
///
/// # Security
/// - Sender: network relay or local API
/// - Fire-and-forget; the outcome goes back to `sender` unless it is `Nil`
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub tx: Arc<Transaction>,
    pub sender: Sender,
}

/// Consensus-side pool queries. Read-only.
#[derive(Debug)]
pub enum PoolQuery {
    /// Verified pool: count or admission-ordered listing.
    PoolState {
        by_count: bool,
        reply: oneshot::Sender<QueryReply>,
    },
    /// Pending pool: count or admission-ordered listing.
    PendingState {
        by_count: bool,
        reply: oneshot::Sender<QueryReply>,
    },
    /// Where one transaction is.
    TxStatus {
        hash: Hash,
        reply: oneshot::Sender<Option<TxStatus>>,
    },
    /// Pool-wide counters.
    Status { reply: oneshot::Sender<PoolStatus> },
}

/// Traffic into the validator-response endpoint.
#[derive(Debug)]
pub enum VerifyRspMessage {
    /// A verdict. No reply.
    Verdict(VerdictMessage),
    /// Adds a validator to the registry.
    Register {
        id: ValidatorId,
        capability: Capability,
        link: ValidatorLink,
        ack: oneshot::Sender<Result<(), TxPoolError>>,
    },
    /// Removes a validator. With `cancel_outstanding` the pool stops
    /// waiting on it for transactions already dispatched.
    Unregister {
        id: ValidatorId,
        cancel_outstanding: bool,
        ack: oneshot::Sender<Result<(), TxPoolError>>,
    },
}

/// Work item sent to a validator.
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub tx: Arc<Transaction>,
    pub shard: ShardId,
    /// Dispatch attempt; echoed back in the verdict.
    pub attempt: u64,
    /// Where to deliver the verdict.
    pub reply_to: VerifyRspHandle,
}

/// How the pool reaches a registered validator.
#[derive(Debug, Clone)]
pub struct ValidatorLink {
    /// The validator's work queue.
    pub inbox: mpsc::UnboundedSender<ValidateRequest>,
    /// The response endpoint its verdicts go to.
    pub response: VerifyRspHandle,
}

/// Resolution notice routed to the network role for non-`Nil` senders.
#[derive(Debug, Clone)]
pub struct OutcomeNotice {
    pub sender: Sender,
    pub outcome: TxOutcome,
}

/// Per-submission result handle.
#[derive(Debug)]
pub struct SubmitTicket {
    hash: Hash,
    outcome: oneshot::Receiver<TxOutcome>,
}

impl SubmitTicket {
    pub(crate) fn new(hash: Hash, outcome: oneshot::Receiver<TxOutcome>) -> Self {
        Self { hash, outcome }
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Waits for the transaction to resolve.
    ///
    /// A server torn down without resolving reports `PoolStopped`.
    pub async fn wait(self) -> TxOutcome {
        let hash = self.hash;
        self.outcome.await.unwrap_or(TxOutcome::Rejected {
            hash,
            error: TxPoolError::PoolStopped,
        })
    }

    /// Non-blocking check. `None` while unresolved.
    pub fn try_outcome(&mut self) -> Option<TxOutcome> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(TxOutcome::Rejected {
                hash: self.hash,
                error: TxPoolError::PoolStopped,
            }),
        }
    }
}
