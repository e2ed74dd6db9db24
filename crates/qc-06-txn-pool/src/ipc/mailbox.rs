//! # Mailboxes
//!
//! Bounded, ordered inboxes. Each endpoint owns the receiving half and
//! processes it one message at a time; everyone else holds a cloneable
//! `Mailbox` handle.

use super::payloads::{OutcomeNotice, PoolQuery, TxRequest, VerifyRspMessage};
use crate::domain::TxPoolError;
use std::fmt;
use tokio::sync::mpsc;

/// Named destination roles the pool server routes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorRole {
    /// Network and API transaction submissions.
    TxIngress,
    /// Consensus pool queries.
    ConsensusQuery,
    /// Validator verdicts and registrations.
    VerifyResponse,
    /// Outbound notices to submitting peers.
    Network,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::TxIngress => "tx-ingress",
            ActorRole::ConsensusQuery => "consensus-query",
            ActorRole::VerifyResponse => "verify-response",
            ActorRole::Network => "network",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sending half of an endpoint inbox.
pub struct Mailbox<M> {
    role: ActorRole,
    tx: mpsc::Sender<M>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            role: self.role,
            tx: self.tx.clone(),
        }
    }
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("role", &self.role)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<M> Mailbox<M> {
    /// Creates a bounded inbox for `role`.
    pub fn channel(role: ActorRole, capacity: usize) -> (Self, mpsc::Receiver<M>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { role, tx }, rx)
    }

    pub fn role(&self) -> ActorRole {
        self.role
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Enqueues without waiting.
    ///
    /// # Errors
    /// - `MailboxFull` if the inbox is at capacity
    /// - `MailboxClosed` if the endpoint has stopped
    pub fn tell(&self, msg: M) -> Result<(), TxPoolError> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TxPoolError::MailboxFull(self.role.as_str()),
            mpsc::error::TrySendError::Closed(_) => TxPoolError::MailboxClosed(self.role.as_str()),
        })
    }

    /// Enqueues, waiting for room.
    pub async fn send(&self, msg: M) -> Result<(), TxPoolError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| TxPoolError::MailboxClosed(self.role.as_str()))
    }
}

pub type IngressHandle = Mailbox<TxRequest>;
pub type QueryHandle = Mailbox<PoolQuery>;
pub type VerifyRspHandle = Mailbox<VerifyRspMessage>;
pub type NetworkHandle = Mailbox<OutcomeNotice>;

/// A handle bound to one role.
#[derive(Clone, Debug)]
pub enum ActorHandle {
    Ingress(IngressHandle),
    Query(QueryHandle),
    VerifyRsp(VerifyRspHandle),
    Network(NetworkHandle),
}

impl ActorHandle {
    /// The role this handle can serve.
    pub fn role(&self) -> ActorRole {
        match self {
            ActorHandle::Ingress(_) => ActorRole::TxIngress,
            ActorHandle::Query(_) => ActorRole::ConsensusQuery,
            ActorHandle::VerifyRsp(_) => ActorRole::VerifyResponse,
            ActorHandle::Network(_) => ActorRole::Network,
        }
    }
}
