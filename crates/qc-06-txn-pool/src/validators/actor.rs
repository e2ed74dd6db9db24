//! Validator actors.
//!
//! Each validator runs as its own task reading `ValidateRequest`s in order
//! and answering through the request's `reply_to` mailbox.

use super::ValidatorKind;
use crate::domain::{Capability, TxPoolError, ValidatorId, VerdictMessage};
use crate::ipc::{ValidateRequest, ValidatorLink, VerifyRspHandle, VerifyRspMessage};
use shared_types::short_hex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A running validator.
#[derive(Debug)]
pub struct ValidatorActor {
    id: ValidatorId,
    capability: Capability,
    link: ValidatorLink,
    task: JoinHandle<()>,
}

/// Starts a validator task whose verdicts go to `response`.
///
/// The validator is not registered yet; call `register()`.
pub fn spawn_validator(id: ValidatorId, kind: ValidatorKind, response: VerifyRspHandle) -> ValidatorActor {
    let (inbox, rx) = mpsc::unbounded_channel();
    let capability = kind.capability();
    let task = tokio::spawn(run(id.clone(), kind, rx));

    ValidatorActor {
        id,
        capability,
        link: ValidatorLink { inbox, response },
        task,
    }
}

impl ValidatorActor {
    pub fn id(&self) -> &ValidatorId {
        &self.id
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn link(&self) -> &ValidatorLink {
        &self.link
    }

    /// Registers through the response endpoint and waits for the ack.
    pub async fn register(&self) -> Result<(), TxPoolError> {
        let (ack, rx) = oneshot::channel();
        self.link
            .response
            .send(VerifyRspMessage::Register {
                id: self.id.clone(),
                capability: self.capability,
                link: self.link.clone(),
                ack,
            })
            .await?;
        rx.await
            .map_err(|_| TxPoolError::MailboxClosed(self.link.response.role().as_str()))?
    }

    /// Unregisters through the response endpoint and waits for the ack.
    pub async fn unregister(&self, cancel_outstanding: bool) -> Result<(), TxPoolError> {
        let (ack, rx) = oneshot::channel();
        self.link
            .response
            .send(VerifyRspMessage::Unregister {
                id: self.id.clone(),
                cancel_outstanding,
                ack,
            })
            .await?;
        rx.await
            .map_err(|_| TxPoolError::MailboxClosed(self.link.response.role().as_str()))?
    }

    /// Stops the task. Queued requests are dropped.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn run(id: ValidatorId, kind: ValidatorKind, mut rx: mpsc::UnboundedReceiver<ValidateRequest>) {
    debug!(validator = %id, capability = ?kind.capability(), "Validator started");

    while let Some(req) = rx.recv().await {
        let tx_hash = req.tx.hash();
        let verdict = match kind.validate(req.tx.clone(), req.shard).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(validator = %id, error = %e, "Validation task failed");
                continue;
            }
        };

        debug!(
            validator = %id,
            tx_hash = %short_hex(&tx_hash),
            pass = verdict.is_pass(),
            "Verdict ready"
        );

        let msg = VerifyRspMessage::Verdict(VerdictMessage {
            tx_hash,
            validator: id.clone(),
            attempt: req.attempt,
            verdict,
        });
        if req.reply_to.send(msg).await.is_err() {
            debug!(validator = %id, "Response endpoint closed, dropping verdict");
        }
    }

    debug!(validator = %id, "Validator stopped");
}
