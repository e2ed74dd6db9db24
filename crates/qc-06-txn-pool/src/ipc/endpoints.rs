//! # Message Endpoints
//!
//! Three independent inbox loops in front of the pool server:
//!
//! | Endpoint | Inbox | Calls |
//! |----------|-------|-------|
//! | Ingress | `TxRequest` | `submit` |
//! | Consensus query | `PoolQuery` | `query`, `tx_status`, `status` (read-only) |
//! | Validator response | `VerifyRspMessage` | `on_verdict`, `register_validator`, `unregister_validator` |
//!
//! Each loop handles one message at a time, in arrival order. The loops run
//! concurrently with each other and exit when the server signals shutdown.

use super::mailbox::{ActorHandle, ActorRole, IngressHandle, Mailbox, QueryHandle, VerifyRspHandle};
use super::payloads::{OutcomeNotice, PoolQuery, TxRequest, VerifyRspMessage};
use crate::domain::{PoolKind, TxOutcome, TxPoolError};
use crate::ports::TxPoolApi;
use crate::service::TxPoolServer;
use shared_types::short_hex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handles and tasks of the running endpoints.
#[derive(Debug)]
pub struct Endpoints {
    pub ingress: IngressHandle,
    pub query: QueryHandle,
    pub verify_rsp: VerifyRspHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl Endpoints {
    /// Waits for every endpoint loop to exit.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Spawns the three endpoints for `server` and registers their roles.
pub fn spawn_endpoints(server: &Arc<TxPoolServer>) -> Result<Endpoints, TxPoolError> {
    let capacity = server.config().mailbox_capacity;
    let (ingress, ingress_rx) = Mailbox::channel(ActorRole::TxIngress, capacity);
    let (query, query_rx) = Mailbox::channel(ActorRole::ConsensusQuery, capacity);
    let (verify_rsp, verify_rx) = Mailbox::channel(ActorRole::VerifyResponse, capacity);

    server.register_actor(ActorRole::TxIngress, ActorHandle::Ingress(ingress.clone()))?;
    server.register_actor(ActorRole::ConsensusQuery, ActorHandle::Query(query.clone()))?;
    server.register_actor(
        ActorRole::VerifyResponse,
        ActorHandle::VerifyRsp(verify_rsp.clone()),
    )?;

    let tasks = vec![
        tokio::spawn(run_ingress(server.clone(), ingress_rx, server.shutdown_signal())),
        tokio::spawn(run_query(server.clone(), query_rx, server.shutdown_signal())),
        tokio::spawn(run_verify_rsp(server.clone(), verify_rx, server.shutdown_signal())),
    ];

    info!(capacity, "Endpoints started");
    Ok(Endpoints {
        ingress,
        query,
        verify_rsp,
        tasks,
    })
}

/// Ingress loop.
pub async fn run_ingress<A: TxPoolApi + ?Sized>(
    api: Arc<A>,
    mut rx: mpsc::Receiver<TxRequest>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            msg = rx.recv() => match msg {
                Some(req) => handle_tx_request(api.as_ref(), req),
                None => break,
            },
        }
    }
    debug!(role = %ActorRole::TxIngress, "Endpoint stopped");
}

/// Consensus query loop.
pub async fn run_query<A: TxPoolApi + ?Sized>(
    api: Arc<A>,
    mut rx: mpsc::Receiver<PoolQuery>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            msg = rx.recv() => match msg {
                Some(query) => handle_query(api.as_ref(), query),
                None => break,
            },
        }
    }
    debug!(role = %ActorRole::ConsensusQuery, "Endpoint stopped");
}

/// Validator response loop.
pub async fn run_verify_rsp<A: TxPoolApi + ?Sized>(
    api: Arc<A>,
    mut rx: mpsc::Receiver<VerifyRspMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            msg = rx.recv() => match msg {
                Some(msg) => handle_verify_rsp(api.as_ref(), msg),
                None => break,
            },
        }
    }
    debug!(role = %ActorRole::VerifyResponse, "Endpoint stopped");
}

fn handle_tx_request<A: TxPoolApi + ?Sized>(api: &A, req: TxRequest) {
    let hash = req.tx.hash();
    match api.submit(req.tx, req.sender) {
        // The outcome reaches the sender through the network role.
        Ok(_ticket) => {}
        Err(error) => {
            debug!(tx_hash = %short_hex(&hash), %error, "Ingress submission refused");
            api.notify_sender(OutcomeNotice {
                sender: req.sender,
                outcome: TxOutcome::Rejected { hash, error },
            });
        }
    }
}

fn handle_query<A: TxPoolApi + ?Sized>(api: &A, query: PoolQuery) {
    match query {
        PoolQuery::PoolState { by_count, reply } => {
            let _ = reply.send(api.query(PoolKind::Verified, by_count));
        }
        PoolQuery::PendingState { by_count, reply } => {
            let _ = reply.send(api.query(PoolKind::Pending, by_count));
        }
        PoolQuery::TxStatus { hash, reply } => {
            let _ = reply.send(api.tx_status(&hash));
        }
        PoolQuery::Status { reply } => {
            let _ = reply.send(api.status());
        }
    }
}

fn handle_verify_rsp<A: TxPoolApi + ?Sized>(api: &A, msg: VerifyRspMessage) {
    match msg {
        VerifyRspMessage::Verdict(verdict) => {
            api.on_verdict(verdict);
        }
        VerifyRspMessage::Register {
            id,
            capability,
            link,
            ack,
        } => {
            let _ = ack.send(api.register_validator(id, capability, link));
        }
        VerifyRspMessage::Unregister {
            id,
            cancel_outstanding,
            ack,
        } => {
            let _ = ack.send(api.unregister_validator(&id, cancel_outstanding));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::config::TxPoolConfig;
    use crate::domain::{
        CallerId, Capability, EmptyRegistryPolicy, PoolStatus, Sender, ShardId, Transaction,
        Verdict, VerdictMessage,
    };
    use crate::ipc::{NetworkHandle, ValidateRequest, ValidatorLink};
    use shared_types::{MutableTransaction, Payload};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn create_tx(nonce: u32) -> Arc<Transaction> {
        let mut tx = MutableTransaction::new(Payload::InvokeCode { code: vec![] });
        tx.nonce = nonce;
        Arc::new(tx.into_immutable().unwrap())
    }

    fn start(config: TxPoolConfig) -> (Arc<TxPoolServer>, Endpoints) {
        let server =
            TxPoolServer::start(config, ShardId::ROOT, Arc::new(InMemoryLedger::new())).unwrap();
        let endpoints = spawn_endpoints(&server).unwrap();
        (server, endpoints)
    }

    async fn pool_status(endpoints: &Endpoints) -> PoolStatus {
        let (reply, rx) = oneshot::channel();
        endpoints
            .query
            .send(PoolQuery::Status { reply })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_spawn_registers_roles() {
        let (server, _endpoints) = start(TxPoolConfig::for_testing());
        assert!(server.actor(ActorRole::TxIngress).is_some());
        assert!(server.actor(ActorRole::ConsensusQuery).is_some());
        assert!(server.actor(ActorRole::VerifyResponse).is_some());
        assert!(server.actor(ActorRole::Network).is_none());
    }

    #[tokio::test]
    async fn test_empty_pool_count_is_zero() {
        let (_server, endpoints) = start(TxPoolConfig::for_testing());

        let (reply, rx) = oneshot::channel();
        endpoints
            .query
            .send(PoolQuery::PoolState {
                by_count: true,
                reply,
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap().len(), 0);

        let (reply, rx) = oneshot::channel();
        endpoints
            .query
            .send(PoolQuery::PendingState {
                by_count: false,
                reply,
            })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_submit_and_verdict_through_endpoints() {
        let (_server, endpoints) = start(TxPoolConfig::for_testing());
        let (inbox, mut requests) = mpsc::unbounded_channel::<ValidateRequest>();

        let (ack, ack_rx) = oneshot::channel();
        endpoints
            .verify_rsp
            .send(VerifyRspMessage::Register {
                id: "v".into(),
                capability: Capability::Stateless,
                link: ValidatorLink {
                    inbox,
                    response: endpoints.verify_rsp.clone(),
                },
                ack,
            })
            .await
            .unwrap();
        ack_rx.await.unwrap().unwrap();

        let tx = create_tx(1);
        endpoints
            .ingress
            .send(TxRequest {
                tx: tx.clone(),
                sender: Sender::Nil,
            })
            .await
            .unwrap();

        let req = tokio::time::timeout(Duration::from_secs(1), requests.recv())
            .await
            .unwrap()
            .unwrap();
        req.reply_to
            .send(VerifyRspMessage::Verdict(VerdictMessage {
                tx_hash: req.tx.hash(),
                validator: "v".into(),
                attempt: req.attempt,
                verdict: Verdict::Pass,
            }))
            .await
            .unwrap();

        // Verdict and query travel through different endpoints.
        let mut status = pool_status(&endpoints).await;
        for _ in 0..100 {
            if status.verified_count == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            status = pool_status(&endpoints).await;
        }
        assert_eq!(status.verified_count, 1);
        assert_eq!(status.validators, 1);

        let (reply, rx) = oneshot::channel();
        endpoints
            .query
            .send(PoolQuery::TxStatus {
                hash: tx.hash(),
                reply,
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), Some(crate::domain::TxStatus::Verified));
    }

    #[tokio::test]
    async fn test_duplicate_ingress_notifies_sender() {
        let (server, endpoints) = start(TxPoolConfig {
            empty_registry_policy: EmptyRegistryPolicy::Accept,
            ..TxPoolConfig::for_testing()
        });
        let (network, mut notices) = NetworkHandle::channel(ActorRole::Network, 8);
        server
            .register_actor(ActorRole::Network, ActorHandle::Network(network))
            .unwrap();

        let caller = Sender::Api(CallerId::new());
        let tx = create_tx(2);
        for _ in 0..2 {
            endpoints
                .ingress
                .send(TxRequest {
                    tx: tx.clone(),
                    sender: caller,
                })
                .await
                .unwrap();
        }

        let first = notices.recv().await.unwrap();
        assert_eq!(first.sender, caller);
        assert!(first.outcome.is_accepted());

        let second = notices.recv().await.unwrap();
        assert_eq!(
            second.outcome.error(),
            Some(&TxPoolError::DuplicateTransaction(tx.hash()))
        );
    }

    #[tokio::test]
    async fn test_endpoints_exit_on_stop() {
        let (server, endpoints) = start(TxPoolConfig::for_testing());
        server.stop().await;

        tokio::time::timeout(Duration::from_secs(1), endpoints.join())
            .await
            .unwrap();
    }
}
