//! # Transaction Pool Container
//!
//! Holds the ledger, the pool server, its endpoints and the validator actors,
//! and manages their lifecycle.
//!
//! ## Startup Order
//!
//! ```text
//! 1. Ledger      InMemoryLedger, loaded from genesis (skipped in bypass mode)
//! 2. Pool server TxPoolServer::start, checks ledger readiness
//! 3. Endpoints   ingress, consensus query, validator response
//! 4. Network     outcome notices for remote and API senders
//! 5. Validators  spawned, then registered through the response endpoint
//! ```
//!
//! Shutdown runs the other way: the server drains and stops first, which
//! ends the endpoint and network loops, then the validator tasks are aborted.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use qc_06_txn_pool::{
    spawn_endpoints, spawn_validator, ActorHandle, ActorRole, Endpoints, InMemoryLedger, Ledger,
    NetworkHandle, OutcomeNotice, PoolSnapshot, PoolSnapshotSink, StatefulValidator,
    StatelessValidator, TxPoolApi, TxPoolServer, ValidatorActor, ValidatorId, ValidatorKind,
};
use shared_types::short_hex;

use crate::container::config::NodeConfig;
use crate::genesis::GenesisBuilder;

/// Central container holding the running pool and its collaborators.
pub struct TxPoolContainer {
    ledger: Arc<InMemoryLedger>,
    server: Arc<TxPoolServer>,
    endpoints: Endpoints,
    validators: Vec<ValidatorActor>,
    network_task: JoinHandle<()>,
}

impl TxPoolContainer {
    /// Builds and starts every component in order.
    pub async fn start(config: &NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;
        let shard = config.shard_id;

        let ledger = Arc::new(InMemoryLedger::new());
        let ledger_ready = if config.txpool.bypass_ledger_check {
            warn!(shard = %shard, "Bypass mode, genesis not loaded");
            false
        } else {
            let genesis = GenesisBuilder::new(config.genesis.clone())
                .build(shard)
                .context("Failed to build genesis")?;
            ledger
                .init_from_genesis(&genesis.state)
                .context("Failed to load genesis into ledger")?;
            info!(
                shard = %shard,
                digest = %hex::encode(genesis.digest),
                accounts = genesis.state.allocations.len(),
                total_supply = genesis.total_supply,
                "Genesis loaded"
            );
            true
        };

        let server = TxPoolServer::start(config.txpool.clone(), shard, ledger.clone())
            .context("Failed to start transaction pool")?;
        if config.txpool.flush_on_stop {
            server.set_flush_sink(Arc::new(LogSnapshotSink));
        }

        let endpoints = spawn_endpoints(&server).context("Failed to start endpoints")?;
        let network_task = spawn_network(&server)?;

        let mut validators = Vec::new();
        for i in 0..config.stateless_validators {
            validators.push(spawn_validator(
                ValidatorId::new(format!("stateless-{i}")),
                ValidatorKind::Stateless(StatelessValidator),
                endpoints.verify_rsp.clone(),
            ));
        }
        if config.stateful_validator && ledger_ready {
            let ledger: Arc<dyn Ledger> = ledger.clone();
            validators.push(spawn_validator(
                ValidatorId::new("stateful-0"),
                ValidatorKind::Stateful(StatefulValidator::new(ledger)),
                endpoints.verify_rsp.clone(),
            ));
        }
        for validator in &validators {
            validator
                .register()
                .await
                .with_context(|| format!("Failed to register validator {}", validator.id()))?;
        }

        info!(
            shard = %shard,
            validators = validators.len(),
            "Node runtime started"
        );

        Ok(Self {
            ledger,
            server,
            endpoints,
            validators,
            network_task,
        })
    }

    pub fn server(&self) -> Arc<TxPoolServer> {
        Arc::clone(&self.server)
    }

    pub fn ledger(&self) -> Arc<InMemoryLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Stops the server and waits for every task to finish.
    pub async fn shutdown(self) {
        info!("Shutting down node runtime");

        self.server.stop().await;
        for validator in self.validators {
            validator.shutdown();
        }
        self.endpoints.join().await;
        let _ = self.network_task.await;

        let stats = self.server.stats();
        info!(
            received = stats.received,
            accepted = stats.accepted,
            rejected = stats.rejected,
            expired = stats.expired,
            "Node runtime stopped"
        );
    }
}

/// Registers the network role and logs the notices it receives.
fn spawn_network(server: &Arc<TxPoolServer>) -> Result<JoinHandle<()>> {
    let (handle, rx) = NetworkHandle::channel(ActorRole::Network, server.config().mailbox_capacity);
    server
        .register_actor(ActorRole::Network, ActorHandle::Network(handle))
        .context("Failed to register network role")?;
    Ok(tokio::spawn(run_network(rx, server.shutdown_signal())))
}

async fn run_network(mut rx: mpsc::Receiver<OutcomeNotice>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            notice = rx.recv() => match notice {
                Some(notice) => debug!(
                    sender = ?notice.sender,
                    tx_hash = %short_hex(&notice.outcome.hash()),
                    accepted = notice.outcome.is_accepted(),
                    "Outcome notice"
                ),
                None => break,
            },
        }
    }
    debug!(role = %ActorRole::Network, "Network relay stopped");
}

/// Flush sink that records the pool contents in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSnapshotSink;

impl PoolSnapshotSink for LogSnapshotSink {
    fn persist(&self, snapshot: &PoolSnapshot) -> Result<(), String> {
        for tx in &snapshot.verified {
            info!(tx_hash = %short_hex(&tx.hash()), "Flushed verified transaction");
        }
        info!(
            pending = snapshot.pending.len(),
            verified = snapshot.verified.len(),
            "Pool flushed on stop"
        );
        Ok(())
    }
}
