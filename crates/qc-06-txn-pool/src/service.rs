//! # Transaction Pool Server
//!
//! Owns the pending/verified pool, the validation coordinator, the validator
//! registry and the worker gate, and implements `TxPoolApi` on top of them.
//!
//! ## Locking
//!
//! Each structure sits behind its own lock and no two are held at once,
//! with one exception: `submit()` holds the server-state read guard for its
//! whole admission so `stop()` cannot slip between the pool insert and the
//! coordinator record.
//!
//! ## Worker slots
//!
//! A slot is taken on admission (or queued) and released exactly once, by
//! whoever receives the `Resolution` of a dispatched record. A released
//! slot passes straight to the next queued transaction.

use crate::config::TxPoolConfig;
use crate::domain::{
    Admission, Capability, DispatchPlan, Hash, PoolKind, PoolStats, PoolStatsSnapshot, PoolStatus,
    QueryReply, Resolution, Sender, ShardId, Transaction, TransactionPool, TxOutcome, TxPoolError,
    TxStatus, ValidationCoordinator, ValidationState, ValidatorId, ValidatorRegistry, Verdict,
    VerdictEffect, VerdictMessage, WorkerDispatch,
};
use crate::ipc::{ActorHandle, ActorRole, OutcomeNotice, SubmitTicket, ValidateRequest, ValidatorLink};
use crate::ports::{Ledger, PoolSnapshotSink, SystemTimeSource, TimeSource, TxPoolApi};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::short_hex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, watch, Notify};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Server lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    /// Accepting submissions.
    Running,
    /// Refusing submissions, letting in-flight validations finish.
    Draining,
    /// Torn down.
    Stopped,
}

/// Coordinator plus the per-submission result channels it resolves.
struct Inflight {
    coordinator: ValidationCoordinator,
    waiters: HashMap<Hash, oneshot::Sender<TxOutcome>>,
}

/// A resolution paired with its waiter, taken under the same lock.
struct Settled {
    resolution: Resolution,
    waiter: Option<oneshot::Sender<TxOutcome>>,
}

impl Inflight {
    fn settle(&mut self, resolution: Resolution) -> Settled {
        let waiter = self.waiters.remove(&resolution.hash());
        Settled { resolution, waiter }
    }

    fn settle_all(&mut self, resolutions: Vec<Resolution>) -> Vec<Settled> {
        resolutions.into_iter().map(|r| self.settle(r)).collect()
    }
}

/// The pool server.
pub struct TxPoolServer {
    config: TxPoolConfig,
    shard: ShardId,
    ledger: Arc<dyn Ledger>,
    time_source: Arc<dyn TimeSource>,
    state: RwLock<ServerState>,
    pool: RwLock<TransactionPool>,
    inflight: Mutex<Inflight>,
    registry: ValidatorRegistry<ValidatorLink>,
    workers: Mutex<WorkerDispatch>,
    actors: RwLock<HashMap<ActorRole, ActorHandle>>,
    flush_sink: RwLock<Option<Arc<dyn PoolSnapshotSink>>>,
    stats: PoolStats,
    resolved: Notify,
    shutdown: watch::Sender<bool>,
}

impl TxPoolServer {
    /// Starts a server for `shard`.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration does not validate
    /// - `LedgerUnavailable` if the ledger cannot report the shard height
    ///   (skipped with `bypass_ledger_check`)
    pub fn start(
        config: TxPoolConfig,
        shard: ShardId,
        ledger: Arc<dyn Ledger>,
    ) -> Result<Arc<Self>, TxPoolError> {
        Self::start_with_time_source(config, shard, ledger, Arc::new(SystemTimeSource))
    }

    /// Like `start`, with an explicit clock.
    pub fn start_with_time_source(
        config: TxPoolConfig,
        shard: ShardId,
        ledger: Arc<dyn Ledger>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Arc<Self>, TxPoolError> {
        config.validate()?;

        if config.bypass_ledger_check {
            warn!(shard = %shard, "Ledger check bypassed");
        } else {
            let height = ledger.current_height(shard)?;
            info!(shard = %shard, height, "Ledger ready");
        }

        let (shutdown, _) = watch::channel(false);
        let server = Arc::new(Self {
            shard,
            ledger,
            time_source,
            state: RwLock::new(ServerState::Running),
            pool: RwLock::new(TransactionPool::new(config.max_pool_size)),
            inflight: Mutex::new(Inflight {
                coordinator: ValidationCoordinator::new(
                    config.validation_timeout_ms,
                    config.empty_registry_policy,
                ),
                waiters: HashMap::new(),
            }),
            registry: ValidatorRegistry::new(),
            workers: Mutex::new(WorkerDispatch::new(config.max_workers)),
            actors: RwLock::new(HashMap::new()),
            flush_sink: RwLock::new(None),
            stats: PoolStats::default(),
            resolved: Notify::new(),
            shutdown,
            config,
        });

        spawn_timeout_tracker(&server);

        info!(
            shard = %shard,
            max_workers = server.config.max_workers,
            capacity = server.config.max_pool_size,
            timeout_ms = server.config.validation_timeout_ms,
            "Transaction pool started"
        );
        Ok(server)
    }

    pub fn config(&self) -> &TxPoolConfig {
        &self.config
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    /// Ledger the pool was started with; stateful validators share it.
    pub fn ledger(&self) -> Arc<dyn Ledger> {
        self.ledger.clone()
    }

    pub fn state(&self) -> ServerState {
        *self.state.read()
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Flips to `true` once the server has stopped.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn set_flush_sink(&self, sink: Arc<dyn PoolSnapshotSink>) {
        *self.flush_sink.write() = Some(sink);
    }

    /// Binds `handle` to `role`, replacing any previous binding.
    ///
    /// # Errors
    /// `RoleMismatch` if the handle serves a different role.
    pub fn register_actor(&self, role: ActorRole, handle: ActorHandle) -> Result<(), TxPoolError> {
        if handle.role() != role {
            return Err(TxPoolError::RoleMismatch {
                role: role.as_str(),
            });
        }
        let replaced = self.actors.write().insert(role, handle).is_some();
        debug!(role = %role, replaced, "Actor registered");
        Ok(())
    }

    pub fn actor(&self, role: ActorRole) -> Option<ActorHandle> {
        self.actors.read().get(&role).cloned()
    }

    /// Expires records past their deadline. Returns how many expired.
    pub fn expire_overdue(&self) -> usize {
        let now = self.time_source.now();
        let settled = {
            let mut inflight = self.inflight.lock();
            let expired = inflight.coordinator.expire_overdue(now);
            inflight.settle_all(expired)
        };

        let count = settled.len();
        for s in settled {
            self.complete(s);
        }
        count
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Dispatches `hash` on a slot it already holds.
    ///
    /// While a dispatch ends without anything in flight, the slot moves on to
    /// the next queued transaction.
    fn run_dispatch(&self, hash: Hash) {
        let mut next = Some(hash);
        while let Some(hash) = next.take() {
            if self.fan_out(hash) {
                break;
            }
            next = self.workers.lock().release();
        }
    }

    /// Releases one slot, dispatching whoever inherits it.
    fn release_worker(&self) {
        let next = self.workers.lock().release();
        if let Some(hash) = next {
            self.run_dispatch(hash);
        }
    }

    /// Sends `hash` to the current validator snapshot.
    ///
    /// Returns true if the record is in flight and keeps the slot.
    fn fan_out(&self, hash: Hash) -> bool {
        let snapshot = self.registry.snapshot();
        let ids = snapshot.iter().map(|e| e.id.clone()).collect();
        let now = self.time_source.now();

        let plan = self.inflight.lock().coordinator.dispatch(&hash, ids, now);
        let (attempt, tx) = match plan {
            DispatchPlan::Dispatch { attempt, tx } => (attempt, tx),
            DispatchPlan::Resolved(resolution) => {
                let settled = self.inflight.lock().settle(resolution);
                self.finalize(settled);
                return false;
            }
            DispatchPlan::NotFound => return false,
        };

        debug!(
            tx_hash = %short_hex(&hash),
            attempt,
            validators = snapshot.len(),
            "Dispatching to validators"
        );

        let mut retained = true;
        for entry in &snapshot {
            let request = ValidateRequest {
                tx: tx.clone(),
                shard: self.shard,
                attempt,
                reply_to: entry.handle.response.clone(),
            };
            if entry.handle.inbox.send(request).is_ok() {
                continue;
            }

            warn!(validator = %entry.id, tx_hash = %short_hex(&hash), "Validator unreachable");
            let effect = self.inflight.lock().coordinator.on_verdict(VerdictMessage {
                tx_hash: hash,
                validator: entry.id.clone(),
                attempt,
                verdict: Verdict::Fail("validator unreachable".into()),
            });
            if let VerdictEffect::Resolved(resolution) = effect {
                let settled = self.inflight.lock().settle(resolution);
                self.finalize(settled);
                retained = false;
            }
        }
        retained
    }

    /// Finalizes a resolution and frees its slot if it held one.
    fn complete(&self, settled: Settled) {
        let was_dispatched = settled.resolution.was_dispatched;
        self.finalize(settled);
        if was_dispatched {
            self.release_worker();
        }
    }

    /// Applies a resolution to the pool and tells everyone who cares.
    fn finalize(&self, settled: Settled) {
        let Settled { resolution, waiter } = settled;
        let hash = resolution.hash();
        let now = self.time_source.now();

        {
            let mut pool = self.pool.write();
            if resolution.outcome.is_accepted() {
                pool.promote(&hash, now);
            } else {
                pool.discard(&hash);
            }
        }

        match (&resolution.state, resolution.outcome.error()) {
            (ValidationState::Accepted, _) => {
                PoolStats::bump(&self.stats.accepted);
                info!(tx_hash = %short_hex(&hash), "Transaction verified");
            }
            (ValidationState::Expired, _) => {
                PoolStats::bump(&self.stats.expired);
                warn!(tx_hash = %short_hex(&hash), "Transaction validation expired");
            }
            (_, error) => {
                PoolStats::bump(&self.stats.rejected);
                warn!(
                    tx_hash = %short_hex(&hash),
                    reason = %error.map(ToString::to_string).unwrap_or_default(),
                    "Transaction rejected"
                );
            }
        }

        if let Some(waiter) = waiter {
            let _ = waiter.send(resolution.outcome.clone());
        }
        if !resolution.sender.is_nil() {
            self.notify_sender(OutcomeNotice {
                sender: resolution.sender,
                outcome: resolution.outcome,
            });
        }
        self.resolved.notify_waiters();
    }
}

#[async_trait]
impl TxPoolApi for TxPoolServer {
    fn submit(&self, tx: Arc<Transaction>, sender: Sender) -> Result<SubmitTicket, TxPoolError> {
        let state = self.state.read();
        if *state != ServerState::Running {
            return Err(TxPoolError::PoolStopped);
        }

        PoolStats::bump(&self.stats.received);
        let hash = tx.hash();
        let now = self.time_source.now();

        let admitted = self.pool.write().admit(tx.clone(), now);
        if let Err(e) = admitted {
            match e {
                TxPoolError::DuplicateTransaction(_) => PoolStats::bump(&self.stats.duplicates),
                TxPoolError::PoolFull { .. } => PoolStats::bump(&self.stats.pool_full),
                _ => {}
            }
            debug!(tx_hash = %short_hex(&hash), error = %e, "Submission refused");
            return Err(e);
        }

        let (outcome_tx, outcome_rx) = oneshot::channel();
        {
            let mut inflight = self.inflight.lock();
            inflight.coordinator.admit(tx, sender, now);
            inflight.waiters.insert(hash, outcome_tx);
        }

        let admission = self.workers.lock().try_acquire(hash);
        debug!(tx_hash = %short_hex(&hash), ?admission, "Transaction admitted");
        if admission == Admission::Granted {
            self.run_dispatch(hash);
        }

        drop(state);
        Ok(SubmitTicket::new(hash, outcome_rx))
    }

    fn notify_sender(&self, notice: OutcomeNotice) {
        if notice.sender.is_nil() {
            return;
        }
        let network = match self.actor(ActorRole::Network) {
            Some(ActorHandle::Network(handle)) => handle,
            _ => {
                debug!(sender = ?notice.sender, "No network role registered, notice dropped");
                return;
            }
        };
        if let Err(e) = network.tell(notice) {
            warn!(error = %e, "Failed to deliver outcome notice");
        }
    }

    fn query(&self, kind: PoolKind, by_count: bool) -> QueryReply {
        let pool = self.pool.read();
        if by_count {
            QueryReply::Count(pool.count(kind))
        } else {
            QueryReply::Listing(pool.listing(kind))
        }
    }

    fn get_transaction(&self, hash: &Hash) -> Option<Arc<Transaction>> {
        self.pool.read().get(hash).map(|entry| entry.tx.clone())
    }

    fn tx_status(&self, hash: &Hash) -> Option<TxStatus> {
        let pending = self.inflight.lock().coordinator.record(hash).map(|r| TxStatus::Pending {
            state: r.state,
            expected: r.expected.len(),
            responded: r.responded.len(),
            verdicts: r.verdicts.clone(),
        });
        if pending.is_some() {
            return pending;
        }
        match self.pool.read().location(hash) {
            Some(PoolKind::Verified) => Some(TxStatus::Verified),
            _ => None,
        }
    }

    fn status(&self) -> PoolStatus {
        let (pending_count, verified_count) = {
            let pool = self.pool.read();
            (pool.count(PoolKind::Pending), pool.count(PoolKind::Verified))
        };
        let (in_flight, queued) = {
            let inflight = self.inflight.lock();
            (inflight.coordinator.in_flight(), inflight.coordinator.queued())
        };
        PoolStatus {
            pending_count,
            verified_count,
            in_flight,
            queued,
            validators: self.registry.len(),
        }
    }

    fn register_validator(
        &self,
        id: ValidatorId,
        capability: Capability,
        link: ValidatorLink,
    ) -> Result<(), TxPoolError> {
        if self.state() == ServerState::Stopped {
            return Err(TxPoolError::PoolStopped);
        }
        let replaced = self.registry.register(id.clone(), capability, link).is_some();
        info!(validator = %id, ?capability, replaced, "Validator registered");
        Ok(())
    }

    fn unregister_validator(
        &self,
        id: &ValidatorId,
        cancel_outstanding: bool,
    ) -> Result<(), TxPoolError> {
        self.registry.unregister(id)?;
        info!(validator = %id, cancel_outstanding, "Validator unregistered");

        if cancel_outstanding {
            let settled = {
                let mut inflight = self.inflight.lock();
                let withdrawn = inflight.coordinator.withdraw_validator(id);
                inflight.settle_all(withdrawn)
            };
            for s in settled {
                self.complete(s);
            }
        }
        Ok(())
    }

    fn on_verdict(&self, msg: VerdictMessage) -> VerdictEffect {
        let tx_hash = msg.tx_hash;
        let validator = msg.validator.clone();

        let (effect, settled) = {
            let mut inflight = self.inflight.lock();
            let effect = inflight.coordinator.on_verdict(msg);
            let settled = match &effect {
                VerdictEffect::Resolved(resolution) => Some(inflight.settle(resolution.clone())),
                _ => None,
            };
            (effect, settled)
        };

        match &effect {
            VerdictEffect::Discarded(reason) => debug!(
                tx_hash = %short_hex(&tx_hash),
                validator = %validator,
                ?reason,
                "Verdict discarded"
            ),
            VerdictEffect::Recorded { remaining } => debug!(
                tx_hash = %short_hex(&tx_hash),
                validator = %validator,
                remaining,
                "Verdict recorded"
            ),
            VerdictEffect::Resolved(_) => {}
        }

        if let Some(settled) = settled {
            self.complete(settled);
        }
        effect
    }

    fn remove_committed(&self, hashes: &[Hash]) -> Vec<Hash> {
        let removed = self.pool.write().remove_committed(hashes);
        debug!(requested = hashes.len(), removed = removed.len(), "Committed transactions removed");
        removed
    }

    async fn stop(&self) {
        {
            let mut state = self.state.write();
            if *state != ServerState::Running {
                let current = *state;
                debug!(state = ?current, "Stop already requested");
                return;
            }
            *state = ServerState::Draining;
        }
        info!(tracked = self.inflight.lock().coordinator.len(), "Draining transaction pool");

        let deadline = Instant::now() + self.config.stop_grace_period();
        loop {
            let notified = self.resolved.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inflight.lock().coordinator.is_empty() {
                break;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                break;
            }
        }

        let aborted = {
            let mut inflight = self.inflight.lock();
            let aborted = inflight.coordinator.abort_all(TxPoolError::PoolStopped);
            inflight.settle_all(aborted)
        };
        if !aborted.is_empty() {
            warn!(aborted = aborted.len(), "Grace period elapsed, aborting validations");
        }
        for s in aborted {
            self.finalize(s);
        }
        self.workers.lock().reset();

        let snapshot = self.pool.write().clear();
        if self.config.flush_on_stop {
            let sink = self.flush_sink.read().clone();
            match sink {
                Some(sink) => match sink.persist(&snapshot) {
                    Ok(()) => info!(transactions = snapshot.len(), "Pool flushed"),
                    Err(e) => warn!(error = %e, "Pool flush failed"),
                },
                None => warn!("flush_on_stop set without a flush sink"),
            }
        }

        self.registry.clear();
        self.actors.write().clear();
        self.shutdown.send_replace(true);
        *self.state.write() = ServerState::Stopped;
        info!("Transaction pool stopped");
    }
}

/// Periodically expires overdue records until the server stops or is dropped.
fn spawn_timeout_tracker(server: &Arc<TxPoolServer>) {
    let weak: Weak<TxPoolServer> = Arc::downgrade(server);
    let mut shutdown = server.shutdown.subscribe();
    let period = server.config.timeout_check_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(server) = weak.upgrade() else { break };
                    let expired = server.expire_overdue();
                    if expired > 0 {
                        debug!(expired, "Timeout tracker expired records");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    });
}
