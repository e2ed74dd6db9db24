//! # Validation Coordinator
//!
//! Owns one `ValidationRecord` per transaction under validation and drives
//! it through the lifecycle:
//!
//! ```text
//! admit ──→ Received ──dispatch(snapshot)──→ Dispatched ──verdict──→ Aggregating
//!                                                 │                      │
//!                 first Fail / all Pass / deadline / withdrawal ─────────┘
//!                                                 ↓
//!                                   Resolution (record removed)
//! ```
//!
//! The coordinator is synchronous and does no I/O. Callers feed it events
//! and act on the `Resolution`s it hands back.
//!
//! ## Aggregation
//!
//! - The first `Fail` resolves the record `Rejected` with that reason.
//! - `Accepted` only once every validator in the dispatch snapshot passed.
//! - Verdicts for records that no longer exist, from validators outside the
//!   snapshot, for an older attempt, or repeated are discarded.

use super::entities::{
    Hash, Sender, Timestamp, Transaction, ValidationRecord, ValidationState, ValidatorId, Verdict,
    VerdictMessage,
};
use super::errors::TxPoolError;
use super::value_objects::TxOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// What to do with a transaction dispatched while no validator is registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyRegistryPolicy {
    /// Resolve `Rejected` with `ValidatorUnavailable`.
    #[default]
    Reject,
    /// Resolve `Accepted` without any check.
    Accept,
}

/// A terminal decision. The record is gone by the time this exists.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub tx: Arc<Transaction>,
    pub sender: Sender,
    /// `Accepted`, `Rejected` or `Expired`.
    pub state: ValidationState,
    pub outcome: TxOutcome,
    /// True if the record held a worker slot when it resolved.
    pub was_dispatched: bool,
}

impl Resolution {
    pub fn hash(&self) -> Hash {
        self.tx.hash()
    }
}

/// Result of `dispatch()`.
#[derive(Clone, Debug)]
pub enum DispatchPlan {
    /// Send `tx` to every validator of the snapshot, tagged with `attempt`.
    Dispatch { attempt: u64, tx: Arc<Transaction> },
    /// The snapshot was empty and the policy decided immediately.
    Resolved(Resolution),
    /// No record for this hash (resolved or aborted while queued).
    NotFound,
}

/// Why a verdict had no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// No record: already resolved, expired or never admitted.
    UnknownTransaction,
    /// Verdict for a previous dispatch of the same hash.
    StaleAttempt,
    /// Validator is not in the dispatch snapshot (or was withdrawn).
    NotExpected,
    /// Validator already answered this attempt.
    DuplicateVerdict,
    /// Record is still waiting for a worker slot.
    NotDispatched,
}

/// Result of `on_verdict()`.
#[derive(Clone, Debug)]
pub enum VerdictEffect {
    Discarded(DiscardReason),
    /// Verdict stored; `remaining` validators still owe a response.
    Recorded { remaining: usize },
    Resolved(Resolution),
}

/// Per-transaction validation state machine.
#[derive(Debug)]
pub struct ValidationCoordinator {
    records: HashMap<Hash, ValidationRecord>,
    timeout_ms: u64,
    empty_policy: EmptyRegistryPolicy,
    next_attempt: u64,
}

impl ValidationCoordinator {
    pub fn new(timeout_ms: u64, empty_policy: EmptyRegistryPolicy) -> Self {
        Self {
            records: HashMap::new(),
            timeout_ms,
            empty_policy,
            next_attempt: 1,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Records tracked, whatever their state.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dispatched and awaiting verdicts.
    pub fn in_flight(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.state.is_in_flight())
            .count()
    }

    /// Records admitted but not yet dispatched.
    pub fn queued(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.state == ValidationState::Received)
            .count()
    }

    pub fn record(&self, hash: &Hash) -> Option<&ValidationRecord> {
        self.records.get(hash)
    }

    /// Starts tracking a transaction in `Received`.
    ///
    /// Returns false if the hash is already tracked.
    pub fn admit(&mut self, tx: Arc<Transaction>, sender: Sender, now: Timestamp) -> bool {
        let hash = tx.hash();
        if self.records.contains_key(&hash) {
            return false;
        }
        self.records
            .insert(hash, ValidationRecord::new(tx, sender, now));
        true
    }

    /// Fixes the expected set to `validators` and moves the record to `Dispatched`.
    ///
    /// The deadline starts now.
    pub fn dispatch(&mut self, hash: &Hash, validators: Vec<ValidatorId>, now: Timestamp) -> DispatchPlan {
        let Some(record) = self.records.get_mut(hash) else {
            return DispatchPlan::NotFound;
        };

        let attempt = self.next_attempt;
        self.next_attempt += 1;

        record.attempt = attempt;
        record.expected = validators.into_iter().collect();
        record.responded.clear();
        record.verdicts.clear();
        record.state = ValidationState::Dispatched;
        record.dispatched_at = Some(now);

        if record.expected.is_empty() {
            return match self.resolve_empty(hash) {
                Some(resolution) => DispatchPlan::Resolved(resolution),
                None => DispatchPlan::NotFound,
            };
        }

        DispatchPlan::Dispatch {
            attempt,
            tx: record.tx.clone(),
        }
    }

    /// Applies one validator verdict.
    pub fn on_verdict(&mut self, msg: VerdictMessage) -> VerdictEffect {
        let Some(record) = self.records.get_mut(&msg.tx_hash) else {
            return VerdictEffect::Discarded(DiscardReason::UnknownTransaction);
        };
        if record.state == ValidationState::Received {
            return VerdictEffect::Discarded(DiscardReason::NotDispatched);
        }
        if record.attempt != msg.attempt {
            return VerdictEffect::Discarded(DiscardReason::StaleAttempt);
        }
        if !record.expected.contains(&msg.validator) {
            return VerdictEffect::Discarded(DiscardReason::NotExpected);
        }
        if !record.responded.insert(msg.validator.clone()) {
            return VerdictEffect::Discarded(DiscardReason::DuplicateVerdict);
        }

        record.verdicts.push((msg.validator.clone(), msg.verdict.clone()));

        match msg.verdict {
            Verdict::Fail(reason) => {
                let error = TxPoolError::ValidationFailed {
                    validator: msg.validator,
                    reason,
                };
                self.resolve(&msg.tx_hash, ValidationState::Rejected, Some(error))
                    .map_or(
                        VerdictEffect::Discarded(DiscardReason::UnknownTransaction),
                        VerdictEffect::Resolved,
                    )
            }
            Verdict::Pass if record.all_responded() => self
                .resolve(&msg.tx_hash, ValidationState::Accepted, None)
                .map_or(
                    VerdictEffect::Discarded(DiscardReason::UnknownTransaction),
                    VerdictEffect::Resolved,
                ),
            Verdict::Pass => {
                record.state = ValidationState::Aggregating;
                VerdictEffect::Recorded {
                    remaining: record.outstanding(),
                }
            }
        }
    }

    /// Resolves every in-flight record whose deadline has passed as `Expired`.
    pub fn expire_overdue(&mut self, now: Timestamp) -> Vec<Resolution> {
        let overdue: Vec<Hash> = self
            .records
            .iter()
            .filter(|(_, r)| r.is_timed_out(now, self.timeout_ms))
            .map(|(hash, _)| *hash)
            .collect();

        let error = TxPoolError::ValidationTimeout {
            timeout_ms: self.timeout_ms,
        };
        overdue
            .iter()
            .filter_map(|hash| self.resolve(hash, ValidationState::Expired, Some(error.clone())))
            .collect()
    }

    /// Stops waiting on `id` in every in-flight record.
    ///
    /// A record left with nothing outstanding resolves: `Accepted` if some
    /// validator passed it, otherwise per the empty-registry policy.
    pub fn withdraw_validator(&mut self, id: &ValidatorId) -> Vec<Resolution> {
        let mut settled = Vec::new();
        for (hash, record) in self.records.iter_mut() {
            if !record.state.is_in_flight() || record.responded.contains(id) {
                continue;
            }
            if record.expected.remove(id) && record.all_responded() {
                settled.push(*hash);
            }
        }

        settled
            .iter()
            .filter_map(|hash| {
                let answered = self
                    .records
                    .get(hash)
                    .is_some_and(|r| !r.responded.is_empty());
                if answered {
                    self.resolve(hash, ValidationState::Accepted, None)
                } else {
                    self.resolve_empty(hash)
                }
            })
            .collect()
    }

    /// Resolves one record `Rejected` with `error`, whatever its state.
    pub fn abort(&mut self, hash: &Hash, error: TxPoolError) -> Option<Resolution> {
        self.resolve(hash, ValidationState::Rejected, Some(error))
    }

    /// Resolves every record `Rejected` with `error`.
    pub fn abort_all(&mut self, error: TxPoolError) -> Vec<Resolution> {
        let hashes: Vec<Hash> = self.records.keys().copied().collect();
        hashes
            .iter()
            .filter_map(|hash| self.abort(hash, error.clone()))
            .collect()
    }

    fn resolve_empty(&mut self, hash: &Hash) -> Option<Resolution> {
        match self.empty_policy {
            EmptyRegistryPolicy::Accept => self.resolve(hash, ValidationState::Accepted, None),
            EmptyRegistryPolicy::Reject => self.resolve(
                hash,
                ValidationState::Rejected,
                Some(TxPoolError::ValidatorUnavailable),
            ),
        }
    }

    /// Removes the record and builds its resolution.
    fn resolve(
        &mut self,
        hash: &Hash,
        state: ValidationState,
        error: Option<TxPoolError>,
    ) -> Option<Resolution> {
        let record = self.records.remove(hash)?;
        let outcome = match error {
            None => TxOutcome::Accepted(*hash),
            Some(error) => TxOutcome::Rejected { hash: *hash, error },
        };
        Some(Resolution {
            was_dispatched: record.state.is_in_flight(),
            tx: record.tx,
            sender: record.sender,
            state,
            outcome,
        })
    }
}
