//! Core domain entities for the transaction pool.
//!
//! Defines submission origins, validator identities, verdicts and the
//! per-transaction validation state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// Re-export from shared-types for convenience
pub use shared_types::{Hash, PeerId, ShardId, Transaction};

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Identifies a local API caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(pub Uuid);

impl CallerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a transaction came from. Carried through its lifecycle so that a
/// rejection can be routed back to the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Sender {
    /// Relayed by a network peer.
    Net(PeerId),
    /// Submitted through the local API.
    Api(CallerId),
    /// Internally generated or test traffic. Never notified.
    #[default]
    Nil,
}

impl Sender {
    pub fn is_nil(&self) -> bool {
        matches!(self, Sender::Nil)
    }
}

/// Validator identity. Registry key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId(String);

impl ValidatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a validator checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Well-formedness only, no chain state.
    Stateless,
    /// Consults ledger state (balances, committed transactions).
    Stateful,
}

/// A single validator's decision on a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// A verdict addressed to the coordinator.
///
/// `attempt` ties the verdict to one dispatch; verdicts for an earlier
/// attempt of the same hash are stale and discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerdictMessage {
    pub tx_hash: Hash,
    pub validator: ValidatorId,
    pub attempt: u64,
    pub verdict: Verdict,
}

/// Validation lifecycle.
///
/// ```text
/// [Received] ──dispatch──→ [Dispatched] ──first verdict──→ [Aggregating]
///                                │                               │
///                                └─────────┬─────────────────────┘
///                                          ↓
///                          [Accepted | Rejected | Expired]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationState {
    /// Admitted, waiting for a worker slot.
    #[default]
    Received,
    /// Sent to the dispatch snapshot, no verdict yet.
    Dispatched,
    /// At least one verdict collected.
    Aggregating,
    /// Every validator in the snapshot passed it.
    Accepted,
    /// A validator failed it.
    Rejected,
    /// The deadline passed before all verdicts arrived.
    Expired,
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Expired)
    }

    /// True while the record holds a worker slot.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Aggregating)
    }
}

/// Per-transaction validation state. Lives only until the decision.
#[derive(Clone, Debug)]
pub struct ValidationRecord {
    pub tx: Arc<Transaction>,
    pub sender: Sender,
    pub state: ValidationState,
    /// Dispatch sequence number, 0 until dispatched.
    pub attempt: u64,
    /// Validators in the dispatch snapshot.
    pub expected: BTreeSet<ValidatorId>,
    pub responded: BTreeSet<ValidatorId>,
    /// Verdicts in arrival order.
    pub verdicts: Vec<(ValidatorId, Verdict)>,
    pub created_at: Timestamp,
    pub dispatched_at: Option<Timestamp>,
}

impl ValidationRecord {
    /// Creates a record in `Received` state.
    pub fn new(tx: Arc<Transaction>, sender: Sender, now: Timestamp) -> Self {
        Self {
            tx,
            sender,
            state: ValidationState::Received,
            attempt: 0,
            expected: BTreeSet::new(),
            responded: BTreeSet::new(),
            verdicts: Vec::new(),
            created_at: now,
            dispatched_at: None,
        }
    }

    pub fn hash(&self) -> Hash {
        self.tx.hash()
    }

    /// Validators that have not answered yet.
    pub fn outstanding(&self) -> usize {
        self.expected.difference(&self.responded).count()
    }

    /// True once every expected validator has responded.
    pub fn all_responded(&self) -> bool {
        self.expected.is_subset(&self.responded)
    }

    /// Checks if the validation deadline has passed.
    ///
    /// The deadline starts at dispatch; records still waiting for a worker never time out.
    pub fn is_timed_out(&self, now: Timestamp, timeout_ms: u64) -> bool {
        match (self.state.is_in_flight(), self.dispatched_at) {
            (true, Some(at)) => now.saturating_sub(at) >= timeout_ms,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{MutableTransaction, Payload};

    fn create_record() -> ValidationRecord {
        let tx = MutableTransaction::new(Payload::InvokeCode { code: vec![1] })
            .into_immutable()
            .unwrap();
        ValidationRecord::new(Arc::new(tx), Sender::Nil, 1000)
    }

    #[test]
    fn test_new_record_is_received() {
        let record = create_record();
        assert_eq!(record.state, ValidationState::Received);
        assert_eq!(record.attempt, 0);
        assert!(record.dispatched_at.is_none());
    }

    #[test]
    fn test_received_record_never_times_out() {
        let record = create_record();
        assert!(!record.is_timed_out(1_000_000, 10));
    }

    #[test]
    fn test_dispatched_record_timeout_check() {
        let mut record = create_record();
        record.state = ValidationState::Dispatched;
        record.dispatched_at = Some(2000);

        assert!(!record.is_timed_out(2500, 1000));
        assert!(record.is_timed_out(3000, 1000));
        assert!(record.is_timed_out(9000, 1000));
    }

    #[test]
    fn test_outstanding_counts_missing_responses() {
        let mut record = create_record();
        record.expected.insert("a".into());
        record.expected.insert("b".into());
        record.responded.insert("a".into());

        assert_eq!(record.outstanding(), 1);
        assert!(!record.all_responded());

        record.responded.insert("b".into());
        assert!(record.all_responded());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ValidationState::Accepted.is_terminal());
        assert!(ValidationState::Rejected.is_terminal());
        assert!(ValidationState::Expired.is_terminal());
        assert!(!ValidationState::Aggregating.is_terminal());
        assert!(ValidationState::Aggregating.is_in_flight());
        assert!(!ValidationState::Received.is_in_flight());
    }

    #[test]
    fn test_nil_sender_default() {
        assert!(Sender::default().is_nil());
        assert!(!Sender::Api(CallerId::new()).is_nil());
    }
}
