//! # Validators
//!
//! A closed set of validator kinds behind one `validate` contract.
//!
//! | Kind | Capability | Cost |
//! |------|------------|------|
//! | `StatelessValidator` | `Stateless` | Pure, runs inline |
//! | `StatefulValidator` | `Stateful` | Ledger lookups, runs on the blocking pool |

pub mod actor;
pub mod stateful;
pub mod stateless;

pub use actor::*;
pub use stateful::*;
pub use stateless::*;

use crate::domain::{Capability, ShardId, Transaction, Verdict};
use std::sync::Arc;
use tokio::task::JoinError;

/// A validator implementation.
#[derive(Clone, Debug)]
pub enum ValidatorKind {
    Stateless(StatelessValidator),
    Stateful(StatefulValidator),
}

impl ValidatorKind {
    pub fn capability(&self) -> Capability {
        match self {
            ValidatorKind::Stateless(_) => Capability::Stateless,
            ValidatorKind::Stateful(_) => Capability::Stateful,
        }
    }

    /// Validates `tx` for `shard`.
    ///
    /// Fails only if the blocking task panicked.
    pub async fn validate(&self, tx: Arc<Transaction>, shard: ShardId) -> Result<Verdict, JoinError> {
        match self {
            ValidatorKind::Stateless(v) => Ok(v.validate(&tx)),
            ValidatorKind::Stateful(v) => {
                let v = v.clone();
                tokio::task::spawn_blocking(move || v.validate(&tx, shard)).await
            }
        }
    }
}
