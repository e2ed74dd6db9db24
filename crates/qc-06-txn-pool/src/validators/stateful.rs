//! Stateful validation against ledger state.

use crate::domain::{ShardId, Transaction, Verdict};
use crate::ports::Ledger;
use shared_types::short_hex;
use std::sync::Arc;

/// Checks a transaction against the ledger of the pool's shard.
///
/// Lookups may block; run it off the async executor.
#[derive(Clone)]
pub struct StatefulValidator {
    ledger: Arc<dyn Ledger>,
}

impl StatefulValidator {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub fn validate(&self, tx: &Transaction, shard: ShardId) -> Verdict {
        match self.check(tx, shard) {
            Ok(()) => Verdict::Pass,
            Err(reason) => Verdict::Fail(reason),
        }
    }

    fn check(&self, tx: &Transaction, shard: ShardId) -> Result<(), String> {
        if tx.shard_id() != shard {
            return Err(format!("transaction for {} sent to {shard}", tx.shard_id()));
        }

        let committed = self
            .ledger
            .contains_transaction(shard, &tx.hash())
            .map_err(|e| e.to_string())?;
        if committed {
            return Err(format!("{} already committed", short_hex(&tx.hash())));
        }

        let account = self
            .ledger
            .account(shard, tx.payer())
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "unknown payer".to_string())?;

        let cost = tx.total_cost();
        if account.balance < cost {
            return Err(format!(
                "balance {} below cost {cost}",
                account.balance
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StatefulValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulValidator").finish_non_exhaustive()
    }
}
