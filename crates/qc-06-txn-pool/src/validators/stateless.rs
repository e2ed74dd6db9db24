//! Stateless validation: well-formedness without chain state.

use crate::domain::{Transaction, Verdict};

/// Largest accepted payload, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Most signature groups a transaction may carry.
pub const MAX_SIGS: usize = 16;

/// Smallest gas limit that covers intrinsic cost.
pub const MIN_GAS_LIMIT: u64 = 20_000;

/// Structural checks. Cheap, pure, never touches the ledger.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatelessValidator;

impl StatelessValidator {
    pub fn validate(&self, tx: &Transaction) -> Verdict {
        match self.check(tx) {
            Ok(()) => Verdict::Pass,
            Err(reason) => Verdict::Fail(reason),
        }
    }

    fn check(&self, tx: &Transaction) -> Result<(), String> {
        if tx.tx_type() != tx.payload().tx_type() {
            return Err(format!(
                "type {:?} does not match payload {:?}",
                tx.tx_type(),
                tx.payload().tx_type()
            ));
        }

        let size = tx.payload().byte_len();
        if size > MAX_PAYLOAD_BYTES {
            return Err(format!("payload {size} bytes exceeds {MAX_PAYLOAD_BYTES}"));
        }

        let sigs = tx.sigs();
        if sigs.is_empty() {
            return Err("unsigned transaction".into());
        }
        if sigs.len() > MAX_SIGS {
            return Err(format!("{} signatures exceeds {MAX_SIGS}", sigs.len()));
        }
        for (i, sig) in sigs.iter().enumerate() {
            let m = usize::from(sig.m);
            if m == 0 || m > sig.pub_keys.len() {
                return Err(format!(
                    "sig {i}: threshold {m} outside 1..={}",
                    sig.pub_keys.len()
                ));
            }
            if sig.sig_data.len() < m {
                return Err(format!(
                    "sig {i}: {} signatures for threshold {m}",
                    sig.sig_data.len()
                ));
            }
        }

        if tx.gas_limit() < MIN_GAS_LIMIT {
            return Err(format!(
                "gas limit {} below {MIN_GAS_LIMIT}",
                tx.gas_limit()
            ));
        }
        Ok(())
    }
}
