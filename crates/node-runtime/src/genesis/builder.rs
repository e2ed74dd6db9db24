//! # Genesis Builder
//!
//! Creates and validates the opening ledger state for a shard.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use qc_06_txn_pool::{GenesisProvider, GenesisState, LedgerError};
use sha2::{Digest, Sha256};
use shared_types::{Address, Hash, ShardId};
use thiserror::Error;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

impl From<GenesisError> for LedgerError {
    fn from(err: GenesisError) -> Self {
        LedgerError::Backend(err.to_string())
    }
}

/// Genesis configuration.
#[derive(Debug, Clone, Default)]
pub struct GenesisConfig {
    /// Genesis timestamp (Unix milliseconds).
    /// If None, uses current time.
    pub timestamp: Option<u64>,

    /// Opening balances.
    pub allocations: Vec<(Address, u64)>,

    /// Extra data (max 32 bytes).
    pub extra_data: Vec<u8>,
}

impl GenesisConfig {
    /// Development configuration funding a single account.
    pub fn devnet(account: Address, balance: u64) -> Self {
        Self {
            allocations: vec![(account, balance)],
            extra_data: b"Quantum-Chain Devnet".to_vec(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.extra_data.len() > 32 {
            return Err(GenesisError::InvalidConfig(
                "Extra data exceeds 32 bytes".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.allocations.len());
        for (address, _) in &self.allocations {
            if !seen.insert(address) {
                return Err(GenesisError::InvalidConfig(format!(
                    "Duplicate allocation for {}",
                    hex::encode(address)
                )));
            }
        }

        let supply = self
            .allocations
            .iter()
            .try_fold(0u64, |total, (_, balance)| total.checked_add(*balance));
        if supply.is_none() {
            return Err(GenesisError::InvalidConfig(
                "Total supply overflows u64".to_string(),
            ));
        }

        Ok(())
    }
}

/// The genesis state with its content digest.
#[derive(Debug, Clone)]
pub struct GenesisBlock {
    /// State handed to the ledger.
    pub state: GenesisState,

    /// SHA-256 over shard, timestamp, allocations and extra data.
    pub digest: Hash,

    /// Sum of all opening balances.
    pub total_supply: u64,
}

/// Builder for genesis state.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    /// Create a new genesis builder with configuration.
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Build the genesis for `shard`.
    pub fn build(&self, shard: ShardId) -> Result<GenesisBlock, GenesisError> {
        self.config.validate()?;

        let timestamp = self.config.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });

        let state = GenesisState {
            shard,
            timestamp,
            allocations: self.config.allocations.clone(),
        };
        let total_supply = state.allocations.iter().map(|(_, balance)| balance).sum();
        let digest = compute_genesis_digest(&state, &self.config.extra_data);

        Ok(GenesisBlock {
            state,
            digest,
            total_supply,
        })
    }
}

impl GenesisProvider for GenesisBuilder {
    fn genesis(&self, shard: ShardId) -> Result<GenesisState, LedgerError> {
        Ok(self.build(shard)?.state)
    }
}

fn compute_genesis_digest(state: &GenesisState, extra_data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();

    hasher.update(state.shard.0.to_be_bytes());
    hasher.update(state.timestamp.to_be_bytes());
    for (address, balance) in &state.allocations {
        hasher.update(address);
        hasher.update(balance.to_be_bytes());
    }
    hasher.update(extra_data);

    hasher.finalize().into()
}
