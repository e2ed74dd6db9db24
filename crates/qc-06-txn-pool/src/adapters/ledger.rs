//! In-memory ledger adapter.
//!
//! Per-shard heights, balances and committed hashes behind a `RwLock`.
//! Suitable for tests and single-process nodes; durable storage lives
//! outside this crate.

use crate::domain::{Hash, LedgerError, ShardId, Transaction};
use crate::ports::{AccountState, GenesisProvider, GenesisState, Ledger};
use parking_lot::RwLock;
use shared_types::{Address, Payload};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ShardState {
    height: u64,
    accounts: HashMap<Address, AccountState>,
    committed: HashSet<Hash>,
}

/// Ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    shards: RwLock<HashMap<ShardId, ShardState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads genesis for one shard at height 0.
    ///
    /// # Errors
    /// `AlreadyInitialized` if the shard already has state.
    pub fn init_from_genesis(&self, genesis: &GenesisState) -> Result<(), LedgerError> {
        let mut shards = self.shards.write();
        if shards.contains_key(&genesis.shard) {
            return Err(LedgerError::AlreadyInitialized(genesis.shard));
        }

        let accounts = genesis
            .allocations
            .iter()
            .map(|(address, balance)| {
                (
                    *address,
                    AccountState {
                        balance: *balance,
                        nonce: 0,
                    },
                )
            })
            .collect();
        shards.insert(
            genesis.shard,
            ShardState {
                height: 0,
                accounts,
                committed: HashSet::new(),
            },
        );

        info!(
            shard = %genesis.shard,
            accounts = genesis.allocations.len(),
            "Ledger initialized from genesis"
        );
        Ok(())
    }

    /// Fetches genesis from `provider` and loads it.
    pub fn bootstrap(&self, provider: &dyn GenesisProvider, shard: ShardId) -> Result<(), LedgerError> {
        let genesis = provider.genesis(shard)?;
        self.init_from_genesis(&genesis)
    }

    /// Applies a block of transactions and advances the height.
    ///
    /// Payers are charged `total_cost`, transfers credit the recipient and
    /// every hash is marked committed. Returns the new height.
    pub fn commit_block(&self, shard: ShardId, txs: &[&Transaction]) -> Result<u64, LedgerError> {
        let mut shards = self.shards.write();
        let state = shards
            .get_mut(&shard)
            .ok_or(LedgerError::NotInitialized(shard))?;

        for tx in txs {
            let payer = state.accounts.entry(*tx.payer()).or_default();
            payer.balance = payer.balance.saturating_sub(tx.total_cost());
            payer.nonce = payer.nonce.max(tx.nonce().saturating_add(1));

            if let Payload::Transfer { to, amount } = tx.payload() {
                let recipient = state.accounts.entry(*to).or_default();
                recipient.balance = recipient.balance.saturating_add(*amount);
            }
            state.committed.insert(tx.hash());
        }
        state.height += 1;

        debug!(shard = %shard, height = state.height, txs = txs.len(), "Block committed");
        Ok(state.height)
    }

    /// Overwrites one account balance.
    pub fn set_balance(&self, shard: ShardId, address: Address, balance: u64) -> Result<(), LedgerError> {
        let mut shards = self.shards.write();
        let state = shards
            .get_mut(&shard)
            .ok_or(LedgerError::NotInitialized(shard))?;
        state.accounts.entry(address).or_default().balance = balance;
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn current_height(&self, shard: ShardId) -> Result<u64, LedgerError> {
        self.shards
            .read()
            .get(&shard)
            .map(|s| s.height)
            .ok_or(LedgerError::NotInitialized(shard))
    }

    fn account(&self, shard: ShardId, address: &Address) -> Result<Option<AccountState>, LedgerError> {
        self.shards
            .read()
            .get(&shard)
            .map(|s| s.accounts.get(address).copied())
            .ok_or(LedgerError::NotInitialized(shard))
    }

    fn contains_transaction(&self, shard: ShardId, hash: &Hash) -> Result<bool, LedgerError> {
        self.shards
            .read()
            .get(&shard)
            .map(|s| s.committed.contains(hash))
            .ok_or(LedgerError::NotInitialized(shard))
    }
}

/// Genesis provider returning fixed allocations for any shard.
#[derive(Clone, Debug, Default)]
pub struct StaticGenesis {
    pub timestamp: u64,
    pub allocations: Vec<(Address, u64)>,
}

impl StaticGenesis {
    pub fn new(allocations: Vec<(Address, u64)>) -> Self {
        Self {
            timestamp: 0,
            allocations,
        }
    }
}

impl GenesisProvider for StaticGenesis {
    fn genesis(&self, shard: ShardId) -> Result<GenesisState, LedgerError> {
        Ok(GenesisState {
            shard,
            timestamp: self.timestamp,
            allocations: self.allocations.clone(),
        })
    }
}
