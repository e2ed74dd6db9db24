//! # Node Configuration
//!
//! Shard selection, pool tuning and genesis allocations for one node.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_SHARD_ID` | `shard_id` |
//! | `QC_TXPOOL_MAX_WORKERS` | `txpool.max_workers` |
//! | `QC_TXPOOL_CAPACITY` | `txpool.max_pool_size` |
//! | `QC_TXPOOL_TIMEOUT_MS` | `txpool.validation_timeout_ms` |
//! | `QC_TXPOOL_BYPASS` | `txpool.bypass_ledger_check` |
//! | `QC_TXPOOL_FLUSH_ON_STOP` | `txpool.flush_on_stop` |
//! | `QC_GENESIS_ALLOC` | `genesis.allocations` (`<hex address>:<balance>,...`) |

use crate::genesis::GenesisConfig;
use qc_06_txn_pool::{TxPoolConfig, TxPoolError};
use shared_types::{Address, ShardId};

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Shard served by this node.
    pub shard_id: ShardId,
    /// Pool server configuration.
    pub txpool: TxPoolConfig,
    /// Genesis allocations for the ledger.
    pub genesis: GenesisConfig,
    /// Number of stateless validator actors to spawn.
    pub stateless_validators: usize,
    /// Spawn one stateful validator backed by the ledger.
    pub stateful_validator: bool,
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            stateless_validators: 1,
            stateful_validator: true,
            ..Self::default()
        };

        if let Some(raw) = lookup("QC_SHARD_ID") {
            config.shard_id = ShardId(parse_number("QC_SHARD_ID", &raw)?);
        }
        if let Some(raw) = lookup("QC_TXPOOL_MAX_WORKERS") {
            config.txpool.max_workers = parse_number("QC_TXPOOL_MAX_WORKERS", &raw)?;
        }
        if let Some(raw) = lookup("QC_TXPOOL_CAPACITY") {
            config.txpool.max_pool_size = parse_number("QC_TXPOOL_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("QC_TXPOOL_TIMEOUT_MS") {
            config.txpool.validation_timeout_ms = parse_number("QC_TXPOOL_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("QC_TXPOOL_BYPASS") {
            config.txpool.bypass_ledger_check = parse_flag("QC_TXPOOL_BYPASS", &raw)?;
        }
        if let Some(raw) = lookup("QC_TXPOOL_FLUSH_ON_STOP") {
            config.txpool.flush_on_stop = parse_flag("QC_TXPOOL_FLUSH_ON_STOP", &raw)?;
        }
        if let Some(raw) = lookup("QC_GENESIS_ALLOC") {
            config.genesis.allocations = parse_allocations(&raw)?;
        }

        Ok(config)
    }

    /// Checks the pool section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.txpool.validate().map_err(ConfigError::TxPool)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// An environment value could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// The pool section failed validation.
    TxPool(TxPoolError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {key}: {value:?}")
            }
            ConfigError::TxPool(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_allocations(raw: &str) -> Result<Vec<(Address, u64)>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "QC_GENESIS_ALLOC",
        value: raw.to_string(),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (address, balance) = entry.split_once(':').ok_or_else(invalid)?;
            let bytes = hex::decode(address.trim().trim_start_matches("0x")).map_err(|_| invalid())?;
            let address: Address = bytes.try_into().map_err(|_| invalid())?;
            let balance: u64 = balance.trim().parse().map_err(|_| invalid())?;
            Ok((address, balance))
        })
        .collect()
}
