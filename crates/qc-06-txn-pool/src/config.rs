//! Configuration for the transaction pool

use crate::domain::{EmptyRegistryPolicy, TxPoolError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on concurrent validations.
pub const MAX_WORKER_NUM: usize = 64;

/// Default pending + verified capacity.
pub const MAX_POOL_SIZE: usize = 40_960;

/// Pool configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxPoolConfig {
    /// Maximum transactions under validation at once
    pub max_workers: usize,
    /// Maximum pending + verified transactions
    pub max_pool_size: usize,
    /// Per-transaction deadline, counted from dispatch (ms)
    pub validation_timeout_ms: u64,
    /// Timeout tracker tick (ms)
    pub timeout_check_interval_ms: u64,
    /// How long `stop()` waits for in-flight validations (ms)
    pub stop_grace_period_ms: u64,
    /// Per-endpoint inbox capacity
    pub mailbox_capacity: usize,
    /// Skip the ledger readiness check at startup (test mode)
    pub bypass_ledger_check: bool,
    /// Resolution when no validator is registered at dispatch
    pub empty_registry_policy: EmptyRegistryPolicy,
    /// Hand pool contents to the flush sink on stop
    pub flush_on_stop: bool,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKER_NUM,
            max_pool_size: MAX_POOL_SIZE,
            validation_timeout_ms: 9_000,
            timeout_check_interval_ms: 100,
            stop_grace_period_ms: 3_000,
            mailbox_capacity: 4_096,
            bypass_ledger_check: false,
            empty_registry_policy: EmptyRegistryPolicy::Reject,
            flush_on_stop: false,
        }
    }
}

impl TxPoolConfig {
    /// Small bounds and short timers, ledger check bypassed.
    pub fn for_testing() -> Self {
        Self {
            max_workers: 4,
            max_pool_size: 64,
            validation_timeout_ms: 500,
            timeout_check_interval_ms: 10,
            stop_grace_period_ms: 200,
            mailbox_capacity: 64,
            bypass_ledger_check: true,
            ..Self::default()
        }
    }

    /// Rejects zero bounds and a tracker tick longer than the deadline.
    pub fn validate(&self) -> Result<(), TxPoolError> {
        if self.max_workers == 0 {
            return Err(TxPoolError::InvalidConfig("max_workers must be > 0".into()));
        }
        if self.max_pool_size == 0 {
            return Err(TxPoolError::InvalidConfig(
                "max_pool_size must be > 0".into(),
            ));
        }
        if self.mailbox_capacity == 0 {
            return Err(TxPoolError::InvalidConfig(
                "mailbox_capacity must be > 0".into(),
            ));
        }
        if self.validation_timeout_ms == 0 {
            return Err(TxPoolError::InvalidConfig(
                "validation_timeout_ms must be > 0".into(),
            ));
        }
        if self.timeout_check_interval_ms == 0
            || self.timeout_check_interval_ms > self.validation_timeout_ms
        {
            return Err(TxPoolError::InvalidConfig(format!(
                "timeout_check_interval_ms must be in 1..={}",
                self.validation_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn timeout_check_interval(&self) -> Duration {
        Duration::from_millis(self.timeout_check_interval_ms)
    }

    pub fn stop_grace_period(&self) -> Duration {
        Duration::from_millis(self.stop_grace_period_ms)
    }
}
