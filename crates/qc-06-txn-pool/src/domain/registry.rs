//! Validator registry.
//!
//! Maps validator identity to capability and a reachability handle. Dispatch
//! works from `snapshot()`, a copy taken at dispatch time, so registration
//! churn never changes the expected set of a transaction already in flight.

use super::entities::{Capability, ValidatorId};
use super::errors::TxPoolError;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A registered validator.
#[derive(Clone, Debug)]
pub struct ValidatorEntry<H> {
    pub id: ValidatorId,
    pub capability: Capability,
    pub handle: H,
}

/// Live validator set keyed by identity.
///
/// `H` is whatever the owner needs to reach the validator.
#[derive(Debug)]
pub struct ValidatorRegistry<H> {
    entries: RwLock<BTreeMap<ValidatorId, ValidatorEntry<H>>>,
}

impl<H: Clone> ValidatorRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers a validator, replacing any entry with the same identity.
    ///
    /// Returns the replaced entry.
    pub fn register(
        &self,
        id: ValidatorId,
        capability: Capability,
        handle: H,
    ) -> Option<ValidatorEntry<H>> {
        let entry = ValidatorEntry {
            id: id.clone(),
            capability,
            handle,
        };
        self.entries.write().insert(id, entry)
    }

    /// Removes a validator.
    ///
    /// # Errors
    /// `UnknownValidator` if the identity is not registered.
    pub fn unregister(&self, id: &ValidatorId) -> Result<ValidatorEntry<H>, TxPoolError> {
        self.entries
            .write()
            .remove(id)
            .ok_or_else(|| TxPoolError::UnknownValidator(id.clone()))
    }

    /// Copy of the live set, ordered by identity.
    pub fn snapshot(&self) -> Vec<ValidatorEntry<H>> {
        self.entries.read().values().cloned().collect()
    }

    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn count_by(&self, capability: Capability) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.capability == capability)
            .count()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<H: Clone> Default for ValidatorRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
