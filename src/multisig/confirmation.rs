//! Confirmation matrix
//!
//! Sparse relation between transaction IDs and the owners who confirmed
//! them. Counting always goes through the registry so that confirmations from
//! owners who have since been removed are ignored.

use crate::crypto::Address;
use crate::multisig::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Confirmers of one transaction, as stored in snapshots
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationEntry {
    pub transaction_id: u64,
    pub owners: Vec<Address>,
}

/// (transaction, owner) pairs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationMatrix {
    confirmed: BTreeMap<u64, BTreeSet<Address>>,
}

impl ConfirmationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from snapshot entries
    pub fn from_entries(entries: Vec<ConfirmationEntry>) -> Self {
        let mut matrix = Self::new();
        for entry in entries {
            for owner in entry.owners {
                matrix.confirm(entry.transaction_id, owner);
            }
        }
        matrix
    }

    /// Record a confirmation. Returns false if it was already present.
    pub fn confirm(&mut self, id: u64, owner: Address) -> bool {
        self.confirmed.entry(id).or_default().insert(owner)
    }

    /// Drop a confirmation. Returns false if there was none.
    pub fn revoke(&mut self, id: u64, owner: &Address) -> bool {
        let Some(owners) = self.confirmed.get_mut(&id) else {
            return false;
        };
        let removed = owners.remove(owner);
        if owners.is_empty() {
            self.confirmed.remove(&id);
        }
        removed
    }

    /// Whether `owner` has a recorded confirmation, current owner or not
    pub fn is_confirmed_by(&self, id: u64, owner: &Address) -> bool {
        self.confirmed
            .get(&id)
            .map_or(false, |owners| owners.contains(owner))
    }

    /// Confirmations from current owners
    pub fn count(&self, id: u64, registry: &OwnerRegistry) -> usize {
        self.confirmed.get(&id).map_or(0, |owners| {
            owners.iter().filter(|o| registry.is_owner(o)).count()
        })
    }

    /// Current owners who confirmed, in registry order
    pub fn confirmations(&self, id: u64, registry: &OwnerRegistry) -> Vec<Address> {
        let Some(confirmed) = self.confirmed.get(&id) else {
            return Vec::new();
        };
        registry
            .owners()
            .iter()
            .filter(|o| confirmed.contains(*o))
            .copied()
            .collect()
    }

    /// Snapshot form
    pub fn entries(&self) -> Vec<ConfirmationEntry> {
        self.confirmed
            .iter()
            .map(|(id, owners)| ConfirmationEntry {
                transaction_id: *id,
                owners: owners.iter().copied().collect(),
            })
            .collect()
    }
}
