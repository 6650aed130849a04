//! Wallet events
//!
//! An append-only observation channel. The engine writes here and never
//! reads back.

use crate::crypto::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something observable the wallet did
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletEvent {
    Submission { transaction_id: u64 },
    Confirmation { owner: Address, transaction_id: u64 },
    Revocation { owner: Address, transaction_id: u64 },
    Execution { transaction_id: u64 },
    ExecutionFailure { transaction_id: u64 },
    Deposit { sender: Address, value: u128 },
    OwnerAddition { owner: Address },
    OwnerRemoval { owner: Address },
    RequirementChange { threshold: usize },
}

/// An event with its position and time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,
    pub event: WalletEvent,
    pub timestamp: DateTime<Utc>,
}

/// Ordered event history of one wallet
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: WalletEvent) {
        log::debug!("Wallet event: {:?}", event);
        self.records.push(EventRecord {
            sequence: self.records.len() as u64,
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Drop every record from position `len` on
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
