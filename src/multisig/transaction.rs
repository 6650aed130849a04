//! Submitted transactions
//!
//! An append-only, sequentially indexed record of every outbound call the
//! owners have proposed. Entries are never removed; execution only flips the
//! `executed` flag.

use crate::crypto::Address;
use crate::multisig::error::MultisigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A proposed outbound call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Sequential ID, starting at 0
    pub id: u64,
    /// Call target
    pub destination: Address,
    /// Native value sent with the call
    pub value: u128,
    /// Opaque call payload
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    /// Set once, on the first successful execution
    pub executed: bool,
    /// Owner who submitted it
    pub submitter: Address,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// When it executed successfully
    pub executed_at: Option<DateTime<Utc>>,
    /// Number of execution attempts that failed
    pub failed_attempts: u32,
}

/// Where a transaction stands
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Fewer confirmations than the threshold
    Pending,
    /// Enough confirmations, not yet executed (possibly after a failed attempt)
    Eligible,
    /// Executed successfully; terminal
    Executed,
}

/// Append-only transaction record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored transactions.
    ///
    /// IDs must be exactly `0..n` in order.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Result<Self, MultisigError> {
        for (index, tx) in transactions.iter().enumerate() {
            if tx.id != index as u64 {
                return Err(MultisigError::InvalidConfiguration(format!(
                    "transaction at position {} has id {}",
                    index, tx.id
                )));
            }
        }
        Ok(Self { transactions })
    }

    /// Store a new transaction and return its ID
    pub fn append(
        &mut self,
        destination: Address,
        value: u128,
        data: Vec<u8>,
        submitter: Address,
    ) -> u64 {
        let id = self.transactions.len() as u64;
        self.transactions.push(Transaction {
            id,
            destination,
            value,
            data,
            executed: false,
            submitter,
            submitted_at: Utc::now(),
            executed_at: None,
            failed_attempts: 0,
        });
        id
    }

    /// Get a transaction by ID
    pub fn get(&self, id: u64) -> Result<&Transaction, MultisigError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get(index))
            .ok_or(MultisigError::TransactionNotFound(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Transaction, MultisigError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get_mut(index))
            .ok_or(MultisigError::TransactionNotFound(id))
    }

    /// Mark as executed. Only the first call has any effect.
    pub fn mark_executed(&mut self, id: u64) -> Result<(), MultisigError> {
        let tx = self.get_mut(id)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        tx.executed = true;
        tx.executed_at = Some(Utc::now());
        Ok(())
    }

    /// Count a failed execution attempt
    pub fn record_failure(&mut self, id: u64) -> Result<(), MultisigError> {
        let tx = self.get_mut(id)?;
        tx.failed_attempts = tx.failed_attempts.saturating_add(1);
        Ok(())
    }

    /// All transactions in ID order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn filtered(
        &self,
        include_pending: bool,
        include_executed: bool,
    ) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |tx| (include_pending && !tx.executed) || (include_executed && tx.executed))
    }

    /// Number of transactions matching the filters
    pub fn count(&self, include_pending: bool, include_executed: bool) -> usize {
        self.filtered(include_pending, include_executed).count()
    }

    /// IDs of matching transactions, positions `from..to` of the filtered list
    pub fn ids(
        &self,
        from: usize,
        to: usize,
        include_pending: bool,
        include_executed: bool,
    ) -> Vec<u64> {
        self.filtered(include_pending, include_executed)
            .skip(from)
            .take(to.saturating_sub(from))
            .map(|tx| tx.id)
            .collect()
    }
}
