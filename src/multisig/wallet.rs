//! Multi-signature wallet
//!
//! The execution engine. Owners submit outbound calls, confirm or revoke
//! them, and once enough current owners have confirmed, the call is executed
//! through the [`Ledger`]. Execution happens automatically on the
//! confirmation that reaches the threshold and can be retried explicitly
//! after a failure.
//!
//! Every mutating operation holds the wallet lock for its whole duration, so
//! callers on other threads queue behind it. While an outbound call is in
//! flight the calling thread still holds the lock; anything the callee tries
//! to do to the wallet from that thread is rejected with
//! [`MultisigError::Reentrant`].

use crate::crypto::Address;
use crate::ledger::{CallError, Ledger};
use crate::multisig::config::WalletConfig;
use crate::multisig::confirmation::{ConfirmationEntry, ConfirmationMatrix};
use crate::multisig::error::MultisigError;
use crate::multisig::events::{EventLog, EventRecord, WalletEvent};
use crate::multisig::management::ManagementCall;
use crate::multisig::registry::OwnerRegistry;
use crate::multisig::transaction::{Transaction, TransactionLog, TransactionStatus};
use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use thiserror::Error;

/// Why an execution attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    #[error("Call failed: {0}")]
    Call(#[from] CallError),
    #[error("Management call rejected: {0}")]
    Management(#[from] MultisigError),
}

/// Result of an execution attempt that passed all checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The call succeeded and the transaction is now executed
    Executed,
    /// The call failed; the transaction stays eligible for retry
    Failed(CallFailure),
}

impl ExecutionOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, ExecutionOutcome::Executed)
    }
}

/// Persistable wallet state. Events are not part of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: Address,
    pub label: Option<String>,
    pub owners: Vec<Address>,
    pub threshold: usize,
    pub transactions: Vec<Transaction>,
    pub confirmations: Vec<ConfirmationEntry>,
    pub taken_at: DateTime<Utc>,
}

struct WalletState {
    registry: OwnerRegistry,
    transactions: TransactionLog,
    confirmations: ConfirmationMatrix,
    events: EventLog,
    /// Transaction whose outbound call is in flight
    executing: Option<u64>,
}

impl WalletState {
    fn ensure_idle(&self) -> Result<(), MultisigError> {
        match self.executing {
            Some(id) => Err(MultisigError::Reentrant(id)),
            None => Ok(()),
        }
    }

    fn ensure_owner(&self, who: &Address) -> Result<(), MultisigError> {
        if !self.registry.is_owner(who) {
            return Err(MultisigError::Unauthorized(*who));
        }
        Ok(())
    }

    fn ensure_not_executed(&self, id: u64) -> Result<(), MultisigError> {
        if self.transactions.get(id)?.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        Ok(())
    }

    fn confirmation_count(&self, id: u64) -> usize {
        self.confirmations.count(id, &self.registry)
    }

    fn is_confirmed(&self, id: u64) -> bool {
        self.confirmation_count(id) >= self.registry.threshold()
    }

    /// Returns false if the owner had already confirmed
    fn record_confirmation(&mut self, id: u64, owner: Address) -> bool {
        if !self.confirmations.confirm(id, owner) {
            return false;
        }
        self.events.push(WalletEvent::Confirmation {
            owner,
            transaction_id: id,
        });
        true
    }

    fn status(&self, id: u64) -> Result<TransactionStatus, MultisigError> {
        let tx = self.transactions.get(id)?;
        Ok(if tx.executed {
            TransactionStatus::Executed
        } else if self.is_confirmed(id) {
            TransactionStatus::Eligible
        } else {
            TransactionStatus::Pending
        })
    }
}

/// Marks an outbound call as in flight; cleared on every exit path
struct ExecutionGuard<'a> {
    state: &'a RefCell<WalletState>,
}

impl<'a> ExecutionGuard<'a> {
    fn enter(state: &'a RefCell<WalletState>, id: u64) -> Self {
        state.borrow_mut().executing = Some(id);
        Self { state }
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.executing = None;
        }
    }
}

/// A multi-signature wallet
pub struct MultisigWallet {
    /// Account holding the custody balance on the ledger
    address: Address,
    /// Optional human-readable label
    label: Option<String>,
    state: ReentrantMutex<RefCell<WalletState>>,
}

impl MultisigWallet {
    /// Create a wallet from its configuration
    pub fn new(config: WalletConfig) -> Result<Self, MultisigError> {
        let registry = config.registry()?;
        let address = config.wallet_address();

        log::info!(
            "Multisig wallet {} created ({})",
            address,
            registry.description()
        );

        Ok(Self::from_parts(
            address,
            config.label,
            registry,
            TransactionLog::new(),
            ConfirmationMatrix::new(),
        ))
    }

    /// Rebuild a wallet from a snapshot
    pub fn restore(snapshot: WalletSnapshot) -> Result<Self, MultisigError> {
        let registry = OwnerRegistry::new(snapshot.owners, snapshot.threshold)?;
        let transactions = TransactionLog::from_transactions(snapshot.transactions)?;

        if let Some(entry) = snapshot
            .confirmations
            .iter()
            .find(|e| transactions.get(e.transaction_id).is_err())
        {
            return Err(MultisigError::InvalidConfiguration(format!(
                "confirmation for unknown transaction {}",
                entry.transaction_id
            )));
        }
        let confirmations = ConfirmationMatrix::from_entries(snapshot.confirmations);

        log::info!(
            "Multisig wallet {} restored with {} transactions",
            snapshot.address,
            transactions.len()
        );

        Ok(Self::from_parts(
            snapshot.address,
            snapshot.label,
            registry,
            transactions,
            confirmations,
        ))
    }

    fn from_parts(
        address: Address,
        label: Option<String>,
        registry: OwnerRegistry,
        transactions: TransactionLog,
        confirmations: ConfirmationMatrix,
    ) -> Self {
        Self {
            address,
            label,
            state: ReentrantMutex::new(RefCell::new(WalletState {
                registry,
                transactions,
                confirmations,
                events: EventLog::new(),
                executing: None,
            })),
        }
    }

    /// Get the wallet address
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Propose an outbound call. The submitter's confirmation is recorded
    /// immediately, so with a threshold of 1 the call executes right away.
    pub fn submit(
        &self,
        submitter: Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
        ledger: &mut dyn Ledger,
    ) -> Result<u64, MultisigError> {
        let lock = self.state.lock();

        let (id, eligible) = {
            let mut state = lock.borrow_mut();
            state.ensure_idle()?;
            state.ensure_owner(&submitter)?;
            if destination.is_zero() {
                return Err(MultisigError::NullAddress);
            }

            let id = state
                .transactions
                .append(destination, value, data, submitter);
            state.events.push(WalletEvent::Submission { transaction_id: id });
            state.record_confirmation(id, submitter);

            log::info!(
                "Transaction {} submitted by {}: {} units to {}",
                id,
                submitter,
                value,
                destination
            );
            (id, state.is_confirmed(id))
        };

        if eligible {
            self.attempt(&lock, id, ledger)?;
        }
        Ok(id)
    }

    /// Confirm a transaction.
    ///
    /// Returns the outcome when this confirmation made the transaction
    /// eligible and an execution was attempted. Confirming twice is a no-op.
    pub fn confirm(
        &self,
        id: u64,
        owner: Address,
        ledger: &mut dyn Ledger,
    ) -> Result<Option<ExecutionOutcome>, MultisigError> {
        let lock = self.state.lock();

        let eligible = {
            let mut state = lock.borrow_mut();
            state.ensure_idle()?;
            state.ensure_owner(&owner)?;
            state.ensure_not_executed(id)?;

            if !state.record_confirmation(id, owner) {
                log::debug!("Owner {} already confirmed transaction {}", owner, id);
                return Ok(None);
            }
            log::info!(
                "Transaction {} confirmed by {} ({}/{})",
                id,
                owner,
                state.confirmation_count(id),
                state.registry.threshold()
            );
            state.is_confirmed(id)
        };

        if !eligible {
            return Ok(None);
        }
        self.attempt(&lock, id, ledger).map(Some)
    }

    /// Withdraw a confirmation. Revoking an absent confirmation is a no-op.
    pub fn revoke(&self, id: u64, owner: Address) -> Result<(), MultisigError> {
        let lock = self.state.lock();
        let mut state = lock.borrow_mut();
        state.ensure_idle()?;
        state.ensure_owner(&owner)?;
        state.ensure_not_executed(id)?;

        if state.confirmations.revoke(id, &owner) {
            state.events.push(WalletEvent::Revocation {
                owner,
                transaction_id: id,
            });
            log::info!("Transaction {} revoked by {}", id, owner);
        } else {
            log::debug!("Owner {} had not confirmed transaction {}", owner, id);
        }
        Ok(())
    }

    /// Attempt execution of a confirmed transaction
    ///
    /// A failing call is not an error: it returns
    /// [`ExecutionOutcome::Failed`] and leaves the transaction retryable.
    pub fn execute(
        &self,
        id: u64,
        caller: Address,
        ledger: &mut dyn Ledger,
    ) -> Result<ExecutionOutcome, MultisigError> {
        let lock = self.state.lock();

        {
            let state = lock.borrow();
            state.ensure_idle()?;
            state.ensure_owner(&caller)?;
            state.ensure_not_executed(id)?;

            let have = state.confirmation_count(id);
            let need = state.registry.threshold();
            if have < need {
                return Err(MultisigError::NotConfirmed { id, have, need });
            }
        }

        self.attempt(&lock, id, ledger)
    }

    /// Accept native value into custody. No confirmation needed.
    pub fn deposit(
        &self,
        sender: Address,
        value: u128,
        ledger: &mut dyn Ledger,
    ) -> Result<(), CallError> {
        // Value from ourselves does not move
        if value == 0 || sender == self.address {
            return Ok(());
        }

        let lock = self.state.lock();
        ledger.transfer(&sender, &self.address, value)?;
        lock.borrow_mut()
            .events
            .push(WalletEvent::Deposit { sender, value });

        log::info!("Deposit of {} units from {}", value, sender);
        Ok(())
    }

    fn attempt(
        &self,
        cell: &RefCell<WalletState>,
        id: u64,
        ledger: &mut dyn Ledger,
    ) -> Result<ExecutionOutcome, MultisigError> {
        let (destination, value, data) = {
            let state = cell.borrow();
            let tx = state.transactions.get(id)?;
            (tx.destination, tx.value, tx.data.clone())
        };

        // Only deposits can be logged while the call is in flight
        let mark = cell.borrow().events.len();
        let guard = ExecutionGuard::enter(cell, id);
        let result = if destination == self.address {
            self.apply_management(cell, &data)
        } else {
            ledger
                .call(&self.address, &destination, value, &data)
                .map_err(CallFailure::from)
        };

        let outcome = {
            let mut state = cell.borrow_mut();
            match result {
                Ok(()) => {
                    state.transactions.mark_executed(id)?;
                    state.events.push(WalletEvent::Execution { transaction_id: id });
                    log::info!("Transaction {} executed", id);
                    ExecutionOutcome::Executed
                }
                Err(failure) => {
                    // The ledger rolled those deposits back
                    state.events.truncate(mark);
                    state.transactions.record_failure(id)?;
                    state
                        .events
                        .push(WalletEvent::ExecutionFailure { transaction_id: id });
                    log::warn!("Transaction {} failed: {}", id, failure);
                    ExecutionOutcome::Failed(failure)
                }
            }
        };

        drop(guard);
        Ok(outcome)
    }

    fn apply_management(
        &self,
        cell: &RefCell<WalletState>,
        data: &[u8],
    ) -> Result<(), CallFailure> {
        // Plain value sent to ourselves
        if data.is_empty() {
            return Ok(());
        }

        let call = ManagementCall::decode(data).map_err(MultisigError::from)?;
        let mut state = cell.borrow_mut();
        let events = call.apply(&mut state.registry)?;
        for event in events {
            state.events.push(event);
        }

        log::info!(
            "Applied {:?}, committee is now {}",
            call,
            state.registry.description()
        );
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn read<R>(&self, f: impl FnOnce(&WalletState) -> R) -> R {
        let lock = self.state.lock();
        let state = lock.borrow();
        f(&state)
    }

    pub fn owners(&self) -> Vec<Address> {
        self.read(|s| s.registry.owners().to_vec())
    }

    pub fn threshold(&self) -> usize {
        self.read(|s| s.registry.threshold())
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.read(|s| s.registry.is_owner(address))
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        self.read(|s| s.registry.description())
    }

    /// Get a transaction by ID
    pub fn transaction(&self, id: u64) -> Result<Transaction, MultisigError> {
        self.read(|s| s.transactions.get(id).cloned())
    }

    pub fn status(&self, id: u64) -> Result<TransactionStatus, MultisigError> {
        self.read(|s| s.status(id))
    }

    /// Confirmations from current owners; 0 for unknown IDs
    pub fn confirmation_count(&self, id: u64) -> usize {
        self.read(|s| s.confirmation_count(id))
    }

    pub fn is_confirmed(&self, id: u64) -> bool {
        self.read(|s| s.is_confirmed(id))
    }

    /// Current owners who confirmed, in owner order
    pub fn confirmations(&self, id: u64) -> Vec<Address> {
        self.read(|s| s.confirmations.confirmations(id, &s.registry))
    }

    pub fn transaction_count(&self, include_pending: bool, include_executed: bool) -> usize {
        self.read(|s| s.transactions.count(include_pending, include_executed))
    }

    /// IDs at positions `from..to` of the filtered transaction list
    pub fn transaction_ids(
        &self,
        from: usize,
        to: usize,
        include_pending: bool,
        include_executed: bool,
    ) -> Vec<u64> {
        self.read(|s| {
            s.transactions
                .ids(from, to, include_pending, include_executed)
        })
    }

    /// Native value held in custody
    pub fn balance(&self, ledger: &dyn Ledger) -> u128 {
        ledger.balance_of(&self.address)
    }

    /// Whether an outbound call is in flight
    pub fn is_executing(&self) -> bool {
        self.read(|s| s.executing.is_some())
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.read(|s| s.events.records().to_vec())
    }

    /// Events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.read(|s| s.events.since(from).to_vec())
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.read(|s| WalletSnapshot {
            address: self.address,
            label: self.label.clone(),
            owners: s.registry.owners().to_vec(),
            threshold: s.registry.threshold(),
            transactions: s.transactions.transactions().to_vec(),
            confirmations: s.confirmations.entries(),
            taken_at: Utc::now(),
        })
    }
}

impl fmt::Debug for MultisigWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisigWallet")
            .field("address", &self.address)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
