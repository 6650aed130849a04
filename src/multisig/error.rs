//! Errors raised by the custody engine

use crate::abi::AbiError;
use crate::crypto::Address;
use thiserror::Error;

/// Errors related to multisig operations
///
/// Every variant aborts the operation that raised it with no state change.
/// A failing outbound call is not an error; it is reported through
/// [`ExecutionOutcome::Failed`](crate::multisig::ExecutionOutcome::Failed).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Not an owner: {0}")]
    Unauthorized(Address),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(u64),
    #[error("Owner not found: {0}")]
    OwnerNotFound(Address),
    #[error("Transaction already executed: {0}")]
    AlreadyExecuted(u64),
    #[error("Transaction {id} not confirmed: have {have}, need {need}")]
    NotConfirmed { id: u64, have: usize, need: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Duplicate owner: {0}")]
    DuplicateOwner(Address),
    #[error("Null address not allowed")]
    NullAddress,
    #[error("Reentrant call rejected: transaction {0} is executing")]
    Reentrant(u64),
    #[error("Malformed management call: {0}")]
    Decode(#[from] AbiError),
}
