//! The ledger the custody engine lives on
//!
//! The engine never moves value or runs foreign code itself. Every outbound
//! call goes through the [`Ledger`] trait, which reports only success or
//! failure. [`Chain`] is an in-memory ledger with native balances and
//! deployable contracts, used to run the engine end to end.
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::Address;
//! use multisig_custody::ledger::{Chain, Ledger};
//!
//! let alice = Address::from_label("alice");
//! let bob = Address::from_label("bob");
//!
//! let mut chain = Chain::new();
//! chain.fund(&alice, 100).unwrap();
//! chain.transfer(&alice, &bob, 40).unwrap();
//!
//! assert_eq!(chain.balance_of(&alice), 60);
//! assert_eq!(chain.balance_of(&bob), 40);
//! ```

pub mod chain;

pub use chain::{CallContext, Chain, Contract, ContractClone, MAX_CALL_DEPTH};

use crate::crypto::Address;
use thiserror::Error;

/// Why an outbound call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Balance overflow crediting {0}")]
    BalanceOverflow(Address),
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("Call depth exceeded: {0} (max: {1})")]
    CallDepthExceeded(usize, usize),
    #[error("Reentrancy detected: contract {0} is already executing")]
    ReentrancyDetected(Address),
}

/// Value and call transport used by the engine
pub trait Ledger {
    /// Native balance held by an account
    fn balance_of(&self, account: &Address) -> u128;

    /// Move native value between accounts without running any code
    fn transfer(&mut self, from: &Address, to: &Address, value: u128) -> Result<(), CallError>;

    /// Move `value` to `to` and run its code with `data`.
    ///
    /// Either the whole call takes effect or none of it does: on `Err` no
    /// value has moved.
    fn call(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), CallError>;
}
