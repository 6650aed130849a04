//! Multi-signature custody engine
//!
//! An M-of-N wallet: a committee of N owners must have M current members
//! confirm an outgoing call before it runs. Committee changes go through the
//! same submit/confirm/execute pipeline as a transaction addressed to the
//! wallet itself.
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::Address;
//! use multisig_custody::ledger::Chain;
//! use multisig_custody::multisig::{ExecutionOutcome, MultisigWallet, WalletConfig};
//!
//! let alice = Address::from_label("alice");
//! let bob = Address::from_label("bob");
//! let carol = Address::from_label("carol");
//!
//! // Create a 2-of-3 multisig wallet
//! let config = WalletConfig::new(vec![alice, bob, carol], 2).unwrap();
//! let wallet = MultisigWallet::new(config).unwrap();
//!
//! let mut chain = Chain::new();
//! chain.fund(&alice, 100).unwrap();
//! wallet.deposit(alice, 100, &mut chain).unwrap();
//!
//! // Propose a payment; alice's confirmation is implied
//! let id = wallet.submit(alice, carol, 40, vec![], &mut chain).unwrap();
//!
//! // Bob's confirmation reaches the threshold and runs the call
//! let outcome = wallet.confirm(id, bob, &mut chain).unwrap();
//! assert_eq!(outcome, Some(ExecutionOutcome::Executed));
//! assert_eq!(chain.balance_of(&carol), 40);
//! ```

pub mod config;
pub mod confirmation;
pub mod error;
pub mod events;
pub mod management;
pub mod manager;
pub mod registry;
pub mod transaction;
pub mod wallet;

pub use config::{ConfigError, WalletConfig};
pub use confirmation::{ConfirmationEntry, ConfirmationMatrix};
pub use error::MultisigError;
pub use events::{EventLog, EventRecord, WalletEvent};
pub use management::ManagementCall;
pub use manager::MultisigManager;
pub use registry::{OwnerRegistry, MAX_OWNER_COUNT};
pub use transaction::{Transaction, TransactionLog, TransactionStatus};
pub use wallet::{CallFailure, ExecutionOutcome, MultisigWallet, WalletSnapshot};
