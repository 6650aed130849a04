//! Multisig-Custody: a multi-signature custody engine in Rust
//!
//! This crate provides an M-of-N approval engine featuring:
//! - Owner committee with a confirmation threshold
//! - Submit / confirm / revoke / execute pipeline for arbitrary outgoing calls
//! - At-most-once execution with retry after a failed call
//! - Owner management through the same approval pipeline
//! - Reentrancy protection and serialized operations across threads
//! - An in-memory ledger and a reference token contract to run it against
//! - JSON persistence of wallet snapshots with backups
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::Address;
//! use multisig_custody::ledger::Chain;
//! use multisig_custody::multisig::{MultisigWallet, WalletConfig};
//! use multisig_custody::token::{ManagedToken, TokenCall, TokenMetadata};
//!
//! let owners = vec![Address::from_label("alice"), Address::from_label("bob")];
//! let wallet = MultisigWallet::new(WalletConfig::new(owners.clone(), 2).unwrap()).unwrap();
//!
//! // Deploy a token administered by the wallet
//! let mut chain = Chain::new();
//! let metadata = TokenMetadata::new("Test Token".to_string(), "TST".to_string(), 18).unwrap();
//! let token = chain.deploy(&owners[0], ManagedToken::new(metadata, wallet.address()));
//!
//! // Minting needs both owners
//! let mint = TokenCall::Mint { to: wallet.address(), amount: 1_000 }.encode();
//! let id = wallet.submit(owners[0], token, 0, mint, &mut chain).unwrap();
//! wallet.confirm(id, owners[1], &mut chain).unwrap();
//!
//! let balance = chain
//!     .contract::<ManagedToken>(&token)
//!     .unwrap()
//!     .balance_of(&wallet.address());
//! assert_eq!(balance, 1_000);
//! ```

pub mod abi;
pub mod crypto;
pub mod ledger;
pub mod multisig;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use crypto::Address;
pub use ledger::{CallError, Chain, Contract, Ledger};
pub use multisig::{
    ExecutionOutcome, MultisigError, MultisigManager, MultisigWallet, WalletConfig, WalletEvent,
};
pub use storage::{StorageConfig, WalletStore};
pub use token::{ManagedToken, TokenCall, TokenMetadata};
