//! Reference token contract
//!
//! An ownable, mintable fungible token that can be deployed on a
//! [`Chain`](crate::ledger::Chain) and administered by a multisig wallet:
//! - Balances per address, minted by the owner
//! - Transfers disabled until the owner calls `allowTransfers`
//! - Ownership hand-over and native value payouts
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::Address;
//! use multisig_custody::ledger::Chain;
//! use multisig_custody::token::{ManagedToken, TokenCall, TokenMetadata};
//!
//! let creator = Address::from_label("creator");
//! let metadata = TokenMetadata::new("Test Token".to_string(), "TST".to_string(), 18).unwrap();
//!
//! let mut chain = Chain::new();
//! let token = chain.deploy(&creator, ManagedToken::new(metadata, creator));
//!
//! let mint = TokenCall::Mint { to: creator, amount: 100 }.encode();
//! chain.call(&creator, &token, 0, &mint).unwrap();
//!
//! let balance = chain.contract::<ManagedToken>(&token).unwrap().balance_of(&creator);
//! assert_eq!(balance, 100);
//! ```

pub mod token;

pub use token::{ManagedToken, TokenCall, TokenError, TokenMetadata, TransferEvent};
