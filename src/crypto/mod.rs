//! Cryptographic utilities for the custody engine
//!
//! This module provides:
//! - SHA-256 hashing
//! - Address derivation (RIPEMD160 over SHA-256)

pub mod address;
pub mod hash;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use hash::{hash160, sha256, sha256_hex};
