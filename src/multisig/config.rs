//! Wallet configuration
//!
//! The starting committee, threshold and identity of a wallet. Loaded from
//! JSON or built in code; validated against the same rules the registry
//! enforces.

use crate::crypto::Address;
use crate::multisig::error::MultisigError;
use crate::multisig::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] MultisigError),
}

/// Configuration for a multisig wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Initial owners
    pub owners: Vec<Address>,
    /// Minimum confirmations required (M)
    pub threshold: usize,
    /// Optional human-readable label
    #[serde(default)]
    pub label: Option<String>,
    /// Distinguishes wallets that share a committee
    #[serde(default)]
    pub salt: u64,
}

impl WalletConfig {
    /// Create a new configuration
    ///
    /// # Errors
    /// Returns error if the owner list or threshold is invalid
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, MultisigError> {
        let config = Self {
            owners,
            threshold,
            label: None,
            salt: 0,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_salt(mut self, salt: u64) -> Self {
        self.salt = salt;
        self
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check owners and threshold
    pub fn validate(&self) -> Result<(), MultisigError> {
        self.registry().map(|_| ())
    }

    /// Build the initial registry
    pub fn registry(&self) -> Result<OwnerRegistry, MultisigError> {
        OwnerRegistry::new(self.owners.clone(), self.threshold)
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Deterministic wallet address
    ///
    /// Address = RIPEMD160(SHA256(threshold || sorted owners || salt))
    pub fn wallet_address(&self) -> Address {
        let mut sorted_owners = self.owners.clone();
        sorted_owners.sort();

        let mut seed = Vec::with_capacity(16 + sorted_owners.len() * 20);
        seed.extend_from_slice(&(self.threshold as u64).to_be_bytes());
        for owner in &sorted_owners {
            seed.extend_from_slice(owner.as_bytes());
        }
        seed.extend_from_slice(&self.salt.to_be_bytes());

        Address::derive(&seed)
    }
}
