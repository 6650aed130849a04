//! Multisig wallet manager
//!
//! Hosts any number of independent wallets keyed by address. Wallets are
//! shared as `Arc`s so that contracts and worker threads can hold on to them.

use crate::crypto::Address;
use crate::ledger::Ledger;
use crate::multisig::config::WalletConfig;
use crate::multisig::error::MultisigError;
use crate::multisig::wallet::{MultisigWallet, WalletSnapshot};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of hosted wallets
#[derive(Debug, Default)]
pub struct MultisigManager {
    /// Multisig wallets by address
    wallets: HashMap<Address, Arc<MultisigWallet>>,
}

impl MultisigManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new multisig wallet
    ///
    /// The same configuration always yields the same address; creating it
    /// twice hands back the wallet already hosted.
    pub fn create_wallet(
        &mut self,
        config: WalletConfig,
    ) -> Result<Arc<MultisigWallet>, MultisigError> {
        let address = config.wallet_address();
        if let Some(existing) = self.wallets.get(&address) {
            log::debug!("Wallet {} already hosted", address);
            return Ok(Arc::clone(existing));
        }

        let wallet = Arc::new(MultisigWallet::new(config)?);
        self.wallets.insert(address, Arc::clone(&wallet));
        Ok(wallet)
    }

    /// Host a wallet rebuilt from a snapshot
    pub fn restore_wallet(
        &mut self,
        snapshot: WalletSnapshot,
    ) -> Result<Arc<MultisigWallet>, MultisigError> {
        if self.wallets.contains_key(&snapshot.address) {
            return Err(MultisigError::InvalidConfiguration(format!(
                "wallet {} is already hosted",
                snapshot.address
            )));
        }

        let wallet = Arc::new(MultisigWallet::restore(snapshot)?);
        self.wallets.insert(wallet.address(), Arc::clone(&wallet));
        Ok(wallet)
    }

    /// Get a wallet by address
    pub fn get_wallet(&self, address: &Address) -> Option<Arc<MultisigWallet>> {
        self.wallets.get(address).cloned()
    }

    /// List all wallets, ordered by address
    pub fn list_wallets(&self) -> Vec<Arc<MultisigWallet>> {
        let mut wallets: Vec<_> = self.wallets.values().cloned().collect();
        wallets.sort_by_key(|w| w.address());
        wallets
    }

    /// Get wallet count
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Check if an address belongs to a hosted wallet
    pub fn is_multisig_address(&self, address: &Address) -> bool {
        self.wallets.contains_key(address)
    }

    /// Stop hosting a wallet. Its funds stay on the ledger.
    pub fn remove_wallet(&mut self, address: &Address) -> Option<Arc<MultisigWallet>> {
        self.wallets.remove(address)
    }

    /// Snapshots of every hosted wallet, ordered by address
    pub fn snapshots(&self) -> Vec<WalletSnapshot> {
        self.list_wallets().iter().map(|w| w.snapshot()).collect()
    }

    /// Get balance for a multisig address
    pub fn get_balance(&self, address: &Address, ledger: &dyn Ledger) -> Option<u128> {
        self.wallets.get(address).map(|w| w.balance(ledger))
    }
}
