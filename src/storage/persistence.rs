//! Wallet persistence layer
//!
//! Saves and loads wallet snapshots as JSON, one file per wallet, keeping a
//! rotating set of backups of earlier saves.

use crate::crypto::Address;
use crate::multisig::WalletSnapshot;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SNAPSHOT_EXTENSION: &str = "json";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Snapshot storage manager
pub struct WalletStore {
    config: StorageConfig,
}

impl WalletStore {
    /// Create a new store, creating the data directory if needed
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    fn wallet_path(&self, address: &Address) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.{}", address, SNAPSHOT_EXTENSION))
    }

    fn backup_path(&self, address: &Address, index: usize) -> PathBuf {
        self.config.data_dir.join(format!(
            "{}.{}.backup.{}",
            address, SNAPSHOT_EXTENSION, index
        ))
    }

    /// Save a wallet snapshot to disk
    pub fn save(&self, snapshot: &WalletSnapshot) -> Result<(), StorageError> {
        let address = snapshot.address;
        let path = self.wallet_path(&address);

        // Create backup if enabled
        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups(&address)?;
            fs::copy(&path, self.backup_path(&address, 0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join(format!("{}.tmp", address));
        save_to_file(snapshot, &temp_path)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!(
            "Saved wallet {} ({} transactions)",
            address,
            snapshot.transactions.len()
        );
        Ok(())
    }

    /// Load a wallet snapshot from disk
    pub fn load(&self, address: &Address) -> Result<WalletSnapshot, StorageError> {
        let path = self.wallet_path(address);

        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Wallet {} not found",
                address
            )));
        }

        let snapshot = load_from_file(&path)?;
        if snapshot.address != *address {
            return Err(StorageError::InvalidData(format!(
                "File for {} holds wallet {}",
                address, snapshot.address
            )));
        }
        Ok(snapshot)
    }

    /// Load every stored wallet, ordered by address
    pub fn load_all(&self) -> Result<Vec<WalletSnapshot>, StorageError> {
        self.list_wallets()?
            .iter()
            .map(|address| self.load(address))
            .collect()
    }

    /// Check if a saved wallet exists
    pub fn exists(&self, address: &Address) -> bool {
        self.wallet_path(address).exists()
    }

    /// Delete a saved wallet. Backups are kept.
    pub fn delete(&self, address: &Address) -> Result<(), StorageError> {
        let path = self.wallet_path(address);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Addresses of all stored wallets, sorted
    pub fn list_wallets(&self) -> Result<Vec<Address>, StorageError> {
        let mut wallets = Vec::new();

        for entry in fs::read_dir(&self.config.data_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let parsed = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<Address>().ok());
            match parsed {
                Some(address) => wallets.push(address),
                None => log::warn!("Ignoring unrecognised file {}", path.display()),
            }
        }

        wallets.sort();
        Ok(wallets)
    }

    /// Rotate backup files
    fn rotate_backups(&self, address: &Address) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(address, self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(address, i);
            if current.exists() {
                fs::rename(&current, self.backup_path(address, i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup; 0 is the most recent
    pub fn restore_backup(
        &self,
        address: &Address,
        backup_index: usize,
    ) -> Result<WalletSnapshot, StorageError> {
        let backup_path = self.backup_path(address, backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} of wallet {} not found",
                backup_index, address
            )));
        }

        load_from_file(&backup_path)
    }

    /// List available backups of a wallet
    pub fn list_backups(&self, address: &Address) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(address, *i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let wallets = self.list_wallets()?;

        let mut total_size = 0;
        let mut backup_count = 0;
        for address in &wallets {
            total_size += fs::metadata(self.wallet_path(address))?.len();
            backup_count += self.list_backups(address).len();
        }

        Ok(StorageStats {
            wallet_count: wallets.len(),
            total_size,
            backup_count,
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub wallet_count: usize,
    pub total_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Save a snapshot to a specific file path
pub fn save_to_file(snapshot: &WalletSnapshot, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// Load a snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<WalletSnapshot, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
