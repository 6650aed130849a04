//! Storage module for wallet persistence

pub mod persistence;

pub use persistence::{
    load_from_file, save_to_file, StorageConfig, StorageError, StorageStats, WalletStore,
};
