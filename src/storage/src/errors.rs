//! Error types for the storage crate.

use mintledger_core::LedgerError;
use thiserror::Error;

/// Errors raised by the RocksDB store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database could not be opened, read or written
    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    /// The database directory could not be created
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored envelope or key could not be decoded
    #[error("Corrupt entry {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another thread panicked while holding the database lock
    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupt { key, reason } => LedgerError::Decode { key, reason },
            other => LedgerError::Storage(other.to_string()),
        }
    }
}
