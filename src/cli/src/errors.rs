//! Error types for the ledger CLI.

use mintledger_core::LedgerError;
use mintledger_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The ledger rejected the operation
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The database could not be opened
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The system clock is before the Unix epoch
    #[error("Clock error: {0}")]
    Clock(String),

    /// Output could not be rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Whether running the same command again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CliError::Ledger(e) if e.is_retryable())
    }
}
