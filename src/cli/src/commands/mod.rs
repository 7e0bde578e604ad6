//! Commands for the ledger CLI.

pub mod audit;
pub mod execute;
pub mod invoke;
pub mod show;

use mintledger_core::Ledger;
use mintledger_storage::RocksStore;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::errors::CliError;

/// Opens the ledger stored under the configured data directory.
pub fn open(config: &LedgerConfig) -> Result<Ledger<RocksStore>, CliError> {
    debug!("Opening ledger at {}", config.data_dir.display());
    let store = RocksStore::open(&config.data_dir)?;
    Ok(Ledger::new(store))
}

/// Returns `timestamp`, or the current Unix time in nanoseconds.
pub fn timestamp_or_now(timestamp: Option<String>) -> Result<String, CliError> {
    match timestamp {
        Some(timestamp) => Ok(timestamp),
        None => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| CliError::Clock(e.to_string()))?;
            Ok(now.as_nanos().to_string())
        }
    }
}
