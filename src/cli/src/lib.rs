//! Command line front end for the currency ledger.

pub mod commands;
pub mod config;
pub mod errors;
pub mod output;

// Re-export commonly used types and functions
pub use commands::{audit, execute, invoke, show};
pub use config::LedgerConfig;
pub use errors::CliError;
