//! Persistent storage for the currency ledger.
//!
//! [`RocksStore`] implements the core [`KvStore`](mintledger_core::KvStore)
//! seam on top of RocksDB, so a ledger survives process restarts.

pub mod errors;
pub mod rocks;

pub use errors::StorageError;
pub use rocks::RocksStore;
