//! Core of the closed-system currency ledger.
//!
//! One center bank mints currency and pays it out to banks and companies,
//! which move it among themselves. Every movement is recorded as an immutable,
//! content-addressed transaction. State lives in a versioned key-value store
//! behind the [`KvStore`] trait; each operation commits its writes as a single
//! unit or not at all.

pub mod account;
pub mod allocator;
pub mod codec;
pub mod engine;
pub mod errors;
pub mod ops;
pub mod store;
pub mod tx;
pub mod types;

// Re-export commonly used types
pub use account::{Account, AccountRecord, Balance, Bank, CenterBank, Company};
pub use engine::{AuditReport, Ledger};
pub use errors::LedgerError;
pub use ops::{Operation, Outcome};
pub use store::{ChangeSet, Invocation, KvStore, MemoryStore, Version, Versioned};
pub use types::{AccountId, AccountKind, AccountRef, Amount, Transaction, TxId};
