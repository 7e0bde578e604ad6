//! Error types for the ledger engine.

use thiserror::Error;

use crate::types::{AccountRef, Amount};

/// Errors that can occur while executing a ledger operation.
///
/// Every variant is terminal for the current invocation: nothing the
/// invocation staged is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Error when the requested operation name is not recognized.
    #[error("Invalid function: {0}")]
    InvalidFunction(String),

    /// Error when the arguments have the wrong count or type.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Error when an operation runs before genesis.
    #[error("Ledger is not initialized")]
    NotInitialized,

    /// Error when genesis runs twice.
    #[error("Ledger is already initialized")]
    AlreadyInitialized,

    /// Error when a counter or record holds an impossible value.
    #[error("Corrupt state at {key}: {reason}")]
    CorruptState {
        /// The offending key
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// Error when a referenced record does not exist.
    #[error("Record not found: {key}")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// Error when a debit exceeds the available balance.
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// The debited account
        account: AccountRef,
        /// The requested amount
        required: Amount,
        /// The rest number at the time of the read
        available: Amount,
    },

    /// Error when a credit would overflow a balance.
    #[error("Balance overflow in {account}: cannot add {amount}")]
    BalanceOverflow {
        /// The credited account
        account: AccountRef,
        /// The amount that did not fit
        amount: Amount,
    },

    /// Error when the commit found a key changed since it was read.
    #[error("Conflict on key {key}")]
    Conflict {
        /// The contended key
        key: String,
    },

    /// Error when a transaction with the same id is already recorded.
    ///
    /// A conflict on the transaction key that no retry can resolve: the id is
    /// derived from the request itself.
    #[error("Duplicate transaction: {key} already exists")]
    DuplicateTransaction {
        /// The existing transaction key
        key: String,
    },

    /// Error when a record cannot be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Error when stored bytes cannot be decoded.
    #[error("Decode error at {key}: {reason}")]
    Decode {
        /// The key whose value failed to decode
        key: String,
        /// The decoder message
        reason: String,
    },

    /// Error when the backing store fails.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }

    /// Whether the operation lost to state another invocation recorded,
    /// either a concurrent commit or an identical earlier transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LedgerError::Conflict { .. } | LedgerError::DuplicateTransaction { .. }
        )
    }
}
