//! Record encoding for values written to the store.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::LedgerError;

/// Encodes a record into its stored byte form.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(record).map_err(|e| LedgerError::Encode(e.to_string()))
}

/// Decodes the value stored under `key`.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, LedgerError> {
    bincode::deserialize(bytes).map_err(|e| LedgerError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
