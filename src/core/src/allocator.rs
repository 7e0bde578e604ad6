//! Identity allocation for banks and companies.

use crate::errors::LedgerError;
use crate::store::{Invocation, KvStore};
use crate::types::{AccountId, AccountRef, MAX_BANK_ID_KEY, MAX_COMPANY_ID_KEY};

/// One of the two persisted id counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    /// Highest allocated bank id
    Bank,
    /// Highest allocated company id
    Company,
}

impl Counter {
    /// The store key of this counter.
    pub fn key(self) -> &'static str {
        match self {
            Counter::Bank => MAX_BANK_ID_KEY,
            Counter::Company => MAX_COMPANY_ID_KEY,
        }
    }
}

/// Encodes a counter value the way it is persisted: a decimal string.
pub fn encode_counter(value: AccountId) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Reads the current value of `counter`.
///
/// An absent counter means genesis never ran, unless the center bank exists,
/// in which case the counter was lost and the state is corrupt.
pub fn current<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    counter: Counter,
) -> Result<AccountId, LedgerError> {
    let key = counter.key();
    let bytes = match inv.get(key)? {
        Some(bytes) => bytes,
        None => return Err(missing_counter(inv, key)?),
    };

    let corrupt = |reason: String| LedgerError::CorruptState {
        key: key.to_string(),
        reason,
    };
    let text = std::str::from_utf8(&bytes).map_err(|e| corrupt(e.to_string()))?;
    let value: AccountId = text
        .parse()
        .map_err(|e| corrupt(format!("`{}` is not an integer: {}", text, e)))?;
    if value < 0 {
        return Err(corrupt(format!("negative counter {}", value)));
    }
    Ok(value)
}

/// Only read on the failure path, so successful allocations never depend on
/// the center bank record.
fn missing_counter<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    key: &str,
) -> Result<LedgerError, LedgerError> {
    match inv.get(&AccountRef::center_bank().key())? {
        Some(_) => Ok(LedgerError::CorruptState {
            key: key.to_string(),
            reason: "counter missing after genesis".to_string(),
        }),
        None => Ok(LedgerError::NotInitialized),
    }
}

/// Computes the next id for `counter`.
///
/// Nothing is written: the caller stages the new record together with
/// [`encode_counter`] of the returned id in the same invocation.
pub fn next<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    counter: Counter,
) -> Result<AccountId, LedgerError> {
    let value = current(inv, counter)?;
    value.checked_add(1).ok_or_else(|| LedgerError::CorruptState {
        key: counter.key().to_string(),
        reason: "counter exhausted".to_string(),
    })
}
