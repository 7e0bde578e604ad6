//! Read-only lookups of ledger records.

use mintledger_core::{AccountId, AccountKind, KvStore, Ledger};
use serde_json::Value;

use crate::errors::CliError;

/// What to look up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The center bank
    CenterBank,
    /// One bank
    Bank(AccountId),
    /// One company
    Company(AccountId),
    /// One transaction by id
    Transaction(String),
    /// Every bank or every company
    All(AccountKind),
}

/// Reads `target` and renders it as JSON.
pub fn run<S: KvStore>(ledger: &Ledger<S>, target: &Target) -> Result<Value, CliError> {
    let value = match target {
        Target::CenterBank => serde_json::to_value(ledger.center_bank()?)?,
        Target::Bank(id) => serde_json::to_value(ledger.bank(*id)?)?,
        Target::Company(id) => serde_json::to_value(ledger.company(*id)?)?,
        Target::Transaction(id) => serde_json::to_value(ledger.transaction(id)?)?,
        Target::All(AccountKind::CenterBank) => serde_json::to_value([ledger.center_bank()?])?,
        Target::All(AccountKind::Bank) => serde_json::to_value(ledger.banks()?)?,
        Target::All(AccountKind::Company) => serde_json::to_value(ledger.companies()?)?,
    };
    Ok(value)
}
