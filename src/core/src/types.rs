//! Core types for the currency ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

/// Identity of a bank or company. The center bank always has id 0.
pub type AccountId = i64;

/// Amount of currency, in indivisible units.
pub type Amount = u64;

/// Content-addressed transaction id, lowercase hex of a SHA-256 digest.
pub type TxId = String;

/// The fixed id of the center bank.
pub const CENTER_BANK_ID: AccountId = 0;

/// Counter key holding the highest allocated bank id.
pub const MAX_BANK_ID_KEY: &str = "max_bankId";

/// Counter key holding the highest allocated company id.
pub const MAX_COMPANY_ID_KEY: &str = "max_companyId";

/// The kind of account on either side of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountKind {
    /// The currency-issuing root account
    CenterBank,
    /// A subordinate bank
    Bank,
    /// A company
    Company,
}

impl AccountKind {
    /// Tag used by the canonical transaction encoding. Never reorder.
    pub fn tag(self) -> u8 {
        match self {
            AccountKind::CenterBank => 0,
            AccountKind::Bank => 1,
            AccountKind::Company => 2,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::CenterBank => write!(f, "CenterBank"),
            AccountKind::Bank => write!(f, "Bank"),
            AccountKind::Company => write!(f, "Company"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "centerbank" | "center_bank" => Ok(AccountKind::CenterBank),
            "bank" => Ok(AccountKind::Bank),
            "company" | "cp" => Ok(AccountKind::Company),
            _ => Err(LedgerError::InvalidParams(format!(
                "unknown account type `{}`",
                s
            ))),
        }
    }
}

/// A typed reference to one account: which kind and which id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountRef {
    /// The account kind
    pub kind: AccountKind,
    /// The account id within its kind
    pub id: AccountId,
}

impl AccountRef {
    /// Reference to the center bank.
    pub fn center_bank() -> Self {
        Self {
            kind: AccountKind::CenterBank,
            id: CENTER_BANK_ID,
        }
    }

    /// Reference to the bank with the given id.
    pub fn bank(id: AccountId) -> Self {
        Self {
            kind: AccountKind::Bank,
            id,
        }
    }

    /// Reference to the company with the given id.
    pub fn company(id: AccountId) -> Self {
        Self {
            kind: AccountKind::Company,
            id,
        }
    }

    /// The store key the referenced record lives under.
    ///
    /// The center bank shares the bank key space and lives at `bank_0`.
    pub fn key(&self) -> String {
        match self.kind {
            AccountKind::CenterBank => bank_key(CENTER_BANK_ID),
            AccountKind::Bank => bank_key(self.id),
            AccountKind::Company => company_key(self.id),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Store key for a bank record.
pub fn bank_key(id: AccountId) -> String {
    format!("bank_{}", id)
}

/// Store key for a company record.
pub fn company_key(id: AccountId) -> String {
    format!("company_{}", id)
}

/// Store key for a transaction record.
pub fn tx_key(id: &str) -> String {
    format!("tx_{}", id)
}

/// An immutable record of one balance movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash of the other fields
    pub id: TxId,
    /// The debited account
    pub from: AccountRef,
    /// The credited account
    pub to: AccountRef,
    /// Caller-supplied timestamp, opaque to the ledger
    pub timestamp: String,
    /// The amount moved
    pub number: Amount,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction {{ id: {}, from: {}, to: {}, timestamp: {}, number: {} }}",
            self.id, self.from, self.to, self.timestamp, self.number
        )
    }
}
