//! Account records and their balance arithmetic.
//!
//! Every account carries a [`Balance`]: `total_number` counts everything the
//! account ever received (or minted), `rest_number` is what it still holds.
//! Debits only lower `rest_number`, so `rest_number <= total_number` holds
//! for every record. All mutations here act on in-memory copies; the engine
//! decides whether they are persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::LedgerError;
use crate::types::{AccountId, AccountRef, Amount, CENTER_BANK_ID};

/// Received and remaining currency of one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Total currency ever received or minted
    pub total_number: Amount,
    /// Currency still held
    pub rest_number: Amount,
}

impl Balance {
    /// Creates a balance holding `amount` with nothing spent.
    pub fn new(amount: Amount) -> Self {
        Self {
            total_number: amount,
            rest_number: amount,
        }
    }

    fn add(&mut self, account: AccountRef, amount: Amount) -> Result<(), LedgerError> {
        let overflow = || LedgerError::BalanceOverflow { account, amount };
        let total_number = self.total_number.checked_add(amount).ok_or_else(overflow)?;
        let rest_number = self.rest_number.checked_add(amount).ok_or_else(overflow)?;
        self.total_number = total_number;
        self.rest_number = rest_number;
        Ok(())
    }

    fn sub(&mut self, account: AccountRef, amount: Amount) -> Result<(), LedgerError> {
        self.rest_number = self
            .rest_number
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                account,
                required: amount,
                available: self.rest_number,
            })?;
        Ok(())
    }
}

/// Balance operations shared by every account record.
pub trait Account {
    /// The typed reference of this record.
    fn account_ref(&self) -> AccountRef;

    /// The current balance.
    fn balance(&self) -> &Balance;

    /// Mutable access to the balance.
    fn balance_mut(&mut self) -> &mut Balance;

    /// Mints `amount` into this account.
    fn credit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let account = self.account_ref();
        self.balance_mut().add(account, amount)
    }

    /// Pays `amount` out of this account.
    fn issue(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let account = self.account_ref();
        self.balance_mut().sub(account, amount)
    }

    /// Accepts `amount` paid in by another account.
    fn receive(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let account = self.account_ref();
        self.balance_mut().add(account, amount)
    }
}

/// The single currency-issuing root account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterBank {
    /// Always [`CENTER_BANK_ID`]
    pub id: AccountId,
    /// Display name given at genesis
    pub name: String,
    /// Minted and remaining currency
    pub balance: Balance,
}

impl CenterBank {
    /// Creates the center bank with its genesis supply.
    pub fn new(name: impl Into<String>, supply: Amount) -> Self {
        Self {
            id: CENTER_BANK_ID,
            name: name.into(),
            balance: Balance::new(supply),
        }
    }
}

impl Account for CenterBank {
    fn account_ref(&self) -> AccountRef {
        AccountRef::center_bank()
    }

    fn balance(&self) -> &Balance {
        &self.balance
    }

    fn balance_mut(&mut self) -> &mut Balance {
        &mut self.balance
    }
}

/// A subordinate bank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// Allocated id, starting at 1
    pub id: AccountId,
    /// Display name
    pub name: String,
    /// Received and remaining currency
    pub balance: Balance,
}

impl Bank {
    /// Creates an empty bank.
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            balance: Balance::default(),
        }
    }
}

impl Account for Bank {
    fn account_ref(&self) -> AccountRef {
        AccountRef::bank(self.id)
    }

    fn balance(&self) -> &Balance {
        &self.balance
    }

    fn balance_mut(&mut self) -> &mut Balance {
        &mut self.balance
    }
}

/// A company. Holds currency the same way a bank does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Allocated id, starting at 1
    pub id: AccountId,
    /// Display name
    pub name: String,
    /// Received and remaining currency
    pub balance: Balance,
}

impl Company {
    /// Creates an empty company.
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            balance: Balance::default(),
        }
    }
}

impl Account for Company {
    fn account_ref(&self) -> AccountRef {
        AccountRef::company(self.id)
    }

    fn balance(&self) -> &Balance {
        &self.balance
    }

    fn balance_mut(&mut self) -> &mut Balance {
        &mut self.balance
    }
}

/// Any one account record, as loaded for a movement of funds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountRecord {
    /// The center bank
    CenterBank(CenterBank),
    /// A bank
    Bank(Bank),
    /// A company
    Company(Company),
}

impl Account for AccountRecord {
    fn account_ref(&self) -> AccountRef {
        match self {
            AccountRecord::CenterBank(a) => a.account_ref(),
            AccountRecord::Bank(a) => a.account_ref(),
            AccountRecord::Company(a) => a.account_ref(),
        }
    }

    fn balance(&self) -> &Balance {
        match self {
            AccountRecord::CenterBank(a) => a.balance(),
            AccountRecord::Bank(a) => a.balance(),
            AccountRecord::Company(a) => a.balance(),
        }
    }

    fn balance_mut(&mut self) -> &mut Balance {
        match self {
            AccountRecord::CenterBank(a) => a.balance_mut(),
            AccountRecord::Bank(a) => a.balance_mut(),
            AccountRecord::Company(a) => a.balance_mut(),
        }
    }
}

impl fmt::Display for CenterBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CenterBank {{ id: {}, name: {}, total: {}, rest: {} }}",
            self.id, self.name, self.balance.total_number, self.balance.rest_number
        )
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bank {{ id: {}, name: {}, total: {}, rest: {} }}",
            self.id, self.name, self.balance.total_number, self.balance.rest_number
        )
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Company {{ id: {}, name: {}, total: {}, rest: {} }}",
            self.id, self.name, self.balance.total_number, self.balance.rest_number
        )
    }
}
