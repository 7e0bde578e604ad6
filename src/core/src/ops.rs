//! The closed set of ledger operations and their argument parsing.
//!
//! Callers at the platform boundary speak in function names and string
//! arguments. [`Operation::parse`] turns those into a typed variant, checking
//! the arity and argument types of each one, so the engine only ever sees
//! well-formed requests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::{Bank, CenterBank, Company};
use crate::errors::LedgerError;
use crate::types::{AccountId, AccountKind, AccountRef, Amount, Transaction};

/// One ledger operation with typed arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Genesis: create the center bank and both counters
    Init {
        /// Name of the center bank
        bank_name: String,
        /// Initial supply
        total_supply: Amount,
    },
    /// Register a new bank
    CreateBank {
        /// Bank name
        name: String,
    },
    /// Register a new company
    CreateCompany {
        /// Company name
        name: String,
    },
    /// Mint new currency at the center bank
    IssueCoin {
        /// Amount to mint
        amount: Amount,
        /// Caller-supplied timestamp
        timestamp: String,
    },
    /// Move currency from the center bank to a bank
    IssueCoinToBank {
        /// Receiving bank
        bank_id: AccountId,
        /// Amount to move
        amount: Amount,
        /// Caller-supplied timestamp
        timestamp: String,
    },
    /// Move currency from the center bank to a company
    IssueCoinToCompany {
        /// Receiving company
        company_id: AccountId,
        /// Amount to move
        amount: Amount,
        /// Caller-supplied timestamp
        timestamp: String,
    },
    /// Move currency between two banks or companies
    Transfer {
        /// Debited account
        from: AccountRef,
        /// Credited account
        to: AccountRef,
        /// Amount to move
        amount: Amount,
        /// Caller-supplied timestamp
        timestamp: String,
    },
}

/// The record an operation produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record")]
pub enum Outcome {
    /// Result of genesis
    CenterBank(CenterBank),
    /// Result of `createBank`
    Bank(Bank),
    /// Result of `createCompany`
    Company(Company),
    /// Result of every movement of funds
    Transaction(Transaction),
}

fn expect_arity<S: AsRef<str>>(
    function: &str,
    args: &[S],
    arity: usize,
) -> Result<(), LedgerError> {
    if args.len() != arity {
        return Err(LedgerError::InvalidParams(format!(
            "{} expects {} arguments, got {}",
            function,
            arity,
            args.len()
        )));
    }
    Ok(())
}

fn nth<S: AsRef<str>>(args: &[S], i: usize) -> &str {
    args[i].as_ref()
}

fn parse_amount(field: &str, value: &str) -> Result<Amount, LedgerError> {
    value.parse().map_err(|e| {
        LedgerError::InvalidParams(format!(
            "{} `{}` is not an unsigned integer: {}",
            field, value, e
        ))
    })
}

fn parse_id(field: &str, value: &str) -> Result<AccountId, LedgerError> {
    value.parse().map_err(|e| {
        LedgerError::InvalidParams(format!("{} `{}` is not an integer: {}", field, value, e))
    })
}

fn parse_kind(field: &str, value: &str) -> Result<AccountKind, LedgerError> {
    value.parse().map_err(|_| {
        LedgerError::InvalidParams(format!("{} `{}` is not an account type", field, value))
    })
}

impl Operation {
    /// The function name this operation is invoked by.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init { .. } => "init",
            Operation::CreateBank { .. } => "createBank",
            Operation::CreateCompany { .. } => "createCompany",
            Operation::IssueCoin { .. } => "issueCoin",
            Operation::IssueCoinToBank { .. } => "issueCoinToBank",
            Operation::IssueCoinToCompany { .. } => "issueCoinToCompany",
            Operation::Transfer { .. } => "transfer",
        }
    }

    /// Parses a function name and its string arguments.
    pub fn parse<S: AsRef<str>>(function: &str, args: &[S]) -> Result<Self, LedgerError> {
        match function {
            "init" => {
                expect_arity(function, args, 2)?;
                Ok(Operation::Init {
                    bank_name: nth(args, 0).to_string(),
                    total_supply: parse_amount("totalSupply", nth(args, 1))?,
                })
            }
            "createBank" => {
                expect_arity(function, args, 1)?;
                Ok(Operation::CreateBank {
                    name: nth(args, 0).to_string(),
                })
            }
            "createCompany" => {
                expect_arity(function, args, 1)?;
                Ok(Operation::CreateCompany {
                    name: nth(args, 0).to_string(),
                })
            }
            "issueCoin" => {
                expect_arity(function, args, 2)?;
                Ok(Operation::IssueCoin {
                    amount: parse_amount("amount", nth(args, 0))?,
                    timestamp: nth(args, 1).to_string(),
                })
            }
            "issueCoinToBank" => {
                expect_arity(function, args, 3)?;
                Ok(Operation::IssueCoinToBank {
                    bank_id: parse_id("bankId", nth(args, 0))?,
                    amount: parse_amount("amount", nth(args, 1))?,
                    timestamp: nth(args, 2).to_string(),
                })
            }
            "issueCoinToCompany" | "issueCoinToCp" => {
                expect_arity(function, args, 3)?;
                Ok(Operation::IssueCoinToCompany {
                    company_id: parse_id("companyId", nth(args, 0))?,
                    amount: parse_amount("amount", nth(args, 1))?,
                    timestamp: nth(args, 2).to_string(),
                })
            }
            "transfer" => {
                expect_arity(function, args, 6)?;
                Ok(Operation::Transfer {
                    from: AccountRef {
                        kind: parse_kind("fromType", nth(args, 0))?,
                        id: parse_id("fromId", nth(args, 1))?,
                    },
                    to: AccountRef {
                        kind: parse_kind("toType", nth(args, 2))?,
                        id: parse_id("toId", nth(args, 3))?,
                    },
                    amount: parse_amount("amount", nth(args, 4))?,
                    timestamp: nth(args, 5).to_string(),
                })
            }
            _ => Err(LedgerError::InvalidFunction(function.to_string())),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CenterBank(r) => write!(f, "{}", r),
            Outcome::Bank(r) => write!(f, "{}", r),
            Outcome::Company(r) => write!(f, "{}", r),
            Outcome::Transaction(r) => write!(f, "{}", r),
        }
    }
}
