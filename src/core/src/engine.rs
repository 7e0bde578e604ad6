//! The ledger engine.
//!
//! Each public operation is one validate-compute-commit step: it opens an
//! [`Invocation`], reads what it needs, checks every invariant against the
//! values it just read, stages the new records and commits them as one unit.
//! Any error before the commit drops the invocation, so a failed operation
//! leaves no trace. Concurrent operations on the same keys are arbitrated by
//! the store at commit time; the losing side gets [`LedgerError::Conflict`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::account::{Account, AccountRecord, Bank, CenterBank, Company};
use crate::allocator::{self, Counter};
use crate::errors::LedgerError;
use crate::ops::{Operation, Outcome};
use crate::store::{Invocation, KvStore};
use crate::tx;
use crate::types::{
    bank_key, company_key, tx_key, AccountId, AccountKind, AccountRef, Amount, Transaction,
    CENTER_BANK_ID,
};

/// Totals read by [`Ledger::audit`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Center bank total: everything ever minted
    pub minted: Amount,
    /// Currency still held by the center bank
    pub center_rest: Amount,
    /// Sum of bank rest numbers
    pub banks_rest: u128,
    /// Sum of company rest numbers
    pub companies_rest: u128,
    /// Number of banks
    pub banks: usize,
    /// Number of companies
    pub companies: usize,
    /// Accounts whose rest number exceeds their total number
    pub violations: Vec<AccountRef>,
}

impl AuditReport {
    /// Whether every unit minted is accounted for exactly once.
    pub fn is_balanced(&self) -> bool {
        self.violations.is_empty()
            && u128::from(self.center_rest) + self.banks_rest + self.companies_rest
                == u128::from(self.minted)
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "minted {}, center {}, banks {} ({}), companies {} ({}), {}",
            self.minted,
            self.center_rest,
            self.banks_rest,
            self.banks,
            self.companies_rest,
            self.companies,
            if self.is_balanced() { "balanced" } else { "IMBALANCED" }
        )
    }
}

/// The ledger state-transition engine over a versioned store.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
}

impl<S: KvStore> Ledger<S> {
    /// Creates an engine over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one typed operation.
    pub fn execute(&self, op: Operation) -> Result<Outcome, LedgerError> {
        debug!("Executing {}", op.name());
        match op {
            Operation::Init {
                bank_name,
                total_supply,
            } => self.init(&bank_name, total_supply).map(Outcome::CenterBank),
            Operation::CreateBank { name } => self.create_bank(&name).map(Outcome::Bank),
            Operation::CreateCompany { name } => self.create_company(&name).map(Outcome::Company),
            Operation::IssueCoin { amount, timestamp } => {
                self.issue_coin(amount, &timestamp).map(Outcome::Transaction)
            }
            Operation::IssueCoinToBank {
                bank_id,
                amount,
                timestamp,
            } => self
                .issue_coin_to_bank(bank_id, amount, &timestamp)
                .map(Outcome::Transaction),
            Operation::IssueCoinToCompany {
                company_id,
                amount,
                timestamp,
            } => self
                .issue_coin_to_company(company_id, amount, &timestamp)
                .map(Outcome::Transaction),
            Operation::Transfer {
                from,
                to,
                amount,
                timestamp,
            } => self
                .transfer(from, to, amount, &timestamp)
                .map(Outcome::Transaction),
        }
    }

    /// Parses a function name with string arguments and runs it.
    pub fn invoke<A: AsRef<str>>(
        &self,
        function: &str,
        args: &[A],
    ) -> Result<Outcome, LedgerError> {
        self.execute(Operation::parse(function, args)?)
    }

    /// Genesis: creates the center bank holding `total_supply` and sets both
    /// id counters to zero.
    pub fn init(&self, bank_name: &str, total_supply: Amount) -> Result<CenterBank, LedgerError> {
        let mut inv = Invocation::begin(&self.store);

        let key = AccountRef::center_bank().key();
        if inv.get(&key)?.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        let cbank = CenterBank::new(bank_name, total_supply);
        inv.put_record(key, &cbank)?;
        inv.put(Counter::Bank.key(), allocator::encode_counter(0));
        inv.put(Counter::Company.key(), allocator::encode_counter(0));
        inv.commit()?;

        info!(
            "Initialized center bank {} with supply {}",
            cbank.name, total_supply
        );
        Ok(cbank)
    }

    /// Registers a bank under the next bank id.
    pub fn create_bank(&self, name: &str) -> Result<Bank, LedgerError> {
        let mut inv = Invocation::begin(&self.store);
        let id = allocator::next(&mut inv, Counter::Bank)?;
        let bank = Bank::new(id, name);
        stage_created(&mut inv, Counter::Bank, bank_key(id), id, &bank)?;
        inv.commit()?;

        info!("Created bank {} with id {}", bank.name, bank.id);
        Ok(bank)
    }

    /// Registers a company under the next company id.
    pub fn create_company(&self, name: &str) -> Result<Company, LedgerError> {
        let mut inv = Invocation::begin(&self.store);
        let id = allocator::next(&mut inv, Counter::Company)?;
        let company = Company::new(id, name);
        stage_created(&mut inv, Counter::Company, company_key(id), id, &company)?;
        inv.commit()?;

        info!("Created company {} with id {}", company.name, company.id);
        Ok(company)
    }

    /// Mints `amount` new units at the center bank.
    pub fn issue_coin(&self, amount: Amount, timestamp: &str) -> Result<Transaction, LedgerError> {
        let mut inv = Invocation::begin(&self.store);
        let center = AccountRef::center_bank();

        let mut cbank = load_center(&mut inv)?;
        let tx = tx::build(center, center, timestamp, amount)?;
        reserve_tx(&mut inv, &tx)?;

        cbank.credit(amount)?;
        inv.put_record(center.key(), &cbank)?;
        inv.put_record(tx_key(&tx.id), &tx)?;
        inv.commit()?;

        info!(
            "Minted {} at the center bank in transaction {}, total now {}",
            amount, tx.id, cbank.balance.total_number
        );
        Ok(tx)
    }

    /// Moves `amount` from the center bank to bank `bank_id`.
    pub fn issue_coin_to_bank(
        &self,
        bank_id: AccountId,
        amount: Amount,
        timestamp: &str,
    ) -> Result<Transaction, LedgerError> {
        let to = member_ref(AccountKind::Bank, bank_id)?;
        self.move_funds(AccountRef::center_bank(), to, amount, timestamp)
    }

    /// Moves `amount` from the center bank to company `company_id`.
    pub fn issue_coin_to_company(
        &self,
        company_id: AccountId,
        amount: Amount,
        timestamp: &str,
    ) -> Result<Transaction, LedgerError> {
        let to = member_ref(AccountKind::Company, company_id)?;
        self.move_funds(AccountRef::center_bank(), to, amount, timestamp)
    }

    /// Moves `amount` between two banks or companies.
    ///
    /// The center bank is not a valid endpoint here; it only pays out through
    /// the issue operations.
    pub fn transfer(
        &self,
        from: AccountRef,
        to: AccountRef,
        amount: Amount,
        timestamp: &str,
    ) -> Result<Transaction, LedgerError> {
        let from = member_ref(from.kind, from.id)?;
        let to = member_ref(to.kind, to.id)?;
        if from == to {
            return Err(LedgerError::InvalidParams(format!(
                "cannot transfer from {} to itself",
                from
            )));
        }
        self.move_funds(from, to, amount, timestamp)
    }

    fn move_funds(
        &self,
        from: AccountRef,
        to: AccountRef,
        amount: Amount,
        timestamp: &str,
    ) -> Result<Transaction, LedgerError> {
        let mut inv = Invocation::begin(&self.store);

        let mut source = load_account(&mut inv, from)?;
        let mut destination = load_account(&mut inv, to)?;
        let tx = tx::build(from, to, timestamp, amount)?;
        reserve_tx(&mut inv, &tx)?;

        source.issue(amount)?;
        destination.receive(amount)?;

        stage_account(&mut inv, &source)?;
        stage_account(&mut inv, &destination)?;
        inv.put_record(tx_key(&tx.id), &tx)?;
        inv.commit()?;

        info!(
            "Moved {} from {} to {} in transaction {}",
            amount, from, to, tx.id
        );
        Ok(tx)
    }

    /// Reads the center bank.
    pub fn center_bank(&self) -> Result<CenterBank, LedgerError> {
        load_center(&mut Invocation::begin(&self.store))
    }

    /// Reads bank `id`.
    pub fn bank(&self, id: AccountId) -> Result<Bank, LedgerError> {
        let account = member_ref(AccountKind::Bank, id)?;
        load_member(&mut Invocation::begin(&self.store), account, |b: &Bank| b.id)
    }

    /// Reads company `id`.
    pub fn company(&self, id: AccountId) -> Result<Company, LedgerError> {
        let account = member_ref(AccountKind::Company, id)?;
        load_member(&mut Invocation::begin(&self.store), account, |c: &Company| c.id)
    }

    /// Reads a transaction by id.
    pub fn transaction(&self, id: &str) -> Result<Transaction, LedgerError> {
        let key = tx_key(id);
        let mut inv = Invocation::begin(&self.store);
        match inv.get_record::<Transaction>(&key)? {
            Some(tx) => Ok(tx),
            None => Err(missing(&mut inv, key)),
        }
    }

    /// Reads every bank in id order.
    pub fn banks(&self) -> Result<Vec<Bank>, LedgerError> {
        list_banks(&mut Invocation::begin(&self.store))
    }

    /// Reads every company in id order.
    pub fn companies(&self) -> Result<Vec<Company>, LedgerError> {
        list_companies(&mut Invocation::begin(&self.store))
    }

    /// Reads every account and checks the conservation invariant.
    ///
    /// The read-set is validated against the store at the end, so the report
    /// reflects one consistent state or fails with a conflict.
    pub fn audit(&self) -> Result<AuditReport, LedgerError> {
        let mut inv = Invocation::begin(&self.store);
        let cbank = load_center(&mut inv)?;
        let banks = list_banks(&mut inv)?;
        let companies = list_companies(&mut inv)?;

        let mut violations = Vec::new();
        let mut check = |account: &dyn Account| {
            let balance = account.balance();
            if balance.rest_number > balance.total_number {
                violations.push(account.account_ref());
            }
        };
        check(&cbank);
        banks.iter().for_each(|b| check(b));
        companies.iter().for_each(|c| check(c));

        let report = AuditReport {
            minted: cbank.balance.total_number,
            center_rest: cbank.balance.rest_number,
            banks_rest: banks.iter().map(|b| u128::from(b.balance.rest_number)).sum(),
            companies_rest: companies
                .iter()
                .map(|c| u128::from(c.balance.rest_number))
                .sum(),
            banks: banks.len(),
            companies: companies.len(),
            violations,
        };
        inv.validate()?;

        if !report.is_balanced() {
            warn!("Ledger audit found an imbalance: {:?}", report);
        }
        Ok(report)
    }
}

/// Builds a reference to a bank or company, rejecting the center bank and
/// ids that can never be allocated.
fn member_ref(kind: AccountKind, id: AccountId) -> Result<AccountRef, LedgerError> {
    if kind == AccountKind::CenterBank {
        return Err(LedgerError::InvalidParams(
            "the center bank only pays out through the issue operations".to_string(),
        ));
    }
    if id <= CENTER_BANK_ID {
        return Err(LedgerError::InvalidParams(format!(
            "{} id must be positive, got {}",
            kind, id
        )));
    }
    Ok(AccountRef { kind, id })
}

fn stage_created<S: KvStore + ?Sized, T: Serialize>(
    inv: &mut Invocation<'_, S>,
    counter: Counter,
    key: String,
    id: AccountId,
    record: &T,
) -> Result<(), LedgerError> {
    if inv.get(&key)?.is_some() {
        return Err(LedgerError::CorruptState {
            key: counter.key().to_string(),
            reason: format!("allocated id {} but {} already exists", id, key),
        });
    }
    inv.put_record(key, record)?;
    inv.put(counter.key(), allocator::encode_counter(id));
    Ok(())
}

fn load_center<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
) -> Result<CenterBank, LedgerError> {
    let key = AccountRef::center_bank().key();
    let cbank: CenterBank = inv.get_record(&key)?.ok_or(LedgerError::NotInitialized)?;
    if cbank.id != CENTER_BANK_ID {
        return Err(LedgerError::CorruptState {
            key,
            reason: format!("center bank stored with id {}", cbank.id),
        });
    }
    Ok(cbank)
}

fn load_member<S, T>(
    inv: &mut Invocation<'_, S>,
    account: AccountRef,
    id_of: impl Fn(&T) -> AccountId,
) -> Result<T, LedgerError>
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
{
    let key = account.key();
    let record: T = match inv.get_record(&key)? {
        Some(record) => record,
        None => return Err(missing(inv, key)),
    };
    if id_of(&record) != account.id {
        return Err(LedgerError::CorruptState {
            reason: format!("record carries id {}", id_of(&record)),
            key,
        });
    }
    Ok(record)
}

fn load_account<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    account: AccountRef,
) -> Result<AccountRecord, LedgerError> {
    match account.kind {
        AccountKind::CenterBank => load_center(inv).map(AccountRecord::CenterBank),
        AccountKind::Bank => load_member(inv, account, |b: &Bank| b.id).map(AccountRecord::Bank),
        AccountKind::Company => {
            load_member(inv, account, |c: &Company| c.id).map(AccountRecord::Company)
        }
    }
}

fn stage_account<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    record: &AccountRecord,
) -> Result<(), LedgerError> {
    let key = record.account_ref().key();
    match record {
        AccountRecord::CenterBank(a) => inv.put_record(key, a),
        AccountRecord::Bank(a) => inv.put_record(key, a),
        AccountRecord::Company(a) => inv.put_record(key, a),
    }
}

/// Explains an absent record: before genesis nothing exists at all.
fn missing<S: KvStore + ?Sized>(inv: &mut Invocation<'_, S>, key: String) -> LedgerError {
    match inv.get(&AccountRef::center_bank().key()) {
        Ok(Some(_)) => LedgerError::NotFound { key },
        Ok(None) => LedgerError::NotInitialized,
        Err(e) => e,
    }
}

/// Fails if a transaction with the same id already exists. The absent read
/// also makes a concurrent identical transaction conflict at commit.
fn reserve_tx<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
    tx: &Transaction,
) -> Result<(), LedgerError> {
    let key = tx_key(&tx.id);
    if inv.get(&key)?.is_some() {
        warn!("Transaction {} already exists", tx.id);
        return Err(LedgerError::DuplicateTransaction { key });
    }
    Ok(())
}

fn list_banks<S: KvStore + ?Sized>(inv: &mut Invocation<'_, S>) -> Result<Vec<Bank>, LedgerError> {
    let count = allocator::current(inv, Counter::Bank)?;
    (1..=count)
        .map(|id| {
            load_member(inv, AccountRef::bank(id), |b: &Bank| b.id).map_err(allocated)
        })
        .collect()
}

fn list_companies<S: KvStore + ?Sized>(
    inv: &mut Invocation<'_, S>,
) -> Result<Vec<Company>, LedgerError> {
    let count = allocator::current(inv, Counter::Company)?;
    (1..=count)
        .map(|id| {
            load_member(inv, AccountRef::company(id), |c: &Company| c.id).map_err(allocated)
        })
        .collect()
}

/// An id at or below its counter must have a record.
fn allocated(err: LedgerError) -> LedgerError {
    match err {
        LedgerError::NotFound { key } => LedgerError::CorruptState {
            key,
            reason: "allocated id has no record".to_string(),
        },
        other => other,
    }
}
