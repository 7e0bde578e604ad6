//! Tests for the ledger engine over the in-memory store.

use mintledger_core::{
    codec, tx, Account, AccountKind, AccountRef, Bank, CenterBank, Company, Ledger, LedgerError,
    MemoryStore, Operation, Outcome, Transaction,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Walks through genesis, allocation, minting and distribution.
#[test]
fn test_ledger_walkthrough() {
    let ledger = Ledger::new(MemoryStore::new());

    let cbank = ledger.init("PBOC", 1_000_000).unwrap();
    let balance = cbank.balance;
    assert_eq!(
        (cbank.id, balance.total_number, balance.rest_number),
        (0, 1_000_000, 1_000_000)
    );
    assert_eq!(ledger.init("PBOC", 1).unwrap_err(), LedgerError::AlreadyInitialized);

    assert_eq!(ledger.create_bank("ICBC").unwrap().id, 1);
    assert_eq!(ledger.create_bank("ABC").unwrap().id, 2);

    let minted = ledger.issue_coin(500, "t1").unwrap();
    assert_eq!(minted.from, AccountRef::center_bank());
    assert_eq!(minted.to, AccountRef::center_bank());
    let cbank = ledger.center_bank().unwrap();
    assert_eq!(cbank.balance.total_number, 1_000_500);
    assert_eq!(cbank.balance.rest_number, 1_000_500);

    let before = ledger.store().snapshot().unwrap();
    assert!(matches!(
        ledger.issue_coin_to_bank(1, 2_000_000, "t2"),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger.store().snapshot().unwrap(), before);

    let tx = ledger.issue_coin_to_bank(1, 200, "t3").unwrap();
    assert_eq!(tx.to, AccountRef::bank(1));
    assert_eq!(tx.number, 200);
    assert_eq!(ledger.center_bank().unwrap().balance.rest_number, 1_000_300);
    let bank = ledger.bank(1).unwrap();
    assert_eq!((bank.balance.total_number, bank.balance.rest_number), (200, 200));

    assert!(ledger.audit().unwrap().is_balanced());
}

/// Tests that persisted records decode to the records that were stored.
#[test]
fn test_records_round_trip() {
    let mut cbank = CenterBank::new("PBOC", 10);
    cbank.credit(5).unwrap();
    let mut bank = Bank::new(3, "ICBC");
    bank.receive(7).unwrap();
    let company = Company::new(9, "Acme");
    let transaction = tx::build(AccountRef::bank(3), AccountRef::company(9), "t", 7).unwrap();

    // Encode each record and decode it back under its store key
    let bytes = codec::encode(&cbank).unwrap();
    assert_eq!(codec::decode::<CenterBank>("bank_0", &bytes).unwrap(), cbank);
    let bytes = codec::encode(&bank).unwrap();
    assert_eq!(codec::decode::<Bank>("bank_3", &bytes).unwrap(), bank);
    let bytes = codec::encode(&company).unwrap();
    assert_eq!(codec::decode::<Company>("company_9", &bytes).unwrap(), company);

    let key = format!("tx_{}", transaction.id);
    let bytes = codec::encode(&transaction).unwrap();
    assert_eq!(codec::decode::<Transaction>(&key, &bytes).unwrap(), transaction);
}

/// Tests that identical transactions on two ledgers get identical ids.
#[test]
fn test_transaction_ids_are_deterministic() {
    let run = || {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.init("PBOC", 100).unwrap();
        ledger.create_company("Acme").unwrap();
        ledger.issue_coin_to_company(1, 40, "1700000000").unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert!(tx::verify(&first).unwrap());
}

fn random_member(rng: &mut StdRng) -> AccountRef {
    let kind = if rng.gen_bool(0.5) {
        AccountKind::Bank
    } else {
        AccountKind::Company
    };
    AccountRef {
        kind,
        id: rng.gen_range(1..=4),
    }
}

fn random_op(rng: &mut StdRng, step: usize) -> Operation {
    let timestamp = format!("t{}", step);
    match rng.gen_range(0..6) {
        0 => Operation::CreateBank {
            name: format!("bank-{}", step),
        },
        1 => Operation::CreateCompany {
            name: format!("company-{}", step),
        },
        2 => Operation::IssueCoin {
            amount: rng.gen_range(0..1_000),
            timestamp,
        },
        3 => Operation::IssueCoinToBank {
            bank_id: rng.gen_range(1..=4),
            amount: rng.gen_range(0..5_000),
            timestamp,
        },
        4 => Operation::IssueCoinToCompany {
            company_id: rng.gen_range(1..=4),
            amount: rng.gen_range(0..5_000),
            timestamp,
        },
        _ => Operation::Transfer {
            from: random_member(rng),
            to: random_member(rng),
            amount: rng.gen_range(0..2_000),
            timestamp,
        },
    }
}

/// Tests that every minted unit stays accounted for across a random run,
/// and that rejected operations leave the store untouched.
#[test]
fn test_conservation_over_random_operations() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let ledger = Ledger::new(MemoryStore::new());
    ledger.init("PBOC", 10_000).unwrap();

    let mut failures = 0;
    for step in 0..400 {
        let op = random_op(&mut rng, step);
        let before = ledger.store().snapshot().unwrap();

        match ledger.execute(op.clone()) {
            Ok(Outcome::Transaction(tx)) => {
                assert!(tx::verify(&tx).unwrap());
                assert_eq!(ledger.transaction(&tx.id).unwrap(), tx);
            }
            Ok(_) => {}
            Err(e) => {
                assert!(!e.is_retryable(), "{:?} conflicted without contention", op);
                assert_eq!(ledger.store().snapshot().unwrap(), before);
                failures += 1;
            }
        }

        let report = ledger.audit().unwrap();
        assert!(report.is_balanced(), "imbalance after {:?}: {}", op, report);
    }

    // the run exercised both paths
    assert!(failures > 0 && failures < 400);
}
