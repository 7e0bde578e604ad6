//! Tests for the ledger on the RocksDB store.

use mintledger_core::{AccountRef, Ledger, LedgerError, Outcome};
use mintledger_storage::RocksStore;
use tempfile::tempdir;

/// Tests that a ledger survives closing and reopening its database.
#[test]
fn test_ledger_persists_across_reopen() {
    let dir = tempdir().unwrap();

    // Populate a ledger and drop it to close the database
    let tx_id = {
        let ledger = Ledger::new(RocksStore::open(dir.path()).unwrap());
        ledger.init("PBOC", 1_000_000).unwrap();
        ledger.create_bank("ICBC").unwrap();
        ledger.create_company("Acme").unwrap();
        ledger.issue_coin_to_bank(1, 200, "t1").unwrap();
        ledger
            .transfer(AccountRef::bank(1), AccountRef::company(1), 50, "t2")
            .unwrap()
            .id
    };

    let ledger = Ledger::new(RocksStore::open(dir.path()).unwrap());
    assert_eq!(ledger.center_bank().unwrap().balance.rest_number, 999_800);
    assert_eq!(ledger.bank(1).unwrap().balance.rest_number, 150);
    assert_eq!(ledger.company(1).unwrap().balance.total_number, 50);
    assert_eq!(ledger.transaction(&tx_id).unwrap().number, 50);

    // counters survived too
    assert_eq!(ledger.create_bank("ABC").unwrap().id, 2);
    assert_eq!(ledger.init("PBOC", 1).unwrap_err(), LedgerError::AlreadyInitialized);
    assert!(ledger.audit().unwrap().is_balanced());
}

/// Tests that a rejected operation writes nothing to disk.
#[test]
fn test_rejected_operation_leaves_disk_untouched() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::new(RocksStore::open(dir.path()).unwrap());
    ledger.init("PBOC", 100).unwrap();
    ledger.create_bank("ICBC").unwrap();
    let before = ledger.store().snapshot().unwrap();

    // Overdraw the center bank, then pay a company that does not exist
    assert!(matches!(
        ledger.invoke("issueCoinToBank", &["1", "101", "t"]),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(
        ledger.invoke("transfer", &["bank", "1", "company", "3", "1", "t"]).unwrap_err(),
        LedgerError::NotFound {
            key: "company_3".to_string()
        }
    );
    assert_eq!(ledger.store().snapshot().unwrap(), before);
}

/// Tests that the same transaction cannot be recorded twice on disk.
#[test]
fn test_duplicate_transaction_on_disk() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::new(RocksStore::open(dir.path()).unwrap());
    ledger.invoke("init", &["PBOC", "100"]).unwrap();

    let outcome = ledger.invoke("issueCoin", &["5", "t"]).unwrap();
    let tx = match outcome {
        Outcome::Transaction(tx) => tx,
        other => panic!("unexpected outcome {:?}", other),
    };

    // Replay the same mint; the stored id makes it a permanent duplicate
    let err = ledger.invoke("issueCoin", &["5", "t"]).unwrap_err();
    assert_eq!(
        err,
        LedgerError::DuplicateTransaction {
            key: format!("tx_{}", tx.id)
        }
    );
    assert!(err.is_conflict());
    assert!(!err.is_retryable());
    assert_eq!(ledger.center_bank().unwrap().balance.total_number, 105);
}
