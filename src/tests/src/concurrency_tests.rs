//! Tests for concurrent invocations racing on the same keys.

use mintledger_core::{
    AccountRef, ChangeSet, KvStore, Ledger, LedgerError, MemoryStore, Versioned,
};
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Barrier;
use std::thread;

/// Holds the first `gated` commits until all of them have arrived, so every
/// racing invocation has finished reading before any of them commits.
struct GatedStore {
    inner: MemoryStore,
    gated: AtomicIsize,
    barrier: Barrier,
}

impl GatedStore {
    fn new(racers: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            gated: AtomicIsize::new(0),
            barrier: Barrier::new(racers),
        }
    }

    fn arm(&self, racers: isize) {
        self.gated.store(racers, Ordering::SeqCst);
    }
}

impl KvStore for GatedStore {
    fn get(&self, key: &str) -> Result<Option<Versioned>, LedgerError> {
        self.inner.get(key)
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        if self.gated.fetch_sub(1, Ordering::SeqCst) > 0 {
            self.barrier.wait();
        }
        self.inner.commit(changes)
    }
}

/// Tests that two banks created at once cannot share an id.
#[test]
fn test_concurrent_create_bank() {
    let ledger = Ledger::new(GatedStore::new(2));
    ledger.init("PBOC", 1_000).unwrap();
    ledger.store().arm(2);

    // Race two registrations that both read the same counter value
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = ["ICBC", "ABC"]
            .into_iter()
            .map(|name| {
                let ledger = &ledger;
                s.spawn(move || ledger.create_bank(name))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].id, 1);
    assert_eq!(losers.len(), 1);
    assert!(matches!(losers[0], LedgerError::Conflict { .. }));
    assert!(losers[0].is_retryable());

    // the loser retries and gets the next id
    let retried = ledger.create_bank("retry").unwrap();
    assert_eq!(retried.id, 2);
    assert_eq!(ledger.banks().unwrap().len(), 2);
}

/// Tests that an identical transaction submitted twice at once is applied once.
#[test]
fn test_concurrent_duplicate_transaction() {
    let ledger = Ledger::new(GatedStore::new(2));
    ledger.init("PBOC", 1_000).unwrap();
    ledger.store().arm(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = &ledger;
                s.spawn(move || ledger.issue_coin(10, "same"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(loser.is_conflict());

    // Once the winner is committed, a retry sees a permanent duplicate
    let retried = ledger.issue_coin(10, "same").unwrap_err();
    assert!(matches!(retried, LedgerError::DuplicateTransaction { .. }));
    assert!(!retried.is_retryable());
    assert_eq!(ledger.center_bank().unwrap().balance.total_number, 1_010);
}

/// Tests that contended transfers with caller-side retries neither lose nor
/// duplicate currency.
#[test]
fn test_contended_transfers_conserve_currency() {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.init("PBOC", 10_000).unwrap();
    ledger.create_bank("ICBC").unwrap();
    ledger.create_company("Acme").unwrap();
    ledger.issue_coin_to_bank(1, 1_000, "seed").unwrap();

    let threads = 4;
    let per_thread = 25;
    thread::scope(|s| {
        for worker in 0..threads {
            let ledger = &ledger;
            s.spawn(move || {
                for i in 0..per_thread {
                    let timestamp = format!("w{}-{}", worker, i);
                    let (from, to) = (AccountRef::bank(1), AccountRef::company(1));

                    // Retry until this transfer wins its commit
                    loop {
                        match ledger.transfer(from, to, 3, &timestamp) {
                            Ok(_) => break,
                            Err(e) if e.is_retryable() => continue,
                            Err(e) => panic!("transfer failed: {}", e),
                        }
                    }
                }
            });
        }
    });

    let moved = 3 * (threads * per_thread) as u64;
    assert_eq!(ledger.bank(1).unwrap().balance.rest_number, 1_000 - moved);
    assert_eq!(ledger.company(1).unwrap().balance.rest_number, moved);
    assert!(ledger.audit().unwrap().is_balanced());
}
