//! Tests for the CLI commands against an on-disk ledger.

use mintledger_cli::commands::{self, audit, execute, invoke, show};
use mintledger_cli::{CliError, LedgerConfig};
use mintledger_core::{AccountKind, AccountRef, LedgerError, Operation, Outcome};
use serial_test::serial;
use tempfile::tempdir;

fn config(dir: &std::path::Path) -> LedgerConfig {
    LedgerConfig {
        data_dir: dir.join("ledger"),
        ..LedgerConfig::default()
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Tests a session of typed and raw commands on one database.
#[test]
fn test_cli_session() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let ledger = commands::open(&config).unwrap();

    // Set up accounts through the string-argument entry point
    invoke::run(&ledger, "init", &args(&["PBOC", "1000"]), config.attempts).unwrap();
    invoke::run(&ledger, "createBank", &args(&["ICBC"]), config.attempts).unwrap();
    invoke::run(&ledger, "createCompany", &args(&["Acme"]), config.attempts).unwrap();

    let op = Operation::IssueCoinToBank {
        bank_id: 1,
        amount: 400,
        timestamp: commands::timestamp_or_now(None).unwrap(),
    };
    execute::run(&ledger, op, config.attempts).unwrap();

    let op = Operation::Transfer {
        from: AccountRef::bank(1),
        to: AccountRef::company(1),
        amount: 150,
        timestamp: "t-transfer".to_string(),
    };
    let tx = match execute::run(&ledger, op, config.attempts).unwrap() {
        Outcome::Transaction(tx) => tx,
        other => panic!("unexpected outcome {:?}", other),
    };

    // Read the results back the way the show commands do
    let shown = show::run(&ledger, &show::Target::Transaction(tx.id.clone())).unwrap();
    assert_eq!(shown["number"], 150);
    let banks = show::run(&ledger, &show::Target::All(AccountKind::Bank)).unwrap();
    assert_eq!(banks[0]["balance"]["rest_number"], 250);

    let report = audit::run(&ledger).unwrap();
    assert!(report.is_balanced());
    assert_eq!(report.minted, 1_000);
}

/// Tests that ledger errors reach the CLI unchanged.
#[test]
fn test_cli_reports_ledger_errors() {
    let dir = tempdir().unwrap();
    let ledger = commands::open(&config(dir.path())).unwrap();

    match invoke::run(&ledger, "createBank", &args(&["ICBC"]), 1).unwrap_err() {
        CliError::Ledger(e) => assert_eq!(e, LedgerError::NotInitialized),
        other => panic!("unexpected error {:?}", other),
    }
    match invoke::run(&ledger, "init", &args(&["PBOC"]), 1).unwrap_err() {
        CliError::Ledger(LedgerError::InvalidParams(_)) => {}
        other => panic!("unexpected error {:?}", other),
    }
}

/// Tests that the data directory from the environment is the one opened.
#[test]
#[serial]
fn test_data_dir_from_environment() {
    let dir = tempdir().unwrap();
    std::env::set_var(mintledger_cli::config::DATA_DIR_ENV, dir.path().join("env-ledger"));
    let config = LedgerConfig::load(None, None).unwrap();
    std::env::remove_var(mintledger_cli::config::DATA_DIR_ENV);

    let ledger = commands::open(&config).unwrap();
    ledger.init("PBOC", 1).unwrap();
    assert!(dir.path().join("env-ledger").exists());
}
