//! Runs a typed ledger operation, retrying commit conflicts.

use mintledger_core::{KvStore, Ledger, Operation, Outcome};
use tracing::{info, warn};

use crate::errors::CliError;

/// Executes `op`, making up to `attempts` attempts while the commit conflicts.
pub fn run<S: KvStore>(
    ledger: &Ledger<S>,
    op: Operation,
    attempts: u32,
) -> Result<Outcome, CliError> {
    let mut attempt = 1;
    loop {
        match ledger.execute(op.clone()) {
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!("{} attempt {} failed: {}", op.name(), attempt, e);
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
            Ok(outcome) => {
                info!("{} succeeded", op.name());
                return Ok(outcome);
            }
        }
    }
}
