//! Raw dispatch by function name, the way a hosting platform calls the ledger.

use mintledger_core::{KvStore, Ledger, Operation, Outcome};
use tracing::debug;

use crate::commands::execute;
use crate::errors::CliError;

/// Parses `function` with `args` and executes it.
pub fn run<S: KvStore>(
    ledger: &Ledger<S>,
    function: &str,
    args: &[String],
    attempts: u32,
) -> Result<Outcome, CliError> {
    debug!("Invoking {} with {:?}", function, args);
    let op = Operation::parse(function, args)?;
    execute::run(ledger, op, attempts)
}
