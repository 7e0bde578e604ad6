//! Conservation check over every account.

use mintledger_core::{AuditReport, KvStore, Ledger};
use tracing::{info, warn};

use crate::errors::CliError;

/// Reads every account and checks that all minted currency is accounted for.
pub fn run<S: KvStore>(ledger: &Ledger<S>) -> Result<AuditReport, CliError> {
    let report = ledger.audit()?;
    if report.is_balanced() {
        info!(
            "Audit passed: {} minted across {} banks and {} companies",
            report.minted, report.banks, report.companies
        );
    } else {
        warn!("Audit failed: {}", report);
    }
    Ok(report)
}
