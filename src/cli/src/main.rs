//! Command line front end for the currency ledger.

use anyhow::{Context, Result};
use colored::Colorize;
use mintledger_cli::commands::{self, audit, execute, invoke, show};
use mintledger_cli::output::render;
use mintledger_cli::{CliError, LedgerConfig};
use mintledger_core::{AccountId, AccountKind, AccountRef, Amount, KvStore, Ledger, Operation};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line arguments for the ledger CLI.
#[derive(Debug, StructOpt)]
#[structopt(name = "mintledger", about = "Closed-system currency ledger")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Directory holding the ledger database
    #[structopt(short, long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[structopt(long)]
    json: bool,

    /// Subcommand to run
    #[structopt(subcommand)]
    cmd: Command,
}

/// Subcommands for the ledger CLI.
#[derive(Debug, StructOpt)]
enum Command {
    /// Create the center bank with its initial supply
    #[structopt(name = "init")]
    Init {
        /// Center bank name
        #[structopt(long)]
        name: String,

        /// Initial supply
        #[structopt(long)]
        supply: Amount,
    },

    /// Register a new bank
    #[structopt(name = "create-bank")]
    CreateBank {
        /// Bank name
        #[structopt(long)]
        name: String,
    },

    /// Register a new company
    #[structopt(name = "create-company")]
    CreateCompany {
        /// Company name
        #[structopt(long)]
        name: String,
    },

    /// Mint new currency at the center bank
    #[structopt(name = "issue-coin")]
    IssueCoin {
        /// Amount to mint
        #[structopt(long)]
        amount: Amount,

        /// Transaction timestamp (defaults to now, in nanoseconds)
        #[structopt(long)]
        timestamp: Option<String>,
    },

    /// Pay currency from the center bank to a bank
    #[structopt(name = "issue-to-bank")]
    IssueToBank {
        /// Receiving bank
        #[structopt(long)]
        bank_id: AccountId,

        /// Amount to pay
        #[structopt(long)]
        amount: Amount,

        /// Transaction timestamp (defaults to now, in nanoseconds)
        #[structopt(long)]
        timestamp: Option<String>,
    },

    /// Pay currency from the center bank to a company
    #[structopt(name = "issue-to-company")]
    IssueToCompany {
        /// Receiving company
        #[structopt(long)]
        company_id: AccountId,

        /// Amount to pay
        #[structopt(long)]
        amount: Amount,

        /// Transaction timestamp (defaults to now, in nanoseconds)
        #[structopt(long)]
        timestamp: Option<String>,
    },

    /// Move currency between banks and companies
    #[structopt(name = "transfer")]
    Transfer {
        /// Debited account type (bank or company)
        #[structopt(long)]
        from_type: AccountKind,

        /// Debited account id
        #[structopt(long)]
        from_id: AccountId,

        /// Credited account type (bank or company)
        #[structopt(long)]
        to_type: AccountKind,

        /// Credited account id
        #[structopt(long)]
        to_id: AccountId,

        /// Amount to move
        #[structopt(long)]
        amount: Amount,

        /// Transaction timestamp (defaults to now, in nanoseconds)
        #[structopt(long)]
        timestamp: Option<String>,
    },

    /// Call an operation by function name with string arguments
    #[structopt(name = "invoke")]
    Invoke {
        /// Function name, e.g. issueCoinToBank
        function: String,

        /// Function arguments
        args: Vec<String>,
    },

    /// Show the center bank
    #[structopt(name = "show-center")]
    ShowCenter,

    /// Show a bank
    #[structopt(name = "show-bank")]
    ShowBank {
        /// Bank id
        id: AccountId,
    },

    /// Show a company
    #[structopt(name = "show-company")]
    ShowCompany {
        /// Company id
        id: AccountId,
    },

    /// Show a transaction
    #[structopt(name = "show-tx")]
    ShowTx {
        /// Transaction id
        id: String,
    },

    /// List every bank
    #[structopt(name = "list-banks")]
    ListBanks,

    /// List every company
    #[structopt(name = "list-companies")]
    ListCompanies,

    /// Check that all minted currency is accounted for
    #[structopt(name = "audit")]
    Audit,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let opt = Opt::from_args();

    // Load configuration
    let config = LedgerConfig::load(opt.config.as_deref(), opt.data_dir)?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let ledger = commands::open(&config)
        .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?;

    if let Err(e) = run(&ledger, &config, opt.cmd, opt.json) {
        error!("{}", e);
        if e.is_retryable() {
            eprintln!("{}", "The ledger changed while the command ran; run it again.".yellow());
        }
        return Err(e.into());
    }

    Ok(())
}

fn run<S: KvStore>(
    ledger: &Ledger<S>,
    config: &LedgerConfig,
    cmd: Command,
    json: bool,
) -> Result<(), CliError> {
    let op = match cmd {
        Command::Init { name, supply } => Operation::Init {
            bank_name: name,
            total_supply: supply,
        },
        Command::CreateBank { name } => Operation::CreateBank { name },
        Command::CreateCompany { name } => Operation::CreateCompany { name },
        Command::IssueCoin { amount, timestamp } => Operation::IssueCoin {
            amount,
            timestamp: commands::timestamp_or_now(timestamp)?,
        },
        Command::IssueToBank {
            bank_id,
            amount,
            timestamp,
        } => Operation::IssueCoinToBank {
            bank_id,
            amount,
            timestamp: commands::timestamp_or_now(timestamp)?,
        },
        Command::IssueToCompany {
            company_id,
            amount,
            timestamp,
        } => Operation::IssueCoinToCompany {
            company_id,
            amount,
            timestamp: commands::timestamp_or_now(timestamp)?,
        },
        Command::Transfer {
            from_type,
            from_id,
            to_type,
            to_id,
            amount,
            timestamp,
        } => Operation::Transfer {
            from: AccountRef {
                kind: from_type,
                id: from_id,
            },
            to: AccountRef {
                kind: to_type,
                id: to_id,
            },
            amount,
            timestamp: commands::timestamp_or_now(timestamp)?,
        },
        Command::Invoke { function, args } => {
            let outcome = invoke::run(ledger, &function, &args, config.attempts)?;
            println!("{}", render("Done:", &outcome, json)?);
            return Ok(());
        }
        Command::ShowCenter => return print_record(ledger, show::Target::CenterBank),
        Command::ShowBank { id } => return print_record(ledger, show::Target::Bank(id)),
        Command::ShowCompany { id } => return print_record(ledger, show::Target::Company(id)),
        Command::ShowTx { id } => return print_record(ledger, show::Target::Transaction(id)),
        Command::ListBanks => return print_record(ledger, show::Target::All(AccountKind::Bank)),
        Command::ListCompanies => {
            return print_record(ledger, show::Target::All(AccountKind::Company))
        }
        Command::Audit => {
            let report = audit::run(ledger)?;
            println!("{}", render("Audit:", &report, json)?);
            if !report.is_balanced() {
                println!("{}", "WARNING: the ledger does not balance!".red());
            }
            return Ok(());
        }
    };

    let label = format!("{}:", op.name());
    let outcome = execute::run(ledger, op, config.attempts)?;
    println!("{}", render(&label, &outcome, json)?);
    Ok(())
}

fn print_record<S: KvStore>(ledger: &Ledger<S>, target: show::Target) -> Result<(), CliError> {
    let value = show::run(ledger, &target)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
