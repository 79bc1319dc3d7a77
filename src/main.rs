//! Treasury Ledger - owner-governed budgets and expense payments
//!
//! Every command that changes the ledger runs as the identity given with
//! `--caller` (or `TREASURY_CALLER`). Only the configured owner succeeds.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

// Use the library crate
use treasury_ledger::cli::commands;
use treasury_ledger::config::Config;

/// Treasury Ledger - budgets, expenses, and payments
#[derive(Parser)]
#[command(name = "treasury")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "treasury.toml")]
    config: String,

    /// Identity issuing the command
    #[arg(long, env = "TREASURY_CALLER", global = true)]
    caller: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add funds to the treasury
    AddFunds {
        /// Amount to credit
        amount: u64,
    },

    /// Budget category commands
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Expense workflow commands
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Show treasury balance and total paid
    Balance,

    /// Show running totals
    Status,

    /// Show the audit journal
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category with a fixed budget
    Add {
        /// Category name
        name: String,

        /// Budget ceiling
        budget: u64,
    },

    /// Show one category
    Show {
        id: u64,
    },

    /// List all categories
    List,
}

#[derive(Subcommand)]
enum ExpenseAction {
    /// Record a new expense (starts Pending)
    Add {
        /// What the expense is for
        description: String,

        /// Amount to pay
        amount: u64,

        /// Identity receiving the payment
        #[arg(long)]
        payee: String,

        /// Category id to charge
        #[arg(long)]
        category: u64,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Approve a Pending expense and reserve its budget
    Approve {
        id: u64,
    },

    /// Reject a Pending expense
    Reject {
        id: u64,

        /// Reason recorded on the expense
        #[arg(long)]
        reason: String,
    },

    /// Pay an Approved expense
    Pay {
        id: u64,

        /// Payment reference (transaction hash, cheque number, ...)
        #[arg(long)]
        reference: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Cancel a Pending or Approved expense
    Cancel {
        id: u64,
    },

    /// Show one expense
    Show {
        id: u64,
    },

    /// List expenses
    List {
        /// Only show this status: pending, approved, rejected, paid, cancelled
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(cli.log_json || config.logging.json);
    startup_checks(&config);

    let caller = cli.caller.as_deref();

    // Execute command
    let result = match cli.command {
        Commands::AddFunds { amount } => match commands::require_caller(caller) {
            Ok(caller) => commands::add_funds(&config, &caller, amount).await,
            Err(e) => Err(e),
        },
        Commands::Category { action } => run_category(&config, caller, action).await,
        Commands::Expense { action } => run_expense(&config, caller, action).await,
        Commands::Balance => commands::balance(&config).await,
        Commands::Status => commands::status(&config).await,
        Commands::History { limit } => commands::history(&config, limit).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        match e.downcast_ref::<treasury_ledger::Error>().and_then(|le| le.code()) {
            Some(code) => error!("Command failed (err {}): {}", code, e),
            None => error!("Command failed: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run_category(config: &Config, caller: Option<&str>, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::Add { name, budget } => {
            let caller = commands::require_caller(caller)?;
            commands::category_add(config, &caller, &name, budget).await
        }
        CategoryAction::Show { id } => commands::category_show(config, id).await,
        CategoryAction::List => commands::category_list(config).await,
    }
}

async fn run_expense(config: &Config, caller: Option<&str>, action: ExpenseAction) -> Result<()> {
    match action {
        ExpenseAction::Show { id } => commands::expense_show(config, id).await,
        ExpenseAction::List { status } => commands::expense_list(config, status.as_deref()).await,
        ExpenseAction::Add {
            description,
            amount,
            payee,
            category,
            notes,
        } => {
            let caller = commands::require_caller(caller)?;
            commands::expense_add(config, &caller, &description, amount, &payee, category, &notes)
                .await
        }
        ExpenseAction::Approve { id } => {
            let caller = commands::require_caller(caller)?;
            commands::expense_approve(config, &caller, id).await
        }
        ExpenseAction::Reject { id, reason } => {
            let caller = commands::require_caller(caller)?;
            commands::expense_reject(config, &caller, id, &reason).await
        }
        ExpenseAction::Pay {
            id,
            reference,
            force,
        } => {
            let caller = commands::require_caller(caller)?;
            commands::expense_pay(config, &caller, id, &reference, force).await
        }
        ExpenseAction::Cancel { id } => {
            let caller = commands::require_caller(caller)?;
            commands::expense_cancel(config, &caller, id).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "treasury_ledger=info"
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }
}

/// Log the settings that affect how the ledger behaves
fn startup_checks(config: &Config) {
    info!(
        "Treasury owner {}, state at {}",
        config.ledger.owner, config.ledger.state_path
    );

    if !config.safety.audit_log {
        warn!("Audit journal disabled - ledger changes will not be journaled");
    }
}
