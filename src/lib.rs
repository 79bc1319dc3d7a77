//! Treasury Ledger Library
//!
//! Owner-governed treasury with category budgets and an expense approval
//! workflow.

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ErrorCode, Result};
pub use ledger::{ExpenseStatus, Identity, NewExpense, TreasuryLedger};
pub use service::LedgerService;
