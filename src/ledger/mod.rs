//! Treasury ledger core
//!
//! Tracks available funds, budgeted spending categories, and expenses that
//! move through an owner-controlled approval workflow.
//!
//! # Architecture
//!
//! ```text
//! OwnerGuard ─┐
//! Treasury ───┼──→ TreasuryLedger (workflow) ──→ AuditJournal
//! Categories ─┤
//! Expenses ───┘
//! ```
//!
//! # Expense lifecycle
//!
//! ```text
//! Pending ──→ Approved ──→ Paid
//!    │           │
//!    ├──→ Rejected
//!    └──→ Cancelled ←┘
//! ```
//!
//! Budget is reserved on approval and stays reserved if an approved
//! expense is later cancelled.

pub mod audit;
pub mod category;
pub mod expense;
pub mod guard;
pub mod treasury;
pub mod types;
pub mod workflow;

pub use audit::{AuditEntry, AuditJournal, LedgerAction};
pub use category::CategoryRegistry;
pub use expense::{ExpenseRegistry, NewExpense};
pub use guard::OwnerGuard;
pub use types::{Category, Expense, ExpenseStatus, Identity, TextLimits, Treasury};
pub use workflow::{LedgerOptions, LedgerState, LedgerSummary, TreasuryLedger};
