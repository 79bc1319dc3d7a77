//! Append-only audit journal of committed ledger operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Identity;

/// A committed ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LedgerAction {
    FundsAdded { amount: u64, new_balance: u64 },
    CategoryAdded { category_id: u64, budget: u64 },
    ExpenseAdded { expense_id: u64, category_id: u64, amount: u64 },
    ExpenseApproved { expense_id: u64, category_id: u64, amount: u64 },
    ExpenseRejected { expense_id: u64, reason: String },
    ExpensePaid { expense_id: u64, amount: u64, payment_reference: String },
    ExpenseCancelled { expense_id: u64 },
}

impl std::fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerAction::FundsAdded { amount, new_balance } => {
                write!(f, "Funds added: {} (balance {})", amount, new_balance)
            }
            LedgerAction::CategoryAdded { category_id, budget } => {
                write!(f, "Category #{} added with budget {}", category_id, budget)
            }
            LedgerAction::ExpenseAdded {
                expense_id,
                category_id,
                amount,
            } => write!(
                f,
                "Expense #{} added: {} against category #{}",
                expense_id, amount, category_id
            ),
            LedgerAction::ExpenseApproved {
                expense_id,
                category_id,
                amount,
            } => write!(
                f,
                "Expense #{} approved: {} reserved from category #{}",
                expense_id, amount, category_id
            ),
            LedgerAction::ExpenseRejected { expense_id, reason } => {
                write!(f, "Expense #{} rejected: {}", expense_id, reason)
            }
            LedgerAction::ExpensePaid {
                expense_id,
                amount,
                payment_reference,
            } => write!(
                f,
                "Expense #{} paid: {} (ref {})",
                expense_id, amount, payment_reference
            ),
            LedgerAction::ExpenseCancelled { expense_id } => {
                write!(f, "Expense #{} cancelled", expense_id)
            }
        }
    }
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub caller: Identity,
    #[serde(flatten)]
    pub action: LedgerAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditJournal {
    next_seq: u64,
    entries: Vec<AuditEntry>,
}

impl AuditJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, caller: &Identity, action: LedgerAction) {
        self.entries.push(AuditEntry {
            seq: self.next_seq,
            timestamp: Utc::now(),
            caller: caller.clone(),
            action,
        });
        self.next_seq += 1;
    }

    /// Newest entries first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
