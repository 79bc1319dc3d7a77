//! Expense registry
//!
//! Append-only store of expense records. Records are never removed; status
//! changes go through [`ExpenseRegistry::transition`], which enforces the
//! workflow transition table.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::types::{Expense, ExpenseStatus, Identity};

/// Fields supplied when an expense is created
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: u64,
    pub payee: Identity,
    pub category_id: u64,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRegistry {
    next_id: u64,
    expenses: Vec<Expense>,
}

impl ExpenseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Append a Pending expense, returning its id
    ///
    /// The caller is responsible for checking that the category exists.
    pub fn create(&mut self, new: NewExpense) -> u64 {
        let id = self.next_id;
        let now = Utc::now();
        self.expenses.push(Expense {
            id,
            description: new.description,
            amount: new.amount,
            payee: new.payee,
            category_id: new.category_id,
            notes: new.notes,
            status: ExpenseStatus::Pending,
            rejection_reason: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        });
        self.next_id += 1;
        id
    }

    pub fn find(&self, id: u64) -> Option<&Expense> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.expenses.get(idx))
            .filter(|e| e.id == id)
    }

    /// Look up an expense, failing with `ExpenseNotFound`
    pub fn get(&self, id: u64) -> Result<&Expense> {
        self.find(id).ok_or(Error::ExpenseNotFound(id))
    }

    /// Validate a status change without mutating, returning the expense
    pub fn check_transition(&self, id: u64, next: ExpenseStatus) -> Result<&Expense> {
        let expense = self.get(id)?;
        if !expense.status.can_transition_to(next) {
            return Err(Error::InvalidStateTransition {
                expense_id: id,
                from: expense.status,
                to: next,
            });
        }
        Ok(expense)
    }

    /// Move an expense to `next`, returning the mutable record so the
    /// caller can fill transition-specific fields
    pub fn transition(&mut self, id: u64, next: ExpenseStatus) -> Result<&mut Expense> {
        self.check_transition(id, next)?;
        let expense = usize::try_from(id)
            .ok()
            .and_then(|idx| self.expenses.get_mut(idx))
            .ok_or(Error::ExpenseNotFound(id))?;
        expense.status = next;
        expense.updated_at = Utc::now();
        Ok(expense)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter()
    }

    /// Expenses in a given status, oldest first
    pub fn with_status(&self, status: ExpenseStatus) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().filter(move |e| e.status == status)
    }

    pub fn count_with_status(&self, status: ExpenseStatus) -> usize {
        self.with_status(status).count()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptops() -> NewExpense {
        NewExpense {
            description: "New laptops".to_string(),
            amount: 500_000,
            payee: Identity::new("wallet_1"),
            category_id: 0,
            notes: "For engineering team".to_string(),
        }
    }

    #[test]
    fn test_create_is_pending() {
        let mut registry = ExpenseRegistry::new();

        assert_eq!(registry.create(laptops()), 0);
        assert_eq!(registry.create(laptops()), 1);

        let expense = registry.get(0).unwrap();
        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert!(expense.rejection_reason.is_none());
        assert!(expense.payment_reference.is_none());
        assert!(matches!(registry.get(2), Err(Error::ExpenseNotFound(2))));
    }

    #[test]
    fn test_transition_follows_table() {
        let mut registry = ExpenseRegistry::new();
        let id = registry.create(laptops());

        registry.transition(id, ExpenseStatus::Approved).unwrap();
        let err = registry.transition(id, ExpenseStatus::Rejected).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidStateTransition {
                from: ExpenseStatus::Approved,
                to: ExpenseStatus::Rejected,
                ..
            }
        ));

        registry.transition(id, ExpenseStatus::Paid).unwrap();
        assert!(registry.transition(id, ExpenseStatus::Cancelled).is_err());
        assert_eq!(registry.get(id).unwrap().status, ExpenseStatus::Paid);
    }

    #[test]
    fn test_status_counts() {
        let mut registry = ExpenseRegistry::new();
        registry.create(laptops());
        let id = registry.create(laptops());
        registry.transition(id, ExpenseStatus::Cancelled).unwrap();

        assert_eq!(registry.count_with_status(ExpenseStatus::Pending), 1);
        assert_eq!(registry.count_with_status(ExpenseStatus::Cancelled), 1);
        assert_eq!(registry.len(), 2);
    }
}
