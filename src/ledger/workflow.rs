//! Expense workflow orchestrator
//!
//! [`TreasuryLedger`] is the only writer of treasury, category, and expense
//! state. Every mutating operation runs in two phases: all preconditions are
//! checked against the current state first, then every write is applied.
//! A failed call therefore leaves the ledger exactly as it found it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::audit::{AuditEntry, AuditJournal, LedgerAction};
use super::category::CategoryRegistry;
use super::expense::{ExpenseRegistry, NewExpense};
use super::guard::OwnerGuard;
use super::types::{check_len, Category, Expense, ExpenseStatus, Identity, TextLimits, Treasury};

/// Persistent ledger records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub owner: Identity,
    pub treasury: Treasury,
    pub categories: CategoryRegistry,
    pub expenses: ExpenseRegistry,
    #[serde(default)]
    pub journal: AuditJournal,
}

impl LedgerState {
    /// Empty ledger owned by `owner`
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            treasury: Treasury::default(),
            categories: CategoryRegistry::new(),
            expenses: ExpenseRegistry::new(),
            journal: AuditJournal::new(),
        }
    }
}

/// Runtime settings that are not part of the persisted state
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    pub limits: TextLimits,
    pub audit_log: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            limits: TextLimits::default(),
            audit_log: true,
        }
    }
}

/// Running totals for status displays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub balance: u64,
    pub total_paid: u64,
    pub categories: usize,
    pub total_budget: u64,
    pub total_committed: u64,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub paid: usize,
    pub cancelled: usize,
}

/// Owner-governed treasury with category budgets and an expense workflow
#[derive(Debug, Clone)]
pub struct TreasuryLedger {
    state: LedgerState,
    guard: OwnerGuard,
    options: LedgerOptions,
}

impl TreasuryLedger {
    /// Create an empty ledger
    pub fn new(owner: Identity, options: LedgerOptions) -> Self {
        Self::from_state(LedgerState::new(owner), options)
    }

    /// Resume from persisted state
    pub fn from_state(state: LedgerState, options: LedgerOptions) -> Self {
        let guard = OwnerGuard::new(state.owner.clone());
        Self {
            state,
            guard,
            options,
        }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    pub fn owner(&self) -> &Identity {
        self.guard.owner()
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        self.guard.is_owner(caller)
    }

    /// Fail with `NotOwner` unless `caller` may run `operation`
    pub fn authorize(&self, caller: &Identity, operation: &str) -> Result<()> {
        self.guard.authorize(caller, operation)
    }

    fn journal(&mut self, caller: &Identity, action: LedgerAction) {
        if self.options.audit_log {
            self.state.journal.record(caller, action);
        }
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Credit the treasury, returning the new balance
    pub fn add_funds(&mut self, caller: &Identity, amount: u64) -> Result<u64> {
        self.guard.authorize(caller, "add-funds")?;
        self.state.treasury.check_credit(amount)?;

        let new_balance = self.state.treasury.credit(amount)?;
        self.journal(caller, LedgerAction::FundsAdded { amount, new_balance });

        info!("Added {} to treasury, balance now {}", amount, new_balance);
        Ok(new_balance)
    }

    /// Register a budget category, returning its id
    pub fn add_category(&mut self, caller: &Identity, name: &str, budget: u64) -> Result<u64> {
        self.guard.authorize(caller, "add-category")?;
        check_len("name", name, self.options.limits.max_name_len)?;

        let category_id = self.state.categories.add(name.to_string(), budget);
        self.journal(
            caller,
            LedgerAction::CategoryAdded {
                category_id,
                budget,
            },
        );

        info!(
            "Created category #{} '{}' with budget {}",
            category_id, name, budget
        );
        Ok(category_id)
    }

    /// Record a Pending expense, returning its id
    ///
    /// The category must exist; its budget is only checked on approval.
    pub fn add_expense(&mut self, caller: &Identity, expense: NewExpense) -> Result<u64> {
        self.guard.authorize(caller, "add-expense")?;

        let limits = self.options.limits;
        check_len("description", &expense.description, limits.max_description_len)?;
        check_len("notes", &expense.notes, limits.max_notes_len)?;
        if !self.state.categories.contains(expense.category_id) {
            return Err(Error::CategoryNotFound(expense.category_id));
        }

        let category_id = expense.category_id;
        let amount = expense.amount;
        let expense_id = self.state.expenses.create(expense);
        self.journal(
            caller,
            LedgerAction::ExpenseAdded {
                expense_id,
                category_id,
                amount,
            },
        );

        info!(
            "Created expense #{} for {} against category #{}",
            expense_id, amount, category_id
        );
        Ok(expense_id)
    }

    /// Approve a Pending expense and reserve its amount from the category budget
    pub fn approve_expense(&mut self, caller: &Identity, expense_id: u64) -> Result<bool> {
        self.guard.authorize(caller, "approve-expense")?;

        let expense = self
            .state
            .expenses
            .check_transition(expense_id, ExpenseStatus::Approved)?;
        let (category_id, amount) = (expense.category_id, expense.amount);
        self.state.categories.check_reserve(category_id, amount)?;

        self.state.categories.reserve_budget(category_id, amount)?;
        self.state
            .expenses
            .transition(expense_id, ExpenseStatus::Approved)?;
        self.journal(
            caller,
            LedgerAction::ExpenseApproved {
                expense_id,
                category_id,
                amount,
            },
        );

        info!(
            "Approved expense #{}: reserved {} from category #{}",
            expense_id, amount, category_id
        );
        Ok(true)
    }

    /// Reject a Pending expense
    pub fn reject_expense(
        &mut self,
        caller: &Identity,
        expense_id: u64,
        reason: &str,
    ) -> Result<bool> {
        self.guard.authorize(caller, "reject-expense")?;
        self.state
            .expenses
            .check_transition(expense_id, ExpenseStatus::Rejected)?;
        check_len("reason", reason, self.options.limits.max_reason_len)?;

        let expense = self
            .state
            .expenses
            .transition(expense_id, ExpenseStatus::Rejected)?;
        expense.rejection_reason = Some(reason.to_string());
        self.journal(
            caller,
            LedgerAction::ExpenseRejected {
                expense_id,
                reason: reason.to_string(),
            },
        );

        info!("Rejected expense #{}: {}", expense_id, reason);
        Ok(true)
    }

    /// Pay an Approved expense out of the treasury
    pub fn pay_expense(
        &mut self,
        caller: &Identity,
        expense_id: u64,
        payment_ref: &str,
    ) -> Result<bool> {
        self.guard.authorize(caller, "pay-expense")?;

        let amount = self
            .state
            .expenses
            .check_transition(expense_id, ExpenseStatus::Paid)?
            .amount;
        check_len("payment reference", payment_ref, self.options.limits.max_payment_ref_len)?;
        self.state.treasury.check_debit(amount)?;

        let new_balance = self.state.treasury.debit_for_payment(amount)?;
        let expense = self
            .state
            .expenses
            .transition(expense_id, ExpenseStatus::Paid)?;
        expense.payment_reference = Some(payment_ref.to_string());
        self.journal(
            caller,
            LedgerAction::ExpensePaid {
                expense_id,
                amount,
                payment_reference: payment_ref.to_string(),
            },
        );

        info!(
            "Paid expense #{}: {} (ref {}), balance now {}",
            expense_id, amount, payment_ref, new_balance
        );
        Ok(true)
    }

    /// Cancel a Pending or Approved expense
    ///
    /// Budget reserved by an earlier approval stays committed.
    pub fn cancel_expense(&mut self, caller: &Identity, expense_id: u64) -> Result<bool> {
        self.guard.authorize(caller, "cancel-expense")?;

        let previous = self
            .state
            .expenses
            .check_transition(expense_id, ExpenseStatus::Cancelled)?
            .status;

        self.state
            .expenses
            .transition(expense_id, ExpenseStatus::Cancelled)?;
        self.journal(caller, LedgerAction::ExpenseCancelled { expense_id });

        info!("Cancelled expense #{} (was {})", expense_id, previous);
        if previous == ExpenseStatus::Approved {
            debug!("Reserved budget for expense #{} remains committed", expense_id);
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Read-only queries
    // ------------------------------------------------------------------

    pub fn balance(&self) -> u64 {
        self.state.treasury.balance
    }

    pub fn total_expenses_paid(&self) -> u64 {
        self.state.treasury.total_paid
    }

    pub fn category(&self, id: u64) -> Option<&Category> {
        self.state.categories.get(id)
    }

    pub fn expense(&self, id: u64) -> Option<&Expense> {
        self.state.expenses.find(id)
    }

    /// Budget still available in a category
    pub fn remaining_budget(&self, category_id: u64) -> Option<u64> {
        self.category(category_id).map(Category::remaining)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.state.categories.iter()
    }

    /// All expenses, optionally restricted to one status
    pub fn expenses(&self, status: Option<ExpenseStatus>) -> Vec<&Expense> {
        match status {
            Some(status) => self.state.expenses.with_status(status).collect(),
            None => self.state.expenses.iter().collect(),
        }
    }

    /// Newest journal entries first
    pub fn audit_log(&self, limit: usize) -> Vec<&AuditEntry> {
        self.state.journal.recent(limit).collect()
    }

    pub fn summary(&self) -> LedgerSummary {
        let expenses = &self.state.expenses;
        LedgerSummary {
            balance: self.balance(),
            total_paid: self.total_expenses_paid(),
            categories: self.state.categories.len(),
            total_budget: self.categories().map(|c| c.budget).fold(0, u64::saturating_add),
            total_committed: self.categories().map(|c| c.spent).fold(0, u64::saturating_add),
            pending: expenses.count_with_status(ExpenseStatus::Pending),
            approved: expenses.count_with_status(ExpenseStatus::Approved),
            rejected: expenses.count_with_status(ExpenseStatus::Rejected),
            paid: expenses.count_with_status(ExpenseStatus::Paid),
            cancelled: expenses.count_with_status(ExpenseStatus::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const CATEGORY_NAME: &str = "Office Supplies";
    const CATEGORY_BUDGET: u64 = 1_000_000;
    const EXPENSE_AMOUNT: u64 = 500_000;
    const PAYMENT_TX_HASH: &str = "0x1234567890abcdef";

    fn deployer() -> Identity {
        Identity::new("deployer")
    }

    fn wallet1() -> Identity {
        Identity::new("wallet_1")
    }

    fn ledger() -> TreasuryLedger {
        TreasuryLedger::new(deployer(), LedgerOptions::default())
    }

    fn expense(description: &str, amount: u64, category_id: u64) -> NewExpense {
        NewExpense {
            description: description.to_string(),
            amount,
            payee: wallet1(),
            category_id,
            notes: "For engineering team".to_string(),
        }
    }

    fn code(err: Error) -> u32 {
        err.code().map(ErrorCode::as_u32).unwrap_or(0)
    }

    #[test]
    fn test_full_payment_flow() {
        let mut ledger = ledger();
        let owner = deployer();

        assert_eq!(ledger.add_funds(&owner, 2_000_000).unwrap(), 2_000_000);
        assert_eq!(
            ledger
                .add_category(&owner, CATEGORY_NAME, CATEGORY_BUDGET)
                .unwrap(),
            0
        );
        assert_eq!(
            ledger
                .add_expense(&owner, expense("New laptops", EXPENSE_AMOUNT, 0))
                .unwrap(),
            0
        );

        assert!(ledger.approve_expense(&owner, 0).unwrap());
        assert_eq!(ledger.category(0).unwrap().spent, 500_000);

        assert!(ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap());
        assert_eq!(ledger.balance(), 1_500_000);
        assert_eq!(ledger.total_expenses_paid(), 500_000);

        let paid = ledger.expense(0).unwrap();
        assert_eq!(paid.status, ExpenseStatus::Paid);
        assert_eq!(paid.payment_reference.as_deref(), Some(PAYMENT_TX_HASH));
        assert_eq!(ledger.audit_log(100).len(), 5);
    }

    #[test]
    fn test_non_owner_is_rejected_without_effects() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 2_000_000).unwrap();
        ledger.add_category(&owner, CATEGORY_NAME, CATEGORY_BUDGET).unwrap();
        ledger
            .add_expense(&owner, expense("New laptops", EXPENSE_AMOUNT, 0))
            .unwrap();
        ledger.approve_expense(&owner, 0).unwrap();
        ledger
            .add_expense(&owner, expense("Chairs", 1_000, 0))
            .unwrap();

        let before = ledger.state().clone();
        let stranger = wallet1();

        assert_eq!(code(ledger.add_funds(&stranger, 1).unwrap_err()), 100);
        assert_eq!(
            code(ledger.add_category(&stranger, "Marketing", 1).unwrap_err()),
            100
        );
        assert_eq!(
            code(
                ledger
                    .add_expense(&stranger, expense("New laptops", 1, 0))
                    .unwrap_err()
            ),
            100
        );
        assert_eq!(code(ledger.approve_expense(&stranger, 1).unwrap_err()), 100);
        assert_eq!(code(ledger.reject_expense(&stranger, 1, "no").unwrap_err()), 100);
        assert_eq!(
            code(ledger.pay_expense(&stranger, 0, PAYMENT_TX_HASH).unwrap_err()),
            100
        );
        assert_eq!(code(ledger.cancel_expense(&stranger, 1).unwrap_err()), 100);

        // Authorization comes before existence checks
        assert_eq!(code(ledger.approve_expense(&stranger, 99).unwrap_err()), 100);

        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn test_budget_exceeded_changes_nothing() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 2_000_000).unwrap();
        ledger.add_category(&owner, "Small Budget", 400_000).unwrap();
        ledger
            .add_expense(&owner, expense("Small expense", 300_000, 0))
            .unwrap();
        ledger.approve_expense(&owner, 0).unwrap();
        ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap();
        assert_eq!(ledger.remaining_budget(0), Some(100_000));

        // Creation does not check budget
        let id = ledger
            .add_expense(&owner, expense("Large expense", 200_000, 0))
            .unwrap();
        assert_eq!(id, 1);

        let before = ledger.state().clone();
        let err = ledger.approve_expense(&owner, id).unwrap_err();
        assert_eq!(code(err), 106);
        assert_eq!(ledger.state(), &before);
        assert_eq!(ledger.balance(), 1_700_000);
        assert_eq!(ledger.category(0).unwrap().spent, 300_000);
        assert_eq!(ledger.expense(id).unwrap().status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 2_000_000).unwrap();
        ledger.add_category(&owner, CATEGORY_NAME, CATEGORY_BUDGET).unwrap();
        ledger
            .add_expense(&owner, expense("New laptops", EXPENSE_AMOUNT, 0))
            .unwrap();

        assert!(ledger.reject_expense(&owner, 0, "Budget constraints").unwrap());
        let rejected = ledger.expense(0).unwrap();
        assert_eq!(rejected.status.code(), 3);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Budget constraints"));

        let err = ledger.approve_expense(&owner, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        let err = ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert!(ledger.cancel_expense(&owner, 0).is_err());
        assert_eq!(ledger.category(0).unwrap().spent, 0);
    }

    #[test]
    fn test_cancel_rules() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 2_000_000).unwrap();
        ledger.add_category(&owner, CATEGORY_NAME, CATEGORY_BUDGET).unwrap();
        for amount in [100_000, 200_000, 300_000, 50_000] {
            ledger
                .add_expense(&owner, expense("Office chairs", amount, 0))
                .unwrap();
        }

        // Pending -> Cancelled
        assert!(ledger.cancel_expense(&owner, 0).unwrap());
        assert_eq!(ledger.expense(0).unwrap().status.code(), 5);

        // Approved -> Cancelled keeps the reservation
        ledger.approve_expense(&owner, 1).unwrap();
        assert!(ledger.cancel_expense(&owner, 1).unwrap());
        assert_eq!(ledger.category(0).unwrap().spent, 200_000);

        // Paid and Rejected cannot be cancelled
        ledger.approve_expense(&owner, 2).unwrap();
        ledger.pay_expense(&owner, 2, PAYMENT_TX_HASH).unwrap();
        assert_eq!(code(ledger.cancel_expense(&owner, 2).unwrap_err()), 105);
        ledger.reject_expense(&owner, 3, "Duplicate").unwrap();
        assert_eq!(code(ledger.cancel_expense(&owner, 3).unwrap_err()), 105);

        // Cancelled cannot be cancelled again or paid
        assert_eq!(code(ledger.cancel_expense(&owner, 0).unwrap_err()), 105);
        assert_eq!(
            code(ledger.pay_expense(&owner, 1, PAYMENT_TX_HASH).unwrap_err()),
            105
        );
        assert_eq!(ledger.category(0).unwrap().spent, 500_000);
    }

    #[test]
    fn test_pay_requires_approval_and_funds() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_category(&owner, CATEGORY_NAME, CATEGORY_BUDGET).unwrap();
        ledger
            .add_expense(&owner, expense("New laptops", EXPENSE_AMOUNT, 0))
            .unwrap();

        // Pending cannot be paid
        assert_eq!(
            code(ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap_err()),
            105
        );

        // Approved but the treasury is short
        ledger.approve_expense(&owner, 0).unwrap();
        ledger.add_funds(&owner, 499_999).unwrap();
        let before = ledger.state().clone();
        let err = ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap_err();
        assert_eq!(code(err), 103);
        assert_eq!(ledger.state(), &before);

        ledger.add_funds(&owner, 1).unwrap();
        assert!(ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap());
        assert_eq!(ledger.balance(), 0);

        // No double payment
        assert_eq!(
            code(ledger.pay_expense(&owner, 0, PAYMENT_TX_HASH).unwrap_err()),
            105
        );
        assert_eq!(ledger.total_expenses_paid(), EXPENSE_AMOUNT);
    }

    #[test]
    fn test_referential_errors() {
        let mut ledger = ledger();
        let owner = deployer();

        let err = ledger
            .add_expense(&owner, expense("Orphan", 1, 0))
            .unwrap_err();
        assert_eq!(code(err), 101);
        assert_eq!(ledger.state().expenses.next_id(), 0);

        assert_eq!(code(ledger.approve_expense(&owner, 0).unwrap_err()), 102);
        assert_eq!(code(ledger.reject_expense(&owner, 0, "x").unwrap_err()), 102);
        assert_eq!(code(ledger.pay_expense(&owner, 0, "x").unwrap_err()), 102);
        assert_eq!(code(ledger.cancel_expense(&owner, 0).unwrap_err()), 102);
        assert!(ledger.expense(0).is_none());
        assert!(ledger.category(0).is_none());
    }

    #[test]
    fn test_bounded_text() {
        let mut ledger = TreasuryLedger::new(
            deployer(),
            LedgerOptions {
                limits: TextLimits {
                    max_name_len: 8,
                    ..TextLimits::default()
                },
                audit_log: true,
            },
        );
        let owner = deployer();

        let err = ledger
            .add_category(&owner, "Office Supplies", 10)
            .unwrap_err();
        assert_eq!(code(err), 104);
        assert_eq!(ledger.add_category(&owner, "Office", 10).unwrap(), 0);
    }

    #[test]
    fn test_audit_log_can_be_disabled() {
        let mut ledger = TreasuryLedger::new(
            deployer(),
            LedgerOptions {
                audit_log: false,
                ..LedgerOptions::default()
            },
        );
        ledger.add_funds(&deployer(), 10).unwrap();
        assert!(ledger.audit_log(10).is_empty());
    }

    #[test]
    fn test_failed_calls_are_not_journaled() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_category(&owner, CATEGORY_NAME, 10).unwrap();
        ledger.add_expense(&owner, expense("Too big", 11, 0)).unwrap();
        assert!(ledger.approve_expense(&owner, 0).is_err());
        assert!(ledger.add_funds(&wallet1(), 5).is_err());
        assert_eq!(ledger.audit_log(100).len(), 2);
    }

    #[test]
    fn test_summary() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 1_000).unwrap();
        ledger.add_category(&owner, "A", 600).unwrap();
        ledger.add_category(&owner, "B", 400).unwrap();
        ledger.add_expense(&owner, expense("x", 100, 0)).unwrap();
        ledger.add_expense(&owner, expense("y", 200, 1)).unwrap();
        ledger.approve_expense(&owner, 1).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.balance, 1_000);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.total_budget, 1_000);
        assert_eq!(summary.total_committed, 200);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.approved, 1);
        assert_eq!(ledger.expenses(Some(ExpenseStatus::Approved)).len(), 1);
        assert_eq!(ledger.expenses(None).len(), 2);
    }

    #[test]
    fn test_budget_never_overrun_under_mixed_calls() {
        let mut ledger = ledger();
        let owner = deployer();
        ledger.add_funds(&owner, 10_000).unwrap();
        ledger.add_category(&owner, "Ops", 1_000).unwrap();

        for (i, amount) in [300u64, 450, 250, 200, 1, 0, 1_000].iter().enumerate() {
            let id = ledger.add_expense(&owner, expense("op", *amount, 0)).unwrap();
            assert_eq!(id, i as u64);
            let _ = ledger.approve_expense(&owner, id);
            if i % 2 == 0 {
                let _ = ledger.pay_expense(&owner, id, "ref");
            } else {
                let _ = ledger.cancel_expense(&owner, id);
            }

            let category = ledger.category(0).unwrap();
            assert!(category.spent <= category.budget);
            assert_eq!(ledger.balance() + ledger.total_expenses_paid(), 10_000);
        }
    }
}
