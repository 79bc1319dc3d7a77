//! Ledger service
//!
//! Serializes every ledger operation behind one mutex and persists the
//! result before it becomes visible. Each mutating call works on a staged
//! copy of the ledger: the copy is changed, saved, and only then swapped in.
//! If either the operation or the save fails, neither memory nor storage
//! changes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ledger::{
    AuditEntry, Category, Expense, ExpenseStatus, Identity, LedgerOptions, LedgerSummary,
    NewExpense, TreasuryLedger,
};
use crate::store::{LedgerSnapshot, LedgerStore};

pub struct LedgerService {
    ledger: Mutex<TreasuryLedger>,
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    /// Open the ledger from `store`, initializing it for `owner` if empty
    ///
    /// The owner is fixed when the ledger is first created; opening an
    /// existing ledger with a different owner is refused.
    pub async fn open(
        owner: Identity,
        options: LedgerOptions,
        store: Arc<dyn LedgerStore>,
    ) -> Result<Self> {
        let ledger = match store.load().await? {
            Some(snapshot) => {
                if snapshot.state.owner != owner {
                    return Err(Error::Config(format!(
                        "Ledger is owned by {}, configured owner is {}",
                        snapshot.state.owner, owner
                    )));
                }
                TreasuryLedger::from_state(snapshot.state, options)
            }
            None => {
                info!("Initializing new treasury ledger for owner {}", owner);
                let ledger = TreasuryLedger::new(owner, options);
                store
                    .save(&LedgerSnapshot::new(ledger.state().clone()))
                    .await?;
                ledger
            }
        };

        Ok(Self {
            ledger: Mutex::new(ledger),
            store,
        })
    }

    /// Run one mutating operation as a single critical section
    async fn commit<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut TreasuryLedger) -> Result<T>,
    {
        let mut guard = self.ledger.lock().await;
        let mut staged = guard.clone();

        let value = match op(&mut staged) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ledger operation refused: {}", e);
                return Err(e);
            }
        };

        self.store
            .save(&LedgerSnapshot::new(staged.state().clone()))
            .await?;
        *guard = staged;
        debug!("Ledger change committed");

        Ok(value)
    }

    pub async fn add_funds(&self, caller: &Identity, amount: u64) -> Result<u64> {
        self.commit(|l| l.add_funds(caller, amount)).await
    }

    pub async fn add_category(&self, caller: &Identity, name: &str, budget: u64) -> Result<u64> {
        self.commit(|l| l.add_category(caller, name, budget)).await
    }

    pub async fn add_expense(&self, caller: &Identity, expense: NewExpense) -> Result<u64> {
        self.commit(|l| l.add_expense(caller, expense)).await
    }

    pub async fn approve_expense(&self, caller: &Identity, expense_id: u64) -> Result<bool> {
        self.commit(|l| l.approve_expense(caller, expense_id)).await
    }

    pub async fn reject_expense(
        &self,
        caller: &Identity,
        expense_id: u64,
        reason: &str,
    ) -> Result<bool> {
        self.commit(|l| l.reject_expense(caller, expense_id, reason))
            .await
    }

    pub async fn pay_expense(
        &self,
        caller: &Identity,
        expense_id: u64,
        payment_ref: &str,
    ) -> Result<bool> {
        self.commit(|l| l.pay_expense(caller, expense_id, payment_ref))
            .await
    }

    pub async fn cancel_expense(&self, caller: &Identity, expense_id: u64) -> Result<bool> {
        self.commit(|l| l.cancel_expense(caller, expense_id)).await
    }

    pub async fn balance(&self) -> u64 {
        self.ledger.lock().await.balance()
    }

    pub async fn total_expenses_paid(&self) -> u64 {
        self.ledger.lock().await.total_expenses_paid()
    }

    pub async fn category(&self, id: u64) -> Option<Category> {
        self.ledger.lock().await.category(id).cloned()
    }

    pub async fn expense(&self, id: u64) -> Option<Expense> {
        self.ledger.lock().await.expense(id).cloned()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.ledger.lock().await.categories().cloned().collect()
    }

    pub async fn expenses(&self, status: Option<ExpenseStatus>) -> Vec<Expense> {
        self.ledger
            .lock()
            .await
            .expenses(status)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        self.ledger
            .lock()
            .await
            .audit_log(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn summary(&self) -> LedgerSummary {
        self.ledger.lock().await.summary()
    }

    pub async fn owner(&self) -> Identity {
        self.ledger.lock().await.owner().clone()
    }

    /// Owner check without touching the ledger
    pub async fn authorize(&self, caller: &Identity, operation: &str) -> Result<()> {
        self.ledger.lock().await.authorize(caller, operation)
    }
}
