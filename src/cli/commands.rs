//! CLI command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::config::{parse_identity, Config};
use crate::ledger::{Category, Expense, ExpenseStatus, Identity, NewExpense};
use crate::service::LedgerService;
use crate::store::JsonFileStore;

/// Open the ledger configured in `config`
pub async fn open_ledger(config: &Config) -> Result<LedgerService> {
    let store = Arc::new(JsonFileStore::new(&config.ledger.state_path));
    LedgerService::open(config.owner(), config.ledger_options(), store)
        .await
        .with_context(|| format!("Failed to open ledger at {}", config.ledger.state_path))
}

/// Resolve the caller identity for a mutating command
pub fn require_caller(caller: Option<&str>) -> Result<Identity> {
    let caller = caller.context(
        "This command changes the ledger and needs a caller (--caller or TREASURY_CALLER)",
    )?;
    parse_identity(caller).context("caller")
}

/// Credit funds to the treasury
pub async fn add_funds(config: &Config, caller: &Identity, amount: u64) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let balance = ledger.add_funds(caller, amount).await?;

    println!("Added {} to treasury", amount);
    println!("Balance: {}", balance);
    Ok(())
}

/// Create a budget category
pub async fn category_add(
    config: &Config,
    caller: &Identity,
    name: &str,
    budget: u64,
) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let id = ledger.add_category(caller, name, budget).await?;

    println!("Created category #{} '{}' with budget {}", id, name, budget);
    Ok(())
}

/// Show one category
pub async fn category_show(config: &Config, id: u64) -> Result<()> {
    let ledger = open_ledger(config).await?;

    match ledger.category(id).await {
        Some(category) => print_category(&category),
        None => println!("Category #{} not found", id),
    }
    Ok(())
}

/// List all categories with their budget usage
pub async fn category_list(config: &Config) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let categories = ledger.categories().await;

    println!("\n=== CATEGORIES ===\n");
    if categories.is_empty() {
        println!("No categories defined.");
        println!("\nTo add one: treasury category add <NAME> <BUDGET>");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:>14} {:>14} {:>14}",
        "ID", "NAME", "BUDGET", "SPENT", "REMAINING"
    );
    println!("{}", "-".repeat(76));
    for category in &categories {
        println!(
            "{:<6} {:<24} {:>14} {:>14} {:>14}",
            category.id,
            truncate(&category.name, 24),
            category.budget,
            category.spent,
            category.remaining()
        );
    }

    println!();
    Ok(())
}

/// Record a new Pending expense
pub async fn expense_add(
    config: &Config,
    caller: &Identity,
    description: &str,
    amount: u64,
    payee: &str,
    category_id: u64,
    notes: &str,
) -> Result<()> {
    let payee = parse_identity(payee).context("payee")?;
    let ledger = open_ledger(config).await?;

    let id = ledger
        .add_expense(
            caller,
            NewExpense {
                description: description.to_string(),
                amount,
                payee,
                category_id,
                notes: notes.to_string(),
            },
        )
        .await?;

    println!("Created expense #{} ({}), status Pending", id, amount);
    Ok(())
}

/// Approve a Pending expense
pub async fn expense_approve(config: &Config, caller: &Identity, id: u64) -> Result<()> {
    let ledger = open_ledger(config).await?;
    ledger.approve_expense(caller, id).await?;

    if let Some(expense) = ledger.expense(id).await {
        let remaining = ledger
            .category(expense.category_id)
            .await
            .map(|c| c.remaining())
            .unwrap_or_default();
        println!(
            "Approved expense #{}: {} reserved, {} left in category #{}",
            id, expense.amount, remaining, expense.category_id
        );
    }
    Ok(())
}

/// Reject a Pending expense
pub async fn expense_reject(
    config: &Config,
    caller: &Identity,
    id: u64,
    reason: &str,
) -> Result<()> {
    let ledger = open_ledger(config).await?;
    ledger.reject_expense(caller, id, reason).await?;

    println!("Rejected expense #{}: {}", id, reason);
    Ok(())
}

/// Pay an Approved expense
///
/// The owner check runs before the expense is looked up, so a non-owner
/// never sees expense details or the confirmation prompt.
pub async fn expense_pay(
    config: &Config,
    caller: &Identity,
    id: u64,
    reference: &str,
    force: bool,
) -> Result<()> {
    let ledger = open_ledger(config).await?;
    ledger.authorize(caller, "pay-expense").await?;

    let expense = ledger.expense(id).await;

    // Unknown ids fall through so the ledger reports ExpenseNotFound
    if let Some(expense) = &expense {
        if expense.amount > config.safety.confirm_payment_above && !force {
            warn!(
                "Payment of {} exceeds confirmation threshold {}",
                expense.amount, config.safety.confirm_payment_above
            );
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Pay {} to {} for '{}'?",
                    expense.amount, expense.payee, expense.description
                ))
                .default(false)
                .interact()?;

            if !confirmed {
                info!("Payment of expense #{} aborted by user", id);
                println!("Payment cancelled.");
                return Ok(());
            }
        }
    }

    ledger.pay_expense(caller, id, reference).await?;

    if let Some(expense) = ledger.expense(id).await {
        println!("Paid expense #{}: {} to {}", id, expense.amount, expense.payee);
    }
    println!("Reference: {}", reference);
    println!("Balance: {}", ledger.balance().await);
    Ok(())
}

/// Cancel a Pending or Approved expense
pub async fn expense_cancel(config: &Config, caller: &Identity, id: u64) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let was_approved = ledger
        .expense(id)
        .await
        .map(|e| e.status == ExpenseStatus::Approved)
        .unwrap_or(false);

    ledger.cancel_expense(caller, id).await?;

    println!("Cancelled expense #{}", id);
    if was_approved {
        println!("Note: the budget reserved at approval stays committed.");
    }
    Ok(())
}

/// Show one expense
pub async fn expense_show(config: &Config, id: u64) -> Result<()> {
    let ledger = open_ledger(config).await?;

    match ledger.expense(id).await {
        Some(expense) => print_expense(&expense),
        None => println!("Expense #{} not found", id),
    }
    Ok(())
}

/// List expenses, optionally filtered by status
pub async fn expense_list(config: &Config, status: Option<&str>) -> Result<()> {
    let status = status
        .map(|s| s.parse::<ExpenseStatus>())
        .transpose()?;
    let ledger = open_ledger(config).await?;
    let expenses = ledger.expenses(status).await;

    println!("\n=== EXPENSES ===\n");
    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<28} {:>12} {:<8} {:<10} {}",
        "ID", "DESCRIPTION", "AMOUNT", "CATEGORY", "STATUS", "PAYEE"
    );
    println!("{}", "-".repeat(90));
    for expense in &expenses {
        println!(
            "{:<6} {:<28} {:>12} {:<8} {:<10} {}",
            expense.id,
            truncate(&expense.description, 28),
            expense.amount,
            expense.category_id,
            expense.status,
            expense.payee
        );
    }

    println!();
    Ok(())
}

/// Show treasury balance and total paid
pub async fn balance(config: &Config) -> Result<()> {
    let ledger = open_ledger(config).await?;

    println!("Balance: {}", ledger.balance().await);
    println!("Total expenses paid: {}", ledger.total_expenses_paid().await);
    Ok(())
}

/// Show running totals
pub async fn status(config: &Config) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let summary = ledger.summary().await;

    println!("\n=== TREASURY STATUS ===\n");
    println!("Owner: {}", ledger.owner().await);
    println!("Balance: {}", summary.balance);
    println!("Total Paid: {}", summary.total_paid);
    println!("\nBudgets:");
    println!("  Categories: {}", summary.categories);
    println!("  Total Budget: {}", summary.total_budget);
    println!("  Committed: {}", summary.total_committed);
    println!("\nExpenses:");
    println!("  Pending: {}", summary.pending);
    println!("  Approved: {}", summary.approved);
    println!("  Paid: {}", summary.paid);
    println!("  Rejected: {}", summary.rejected);
    println!("  Cancelled: {}", summary.cancelled);
    println!();
    Ok(())
}

/// Show the audit journal, newest first
pub async fn history(config: &Config, limit: usize) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let entries = ledger.audit_log(limit).await;

    println!("\n=== AUDIT JOURNAL ===\n");
    if entries.is_empty() {
        println!("No journal entries found.");
        if !config.safety.audit_log {
            println!("(audit journal is disabled in configuration)");
        }
        return Ok(());
    }

    println!("{:<6} {:<20} {:<16} {}", "SEQ", "TIME", "CALLER", "ACTION");
    println!("{}", "-".repeat(80));
    for entry in &entries {
        println!(
            "{:<6} {:<20} {:<16} {}",
            entry.seq,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            truncate(entry.caller.as_str(), 16),
            entry.action
        );
    }

    println!();
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

fn print_category(category: &Category) {
    println!("\n=== CATEGORY #{} ===\n", category.id);
    println!("Name: {}", category.name);
    println!("Budget: {}", category.budget);
    println!("Spent: {}", category.spent);
    println!("Remaining: {}", category.remaining());
    println!("Created: {}", category.created_at.to_rfc3339());
    println!();
}

fn print_expense(expense: &Expense) {
    println!("\n=== EXPENSE #{} ===\n", expense.id);
    println!("Description: {}", expense.description);
    println!("Amount: {}", expense.amount);
    println!("Payee: {}", expense.payee);
    println!("Category: #{}", expense.category_id);
    println!("Status: {} (u{})", expense.status, expense.status.code());
    if !expense.notes.is_empty() {
        println!("Notes: {}", expense.notes);
    }
    if let Some(reason) = &expense.rejection_reason {
        println!("Rejection reason: {}", reason);
    }
    if let Some(reference) = &expense.payment_reference {
        println!("Payment reference: {}", reference);
    }
    println!("Created: {}", expense.created_at.to_rfc3339());
    println!("Updated: {}", expense.updated_at.to_rfc3339());
    println!();
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let head: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}
