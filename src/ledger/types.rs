//! Core types for the treasury ledger
//!
//! Defines identities, the treasury record, categories, and expenses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An already-authenticated caller or payee identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Singleton record of available funds and cumulative payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    /// Funds available for future expense payment
    pub balance: u64,

    /// Cumulative amount ever paid out
    pub total_paid: u64,
}

/// A named budget bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,

    /// Fixed ceiling, never edited after creation
    pub budget: u64,

    /// Amount committed by approved expenses
    pub spent: u64,

    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Budget still available for approvals
    pub fn remaining(&self) -> u64 {
        self.budget.saturating_sub(self.spent)
    }

    /// Check if an amount can still be reserved against this category
    pub fn can_reserve(&self, amount: u64) -> bool {
        amount <= self.remaining()
    }
}

/// Lifecycle state of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Created, waiting for a decision
    Pending,

    /// Budget reserved, waiting for payment
    Approved,

    /// Refused by the owner
    Rejected,

    /// Paid out of the treasury
    Paid,

    /// Withdrawn before payment
    Cancelled,
}

impl ExpenseStatus {
    pub const ALL: [ExpenseStatus; 5] = [
        ExpenseStatus::Pending,
        ExpenseStatus::Approved,
        ExpenseStatus::Rejected,
        ExpenseStatus::Paid,
        ExpenseStatus::Cancelled,
    ];

    /// Stable wire code for this status
    pub fn code(&self) -> u8 {
        match self {
            ExpenseStatus::Pending => 1,
            ExpenseStatus::Approved => 2,
            ExpenseStatus::Rejected => 3,
            ExpenseStatus::Paid => 4,
            ExpenseStatus::Cancelled => 5,
        }
    }

    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExpenseStatus::Rejected | ExpenseStatus::Paid | ExpenseStatus::Cancelled
        )
    }

    /// Transition table of the expense workflow
    pub fn can_transition_to(&self, next: ExpenseStatus) -> bool {
        use ExpenseStatus::*;
        match (self, next) {
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) => true,
            (Approved, Paid) | (Approved, Cancelled) => true,
            (Pending, _) | (Approved, _) => false,
            (Rejected, _) | (Paid, _) | (Cancelled, _) => false,
        }
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseStatus::Pending => write!(f, "Pending"),
            ExpenseStatus::Approved => write!(f, "Approved"),
            ExpenseStatus::Rejected => write!(f, "Rejected"),
            ExpenseStatus::Paid => write!(f, "Paid"),
            ExpenseStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for ExpenseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ExpenseStatus::Pending),
            "approved" => Ok(ExpenseStatus::Approved),
            "rejected" => Ok(ExpenseStatus::Rejected),
            "paid" => Ok(ExpenseStatus::Paid),
            "cancelled" | "canceled" => Ok(ExpenseStatus::Cancelled),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// A requested payment against a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub description: String,

    /// Fixed at creation
    pub amount: u64,

    pub payee: Identity,
    pub category_id: u64,
    pub notes: String,
    pub status: ExpenseStatus,

    /// Set only on rejection
    #[serde(default)]
    pub rejection_reason: Option<String>,

    /// Set only on payment
    #[serde(default)]
    pub payment_reference: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Time of the latest status change
    pub updated_at: DateTime<Utc>,
}

/// Length limits for the bounded text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLimits {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    #[serde(default = "default_max_text_len")]
    pub max_description_len: usize,
    #[serde(default = "default_max_text_len")]
    pub max_notes_len: usize,
    #[serde(default = "default_max_text_len")]
    pub max_reason_len: usize,
    #[serde(default = "default_max_payment_ref_len")]
    pub max_payment_ref_len: usize,
}

fn default_max_name_len() -> usize {
    64
}

fn default_max_text_len() -> usize {
    256
}

fn default_max_payment_ref_len() -> usize {
    64
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            max_description_len: default_max_text_len(),
            max_notes_len: default_max_text_len(),
            max_reason_len: default_max_text_len(),
            max_payment_ref_len: default_max_payment_ref_len(),
        }
    }
}

/// Reject text longer than `max` characters
pub fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::TextTooLong { field, len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use ExpenseStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Paid));

        assert!(Approved.can_transition_to(Paid));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Approved));

        for terminal in [Rejected, Paid, Cancelled] {
            assert!(terminal.is_terminal());
            for next in ExpenseStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ExpenseStatus::Pending.code(), 1);
        assert_eq!(ExpenseStatus::Rejected.code(), 3);
        assert_eq!(ExpenseStatus::Cancelled.code(), 5);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExpenseStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        assert_eq!("Canceled".parse::<ExpenseStatus>().unwrap(), ExpenseStatus::Cancelled);
        assert!(matches!(
            "unknown".parse::<ExpenseStatus>(),
            Err(Error::InvalidStatus(s)) if s == "unknown"
        ));
    }

    #[test]
    fn test_check_len_counts_chars() {
        assert!(check_len("name", "abcd", 4).is_ok());
        assert!(check_len("name", "éééé", 4).is_ok());
        let err = check_len("name", "abcde", 4).unwrap_err();
        assert!(matches!(err, Error::TextTooLong { field: "name", len: 5, max: 4 }));
    }

    #[test]
    fn test_category_remaining() {
        let category = Category {
            id: 0,
            name: "Small Budget".to_string(),
            budget: 400_000,
            spent: 300_000,
            created_at: Utc::now(),
        };
        assert_eq!(category.remaining(), 100_000);
        assert!(category.can_reserve(100_000));
        assert!(!category.can_reserve(200_000));
    }
}
