//! Error types for the treasury ledger

use thiserror::Error;

use crate::ledger::types::ExpenseStatus;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Stable numeric codes for ledger failures
///
/// External callers branch on these instead of matching error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    NotOwner = 100,
    CategoryNotFound = 101,
    ExpenseNotFound = 102,
    InsufficientFunds = 103,
    TextTooLong = 104,
    InvalidStateTransition = 105,
    BudgetExceeded = 106,
    AmountOverflow = 107,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "u{}", self.as_u32())
    }
}

/// Main error type for the treasury ledger
#[derive(Error, Debug)]
pub enum Error {
    // Authorization errors
    #[error("Caller {caller} is not the treasury owner")]
    NotOwner { caller: String },

    // Referential integrity errors
    #[error("Category not found: {0}")]
    CategoryNotFound(u64),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(u64),

    // Resource limit errors
    #[error("Budget exceeded for category {category_id}: requested {requested}, remaining {remaining}")]
    BudgetExceeded {
        category_id: u64,
        requested: u64,
        remaining: u64,
    },

    #[error("Insufficient funds: {available} available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Amount overflow: {current} + {added} exceeds the ledger range")]
    AmountOverflow { current: u64, added: u64 },

    #[error("{field} too long: {len} characters, limit is {max}")]
    TextTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    // Workflow errors
    #[error("Invalid state transition for expense {expense_id}: {from} -> {to}")]
    InvalidStateTransition {
        expense_id: u64,
        from: ExpenseStatus,
        to: ExpenseStatus,
    },

    // Input errors
    #[error("Unknown expense status: {0}")]
    InvalidStatus(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Storage errors
    #[error("Ledger persistence failed: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable code for ledger failures, `None` for infrastructure errors
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::NotOwner { .. } => Some(ErrorCode::NotOwner),
            Error::CategoryNotFound(_) => Some(ErrorCode::CategoryNotFound),
            Error::ExpenseNotFound(_) => Some(ErrorCode::ExpenseNotFound),
            Error::InsufficientFunds { .. } => Some(ErrorCode::InsufficientFunds),
            Error::TextTooLong { .. } => Some(ErrorCode::TextTooLong),
            Error::InvalidStateTransition { .. } => Some(ErrorCode::InvalidStateTransition),
            Error::BudgetExceeded { .. } => Some(ErrorCode::BudgetExceeded),
            Error::AmountOverflow { .. } => Some(ErrorCode::AmountOverflow),
            Error::InvalidStatus(_)
            | Error::Config(_)
            | Error::Persistence(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Internal(_) => None,
        }
    }

    /// Check if this error came from the authorization guard
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::NotOwner { .. })
    }

    /// Check if this error is a budget or balance limit violation
    pub fn is_limit_violation(&self) -> bool {
        matches!(
            self,
            Error::BudgetExceeded { .. }
                | Error::InsufficientFunds { .. }
                | Error::AmountOverflow { .. }
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
