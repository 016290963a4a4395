//! # Core Type Definitions
//!
//! This module contains the shared types for the Hiloch core:
//! - Storage keys (`StorageKey`)
//! - Access verdicts carried by course URLs (`AccessVerdict`)
//! - Error types (`HilochError`)
//!
//! ## Determinism Guarantees
//!
//! Nothing in the core reads the wall clock. Every operation that depends on
//! "today" or "now" takes it as an argument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Keys of the string-keyed store used by the companion app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    /// The accompanied-driving start date (`YYYY-MM-DD`).
    StartDate,
    /// JSON array of recorded expenses.
    DrivingExpenses,
}

impl StorageKey {
    /// The raw key string used by the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::StartDate => "start_date",
            StorageKey::DrivingExpenses => "driving_expenses",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ACCESS VERDICT
// =============================================================================

/// The verdict the remote course reports through its `mobileapp` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessVerdict {
    Granted,
    Denied,
}

impl AccessVerdict {
    /// Parse the literal token. Anything other than `granted` / `denied`
    /// (including the empty string) is no verdict at all.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "granted" => Some(AccessVerdict::Granted),
            "denied" => Some(AccessVerdict::Denied),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessVerdict::Granted => "granted",
            AccessVerdict::Denied => "denied",
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Hiloch core.
///
/// - Use `Result<T, HilochError>` for fallible operations
/// - The gate and the stage calculator never fail; only persistence,
///   input parsing and configuration do
#[derive(Debug, Error)]
pub enum HilochError {
    /// A date string could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The selected start date lies after today.
    #[error("Start date {0} is in the future")]
    FutureStartDate(String),

    /// An expense is dated after today.
    #[error("Expense date {0} is in the future")]
    FutureExpenseDate(String),

    /// An expense entry failed validation.
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// No expense with the given id exists.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be loaded.
    #[error("Config error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
