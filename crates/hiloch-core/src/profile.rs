//! # Profile
//!
//! The user's persisted data on top of a [`KeyValueStore`]: the start date of
//! the accompanied-driving period and the expense ledger.
//!
//! ## Failure policy
//!
//! Stored timestamps are read as calendar dates in the profile's time zone
//! (the host's local zone unless given one).
//!
//! Reads never fail. A storage error or an unparseable value is logged and
//! treated as absent, so the host falls back to its empty state. Writes are
//! logged and returned to the caller.

use crate::expenses::{Expense, ExpenseDraft, ExpenseLedger};
use crate::storage::{KeyValueStore, StorageBackend};
use crate::system::{CountdownReport, format_storage_date, parse_date_in};
use crate::{HilochError, StorageKey};
use chrono::{Local, NaiveDate, TimeZone};

// =============================================================================
// ERROR LOGGING HELPERS
// =============================================================================

/// Log an error and convert Result to Option.
///
/// Keeps read failures visible in the logs while the caller sees "absent".
#[inline]
fn log_and_convert<T>(result: Result<T, HilochError>, key: StorageKey) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(%key, error = %e, "failed to load stored value");
            None
        }
    }
}

/// Log a write failure and pass it on.
#[inline]
fn log_write(result: Result<(), HilochError>, key: StorageKey) -> Result<(), HilochError> {
    if let Err(e) = &result {
        tracing::error!(%key, error = %e, "failed to persist value");
    }
    result
}

/// Persisted user data over a storage backend.
#[derive(Debug)]
pub struct Profile<S: KeyValueStore = StorageBackend, Z: TimeZone = Local> {
    store: S,
    zone: Z,
}

impl<S: KeyValueStore> Profile<S, Local> {
    /// A profile reading timestamps in the host's local zone.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_zone(store, Local)
    }
}

impl<S: KeyValueStore, Z: TimeZone> Profile<S, Z> {
    #[must_use]
    pub fn with_zone(store: S, zone: Z) -> Self {
        Self { store, zone }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Start date
    // -------------------------------------------------------------------------

    /// The stored start date, if any.
    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        let key = StorageKey::StartDate;
        let raw = log_and_convert(self.store.get(key.as_str()), key)??;
        log_and_convert(parse_date_in(&raw, &self.zone), key)
    }

    /// Store a newly selected start date.
    ///
    /// The date picker never offers days after today; the same rule is
    /// enforced here for hosts without a picker.
    pub fn select_start_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), HilochError> {
        if date > today {
            return Err(HilochError::FutureStartDate(format_storage_date(date)));
        }
        let key = StorageKey::StartDate;
        tracing::info!(start_date = %date, "start date selected");
        log_write(
            self.store.set(key.as_str(), &format_storage_date(date)),
            key,
        )
    }

    /// Forget the start date.
    pub fn clear_start_date(&mut self) -> Result<(), HilochError> {
        let key = StorageKey::StartDate;
        tracing::info!("start date cleared");
        log_write(self.store.delete(key.as_str()), key)
    }

    /// The countdown for the stored start date, if one is set.
    #[must_use]
    pub fn countdown(&self, today: NaiveDate) -> Option<CountdownReport> {
        self.start_date()
            .map(|start| CountdownReport::evaluate(start, today))
    }

    // -------------------------------------------------------------------------
    // Expenses
    // -------------------------------------------------------------------------

    /// The stored ledger; empty when absent or unreadable.
    #[must_use]
    pub fn ledger(&self) -> ExpenseLedger {
        let key = StorageKey::DrivingExpenses;
        log_and_convert(self.store.get(key.as_str()), key)
            .flatten()
            .and_then(|raw| log_and_convert(ExpenseLedger::from_json_in(&raw, &self.zone), key))
            .unwrap_or_default()
    }

    pub fn save_ledger(&mut self, ledger: &ExpenseLedger) -> Result<(), HilochError> {
        let key = StorageKey::DrivingExpenses;
        let json = ledger.to_json()?;
        log_write(self.store.set(key.as_str(), &json), key)
    }

    /// Validate, append and persist a new expense.
    ///
    /// Like the start date, a payment cannot be dated after today.
    pub fn add_expense(
        &mut self,
        draft: &ExpenseDraft,
        today: NaiveDate,
        now_millis: i64,
    ) -> Result<Expense, HilochError> {
        let mut ledger = self.ledger();
        let expense = ledger.add(draft, today, now_millis)?;
        self.save_ledger(&ledger)?;
        tracing::info!(id = %expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    /// Remove and persist.
    pub fn delete_expense(&mut self, id: &str) -> Result<Expense, HilochError> {
        let mut ledger = self.ledger();
        let removed = ledger.remove(id)?;
        self.save_ledger(&ledger)?;
        tracing::info!(id, "expense deleted");
        Ok(removed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
