//! # Expense Ledger
//!
//! A flat list of driving-related payments, stored as a JSON array under the
//! `driving_expenses` key:
//!
//! ```json
//! [{"id":"1717230000000","type":"שיעור נהיגה","amount":180.0,"date":"2024-06-01"}]
//! ```
//!
//! Amounts are exact decimals in memory and JSON numbers on the wire.

use crate::primitives::{MAX_EXPENSES, MAX_EXPENSE_TYPE_LENGTH};
use crate::system::{format_storage_date, parse_date_in};
use crate::HilochError;
use chrono::{NaiveDate, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Expense categories offered by the picker.
pub const EXPENSE_TYPES: [&str; 8] = [
    "שיעור נהיגה",
    "אגרת טסט",
    "אגרת מבחן תיאוריה",
    "תשלום למורה עבור טסט",
    "אגרת רישום",
    "שיעור נהיגה כפול",
    "אגרה לאחר מעבר טסט",
    "אגרת טסט פנימי",
];

/// One recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// An entry as stored. Older entries carry full timestamps in `date`, which
/// only become a calendar date once a time zone is known.
#[derive(Deserialize)]
struct StoredExpense {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    date: String,
}

impl StoredExpense {
    fn into_expense<Tz: TimeZone>(self, zone: &Tz) -> Result<Expense, HilochError> {
        Ok(Expense {
            date: parse_date_in(&self.date, zone)?,
            id: self.id,
            kind: self.kind,
            amount: self.amount,
        })
    }
}

/// User input for a new expense, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub kind: String,
    pub amount: String,
    pub date: NaiveDate,
}

impl ExpenseDraft {
    /// Validate the draft into an expense with the given id. Payments dated
    /// after `today` are rejected.
    pub fn validate(&self, id: String, today: NaiveDate) -> Result<Expense, HilochError> {
        if self.date > today {
            return Err(HilochError::FutureExpenseDate(format_storage_date(self.date)));
        }
        let kind = self.kind.trim();
        if kind.is_empty() {
            return Err(HilochError::InvalidExpense("missing type".to_string()));
        }
        if kind.chars().count() > MAX_EXPENSE_TYPE_LENGTH {
            return Err(HilochError::InvalidExpense(format!(
                "type longer than {} characters",
                MAX_EXPENSE_TYPE_LENGTH
            )));
        }

        let raw_amount = self.amount.trim();
        if raw_amount.is_empty() {
            return Err(HilochError::InvalidExpense("missing amount".to_string()));
        }
        let amount = Decimal::from_str(raw_amount)
            .map_err(|_| HilochError::InvalidExpense(format!("invalid amount: {}", raw_amount)))?;
        if amount <= Decimal::ZERO {
            return Err(HilochError::InvalidExpense(format!(
                "amount must be positive: {}",
                raw_amount
            )));
        }

        Ok(Expense {
            id,
            kind: kind.to_string(),
            amount,
            date: self.date,
        })
    }
}

/// The list of expenses in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseLedger {
    expenses: Vec<Expense>,
}

impl ExpenseLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored JSON array. Timestamped dates are read in `zone`.
    pub fn from_json_in<Tz: TimeZone>(json: &str, zone: &Tz) -> Result<Self, HilochError> {
        let stored: Vec<StoredExpense> = serde_json::from_str(json)
            .map_err(|e| HilochError::SerializationError(e.to_string()))?;
        let expenses = stored
            .into_iter()
            .map(|entry| entry.into_expense(zone))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { expenses })
    }

    /// Serialize to the stored JSON array.
    pub fn to_json(&self) -> Result<String, HilochError> {
        serde_json::to_string(&self.expenses)
            .map_err(|e| HilochError::SerializationError(e.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Validate and append a draft. `now_millis` seeds the id; it is bumped
    /// until unique.
    pub fn add(
        &mut self,
        draft: &ExpenseDraft,
        today: NaiveDate,
        now_millis: i64,
    ) -> Result<Expense, HilochError> {
        if self.expenses.len() >= MAX_EXPENSES {
            return Err(HilochError::InvalidExpense(format!(
                "ledger is full ({} entries)",
                MAX_EXPENSES
            )));
        }
        let expense = draft.validate(self.next_id(now_millis), today)?;
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    /// Remove an expense by id.
    pub fn remove(&mut self, id: &str) -> Result<Expense, HilochError> {
        let index = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| HilochError::ExpenseNotFound(id.to_string()))?;
        Ok(self.expenses.remove(index))
    }

    /// Sum of all amounts.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Expenses by date, newest first. Same-day entries keep insertion order.
    #[must_use]
    pub fn newest_first(&self) -> Vec<&Expense> {
        let mut sorted: Vec<&Expense> = self.expenses.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    fn next_id(&self, now_millis: i64) -> String {
        let mut candidate = now_millis;
        while self.get(&candidate.to_string()).is_some() {
            candidate = candidate.saturating_add(1);
        }
        candidate.to_string()
    }
}

/// Format an amount in shekels with two decimals (`₪180.00`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    format!("₪{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn today() -> NaiveDate {
        date(2024, 12, 31)
    }

    fn draft(kind: &str, amount: &str, on: NaiveDate) -> ExpenseDraft {
        ExpenseDraft {
            kind: kind.to_string(),
            amount: amount.to_string(),
            date: on,
        }
    }

    #[test]
    fn add_and_total() {
        let mut ledger = ExpenseLedger::new();
        ledger
            .add(&draft(EXPENSE_TYPES[0], "180", date(2024, 6, 1)), today(), 1000)
            .expect("add");
        ledger
            .add(&draft(EXPENSE_TYPES[1], "62.5", date(2024, 6, 3)), today(), 1000)
            .expect("add");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total(), Decimal::from_str("242.5").expect("decimal"));
        assert_eq!(format_amount(ledger.total()), "₪242.50");
        // second id collided with the first and was bumped
        assert!(ledger.get("1000").is_some());
        assert!(ledger.get("1001").is_some());
    }

    #[test]
    fn rejects_bad_drafts() {
        let mut ledger = ExpenseLedger::new();
        let on = date(2024, 6, 1);
        for (kind, amount) in [("", "10"), ("  ", "10"), ("x", ""), ("x", "abc"), ("x", "0"), ("x", "-5")] {
            let result = ledger.add(&draft(kind, amount, on), today(), 1);
            assert!(matches!(result, Err(HilochError::InvalidExpense(_))), "{kind:?} {amount:?}");
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let mut ledger = ExpenseLedger::new();
        let e = ledger
            .add(&draft("x", "10", date(2024, 6, 1)), today(), 7)
            .expect("add");
        assert!(matches!(
            ledger.remove("missing"),
            Err(HilochError::ExpenseNotFound(_))
        ));
        assert_eq!(ledger.remove(&e.id).expect("remove"), e);
        assert!(ledger.is_empty());
    }

    #[test]
    fn newest_first_ordering() {
        let mut ledger = ExpenseLedger::new();
        ledger.add(&draft("a", "1", date(2024, 1, 1)), today(), 1).expect("add");
        ledger.add(&draft("b", "1", date(2024, 3, 1)), today(), 2).expect("add");
        ledger.add(&draft("c", "1", date(2024, 2, 1)), today(), 3).expect("add");
        let kinds: Vec<&str> = ledger.newest_first().iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["b", "c", "a"]);
    }

    #[test]
    fn json_wire_format() {
        let json = r#"[{"id":"1717230000000","type":"אגרת טסט","amount":62.5,"date":"2024-06-01T09:15:00.000Z"}]"#;
        let ledger = ExpenseLedger::from_json_in(json, &chrono::Utc).expect("parse");
        let expense = ledger.get("1717230000000").expect("present");
        assert_eq!(expense.kind, "אגרת טסט");
        assert_eq!(expense.date, date(2024, 6, 1));

        let out = ledger.to_json().expect("serialize");
        assert!(out.contains("\"type\":\"אגרת טסט\""));
        assert!(out.contains("\"amount\":62.5"));
        assert!(out.contains("\"date\":\"2024-06-01\""));
    }

    #[test]
    fn future_payment_date_rejected() {
        let mut ledger = ExpenseLedger::new();
        let result = ledger.add(&draft("x", "10", date(2025, 1, 1)), today(), 1);
        assert!(matches!(result, Err(HilochError::FutureExpenseDate(_))));
        assert!(ledger.is_empty());

        // today itself is fine
        ledger.add(&draft("x", "10", today()), today(), 1).expect("add");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn timestamped_dates_follow_zone() {
        let json = r#"[{"id":"1","type":"x","amount":10.5,"date":"2024-06-01T22:30:00.000Z"}]"#;
        let israel = chrono::FixedOffset::east_opt(3 * 3600).expect("offset");
        let ledger = ExpenseLedger::from_json_in(json, &israel).expect("parse");
        assert_eq!(ledger.get("1").expect("present").date, date(2024, 6, 2));

        let ledger = ExpenseLedger::from_json_in(json, &chrono::Utc).expect("parse");
        assert_eq!(ledger.get("1").expect("present").date, date(2024, 6, 1));
    }

    #[test]
    fn corrupt_json_is_an_error() {
        assert!(matches!(
            ExpenseLedger::from_json_in("{not json", &chrono::Utc),
            Err(HilochError::SerializationError(_))
        ));
    }
}
