//! Expense record domain model.
//!
//! # Responsibility
//! - Define the canonical record stored by the expense ledger.
//! - Validate record invariants before persistence.
//! - Parse user-typed amounts into exact decimals.
//!
//! # Invariants
//! - `amount` is never negative.
//! - `id == UNSAVED_EXPENSE_ID` means "let the ledger assign one".
//! - `date` has day granularity by construction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Ledger-assigned identifier of an expense record.
pub type ExpenseId = i64;

/// Id carried by records that were not stored yet.
pub const UNSAVED_EXPENSE_ID: ExpenseId = 0;

/// Validation errors for expense invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    NegativeAmount(Decimal),
    NegativeId(ExpenseId),
    InvalidAmountInput(String),
}

impl Display for ExpenseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount(amount) => {
                write!(f, "expense amount must not be negative, got {amount}")
            }
            Self::NegativeId(id) => write!(f, "expense id must not be negative, got {id}"),
            Self::InvalidAmountInput(input) => write!(f, "invalid amount input `{input}`"),
        }
    }
}

impl Error for ExpenseValidationError {}

/// One recorded expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    /// Free-form label; the keypad flow stores an empty name.
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl ExpenseRecord {
    /// Creates an unsaved record; the ledger assigns the id on insert.
    pub fn new(name: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self::with_id(UNSAVED_EXPENSE_ID, name, amount, date)
    }

    /// Creates a record with a caller-provided id.
    ///
    /// Used by update/delete paths and by imports that keep existing ids.
    pub fn with_id(
        id: ExpenseId,
        name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            amount,
            date,
        }
    }

    /// Returns whether this record has not been stored yet.
    pub fn is_unsaved(&self) -> bool {
        self.id == UNSAVED_EXPENSE_ID
    }

    /// Checks record invariants.
    ///
    /// # Errors
    /// - `NegativeAmount` when `amount < 0`.
    /// - `NegativeId` when `id < 0`.
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ExpenseValidationError::NegativeAmount(self.amount));
        }
        if self.id < 0 {
            return Err(ExpenseValidationError::NegativeId(self.id));
        }
        Ok(())
    }
}

/// Parses an amount typed on a keypad or in a text field.
///
/// Accepts `.` or `,` as decimal separator and surrounding whitespace.
///
/// # Errors
/// - `InvalidAmountInput` for empty or non-numeric text.
/// - `NegativeAmount` for values below zero.
pub fn parse_amount_input(input: &str) -> Result<Decimal, ExpenseValidationError> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(ExpenseValidationError::InvalidAmountInput(input.to_string()));
    }
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| ExpenseValidationError::InvalidAmountInput(input.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ExpenseValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::{parse_amount_input, ExpenseRecord, ExpenseValidationError};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn parse_amount_accepts_comma_separator() {
        assert_eq!(
            parse_amount_input(" 12,50 ").unwrap(),
            Decimal::from_str("12.50").unwrap()
        );
    }

    #[test]
    fn parse_amount_rejects_garbage_and_negatives() {
        assert!(matches!(
            parse_amount_input(""),
            Err(ExpenseValidationError::InvalidAmountInput(_))
        ));
        assert!(matches!(
            parse_amount_input("12,5,1"),
            Err(ExpenseValidationError::InvalidAmountInput(_))
        ));
        assert!(matches!(
            parse_amount_input("-3"),
            Err(ExpenseValidationError::NegativeAmount(_))
        ));
    }

    #[test]
    fn validate_rejects_negative_amount() {
        let record = ExpenseRecord::new("coffee", Decimal::from(-1), day());
        assert!(matches!(
            record.validate(),
            Err(ExpenseValidationError::NegativeAmount(_))
        ));
    }

    #[test]
    fn zero_amount_is_valid() {
        let record = ExpenseRecord::new("", Decimal::ZERO, day());
        assert!(record.validate().is_ok());
        assert!(record.is_unsaved());
    }
}
