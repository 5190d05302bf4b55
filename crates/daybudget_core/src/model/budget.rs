//! Derived budget figures published by the budget engine.
//!
//! # Invariants
//! - `spent_today == total_spent - spent_before_today`.
//! - A snapshot is always built as a whole; fields are never patched
//!   individually.
//! - `period_complete == (days_remaining <= 0)`, including the placeholder.

use crate::budget::calculator::BudgetError;
    use crate::model::expense::ExpenseRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Spend totals derived from the ledger for one "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SpendFigures {
    pub total_spent: Decimal,
    pub spent_before_today: Decimal,
    pub spent_today: Decimal,
}

impl SpendFigures {
    /// Builds figures from explicit totals.
    pub fn new(total_spent: Decimal, spent_before_today: Decimal) -> Self {
        Self {
            total_spent,
            spent_before_today,
            spent_today: total_spent - spent_before_today,
        }
    }

    /// Aggregates a ledger snapshot against `today`.
    ///
    /// Records dated after `today` are not "before today", so they land in
    /// `spent_today`.
    ///
    /// # Errors
    /// - `Arithmetic` when a sum leaves the `Decimal` range.
    pub fn from_records(records: &[ExpenseRecord], today: NaiveDate) -> Result<Self, BudgetError> {
        let mut total_spent = Decimal::ZERO;
        let mut spent_before_today = Decimal::ZERO;
        for record in records {
            total_spent = total_spent
                .checked_add(record.amount)
                .ok_or(BudgetError::Arithmetic("total spent"))?;
            if record.date < today {
                spent_before_today = spent_before_today
                    .checked_add(record.amount)
                    .ok_or(BudgetError::Arithmetic("spent before today"))?;
            }
        }
        Ok(Self::new(total_spent, spent_before_today))
    }
}

/// Daily allowance, or the marker that no further daily allowance exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "amount", rename_all = "snake_case")]
pub enum Allowance {
    Amount(Decimal),
    /// The period has no day left to spread the remaining budget over.
    PeriodEnded,
}

impl Allowance {
    /// Returns the numeric allowance; `PeriodEnded` reads as zero.
    pub fn value(self) -> Decimal {
        match self {
            Self::Amount(amount) => amount,
            Self::PeriodEnded => Decimal::ZERO,
        }
    }

    pub fn amount(self) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(amount),
            Self::PeriodEnded => None,
        }
    }

    pub fn is_period_ended(self) -> bool {
        matches!(self, Self::PeriodEnded)
    }
}

/// Consolidated budget view published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSnapshot {
    pub spend: SpendFigures,
    /// `total_amount - total_spent`; negative when overspent.
    pub amount_remaining_total: Decimal,
    pub allowance_today: Allowance,
    pub allowance_tomorrow: Allowance,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub period_complete: bool,
}

impl BudgetSnapshot {
    /// Placeholder used only until the first real snapshot is computed.
    ///
    /// With no days remaining it reads as a finished period, so no
    /// allowance is offered.
    pub fn empty() -> Self {
        Self {
            spend: SpendFigures::default(),
            amount_remaining_total: Decimal::ZERO,
            allowance_today: Allowance::PeriodEnded,
            allowance_tomorrow: Allowance::PeriodEnded,
            days_elapsed: 0,
            days_remaining: 0,
            period_complete: true,
        }
    }

    /// Returns whether tomorrow's allowance is tighter than today's.
    ///
    /// The presentation layer uses this to warn before overspending.
    pub fn tomorrow_is_tighter(&self) -> bool {
        match (self.allowance_today, self.allowance_tomorrow) {
            (Allowance::Amount(today), Allowance::Amount(tomorrow)) => tomorrow < today,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Allowance, BudgetSnapshot, SpendFigures};
    use crate::budget::calculator::BudgetError;
    use crate::model::expense::ExpenseRecord;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn from_records_splits_on_today() {
        let records = vec![
            ExpenseRecord::with_id(1, "a", Decimal::from(10), day(1)),
            ExpenseRecord::with_id(2, "b", Decimal::from(5), day(2)),
            ExpenseRecord::with_id(3, "c", Decimal::from(7), day(3)),
        ];

        let figures = SpendFigures::from_records(&records, day(2)).unwrap();
        assert_eq!(figures.total_spent, Decimal::from(22));
        assert_eq!(figures.spent_before_today, Decimal::from(10));
        assert_eq!(figures.spent_today, Decimal::from(12));
    }

    #[test]
    fn period_ended_reads_as_zero() {
        assert_eq!(Allowance::PeriodEnded.value(), Decimal::ZERO);
        assert_eq!(Allowance::PeriodEnded.amount(), None);
    }

    #[test]
    fn allowance_serializes_as_tagged_value() {
        let json = serde_json::to_value(Allowance::Amount(Decimal::from(54))).unwrap();
        assert_eq!(json["state"], "amount");
        assert_eq!(json["amount"], "54");

        let json = serde_json::to_value(Allowance::PeriodEnded).unwrap();
        assert_eq!(json["state"], "period_ended");
    }

    #[test]
    fn from_records_reports_overflow_instead_of_panicking() {
        let records = vec![
            ExpenseRecord::with_id(1, "a", Decimal::MAX, day(1)),
            ExpenseRecord::with_id(2, "b", Decimal::MAX, day(3)),
        ];
        let err = SpendFigures::from_records(&records, day(2)).unwrap_err();
        assert_eq!(err, BudgetError::Arithmetic("total spent"));
    }

    #[test]
    fn empty_snapshot_reads_as_finished_period() {
        let snapshot = BudgetSnapshot::empty();
        assert_eq!(snapshot.period_complete, snapshot.days_remaining <= 0);
        assert!(snapshot.allowance_today.is_period_ended());
        assert!(snapshot.allowance_tomorrow.is_period_ended());
        assert!(!snapshot.tomorrow_is_tighter());
    }
}
