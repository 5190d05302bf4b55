//! Daily allowance calculator.
//!
//! Pure and synchronous. Given the same configuration, spend figures and
//! day, it always returns the same snapshot.

use crate::model::budget::{Allowance, BudgetSnapshot, SpendFigures};
use crate::model::preferences::BudgetConfiguration;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inputs the calculator cannot produce a snapshot for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    InvalidConfiguration(String),
    InvalidSpend(String),
    /// Decimal overflow while dividing or subtracting.
    Arithmetic(&'static str),
}

impl Display for BudgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(message) => {
                write!(f, "invalid budget configuration: {message}")
            }
            Self::InvalidSpend(message) => write!(f, "invalid spend figures: {message}"),
            Self::Arithmetic(step) => write!(f, "decimal overflow while computing {step}"),
        }
    }
}

impl Error for BudgetError {}

/// Computes the budget snapshot for `today`.
///
/// - `allowance_today = max((total - spent_before_today) / days_remaining
///   - spent_today, 0)`.
/// - `allowance_tomorrow = (total - total_spent) / (days_remaining - 1)`.
/// - Either allowance is `PeriodEnded` when its divisor would be zero or
///   negative.
///
/// # Errors
/// - `InvalidConfiguration` for a non-positive total or a zero-day period.
/// - `InvalidSpend` for negative or inconsistent spend figures.
/// - `Arithmetic` on decimal overflow.
pub fn compute(
    config: &BudgetConfiguration,
    spend: &SpendFigures,
    today: NaiveDate,
) -> Result<BudgetSnapshot, BudgetError> {
    validate_inputs(config, spend)?;

    let days_elapsed = (today - config.start_date).num_days().max(0);
    let days_remaining = i64::from(config.period_days) - days_elapsed;
    let period_complete = days_remaining <= 0;

    let amount_remaining_total = config
        .total_amount
        .checked_sub(spend.total_spent)
        .ok_or(BudgetError::Arithmetic("remaining total"))?;

    let allowance_today = if period_complete {
        Allowance::PeriodEnded
    } else {
        let per_day = config
            .total_amount
            .checked_sub(spend.spent_before_today)
            .and_then(|left| left.checked_div(Decimal::from(days_remaining)))
            .ok_or(BudgetError::Arithmetic("today allowance"))?;
        let raw = per_day
            .checked_sub(spend.spent_today)
            .ok_or(BudgetError::Arithmetic("today allowance"))?;
        Allowance::Amount(raw.max(Decimal::ZERO))
    };

    let allowance_tomorrow = if days_remaining > 1 {
        let per_day = amount_remaining_total
            .checked_div(Decimal::from(days_remaining - 1))
            .ok_or(BudgetError::Arithmetic("tomorrow allowance"))?;
        Allowance::Amount(per_day)
    } else {
        Allowance::PeriodEnded
    };

    Ok(BudgetSnapshot {
        spend: *spend,
        amount_remaining_total,
        allowance_today,
        allowance_tomorrow,
        days_elapsed,
        days_remaining,
        period_complete,
    })
}

fn validate_inputs(config: &BudgetConfiguration, spend: &SpendFigures) -> Result<(), BudgetError> {
    if config.total_amount <= Decimal::ZERO {
        return Err(BudgetError::InvalidConfiguration(format!(
            "total amount must be positive, got {}",
            config.total_amount
        )));
    }
    if config.period_days == 0 {
        return Err(BudgetError::InvalidConfiguration(
            "period must be at least one day".to_string(),
        ));
    }
    if spend.spent_before_today < Decimal::ZERO {
        return Err(BudgetError::InvalidSpend(format!(
            "spent before today is negative: {}",
            spend.spent_before_today
        )));
    }
    if spend.total_spent < spend.spent_before_today {
        return Err(BudgetError::InvalidSpend(format!(
            "total spent {} is below spent before today {}",
            spend.total_spent, spend.spent_before_today
        )));
    }
    Ok(())
}
