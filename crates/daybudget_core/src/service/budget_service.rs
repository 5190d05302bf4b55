//! Budget configuration use-case service.
//!
//! # Responsibility
//! - Expose configuration updates to presentation callers.
//! - Implement the "start a new budget" flow on top of field updates.
//!
//! # Invariants
//! - Every change is funneled through the preferences store.

use crate::clock::Clock;
use crate::model::preferences::{BudgetConfiguration, Language, Theme};
use crate::repo::preferences_repo::{PreferencesError, PreferencesResult, PreferencesStore};
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Use-case service wrapper for budget configuration.
pub struct BudgetService<P: PreferencesStore + ?Sized> {
    store: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P: PreferencesStore + ?Sized> BudgetService<P> {
    pub fn new(store: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<P> {
        &self.store
    }

    pub fn configuration(&self) -> BudgetConfiguration {
        self.store.read()
    }

    pub fn set_total_amount(&self, value: Decimal) -> PreferencesResult<()> {
        self.store.update_total_amount(value)
    }

    pub fn set_period_days(&self, value: u32) -> PreferencesResult<()> {
        self.store.update_period_days(value)
    }

    pub fn set_start_date(&self, value: NaiveDate) -> PreferencesResult<()> {
        self.store.update_start_date(value)
    }

    pub fn set_undo_delay(&self, value_millis: u64) -> PreferencesResult<()> {
        self.store.update_undo_delay(value_millis)
    }

    pub fn set_theme(&self, value: Theme) -> PreferencesResult<()> {
        self.store.update_theme(value)
    }

    /// Stores the language. Applying the locale is up to the caller.
    pub fn set_language(&self, value: Language) -> PreferencesResult<()> {
        self.store.update_language(value)
    }

    pub fn set_selected_list(&self, value: u32) -> PreferencesResult<()> {
        self.store.update_selected_list(value)
    }

    /// Starts a new budget of `total_amount` running from today until
    /// `end_date` (exclusive).
    ///
    /// # Errors
    /// - `InvalidValue` when `end_date` is not after today or the amount is
    ///   not positive. Nothing is written in that case.
    pub fn restart_budget(&self, total_amount: Decimal, end_date: NaiveDate) -> PreferencesResult<()> {
        let today = self.clock.today();
        let period_days = (end_date - today).num_days();
        if period_days <= 0 {
            return Err(PreferencesError::InvalidValue(format!(
                "budget end {end_date} must be after today {today}"
            )));
        }
        let period_days = u32::try_from(period_days).map_err(|_| {
            PreferencesError::InvalidValue(format!("budget period of {period_days} days is too long"))
        })?;
        if total_amount <= Decimal::ZERO {
            return Err(PreferencesError::InvalidValue(format!(
                "total amount must be positive, got {total_amount}"
            )));
        }

        self.store.update_total_amount(total_amount)?;
        self.store.update_start_date(today)?;
        self.store.update_period_days(period_days)?;
        info!("event=budget_restart module=service status=ok period_days={period_days}");
        Ok(())
    }
}
