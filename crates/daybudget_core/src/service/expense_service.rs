//! Expense use-case service.
//!
//! # Responsibility
//! - Provide stable expense entry points for presentation callers.
//! - Delegate persistence to ledger implementations.
//!
//! # Invariants
//! - Service APIs never bypass ledger validation or notification.
//! - Ledger errors (conflict, not-found) reach the caller unchanged.

use crate::clock::Clock;
use crate::model::expense::{ExpenseId, ExpenseRecord};
use crate::repo::expense_repo::{ExpenseLedger, RepoResult, EXPENSES_TABLE};
use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Use-case service wrapper for expense operations.
pub struct ExpenseService<L: ExpenseLedger + ?Sized> {
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L: ExpenseLedger + ?Sized> ExpenseService<L> {
    pub fn new(ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Records a named expense on `date` and returns its new id.
    pub fn record_expense(
        &self,
        name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> RepoResult<ExpenseId> {
        let record = ExpenseRecord::new(name, amount, date);
        self.ledger.insert(&record).inspect_err(|err| {
            warn!("event=expense_record module=service status=error error={err}");
        })
    }

    /// Records an unnamed expense dated today (keypad flow).
    pub fn record_spend_today(&self, amount: Decimal) -> RepoResult<ExpenseId> {
        self.record_expense(String::new(), amount, self.clock.today())
    }

    /// Replaces an existing expense by id.
    pub fn edit_expense(&self, record: &ExpenseRecord) -> RepoResult<()> {
        self.ledger.update(record).inspect_err(|err| {
            warn!(
                "event=expense_edit module=service status=error id={} error={err}",
                record.id
            );
        })
    }

    /// Removes an expense by id.
    ///
    /// Undo windows live in the presentation layer: it delays this call by
    /// `BudgetConfiguration::undo_delay_millis` and skips it on undo.
    pub fn remove_expense(&self, record: &ExpenseRecord) -> RepoResult<()> {
        self.ledger.delete(record).inspect_err(|err| {
            warn!(
                "event=expense_remove module=service status=error id={} error={err}",
                record.id
            );
        })
    }

    pub fn get_expense(&self, id: ExpenseId) -> RepoResult<Option<ExpenseRecord>> {
        self.ledger.get(id)
    }

    /// Lists all expenses ordered by date, then id.
    pub fn list_expenses(&self) -> RepoResult<Vec<ExpenseRecord>> {
        self.ledger.list_all()
    }

    /// Lists expenses recorded today.
    pub fn list_today(&self) -> RepoResult<Vec<ExpenseRecord>> {
        self.ledger.list_on(self.clock.today())
    }

    /// Deletes expenses dated strictly before `cutoff`.
    pub fn purge_before(&self, cutoff: NaiveDate) -> RepoResult<usize> {
        self.ledger.delete_all_before(cutoff)
    }

    /// Restarts expense id numbering.
    pub fn reset_ids(&self) -> RepoResult<()> {
        self.ledger.reset_auto_increment(EXPENSES_TABLE)
    }
}
