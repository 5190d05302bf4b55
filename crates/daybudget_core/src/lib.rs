//! Core budget engine for DayBudget.
//! This crate is the single source of truth for budget invariants: expense
//! storage, budget configuration, daily allowance arithmetic and the live
//! budget snapshot consumed by the presentation layer.

pub mod budget;
pub mod clock;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stream;

pub use budget::aggregator::{AggregatorError, BudgetAggregator};
pub use budget::calculator::{compute, BudgetError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{BudgetEngine, EngineConfig, EngineError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::budget::{Allowance, BudgetSnapshot, SpendFigures};
pub use model::expense::{
    parse_amount_input, ExpenseId, ExpenseRecord, ExpenseValidationError, UNSAVED_EXPENSE_ID,
};
pub use model::preferences::{BudgetConfiguration, Language, Theme};
pub use repo::expense_repo::{
    ExpenseLedger, ExpenseQuery, RepoError, RepoResult, SqliteExpenseLedger, EXPENSES_TABLE,
};
pub use repo::preferences_repo::{
    JsonPreferencesStore, PreferencesError, PreferencesResult, PreferencesStore,
};
pub use service::budget_service::BudgetService;
pub use service::expense_service::ExpenseService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
