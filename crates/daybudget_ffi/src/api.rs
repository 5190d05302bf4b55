//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level budget functions to Dart via FRB.
//! - Translate core types into flat envelopes (decimal strings, ISO dates).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One engine per process, opened lazily on first use.
//! - Amounts cross the boundary as strings; both `,` and `.` are accepted as
//!   the decimal separator.

use chrono::NaiveDate;
use daybudget_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    parse_amount_input, ping as ping_inner, Allowance, BudgetConfiguration, BudgetEngine,
    BudgetSnapshot, EngineConfig, ExpenseId, ExpenseRecord, Language, SystemClock, Theme,
};
use log::warn;
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

const DATA_DIR_ENV: &str = "DAYBUDGET_DATA_DIR";
const LOCALE_ENV: &str = "DAYBUDGET_LOCALE";
const DEFAULT_DATA_DIR_NAME: &str = "daybudget";
const DATE_FORMAT: &str = "%Y-%m-%d";

static ENGINE: OnceCell<BudgetEngine> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Flattened budget snapshot.
///
/// Allowances are `None` once the period leaves no day to spread over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSnapshotResponse {
    pub ok: bool,
    pub total_spent: String,
    pub spent_before_today: String,
    pub spent_today: String,
    pub amount_remaining_total: String,
    pub allowance_today: Option<String>,
    pub allowance_tomorrow: Option<String>,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub period_complete: bool,
    pub message: String,
}

impl BudgetSnapshotResponse {
    fn from_snapshot(snapshot: &BudgetSnapshot) -> Self {
        Self {
            ok: true,
            total_spent: snapshot.spend.total_spent.to_string(),
            spent_before_today: snapshot.spend.spent_before_today.to_string(),
            spent_today: snapshot.spend.spent_today.to_string(),
            amount_remaining_total: snapshot.amount_remaining_total.to_string(),
            allowance_today: allowance_text(snapshot.allowance_today),
            allowance_tomorrow: allowance_text(snapshot.allowance_tomorrow),
            days_elapsed: snapshot.days_elapsed,
            days_remaining: snapshot.days_remaining,
            period_complete: snapshot.period_complete,
            message: "Snapshot ready.".to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            total_spent: String::new(),
            spent_before_today: String::new(),
            spent_today: String::new(),
            amount_remaining_total: String::new(),
            allowance_today: None,
            allowance_tomorrow: None,
            days_elapsed: 0,
            days_remaining: 0,
            period_complete: false,
            message: message.into(),
        }
    }
}

/// Budget configuration as seen by the settings screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetConfigurationResponse {
    pub ok: bool,
    pub total_amount: String,
    pub period_days: u32,
    /// ISO `YYYY-MM-DD`.
    pub start_date: String,
    pub undo_delay_millis: u64,
    /// `light|dark|system`.
    pub theme: String,
    /// BCP 47 language tag.
    pub language: String,
    pub message: String,
}

impl BudgetConfigurationResponse {
    fn from_config(config: &BudgetConfiguration) -> Self {
        Self {
            ok: true,
            total_amount: config.total_amount.to_string(),
            period_days: config.period_days,
            start_date: config.start_date.format(DATE_FORMAT).to_string(),
            undo_delay_millis: config.undo_delay_millis,
            theme: config.theme.as_str().to_string(),
            language: config.language.locale_tag().to_string(),
            message: "Configuration ready.".to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            total_amount: String::new(),
            period_days: 0,
            start_date: String::new(),
            undo_delay_millis: 0,
            theme: String::new(),
            language: String::new(),
            message: message.into(),
        }
    }
}

/// One expense row for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseItem {
    pub id: i64,
    pub name: String,
    pub amount: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
}

impl From<ExpenseRecord> for ExpenseItem {
    fn from(record: ExpenseRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            amount: record.amount.to_string(),
            date: record.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Expense list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseListResponse {
    pub ok: bool,
    /// Ordered by date, then id.
    pub items: Vec<ExpenseItem>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or touched expense, when there is one.
    pub expense_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, expense_id: Option<ExpenseId>) -> Self {
        Self {
            ok: true,
            expense_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            expense_id: None,
            message: message.into(),
        }
    }
}

/// Returns the last published budget snapshot.
///
/// # FFI contract
/// - Sync call; never blocks on a recomputation in flight.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_snapshot() -> BudgetSnapshotResponse {
    match engine() {
        Ok(engine) => BudgetSnapshotResponse::from_snapshot(&engine.snapshot()),
        Err(err) => BudgetSnapshotResponse::failure(format!("budget_snapshot failed: {err}")),
    }
}

/// Returns the stored budget configuration.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_configuration() -> BudgetConfigurationResponse {
    match engine() {
        Ok(engine) => {
            BudgetConfigurationResponse::from_config(&engine.budget().configuration())
        }
        Err(err) => {
            BudgetConfigurationResponse::failure(format!("budget_configuration failed: {err}"))
        }
    }
}

/// Records an unnamed expense dated today from keypad input.
///
/// # FFI contract
/// - `amount` is typed text such as `12,50`.
/// - Returns the new expense id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn add_spend_today(amount: String) -> ActionResponse {
    let result = parse_amount(&amount).and_then(|amount| {
        with_engine(|engine| {
            engine
                .expenses()
                .record_spend_today(amount)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => ActionResponse::success("Expense recorded.", Some(id)),
        Err(err) => ActionResponse::failure(format!("add_spend_today failed: {err}")),
    }
}

/// Records a named expense on an ISO date.
#[flutter_rust_bridge::frb(sync)]
pub fn add_expense(name: String, amount: String, date: String) -> ActionResponse {
    let result = parse_amount(&amount)
        .and_then(|amount| Ok((amount, parse_date(&date)?)))
        .and_then(|(amount, date)| {
            with_engine(|engine| {
                engine
                    .expenses()
                    .record_expense(name.trim(), amount, date)
                    .map_err(|err| err.to_string())
            })
        });
    match result {
        Ok(id) => ActionResponse::success("Expense recorded.", Some(id)),
        Err(err) => ActionResponse::failure(format!("add_expense failed: {err}")),
    }
}

/// Replaces an existing expense by id.
#[flutter_rust_bridge::frb(sync)]
pub fn update_expense(id: i64, name: String, amount: String, date: String) -> ActionResponse {
    let result = parse_amount(&amount)
        .and_then(|amount| Ok((amount, parse_date(&date)?)))
        .and_then(|(amount, date)| {
            let record = ExpenseRecord::with_id(id, name.trim(), amount, date);
            with_engine(|engine| {
                engine
                    .expenses()
                    .edit_expense(&record)
                    .map_err(|err| err.to_string())
            })
        });
    match result {
        Ok(()) => ActionResponse::success("Expense updated.", Some(id)),
        Err(err) => ActionResponse::failure(format!("update_expense failed: {err}")),
    }
}

/// Deletes an expense by id.
///
/// The undo window is the caller's: wait `undo_delay_millis` before calling.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_expense(id: i64) -> ActionResponse {
    let result = with_engine(|engine| {
        let expenses = engine.expenses();
        let record = expenses
            .get_expense(id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("expense not found: {id}"))?;
        expenses
            .remove_expense(&record)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(()) => ActionResponse::success("Expense deleted.", Some(id)),
        Err(err) => ActionResponse::failure(format!("delete_expense failed: {err}")),
    }
}

/// Lists every expense ordered by date, then id.
#[flutter_rust_bridge::frb(sync)]
pub fn list_expenses() -> ExpenseListResponse {
    let result = with_engine(|engine| {
        engine
            .expenses()
            .list_expenses()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(records) => {
            let items = records.into_iter().map(ExpenseItem::from).collect::<Vec<_>>();
            let message = format!("Found {} expense(s).", items.len());
            ExpenseListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => ExpenseListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("list_expenses failed: {err}"),
        },
    }
}

/// Sets the total budget amount.
#[flutter_rust_bridge::frb(sync)]
pub fn update_budget_amount(amount: String) -> ActionResponse {
    let result = parse_amount(&amount).and_then(|amount| {
        with_engine(|engine| {
            engine
                .budget()
                .set_total_amount(amount)
                .map_err(|err| err.to_string())
        })
    });
    settings_response("update_budget_amount", result)
}

/// Sets the period length in days.
#[flutter_rust_bridge::frb(sync)]
pub fn update_budget_period(days: u32) -> ActionResponse {
    let result = with_engine(|engine| {
        engine
            .budget()
            .set_period_days(days)
            .map_err(|err| err.to_string())
    });
    settings_response("update_budget_period", result)
}

/// Starts a new budget from today until `end_date` (exclusive, ISO).
#[flutter_rust_bridge::frb(sync)]
pub fn restart_budget(amount: String, end_date: String) -> ActionResponse {
    let result = parse_amount(&amount)
        .and_then(|amount| Ok((amount, parse_date(&end_date)?)))
        .and_then(|(amount, end_date)| {
            with_engine(|engine| {
                engine
                    .budget()
                    .restart_budget(amount, end_date)
                    .map_err(|err| err.to_string())
            })
        });
    settings_response("restart_budget", result)
}

/// Sets how long deletions wait for an undo, in milliseconds.
#[flutter_rust_bridge::frb(sync)]
pub fn update_undo_delay(millis: u64) -> ActionResponse {
    let result = with_engine(|engine| {
        engine
            .budget()
            .set_undo_delay(millis)
            .map_err(|err| err.to_string())
    });
    settings_response("update_undo_delay", result)
}

/// Recomputes the snapshot for the current day.
///
/// # FFI contract
/// - Call on app resume; a snapshot otherwise stays on the day of the last
///   change.
/// - Returns before the recomputation finishes; read it with
///   `budget_snapshot`.
#[flutter_rust_bridge::frb(sync)]
pub fn refresh_budget() -> ActionResponse {
    match engine() {
        Ok(engine) => {
            engine.aggregator().refresh();
            ActionResponse::success("Refresh requested.", None)
        }
        Err(err) => ActionResponse::failure(format!("refresh_budget failed: {err}")),
    }
}

/// Stores the theme (`light|dark|system`).
#[flutter_rust_bridge::frb(sync)]
pub fn update_theme(theme: String) -> ActionResponse {
    let result = Theme::from_name(&theme)
        .ok_or_else(|| format!("unsupported theme `{}`", theme.trim()))
        .and_then(|theme| {
            with_engine(|engine| {
                engine
                    .budget()
                    .set_theme(theme)
                    .map_err(|err| err.to_string())
            })
        });
    settings_response("update_theme", result)
}

/// Stores the language from a locale tag such as `ru` or `en-US`.
///
/// Unknown tags store English. Applying the locale stays with the caller.
#[flutter_rust_bridge::frb(sync)]
pub fn update_language(locale_tag: String) -> ActionResponse {
    let language = Language::from_locale_tag(&locale_tag);
    let result = with_engine(|engine| {
        engine
            .budget()
            .set_language(language)
            .map_err(|err| err.to_string())
    });
    settings_response("update_language", result)
}

fn settings_response(operation: &str, result: Result<(), String>) -> ActionResponse {
    match result {
        Ok(()) => ActionResponse::success("Settings saved.", None),
        Err(err) => ActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn allowance_text(allowance: Allowance) -> Option<String> {
    allowance.amount().map(|amount| amount.to_string())
}

fn parse_amount(input: &str) -> Result<Decimal, String> {
    parse_amount_input(input).map_err(|err| err.to_string())
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date `{}`: {err}", input.trim()))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_data_dir() -> PathBuf {
    env_value(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME))
}

fn engine() -> Result<&'static BudgetEngine, String> {
    ENGINE.get_or_try_init(|| {
        let mut config = EngineConfig::new(resolve_data_dir());
        if let Some(tag) = env_value(LOCALE_ENV) {
            config = config.with_locale_tag(tag);
        }
        BudgetEngine::open(&config, Arc::new(SystemClock)).map_err(|err| {
            warn!("event=ffi_engine_open module=ffi status=error error={err}");
            format!("engine open failed: {err}")
        })
    })
}

fn with_engine<T>(f: impl FnOnce(&BudgetEngine) -> Result<T, String>) -> Result<T, String> {
    f(engine()?)
}
