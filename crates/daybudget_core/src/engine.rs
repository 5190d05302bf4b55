//! Engine wiring: opens both stores and starts the aggregator over them.
//!
//! # Responsibility
//! - Resolve storage locations from `EngineConfig`.
//! - Construct and own the ledger, the preferences store, their services and
//!   the aggregator, with no process-global state.

use crate::budget::aggregator::{AggregatorError, BudgetAggregator};
use crate::clock::Clock;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::budget::BudgetSnapshot;
use crate::model::preferences::Language;
use crate::repo::expense_repo::SqliteExpenseLedger;
use crate::repo::preferences_repo::JsonPreferencesStore;
use crate::service::budget_service::BudgetService;
use crate::service::expense_service::ExpenseService;
use flume::Receiver;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DB_FILE_NAME: &str = "daybudget.sqlite3";
const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Storage configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    /// Host locale tag (e.g. `ru-RU`) for an unset language. `None` reads
    /// the process locale.
    pub locale_tag: Option<String>,
}

impl EngineConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locale_tag: None,
        }
    }

    pub fn with_locale_tag(mut self, tag: impl Into<String>) -> Self {
        self.locale_tag = Some(tag.into());
        self
    }

    fn fallback_language(&self) -> Language {
        self.locale_tag
            .as_deref()
            .map_or_else(Language::from_system_locale, Language::from_locale_tag)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE_NAME)
    }
}

/// Error raised while opening the engine.
#[derive(Debug)]
pub enum EngineError {
    DataDir(std::io::Error),
    Db(DbError),
    Aggregator(AggregatorError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDir(err) => write!(f, "failed to prepare data directory: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Aggregator(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DataDir(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Aggregator(err) => Some(err),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<AggregatorError> for EngineError {
    fn from(value: AggregatorError) -> Self {
        Self::Aggregator(value)
    }
}

/// Fully wired budget engine.
pub struct BudgetEngine {
    expenses: ExpenseService<SqliteExpenseLedger>,
    budget: BudgetService<JsonPreferencesStore>,
    aggregator: BudgetAggregator,
}

impl BudgetEngine {
    /// Opens file-backed stores under `config.data_dir`, creating it if
    /// needed.
    pub fn open(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
        std::fs::create_dir_all(&config.data_dir).map_err(EngineError::DataDir)?;
        let conn = open_db(config.db_path())?;
        let preferences = JsonPreferencesStore::new(config.preferences_path(), Arc::clone(&clock))
            .with_fallback_language(config.fallback_language());
        let engine = Self::with_stores(conn, preferences, clock)?;
        info!("event=engine_open module=engine status=ok mode=file");
        Ok(engine)
    }

    /// Opens an in-memory ledger with file-backed preferences.
    pub fn open_in_memory(
        preferences_path: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let conn = open_db_in_memory()?;
        let preferences = JsonPreferencesStore::new(preferences_path.as_ref(), Arc::clone(&clock));
        let engine = Self::with_stores(conn, preferences, clock)?;
        info!("event=engine_open module=engine status=ok mode=memory");
        Ok(engine)
    }

    fn with_stores(
        conn: Connection,
        preferences: JsonPreferencesStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let ledger = Arc::new(SqliteExpenseLedger::new(conn));
        let preferences = Arc::new(preferences);
        let aggregator =
            BudgetAggregator::start(ledger.as_ref(), preferences.as_ref(), Arc::clone(&clock))?;

        Ok(Self {
            expenses: ExpenseService::new(ledger, Arc::clone(&clock)),
            budget: BudgetService::new(preferences, clock),
            aggregator,
        })
    }

    pub fn expenses(&self) -> &ExpenseService<SqliteExpenseLedger> {
        &self.expenses
    }

    pub fn budget(&self) -> &BudgetService<JsonPreferencesStore> {
        &self.budget
    }

    pub fn aggregator(&self) -> &BudgetAggregator {
        &self.aggregator
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        self.aggregator.current()
    }

    pub fn subscribe(&self) -> Receiver<BudgetSnapshot> {
        self.aggregator.subscribe()
    }
}
