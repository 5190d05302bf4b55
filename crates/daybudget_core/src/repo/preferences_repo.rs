//! Preferences store contract and JSON file implementation.
//!
//! # Responsibility
//! - Persist budget configuration and presentation preferences as one
//!   key-value JSON object.
//! - Re-emit the full configuration after every field update.
//! - Materialize an unset start date once, on first read.
//!
//! # Invariants
//! - Read failures never reach callers; they are logged and replaced with
//!   defaults.
//! - Each field update is a read-modify-write of the whole object done under
//!   one lock and written atomically (temp file + rename).
//! - After the first read, `start_date` is never re-derived from the clock.
//! - An unset language resolves from the host locale on every read; it is
//!   never written back.

use crate::clock::Clock;
use crate::model::preferences::{
    BudgetConfiguration, Language, Theme, DEFAULT_PERIOD_DAYS, DEFAULT_SELECTED_LIST,
    DEFAULT_TOTAL_AMOUNT, DEFAULT_UNDO_DELAY_MILLIS,
};
use crate::stream::Subscribers;
use chrono::NaiveDate;
use flume::Receiver;
use log::{error, info, warn};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error for preference reads and writes.
#[derive(Debug)]
pub enum PreferencesError {
    /// Stored preferences could not be read or parsed.
    Read(String),
    /// Updated preferences could not be written.
    Write(String),
    /// Update rejected before touching storage.
    InvalidValue(String),
}

impl Display for PreferencesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(message) => write!(f, "failed to read preferences: {message}"),
            Self::Write(message) => write!(f, "failed to write preferences: {message}"),
            Self::InvalidValue(message) => write!(f, "invalid preference value: {message}"),
        }
    }
}

impl Error for PreferencesError {}

pub type PreferencesResult<T> = Result<T, PreferencesError>;

/// Persistent store of budget configuration.
pub trait PreferencesStore: Send + Sync {
    /// Returns the current configuration; never fails.
    fn read(&self) -> BudgetConfiguration;
    /// Emits the current configuration immediately and after every update.
    fn stream(&self) -> Receiver<BudgetConfiguration>;

    fn update_total_amount(&self, value: Decimal) -> PreferencesResult<()>;
    fn update_period_days(&self, value: u32) -> PreferencesResult<()>;
    fn update_start_date(&self, value: NaiveDate) -> PreferencesResult<()>;
    fn update_undo_delay(&self, value_millis: u64) -> PreferencesResult<()>;
    fn update_theme(&self, value: Theme) -> PreferencesResult<()>;
    fn update_language(&self, value: Language) -> PreferencesResult<()>;
    fn update_selected_list(&self, value: u32) -> PreferencesResult<()>;
}

/// Persisted key-value layout; missing keys fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_list: Option<u32>,
    /// Undo delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Period length in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl StoredPreferences {
    /// Resolves stored values against defaults.
    ///
    /// `start_date` must already be materialized by the caller; `language`
    /// is used only when no language was stored.
    fn resolve(&self, start_date: NaiveDate, language: Language) -> BudgetConfiguration {
        BudgetConfiguration {
            total_amount: self.amount.unwrap_or(DEFAULT_TOTAL_AMOUNT),
            period_days: self.period.unwrap_or(DEFAULT_PERIOD_DAYS),
            start_date,
            undo_delay_millis: self.duration.unwrap_or(DEFAULT_UNDO_DELAY_MILLIS),
            theme: self.theme.unwrap_or_default(),
            language: self.language.unwrap_or(language),
            selected_list: self.selected_list.unwrap_or(DEFAULT_SELECTED_LIST),
        }
    }
}

/// Preferences store backed by a JSON file.
pub struct JsonPreferencesStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    fallback_language: Language,
    state: Mutex<Option<StoredPreferences>>,
    subscribers: Subscribers<(), BudgetConfiguration>,
}

impl JsonPreferencesStore {
    /// Creates a store for `path`. The file is read lazily on first access.
    ///
    /// An unset language resolves from the system locale.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            fallback_language: Language::from_system_locale(),
            state: Mutex::new(None),
            subscribers: Subscribers::new(),
        }
    }

    /// Overrides the language used while none is stored, e.g. with the
    /// locale reported by the host platform.
    pub fn with_fallback_language(mut self, language: Language) -> Self {
        self.fallback_language = language;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads stored preferences once and materializes the start date.
    fn loaded<'a>(&self, state: &'a mut Option<StoredPreferences>) -> &'a StoredPreferences {
        state.get_or_insert_with(|| {
            let mut stored = match read_preferences(&self.path) {
                Ok(stored) => stored,
                Err(err) => {
                    warn!(
                        "event=preferences_read module=repo status=error fallback=defaults error={}",
                        err
                    );
                    StoredPreferences::default()
                }
            };

            if stored.start_date.is_none() {
                let today = self.clock.today();
                stored.start_date = Some(today);
                match write_preferences_atomic(&self.path, &stored) {
                    Ok(()) => info!(
                        "event=preferences_start_date module=repo status=ok start_date={today}"
                    ),
                    Err(err) => error!(
                        "event=preferences_start_date module=repo status=error error={}",
                        err
                    ),
                }
            }
            stored
        })
    }

    fn current(&self, stored: &StoredPreferences) -> BudgetConfiguration {
        let start_date = stored.start_date.unwrap_or_else(|| self.clock.today());
        stored.resolve(start_date, self.fallback_language)
    }

    fn update(
        &self,
        field: &'static str,
        apply: impl FnOnce(&mut StoredPreferences),
    ) -> PreferencesResult<()> {
        let mut state = self.state.lock();
        let mut next = self.loaded(&mut state).clone();
        apply(&mut next);

        if let Err(err) = write_preferences_atomic(&self.path, &next) {
            error!(
                "event=preferences_update module=repo status=error field={field} error={}",
                err
            );
            return Err(err);
        }

        let config = self.current(&next);
        *state = Some(next);
        info!("event=preferences_update module=repo status=ok field={field}");
        self.subscribers.publish_with(|_| Some(config.clone()));
        Ok(())
    }
}

impl PreferencesStore for JsonPreferencesStore {
    fn read(&self) -> BudgetConfiguration {
        let mut state = self.state.lock();
        let stored = self.loaded(&mut state);
        self.current(stored)
    }

    fn stream(&self) -> Receiver<BudgetConfiguration> {
        let mut state = self.state.lock();
        let config = self.current(self.loaded(&mut state));
        self.subscribers.subscribe((), config)
    }

    fn update_total_amount(&self, value: Decimal) -> PreferencesResult<()> {
        if value <= Decimal::ZERO {
            return Err(PreferencesError::InvalidValue(format!(
                "total amount must be positive, got {value}"
            )));
        }
        self.update("amount", |stored| stored.amount = Some(value))
    }

    fn update_period_days(&self, value: u32) -> PreferencesResult<()> {
        if value == 0 {
            return Err(PreferencesError::InvalidValue(
                "period must be at least one day".to_string(),
            ));
        }
        self.update("period", |stored| stored.period = Some(value))
    }

    fn update_start_date(&self, value: NaiveDate) -> PreferencesResult<()> {
        self.update("startDate", |stored| stored.start_date = Some(value))
    }

    fn update_undo_delay(&self, value_millis: u64) -> PreferencesResult<()> {
        self.update("duration", |stored| stored.duration = Some(value_millis))
    }

    fn update_theme(&self, value: Theme) -> PreferencesResult<()> {
        self.update("theme", |stored| stored.theme = Some(value))
    }

    fn update_language(&self, value: Language) -> PreferencesResult<()> {
        self.update("language", |stored| stored.language = Some(value))
    }

    fn update_selected_list(&self, value: u32) -> PreferencesResult<()> {
        self.update("selectedList", |stored| stored.selected_list = Some(value))
    }
}

/// Reads stored preferences; a missing file yields defaults.
fn read_preferences(path: &Path) -> PreferencesResult<StoredPreferences> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoredPreferences::default()),
        Err(err) => {
            return Err(PreferencesError::Read(format!(
                "failed to open {}: {err}",
                path.display()
            )))
        }
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|err| {
        PreferencesError::Read(format!("failed to parse {}: {err}", path.display()))
    })
}

/// Writes stored preferences to a temp file, then renames it into place.
fn write_preferences_atomic(path: &Path, stored: &StoredPreferences) -> PreferencesResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                PreferencesError::Write(format!(
                    "failed to create directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path)
        .map_err(|err| PreferencesError::Write(format!("failed to create temp file: {err}")))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stored)
        .map_err(|err| PreferencesError::Write(format!("failed to serialize: {err}")))?;
    writer
        .flush()
        .map_err(|err| PreferencesError::Write(format!("failed to flush: {err}")))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|err| PreferencesError::Write(format!("failed to sync: {err}")))?;

    fs::rename(&temp_path, path).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        PreferencesError::Write(format!("failed to rename temp file: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::StoredPreferences;
    use crate::model::preferences::Language;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn stored_preferences_use_stable_key_names() {
        let stored = StoredPreferences {
            selected_list: Some(2),
            duration: Some(3000),
            amount: Some(Decimal::from(500)),
            period: Some(14),
            start_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            ..StoredPreferences::default()
        };

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["selectedList"], 2);
        assert_eq!(json["duration"], 3000);
        assert_eq!(json["amount"], "500");
        assert_eq!(json["period"], 14);
        assert_eq!(json["startDate"], "2026-04-01");
        assert!(json.get("theme").is_none());
    }

    #[test]
    fn resolve_fills_defaults() {
        let start = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let config = StoredPreferences::default().resolve(start, Language::Russian);
        assert_eq!(config.total_amount, Decimal::from(15453));
        assert_eq!(config.period_days, 30);
        assert_eq!(config.undo_delay_millis, 4000);
        assert_eq!(config.selected_list, 1);
        assert_eq!(config.start_date, start);
        assert_eq!(config.language, Language::Russian);
    }

    #[test]
    fn stored_language_wins_over_fallback() {
        let stored = StoredPreferences {
            language: Some(Language::English),
            ..StoredPreferences::default()
        };
        let start = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(stored.resolve(start, Language::Russian).language, Language::English);
    }
}
