//! Budget configuration and user preference model.
//!
//! # Responsibility
//! - Define the configuration the budget engine reads.
//! - Carry presentation preferences (theme, language, selected list) through
//!   the core without interpreting them.
//!
//! # Invariants
//! - `start_date` is always materialized; an unset stored value is resolved
//!   by the preferences store before a configuration is handed out.
//! - Reading a configuration never changes process-wide state such as locale.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default budget for the whole period when nothing was configured yet.
pub const DEFAULT_TOTAL_AMOUNT: Decimal = Decimal::from_parts(15453, 0, 0, false, 0);
/// Default period length in days.
pub const DEFAULT_PERIOD_DAYS: u32 = 30;
/// Default undo window for delete actions, in milliseconds.
pub const DEFAULT_UNDO_DELAY_MILLIS: u64 = 4000;
/// Default selected expense list in the presentation layer.
pub const DEFAULT_SELECTED_LIST: u32 = 1;

const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Color theme selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Parses `light|dark|system`, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// UI language selected by the user.
///
/// The core only stores this value. Applying it (switching the process or
/// app locale) is an explicit presentation-layer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// Returns the BCP-47 language tag for this language.
    pub fn locale_tag(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Russian => "ru",
        }
    }

    /// Maps a locale tag such as `ru` or `en-US` to a supported language.
    ///
    /// Unknown tags fall back to English.
    pub fn from_locale_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "ru" => Self::Russian,
            _ => Self::English,
        }
    }

    /// Maps the process locale to a supported language.
    ///
    /// Reads `LC_ALL`, `LC_MESSAGES`, then `LANG`; the first non-empty one
    /// wins. Values such as `ru_RU.UTF-8` are accepted.
    pub fn from_system_locale() -> Self {
        LOCALE_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map_or_else(Self::default, |tag| Self::from_locale_tag(&tag))
    }
}

/// Budget configuration consumed by the budget engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfiguration {
    /// Budget for the whole period. Must be positive.
    pub total_amount: Decimal,
    /// Period length in days. Must be positive.
    pub period_days: u32,
    /// Day 0 of the period.
    pub start_date: NaiveDate,
    /// How long a delete stays undoable; read by the presentation layer only.
    pub undo_delay_millis: u64,
    pub theme: Theme,
    pub language: Language,
    pub selected_list: u32,
}

impl BudgetConfiguration {
    /// Creates a configuration with default values starting at `start_date`.
    pub fn with_defaults(start_date: NaiveDate) -> Self {
        Self {
            total_amount: DEFAULT_TOTAL_AMOUNT,
            period_days: DEFAULT_PERIOD_DAYS,
            start_date,
            undo_delay_millis: DEFAULT_UNDO_DELAY_MILLIS,
            theme: Theme::default(),
            language: Language::default(),
            selected_list: DEFAULT_SELECTED_LIST,
        }
    }

    /// Returns the first day after the period, or `None` past the calendar
    /// range.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.start_date
            .checked_add_days(Days::new(u64::from(self.period_days)))
    }
}
