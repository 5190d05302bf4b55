//! Domain model for expenses, budget configuration and derived budget views.
//!
//! # Responsibility
//! - Define canonical data structures used by the ledger, the preferences
//!   store and the budget engine.
//! - Keep day-granularity dates in `NaiveDate` so no sub-day precision exists.
//!
//! # Invariants
//! - Every stored expense is identified by a ledger-assigned integer id.
//! - Amounts are exact decimals; floating point never enters the engine.

pub mod budget;
pub mod expense;
pub mod preferences;
