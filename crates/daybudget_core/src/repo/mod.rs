//! Store contracts consumed by the budget engine and their persistence
//! implementations.
//!
//! # Responsibility
//! - Define the expense ledger and preferences store contracts.
//! - Isolate SQLite and file details from services and the budget engine.
//!
//! # Invariants
//! - Store writes validate inputs before persistence.
//! - Store APIs return semantic errors (`Conflict`, `NotFound`) in addition
//!   to transport errors.

pub mod expense_repo;
pub mod preferences_repo;
