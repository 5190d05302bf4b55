//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate ledger and preferences calls into use-case level APIs.
//! - Keep FFI/UI layers decoupled from storage details.

pub mod budget_service;
pub mod expense_service;
