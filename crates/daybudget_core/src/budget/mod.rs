//! Budget engine: pure allowance arithmetic and the reactive aggregator that
//! keeps a live snapshot of it.
//!
//! # Responsibility
//! - Turn configuration plus spend figures into daily allowances.
//! - Recompute and republish whenever the ledger or preferences change.
//!
//! # Invariants
//! - Neither component mutates the ledger or the preferences store.
//! - Degenerate period ends resolve to `Allowance::PeriodEnded`, never to a
//!   division fault.

pub mod aggregator;
pub mod calculator;
