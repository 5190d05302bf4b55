//! Flutter-facing bindings for the budget engine.

pub mod api;
