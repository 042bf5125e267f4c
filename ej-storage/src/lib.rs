//! # ej-storage
//!
//! SQLite persistence for the entitlement engine: one store implementing
//! both `ScopeRepository` (scoped config records, limit rules, tiers) and
//! `CounterStore` (atomic usage counters).

pub mod engine;
pub mod migration;

pub use engine::SqliteScopeStore;
