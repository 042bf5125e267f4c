//! Trait contracts between the engine and its external collaborators.
//!
//! These traits define the boundary between resolution/gating logic and the
//! underlying stores. The SQLite implementation lives in `ej-storage`; any
//! other backend only has to implement these. All traits are object-safe,
//! `Send + Sync`, and have blanket `Arc<T>` impls.

pub mod counter_store;
pub mod scope_repository;
pub mod test_helpers;

pub use counter_store::CounterStore;
pub use scope_repository::{RecordMeta, ScopeRepository};
pub use test_helpers::InMemoryScopeStore;
