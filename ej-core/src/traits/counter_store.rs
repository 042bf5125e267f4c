//! `CounterStore` — atomic per-key usage counters.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::types::usage::UsageKey;

/// Atomic usage counters keyed by `(tenant, feature, period)`.
///
/// `increment` must be a single atomic read-modify-write, linearizable per
/// key (`UPDATE … RETURNING`, compare-and-swap, or an in-process lock) —
/// never a read followed by a separate write from the caller's view.
/// Concurrent increments of the same key must never lose an update.
///
/// Idempotency under caller retries is *not* provided here: a retried
/// request increments twice unless the consumer deduplicates by request id
/// in front of the store.
pub trait CounterStore: Send + Sync {
    /// Atomically add one and return the new count.
    fn increment(&self, key: &UsageKey) -> Result<u64, StorageError>;

    /// Current count without modifying it. Missing counters read as 0.
    fn peek(&self, key: &UsageKey) -> Result<u64, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: CounterStore + ?Sized> CounterStore for Arc<T> {
    fn increment(&self, key: &UsageKey) -> Result<u64, StorageError> {
        (**self).increment(key)
    }
    fn peek(&self, key: &UsageKey) -> Result<u64, StorageError> {
        (**self).peek(key)
    }
}
