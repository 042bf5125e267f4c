//! Usage metering.
//!
//! Thin, clock-free delegate over the [`CounterStore`]: the caller supplies
//! the period id, so rollover is just a new key and the meter stays pure
//! and testable.

use tracing::warn;

use ej_core::errors::StorageError;
use ej_core::traits::counter_store::CounterStore;
use ej_core::types::usage::UsageKey;

/// Per-tenant, per-feature, per-period usage counters.
pub struct UsageMeter<C> {
    store: C,
}

impl<C: CounterStore> UsageMeter<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    /// Atomically increment and return the new count.
    ///
    /// Counts are monotonic within a period; there is no decrement and no
    /// rollback. Retried requests increment twice unless the consumer
    /// deduplicates by request id in front of this call.
    pub fn increment(
        &self,
        tenant_id: &str,
        feature_key: &str,
        period_id: &str,
    ) -> Result<u64, StorageError> {
        self.store
            .increment(&UsageKey::new(tenant_id, feature_key, period_id))
    }

    /// Current count without modifying it.
    pub fn peek(
        &self,
        tenant_id: &str,
        feature_key: &str,
        period_id: &str,
    ) -> Result<u64, StorageError> {
        self.store
            .peek(&UsageKey::new(tenant_id, feature_key, period_id))
    }

    /// Best-effort analytics increment for unlimited features. A counter
    /// failure is logged and swallowed — it must never block the caller.
    pub fn record_unmetered(&self, tenant_id: &str, feature_key: &str, period_id: &str) {
        let key = UsageKey::new(tenant_id, feature_key, period_id);
        if let Err(e) = self.store.increment(&key) {
            warn!(
                tenant_id,
                feature_key,
                period_id,
                error = %e,
                "analytics increment failed, continuing"
            );
        }
    }
}
