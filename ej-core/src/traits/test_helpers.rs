//! `InMemoryScopeStore` — in-memory test double for `ScopeRepository` and
//! `CounterStore`.
//!
//! Used by engine and gate tests to avoid a real SQLite store. Interior
//! mutability via `Mutex` so fixtures can be seeded through a shared `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::errors::StorageError;
use crate::types::entitlements::FeatureLimitRecord;
use crate::types::limit_rule::LimitRule;
use crate::types::scope::ScopeKey;
use crate::types::tier::TierDefinition;
use crate::types::tokens::TokenRecord;
use crate::types::usage::UsageKey;

use super::counter_store::CounterStore;
use super::scope_repository::{RecordMeta, ScopeRepository};

/// In-memory implementation of both storage traits.
///
/// Empty by default; seed it with the `put_*` methods. `fail_counters(true)`
/// makes every counter call return `Unavailable`, for exercising the
/// best-effort paths.
#[derive(Default)]
pub struct InMemoryScopeStore {
    token_records: Mutex<Vec<TokenRecord>>,
    feature_limits: Mutex<Vec<FeatureLimitRecord>>,
    limit_rules: Mutex<Vec<LimitRule>>,
    tiers: Mutex<Vec<TierDefinition>>,
    counters: Mutex<HashMap<UsageKey, u64>>,
    counters_down: AtomicBool,
}

impl InMemoryScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_token_record(&self, record: TokenRecord) {
        self.token_records.lock().unwrap().push(record);
    }

    /// Replace a record in place by id, as an admin edit would.
    pub fn update_token_record(&self, record: TokenRecord) {
        let mut records = self.token_records.lock().unwrap();
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            records.push(record);
        }
    }

    pub fn put_feature_limit_record(&self, record: FeatureLimitRecord) {
        self.feature_limits.lock().unwrap().push(record);
    }

    pub fn update_feature_limit_record(&self, record: FeatureLimitRecord) {
        let mut records = self.feature_limits.lock().unwrap();
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            records.push(record);
        }
    }

    pub fn put_limit_rule(&self, rule: LimitRule) {
        self.limit_rules.lock().unwrap().push(rule);
    }

    pub fn put_tier_definition(&self, tier: TierDefinition) {
        self.tiers.lock().unwrap().push(tier);
    }

    /// Toggle counter failures for best-effort-path tests.
    pub fn fail_counters(&self, down: bool) {
        self.counters_down.store(down, Ordering::SeqCst);
    }

    pub fn counter_value(&self, key: &UsageKey) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl ScopeRepository for InMemoryScopeStore {
    fn load_active_token_records(&self, scope: &ScopeKey) -> Result<Vec<TokenRecord>, StorageError> {
        Ok(self
            .token_records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.active && &r.scope == scope)
            .cloned()
            .collect())
    }

    fn load_token_record_meta(&self, scope: &ScopeKey) -> Result<Vec<RecordMeta>, StorageError> {
        Ok(self
            .token_records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.active && &r.scope == scope)
            .map(|r| RecordMeta {
                id: r.id.clone(),
                changed_at: r.changed_at,
            })
            .collect())
    }

    fn load_feature_limit_record(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<FeatureLimitRecord>, StorageError> {
        Ok(self
            .feature_limits
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.active && r.vertical_id == vertical_id && r.tier_key == tier_key)
            .cloned())
    }

    fn load_feature_limit_meta(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<RecordMeta>, StorageError> {
        Ok(self
            .feature_limits
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.active && r.vertical_id == vertical_id && r.tier_key == tier_key)
            .map(|r| RecordMeta {
                id: r.id.clone(),
                changed_at: r.changed_at,
            }))
    }

    fn load_limit_rule(
        &self,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
    ) -> Result<Option<LimitRule>, StorageError> {
        Ok(self
            .limit_rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.vertical_id == vertical_id
                    && r.tier_key == tier_key
                    && r.feature_key == feature_key
            })
            .cloned())
    }

    fn load_tier_definitions(&self) -> Result<Vec<TierDefinition>, StorageError> {
        Ok(self.tiers.lock().unwrap().clone())
    }
}

impl CounterStore for InMemoryScopeStore {
    fn increment(&self, key: &UsageKey) -> Result<u64, StorageError> {
        if self.counters_down.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                message: "counter store down".into(),
            });
        }
        // The map mutex makes the read-modify-write atomic per store.
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(key.clone()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn peek(&self, key: &UsageKey) -> Result<u64, StorageError> {
        if self.counters_down.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                message: "counter store down".into(),
            });
        }
        Ok(self.counters.lock().unwrap().get(key).copied().unwrap_or(0))
    }
}
