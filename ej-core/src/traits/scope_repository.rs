//! `ScopeRepository` — read-only access to scoped configuration records.
//!
//! All methods are read-only from the engine's perspective: records are
//! created and mutated exclusively through the external admin layer and are
//! treated as immutable inputs per resolution call.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::types::entitlements::FeatureLimitRecord;
use crate::types::limit_rule::LimitRule;
use crate::types::scope::ScopeKey;
use crate::types::tier::TierDefinition;
use crate::types::tokens::TokenRecord;

/// Identity + freshness of one stored record, enough to fingerprint a
/// resolution without loading payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    pub id: String,
    pub changed_at: i64,
}

/// Read-only repository for scoped config records.
///
/// Implementations surface transient failures as
/// [`StorageError::Unavailable`] verbatim — the engine does not retry.
/// A malformed stored payload is the implementation's problem to skip
/// (with a warning log), not a request-ending error for unrelated records.
pub trait ScopeRepository: Send + Sync {
    /// All *active* token records at exactly this scope key.
    fn load_active_token_records(&self, scope: &ScopeKey) -> Result<Vec<TokenRecord>, StorageError>;

    /// Metadata (`id`, `changed_at`) of the active token records at this
    /// scope key. Must be cheap: this backs cache revalidation on every hit.
    fn load_token_record_meta(&self, scope: &ScopeKey) -> Result<Vec<RecordMeta>, StorageError>;

    /// The active feature/limit catalog record for `(vertical_id, tier_key)`,
    /// where `vertical_id` may be the `"_default"` wildcard.
    fn load_feature_limit_record(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<FeatureLimitRecord>, StorageError>;

    /// Metadata of the record `load_feature_limit_record` would return.
    fn load_feature_limit_meta(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<RecordMeta>, StorageError>;

    /// The limit rule for `(vertical_id, tier_key, feature_key)`, if any.
    fn load_limit_rule(
        &self,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
    ) -> Result<Option<LimitRule>, StorageError>;

    /// All tier definitions. Loaded once at bootstrap and on tier change to
    /// rebuild the registry.
    fn load_tier_definitions(&self) -> Result<Vec<TierDefinition>, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: ScopeRepository + ?Sized> ScopeRepository for Arc<T> {
    fn load_active_token_records(&self, scope: &ScopeKey) -> Result<Vec<TokenRecord>, StorageError> {
        (**self).load_active_token_records(scope)
    }
    fn load_token_record_meta(&self, scope: &ScopeKey) -> Result<Vec<RecordMeta>, StorageError> {
        (**self).load_token_record_meta(scope)
    }
    fn load_feature_limit_record(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<FeatureLimitRecord>, StorageError> {
        (**self).load_feature_limit_record(vertical_id, tier_key)
    }
    fn load_feature_limit_meta(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<RecordMeta>, StorageError> {
        (**self).load_feature_limit_meta(vertical_id, tier_key)
    }
    fn load_limit_rule(
        &self,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
    ) -> Result<Option<LimitRule>, StorageError> {
        (**self).load_limit_rule(vertical_id, tier_key, feature_key)
    }
    fn load_tier_definitions(&self) -> Result<Vec<TierDefinition>, StorageError> {
        (**self).load_tier_definitions()
    }
}
