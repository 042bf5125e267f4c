//! Usage reporting and tier-change validation.
//!
//! Read-only companions to the gate: the summary feeds account dashboards,
//! the tier-change check guards downgrades that would strand existing
//! usage. Neither ever increments a counter.

use std::sync::Arc;

use ej_core::errors::GateError;
use ej_core::traits::counter_store::CounterStore;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::entitlements::LimitValue;

use crate::cache::ResolutionCache;
use crate::meter::UsageMeter;

/// One row of a usage summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureUsage {
    pub feature_key: String,
    pub current: u64,
    pub limit: LimitValue,
    /// Convenience flags mirroring the sentinel semantics.
    pub unlimited: bool,
    pub included: bool,
}

/// A feature whose current usage would exceed a candidate tier's cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierChangeViolation {
    pub feature_key: String,
    pub current: u64,
    pub new_limit: u64,
}

/// Read-only usage views over resolved limits and live counters.
pub struct UsageReporter<R, C> {
    cache: Arc<ResolutionCache<R>>,
    meter: UsageMeter<C>,
}

impl<R: ScopeRepository + Clone, C: CounterStore> UsageReporter<R, C> {
    pub fn new(cache: Arc<ResolutionCache<R>>, meter: UsageMeter<C>) -> Self {
        Self { cache, meter }
    }

    /// Current usage against effective limits for the given features.
    pub fn usage_summary(
        &self,
        tenant_id: &str,
        vertical_id: &str,
        tier_key: &str,
        period_id: &str,
        feature_keys: &[&str],
    ) -> Result<Vec<FeatureUsage>, GateError> {
        let entitlements = self.cache.resolve_entitlements(vertical_id, tier_key)?;

        let mut rows = Vec::with_capacity(feature_keys.len());
        for feature_key in feature_keys {
            let limit = entitlements.limit_for(feature_key);
            let current = self
                .meter
                .peek(tenant_id, feature_key, period_id)
                .map_err(GateError::Counter)?;
            rows.push(FeatureUsage {
                feature_key: feature_key.to_string(),
                current,
                limit,
                unlimited: limit.is_unlimited(),
                included: limit != LimitValue::Disabled,
            });
        }
        Ok(rows)
    }

    /// Check whether moving the tenant to `new_tier_key` would strand
    /// current usage above the candidate tier's caps. Returns the
    /// violations; an empty list means the change is safe. Features the
    /// candidate tier disables are reported only when actually in use.
    pub fn validate_tier_change(
        &self,
        tenant_id: &str,
        vertical_id: &str,
        new_tier_key: &str,
        period_id: &str,
        feature_keys: &[&str],
    ) -> Result<Vec<TierChangeViolation>, GateError> {
        let candidate = self.cache.resolve_entitlements(vertical_id, new_tier_key)?;

        let mut violations = Vec::new();
        for feature_key in feature_keys {
            let current = self
                .meter
                .peek(tenant_id, feature_key, period_id)
                .map_err(GateError::Counter)?;

            match candidate.limit_for(feature_key) {
                LimitValue::Unlimited => {}
                LimitValue::Disabled => {
                    if current > 0 {
                        violations.push(TierChangeViolation {
                            feature_key: feature_key.to_string(),
                            current,
                            new_limit: 0,
                        });
                    }
                }
                LimitValue::Capped(n) => {
                    if current > n {
                        violations.push(TierChangeViolation {
                            feature_key: feature_key.to_string(),
                            current,
                            new_limit: n,
                        });
                    }
                }
            }
        }
        Ok(violations)
    }
}
