//! Feature catalogs and numeric limits per (vertical, tier).
//!
//! Limits use fixed sentinel semantics that no consumer may reinterpret:
//! `-1` = unlimited, `0` = not entitled, `n > 0` = hard cap per period.
//! A feature key absent from the resolved map is *not entitled* — absence
//! is never permissive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collections::FxHashSet;

/// Wildcard vertical id for records that apply to every vertical without a
/// more specific entry.
pub const DEFAULT_VERTICAL: &str = "_default";

/// Typed view over the raw limit integer. The raw value round-trips
/// untouched through storage; this enum exists only for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitValue {
    /// `-1`: no cap, always allowed.
    Unlimited,
    /// `0`: feature not included in the plan.
    Disabled,
    /// `n > 0`: hard cap per period.
    Capped(u64),
}

impl LimitValue {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => Self::Unlimited,
            n if n <= 0 => Self::Disabled,
            n => Self::Capped(n as u64),
        }
    }

    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Disabled => 0,
            Self::Capped(n) => *n as i64,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

/// One feature/limit catalog entry, keyed by `(vertical_id | "_default",
/// tier_key)`. Catalogs are coarse per-plan entries: resolution picks one
/// whole record, it never merges two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLimitRecord {
    pub id: String,
    /// `"_default"` for the cross-vertical fallback record.
    pub vertical_id: String,
    pub tier_key: String,
    /// Feature keys enabled for this plan.
    #[serde(default)]
    pub features: FxHashSet<String>,
    /// Raw limit per feature key. BTreeMap keeps resolved output stable.
    #[serde(default)]
    pub limits: BTreeMap<String, i64>,
    pub active: bool,
    #[serde(default)]
    pub changed_at: i64,
}

impl FeatureLimitRecord {
    pub fn new(
        id: impl Into<String>,
        vertical_id: impl Into<String>,
        tier_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vertical_id: vertical_id.into(),
            tier_key: tier_key.into(),
            features: FxHashSet::default(),
            limits: BTreeMap::new(),
            active: true,
            changed_at: 0,
        }
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    pub fn with_limit(mut self, feature: impl Into<String>, raw: i64) -> Self {
        self.limits.insert(feature.into(), raw);
        self
    }
}

/// The resolved entitlements for one (vertical, tier): the feature set plus
/// the limit map of exactly one catalog record. Immutable value object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entitlements {
    pub features: FxHashSet<String>,
    pub limits: BTreeMap<String, i64>,
}

impl Entitlements {
    /// Empty entitlements: nothing enabled, everything disabled.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_record(record: &FeatureLimitRecord) -> Self {
        Self {
            features: record.features.clone(),
            limits: record.limits.clone(),
        }
    }

    pub fn has_feature(&self, feature_key: &str) -> bool {
        self.features.contains(feature_key)
    }

    /// The effective limit for a feature. An absent key means the feature
    /// is not entitled, equivalent to a stored `0`.
    pub fn limit_for(&self, feature_key: &str) -> LimitValue {
        self.limits
            .get(feature_key)
            .copied()
            .map(LimitValue::from_raw)
            .unwrap_or(LimitValue::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_semantics() {
        assert_eq!(LimitValue::from_raw(-1), LimitValue::Unlimited);
        assert_eq!(LimitValue::from_raw(0), LimitValue::Disabled);
        assert_eq!(LimitValue::from_raw(5), LimitValue::Capped(5));
        assert_eq!(LimitValue::Capped(5).as_raw(), 5);
    }

    #[test]
    fn absent_key_is_disabled() {
        let ent = Entitlements::none();
        assert_eq!(ent.limit_for("anything"), LimitValue::Disabled);
        assert!(!ent.has_feature("anything"));
    }

    #[test]
    fn negative_garbage_is_disabled_not_unlimited() {
        // Only the exact sentinel -1 means unlimited.
        assert_eq!(LimitValue::from_raw(-7), LimitValue::Disabled);
    }
}
