//! Per-(vertical, tier, feature) upgrade-messaging rules.

use serde::{Deserialize, Serialize};

/// A limit rule attaches an upgrade message and conversion metadata to one
/// `(vertical_id, tier_key, feature_key)` combination. The `limit_value`
/// mirrors the catalog value for display; enforcement always reads the
/// resolved entitlements, not the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitRule {
    pub vertical_id: String,
    pub tier_key: String,
    pub feature_key: String,
    pub limit_value: i64,
    /// Template with `{feature}`, `{limit}`, `{tier}`, `{vertical}` and
    /// `{next_tier}` placeholders.
    pub upgrade_message: String,
    /// Expected conversion probability in `[0.0, 1.0]`. Advisory metadata
    /// for downstream marketing analytics; never used in control flow.
    pub expected_conversion: f64,
}

impl LimitRule {
    pub fn new(
        vertical_id: impl Into<String>,
        tier_key: impl Into<String>,
        feature_key: impl Into<String>,
        limit_value: i64,
    ) -> Self {
        Self {
            vertical_id: vertical_id.into(),
            tier_key: tier_key.into(),
            feature_key: feature_key.into(),
            limit_value,
            upgrade_message: String::new(),
            expected_conversion: 0.0,
        }
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.upgrade_message = template.into();
        self
    }

    pub fn with_conversion(mut self, expected: f64) -> Self {
        self.expected_conversion = expected.clamp(0.0, 1.0);
        self
    }
}
