//! Usage-counter addressing.

use serde::{Deserialize, Serialize};

/// Address of one usage counter: `(tenant, feature, period)`.
///
/// The period id is caller-supplied (e.g. `"2026-02"` for a monthly
/// window); the metering layer does no clock logic of its own, so rollover
/// happens simply by callers moving to the next period id. Counters are
/// monotonic within a period and are never decremented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageKey {
    pub tenant_id: String,
    pub feature_key: String,
    pub period_id: String,
}

impl UsageKey {
    pub fn new(
        tenant_id: impl Into<String>,
        feature_key: impl Into<String>,
        period_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            feature_key: feature_key.into(),
            period_id: period_id.into(),
        }
    }
}

impl std::fmt::Display for UsageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.tenant_id, self.feature_key, self.period_id
        )
    }
}
