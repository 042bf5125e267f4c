//! The four-level scope cascade: platform < vertical < plan < tenant.
//!
//! A single tagged union replaces the overlapping per-entity scope fields of
//! the admin data model (token config scope, plan-features vertical,
//! vertical-limit vertical+plan), so every lookup path shares one
//! specificity ordering.

use serde::{Deserialize, Serialize};

/// Cascade level, ordered by specificity. `Platform` is the least specific
/// and always present; `Tenant` is the most specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Platform,
    Vertical,
    Plan,
    Tenant,
}

impl ScopeLevel {
    /// All levels in ascending specificity.
    pub const ALL: [ScopeLevel; 4] = [
        Self::Platform,
        Self::Vertical,
        Self::Plan,
        Self::Tenant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Vertical => "vertical",
            Self::Plan => "plan",
            Self::Tenant => "tenant",
        }
    }
}

/// A concrete point in the cascade. The payload carried by each variant is
/// exactly what is needed to address records at that level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ScopeKey {
    Platform,
    Vertical {
        vertical_id: String,
    },
    Plan {
        vertical_id: String,
        tier_key: String,
    },
    Tenant {
        vertical_id: String,
        tier_key: String,
        tenant_id: String,
    },
}

impl ScopeKey {
    pub fn level(&self) -> ScopeLevel {
        match self {
            Self::Platform => ScopeLevel::Platform,
            Self::Vertical { .. } => ScopeLevel::Vertical,
            Self::Plan { .. } => ScopeLevel::Plan,
            Self::Tenant { .. } => ScopeLevel::Tenant,
        }
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform => write!(f, "platform"),
            Self::Vertical { vertical_id } => write!(f, "vertical:{vertical_id}"),
            Self::Plan {
                vertical_id,
                tier_key,
            } => write!(f, "plan:{vertical_id}:{tier_key}"),
            Self::Tenant {
                vertical_id,
                tier_key,
                tenant_id,
            } => write!(f, "tenant:{vertical_id}:{tier_key}:{tenant_id}"),
        }
    }
}

/// The resolution context for one tenant: which vertical it lives in, which
/// tier it is on, and its own id. Cheap to clone; used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    pub vertical_id: String,
    pub tier_key: String,
    pub tenant_id: String,
}

impl TenantContext {
    pub fn new(
        vertical_id: impl Into<String>,
        tier_key: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            vertical_id: vertical_id.into(),
            tier_key: tier_key.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// The four scope keys this context resolves through, in ascending
    /// specificity. Merging in this order makes later (more specific)
    /// scopes override earlier ones key-by-key.
    pub fn cascade_chain(&self) -> [ScopeKey; 4] {
        [
            ScopeKey::Platform,
            ScopeKey::Vertical {
                vertical_id: self.vertical_id.clone(),
            },
            ScopeKey::Plan {
                vertical_id: self.vertical_id.clone(),
                tier_key: self.tier_key.clone(),
            },
            ScopeKey::Tenant {
                vertical_id: self.vertical_id.clone(),
                tier_key: self.tier_key.clone(),
                tenant_id: self.tenant_id.clone(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_levels_order_by_specificity() {
        assert!(ScopeLevel::Platform < ScopeLevel::Vertical);
        assert!(ScopeLevel::Vertical < ScopeLevel::Plan);
        assert!(ScopeLevel::Plan < ScopeLevel::Tenant);
    }

    #[test]
    fn cascade_chain_ascends() {
        let ctx = TenantContext::new("agroconecta", "starter", "t1");
        let chain = ctx.cascade_chain();
        for pair in chain.windows(2) {
            assert!(pair[0].level() < pair[1].level());
        }
        assert_eq!(chain[0], ScopeKey::Platform);
        assert_eq!(
            chain[3],
            ScopeKey::Tenant {
                vertical_id: "agroconecta".into(),
                tier_key: "starter".into(),
                tenant_id: "t1".into(),
            }
        );
    }
}
