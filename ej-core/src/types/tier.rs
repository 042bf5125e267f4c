//! Subscription tier definitions.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One subscription tier: a canonical key, the labels that resolve to it,
/// and its position in the upgrade ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Canonical, globally unique key (e.g. `"starter"`).
    pub tier_key: String,
    /// Accepted labels, case-insensitive, globally unique across tiers.
    /// The canonical key always resolves to itself whether or not it is
    /// listed here.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Strictly increasing with tier level; defines the upgrade ladder.
    pub hierarchy_weight: i32,
    /// Opaque payment-provider price ids, passed through untouched.
    #[serde(default)]
    pub stripe_price_ids: SmallVec<[String; 2]>,
}

impl TierDefinition {
    pub fn new(tier_key: impl Into<String>, hierarchy_weight: i32) -> Self {
        Self {
            tier_key: tier_key.into(),
            aliases: Vec::new(),
            hierarchy_weight,
            stripe_price_ids: SmallVec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_price_id(mut self, price_id: impl Into<String>) -> Self {
        self.stripe_price_ids.push(price_id.into());
        self
    }
}
