//! Entitlement gating.
//!
//! Combines resolved limits with atomic metering to authorize or deny
//! feature use. A `Blocked` decision is a normal, expected return value —
//! callers must branch on it, not catch it.

use std::sync::Arc;

use tracing::{debug, warn};

use ej_core::config::EngineConfig;
use ej_core::errors::GateError;
use ej_core::events::{UpgradeSink, UpgradeTriggered};
use ej_core::traits::counter_store::CounterStore;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::entitlements::LimitValue;
use ej_core::types::limit_rule::LimitRule;

use crate::cache::ResolutionCache;
use crate::meter::UsageMeter;
use crate::registry::TierRegistry;

/// Default expected-conversion rates used when no limit rule is configured.
/// Hitting a numeric cap converts measurably better than discovering a
/// feature is missing outright.
pub const DEFAULT_LIMIT_REACHED_CONVERSION: f64 = 0.35;
pub const DEFAULT_FEATURE_BLOCKED_CONVERSION: f64 = 0.28;

const DEFAULT_LIMIT_REACHED_TEMPLATE: &str =
    "Has alcanzado el limite de {feature} ({limit}) del plan {tier}. \
     Pasa a {next_tier} para seguir creciendo.";
const DEFAULT_FEATURE_BLOCKED_TEMPLATE: &str =
    "{feature} no esta incluido en el plan {tier}. \
     Pasa a {next_tier} para desbloquearlo.";

/// Capacity left after an allowed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unlimited,
    Count(u64),
}

/// Why a call was blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Limit is `0` or the feature key is absent from the resolved limits.
    NotEntitled,
    /// The atomic increment pushed the counter past the cap.
    LimitReached { used: u64, limit: u64 },
}

/// Upgrade nudge attached to a blocked decision.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradePrompt {
    /// Fully substituted, user-facing message.
    pub message: String,
    /// Advisory conversion metadata from the rule or the per-kind default.
    pub expected_conversion: f64,
    /// Canonical key of the tier one step up the ladder.
    pub recommended_tier: String,
    /// Where the consumer should send the tenant to upgrade.
    pub upgrade_url: String,
}

/// Outcome of an authorization call.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allowed {
        remaining: Remaining,
    },
    Blocked {
        reason: BlockReason,
        /// `None` for tenants already on the top tier.
        upgrade: Option<UpgradePrompt>,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Authorizes feature use against resolved limits and live counters.
pub struct EntitlementGate<R, C> {
    cache: Arc<ResolutionCache<R>>,
    meter: UsageMeter<C>,
    registry: Arc<TierRegistry>,
    repo: R,
    sink: Arc<dyn UpgradeSink>,
    upgrade_url: String,
}

impl<R: ScopeRepository + Clone, C: CounterStore> EntitlementGate<R, C> {
    pub fn new(
        cache: Arc<ResolutionCache<R>>,
        meter: UsageMeter<C>,
        registry: Arc<TierRegistry>,
        repo: R,
        sink: Arc<dyn UpgradeSink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            cache,
            meter,
            registry,
            repo,
            sink,
            upgrade_url: config.effective_upgrade_url().to_string(),
        }
    }

    /// Authorize one use of `feature_key` by `tenant_id` in `period_id`.
    ///
    /// Limit semantics, in order:
    /// - disabled/absent: blocked immediately, the counter is never touched;
    /// - unlimited: best-effort analytics increment, then allowed;
    /// - capped at `n`: one atomic increment; the call that pushes the
    ///   counter past `n` is the one that gets blocked. The counter is not
    ///   rolled back: blocked callers leave their increment behind, so the
    ///   stored count can exceed the cap by up to (concurrency − 1).
    pub fn authorize(
        &self,
        tenant_id: &str,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
        period_id: &str,
    ) -> Result<Decision, GateError> {
        let entitlements = self.cache.resolve_entitlements(vertical_id, tier_key)?;

        match entitlements.limit_for(feature_key) {
            LimitValue::Disabled => {
                debug!(tenant_id, feature_key, "blocked: not entitled");
                let upgrade = self.build_prompt(
                    tenant_id,
                    vertical_id,
                    tier_key,
                    feature_key,
                    None,
                );
                Ok(Decision::Blocked {
                    reason: BlockReason::NotEntitled,
                    upgrade,
                })
            }

            LimitValue::Unlimited => {
                self.meter
                    .record_unmetered(tenant_id, feature_key, period_id);
                Ok(Decision::Allowed {
                    remaining: Remaining::Unlimited,
                })
            }

            LimitValue::Capped(limit) => {
                let count = self
                    .meter
                    .increment(tenant_id, feature_key, period_id)
                    .map_err(GateError::Counter)?;

                if count > limit {
                    debug!(tenant_id, feature_key, count, limit, "blocked: limit reached");
                    let upgrade = self.build_prompt(
                        tenant_id,
                        vertical_id,
                        tier_key,
                        feature_key,
                        Some(limit),
                    );
                    Ok(Decision::Blocked {
                        reason: BlockReason::LimitReached { used: count, limit },
                        upgrade,
                    })
                } else {
                    Ok(Decision::Allowed {
                        remaining: Remaining::Count(limit - count),
                    })
                }
            }
        }
    }

    /// Build the upgrade prompt and notify the sink. Returns `None` for
    /// top-tier tenants: there is nothing to upgrade to, so neither a
    /// prompt nor an event is produced.
    fn build_prompt(
        &self,
        tenant_id: &str,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
        limit: Option<u64>,
    ) -> Option<UpgradePrompt> {
        let next_tier = self.registry.next_tier(tier_key)?;

        // Messaging is decoration on an already-made decision: a failure
        // loading the rule falls back to defaults instead of failing the
        // call.
        let rule = match self.repo.load_limit_rule(vertical_id, tier_key, feature_key) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(
                    vertical_id,
                    tier_key,
                    feature_key,
                    error = %e,
                    "limit rule lookup failed, using default prompt"
                );
                None
            }
        };

        let prompt = render_prompt(
            rule.as_ref(),
            vertical_id,
            tier_key,
            feature_key,
            limit,
            &next_tier.tier_key,
            &self.upgrade_url,
        );

        self.sink.upgrade_triggered(UpgradeTriggered {
            tenant_id: tenant_id.to_string(),
            vertical_id: vertical_id.to_string(),
            tier_key: tier_key.to_string(),
            feature_key: feature_key.to_string(),
            message: prompt.message.clone(),
            expected_conversion: prompt.expected_conversion,
        });

        Some(prompt)
    }
}

fn render_prompt(
    rule: Option<&LimitRule>,
    vertical_id: &str,
    tier_key: &str,
    feature_key: &str,
    limit: Option<u64>,
    next_tier: &str,
    upgrade_url: &str,
) -> UpgradePrompt {
    let (template, expected_conversion) = match rule {
        Some(rule) if !rule.upgrade_message.is_empty() => {
            (rule.upgrade_message.as_str(), rule.expected_conversion)
        }
        Some(rule) => (default_template(limit), rule.expected_conversion),
        None => (default_template(limit), default_conversion(limit)),
    };

    let limit_text = match limit {
        Some(n) => n.to_string(),
        None => "0".to_string(),
    };

    let message = template
        .replace("{feature}", feature_key)
        .replace("{limit}", &limit_text)
        .replace("{tier}", tier_key)
        .replace("{vertical}", vertical_id)
        .replace("{next_tier}", next_tier)
        .replace("{upgrade_url}", upgrade_url);

    UpgradePrompt {
        message,
        expected_conversion,
        recommended_tier: next_tier.to_string(),
        upgrade_url: upgrade_url.to_string(),
    }
}

fn default_template(limit: Option<u64>) -> &'static str {
    match limit {
        Some(_) => DEFAULT_LIMIT_REACHED_TEMPLATE,
        None => DEFAULT_FEATURE_BLOCKED_TEMPLATE,
    }
}

fn default_conversion(limit: Option<u64>) -> f64 {
    match limit {
        Some(_) => DEFAULT_LIMIT_REACHED_CONVERSION,
        None => DEFAULT_FEATURE_BLOCKED_CONVERSION,
    }
}
