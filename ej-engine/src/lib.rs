//! # ej-engine
//!
//! The resolution engine: given a tenant's vertical, tier, and explicit
//! overrides, compute the effective design tokens, feature set, and usage
//! limits, and gate feature use against those limits with upgrade
//! signaling.
//!
//! ## Components
//! - **registry** — canonical tier keys, alias normalization, upgrade ladder
//! - **cascade** — scope-cascade merge of design tokens
//! - **features** — feature/limit resolution with `_default` fallback
//! - **fingerprint** — contributing-record fingerprints for cache freshness
//! - **cache** — memoized resolution with metadata revalidation
//! - **meter** — atomic per-tenant, per-feature, per-period counters
//! - **gate** — entitlement decisions and upgrade prompts
//! - **summary** — usage reporting and tier-change validation

pub mod cache;
pub mod cascade;
pub mod features;
pub mod fingerprint;
pub mod gate;
pub mod meter;
pub mod registry;
pub mod summary;

// Re-export the most commonly used types.
pub use cache::ResolutionCache;
pub use cascade::TokenCascadeMerger;
pub use features::FeatureLimitResolver;
pub use fingerprint::Fingerprint;
pub use gate::{BlockReason, Decision, EntitlementGate, Remaining, UpgradePrompt};
pub use meter::UsageMeter;
pub use registry::TierRegistry;
pub use summary::{FeatureUsage, TierChangeViolation, UsageReporter};
