//! # ej-core
//!
//! Foundation crate for the entitlement and design-token resolution engine.
//! Defines all types, traits, errors, config, events, and telemetry.
//! Every other crate in the workspace depends on this.

pub mod collections;
pub mod config;
pub mod errors;
pub mod events;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use collections::{FxHashMap, FxHashSet};
pub use config::EngineConfig;
pub use errors::error_code::EjErrorCode;
pub use events::{NullSink, UpgradeSink, UpgradeTriggered};
pub use traits::counter_store::CounterStore;
pub use traits::scope_repository::{RecordMeta, ScopeRepository};
pub use types::entitlements::{Entitlements, FeatureLimitRecord, LimitValue};
pub use types::limit_rule::LimitRule;
pub use types::scope::{ScopeKey, ScopeLevel, TenantContext};
pub use types::tier::TierDefinition;
pub use types::tokens::{TokenCategory, TokenRecord, TokenSet};
pub use types::usage::UsageKey;
