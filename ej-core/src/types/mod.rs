//! Domain types for scoped configuration and entitlement resolution.
//!
//! All record types here are immutable inputs from the engine's point of
//! view: they are created and edited by the (external) admin layer, loaded
//! through [`crate::traits::scope_repository::ScopeRepository`], and never
//! written back by this workspace. Usage counters are the one exception and
//! are owned by the metering layer.

pub mod entitlements;
pub mod limit_rule;
pub mod scope;
pub mod tier;
pub mod tokens;
pub mod usage;
