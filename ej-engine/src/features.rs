//! Feature/limit resolution per (vertical, tier).
//!
//! Unlike the token cascade, this is a first-match lookup, not a merge:
//! catalogs are coarse per-plan entries. The exact `(vertical_id, tier_key)`
//! record wins outright; otherwise the `("_default", tier_key)` record is
//! returned unmodified.

use tracing::debug;

use ej_core::errors::ResolveError;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::entitlements::{Entitlements, DEFAULT_VERTICAL};

/// Resolves the effective feature set and limits for (vertical, tier).
pub struct FeatureLimitResolver<R> {
    repo: R,
}

impl<R: ScopeRepository> FeatureLimitResolver<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lookup order: exact `(vertical_id, tier_key)` if active, else
    /// `("_default", tier_key)`. No merging between the two. Missing both
    /// yields empty entitlements, where every feature reads as disabled.
    pub fn resolve(&self, vertical_id: &str, tier_key: &str) -> Result<Entitlements, ResolveError> {
        if let Some(record) = self.repo.load_feature_limit_record(vertical_id, tier_key)? {
            debug!(
                vertical_id,
                tier_key,
                record = record.id.as_str(),
                "feature limits resolved from vertical record"
            );
            return Ok(Entitlements::from_record(&record));
        }

        if let Some(record) = self
            .repo
            .load_feature_limit_record(DEFAULT_VERTICAL, tier_key)?
        {
            debug!(
                vertical_id,
                tier_key,
                record = record.id.as_str(),
                "feature limits resolved from _default record"
            );
            return Ok(Entitlements::from_record(&record));
        }

        debug!(vertical_id, tier_key, "no feature limit record, nothing entitled");
        Ok(Entitlements::none())
    }
}
