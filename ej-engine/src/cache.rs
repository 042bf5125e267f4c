//! Memoized resolution with fingerprint revalidation.
//!
//! The cache never serves a value on trust: every hit recomputes the
//! contributing-record fingerprint from a metadata-only repository call and
//! compares. Staleness is therefore bounded by the metadata check, not a
//! TTL — an admin edit is visible on the very next resolve.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use ej_core::config::EngineConfig;
use ej_core::errors::ResolveError;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::entitlements::Entitlements;
use ej_core::types::scope::TenantContext;
use ej_core::types::tokens::TokenSet;

use crate::cascade::TokenCascadeMerger;
use crate::features::FeatureLimitResolver;
use crate::fingerprint::Fingerprint;

#[derive(Clone)]
struct CachedTokens {
    fingerprint: Fingerprint,
    tokens: Arc<TokenSet>,
}

#[derive(Clone)]
struct CachedEntitlements {
    fingerprint: Fingerprint,
    entitlements: Arc<Entitlements>,
}

/// Caching facade over [`TokenCascadeMerger`] and [`FeatureLimitResolver`].
///
/// Resolved values are immutable and shared via `Arc`; concurrent readers
/// never clone the payload.
pub struct ResolutionCache<R> {
    repo: R,
    merger: TokenCascadeMerger<R>,
    resolver: FeatureLimitResolver<R>,
    tokens: Cache<TenantContext, CachedTokens>,
    entitlements: Cache<(String, String), CachedEntitlements>,
}

impl<R: ScopeRepository + Clone> ResolutionCache<R> {
    pub fn new(repo: R, config: &EngineConfig) -> Self {
        let capacity = config.effective_cache_capacity();
        Self {
            merger: TokenCascadeMerger::new(repo.clone()),
            resolver: FeatureLimitResolver::new(repo.clone()),
            repo,
            tokens: Cache::new(capacity),
            entitlements: Cache::new(capacity),
        }
    }

    /// Resolve the token set for `context`, memoized.
    pub fn resolve_tokens(&self, context: &TenantContext) -> Result<Arc<TokenSet>, ResolveError> {
        let current = self.token_fingerprint(context)?;

        if let Some(entry) = self.tokens.get(context) {
            if entry.fingerprint == current {
                debug!(tenant_id = context.tenant_id.as_str(), "token cache hit");
                return Ok(entry.tokens);
            }
            debug!(
                tenant_id = context.tenant_id.as_str(),
                "token cache stale, recomputing"
            );
        }

        let resolved = Arc::new(self.merger.resolve(context)?);
        self.tokens.insert(
            context.clone(),
            CachedTokens {
                fingerprint: current,
                tokens: Arc::clone(&resolved),
            },
        );
        Ok(resolved)
    }

    /// Resolve entitlements for (vertical, tier), memoized.
    pub fn resolve_entitlements(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Arc<Entitlements>, ResolveError> {
        let key = (vertical_id.to_string(), tier_key.to_string());
        let current = self.entitlement_fingerprint(vertical_id, tier_key)?;

        if let Some(entry) = self.entitlements.get(&key) {
            if entry.fingerprint == current {
                debug!(vertical_id, tier_key, "entitlement cache hit");
                return Ok(entry.entitlements);
            }
            debug!(vertical_id, tier_key, "entitlement cache stale, recomputing");
        }

        let resolved = Arc::new(self.resolver.resolve(vertical_id, tier_key)?);
        self.entitlements.insert(
            key,
            CachedEntitlements {
                fingerprint: current,
                entitlements: Arc::clone(&resolved),
            },
        );
        Ok(resolved)
    }

    /// Drop every memoized entry. The fingerprint check makes this
    /// unnecessary for correctness; it exists for memory pressure and
    /// tests.
    pub fn invalidate_all(&self) {
        self.tokens.invalidate_all();
        self.entitlements.invalidate_all();
    }

    fn token_fingerprint(&self, context: &TenantContext) -> Result<Fingerprint, ResolveError> {
        let mut metas = Vec::new();
        for scope in context.cascade_chain() {
            metas.extend(self.repo.load_token_record_meta(&scope)?);
        }
        Ok(Fingerprint::of_metas(&metas))
    }

    fn entitlement_fingerprint(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Fingerprint, ResolveError> {
        // Mirror the resolver's fallback so the fingerprint tracks whichever
        // record actually contributes.
        let meta = match self.repo.load_feature_limit_meta(vertical_id, tier_key)? {
            Some(meta) => Some(meta),
            None => self
                .repo
                .load_feature_limit_meta(ej_core::types::entitlements::DEFAULT_VERTICAL, tier_key)?,
        };
        Ok(Fingerprint::of_optional_meta(meta.as_ref()))
    }
}
