//! Scope-cascade merge of design tokens.
//!
//! Resolution walks the four scopes in ascending specificity and overwrites
//! the running result key by key. A tenant overriding `color.primary` never
//! erases `color.secondary` inherited from platform — categories are merged
//! per key, never replaced wholesale.

use tracing::{debug, warn};

use ej_core::errors::ResolveError;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::scope::{ScopeKey, TenantContext};
use ej_core::types::tokens::{TokenCategory, TokenRecord, TokenSet};

/// Resolves the effective token set for a tenant context.
pub struct TokenCascadeMerger<R> {
    repo: R,
}

impl<R: ScopeRepository> TokenCascadeMerger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Bootstrap precondition: exactly one active platform-level record per
    /// category. A missing category is fatal — the service must refuse to
    /// start rather than serve partial token sets. A surplus is tolerated
    /// at runtime through the tie-break but flagged here as an anomaly.
    pub fn ensure_platform_closure(&self) -> Result<(), ResolveError> {
        let records = self.repo.load_active_token_records(&ScopeKey::Platform)?;

        for category in TokenCategory::ALL {
            let covering: Vec<&TokenRecord> = records
                .iter()
                .filter(|r| r.tokens.get(&category).is_some_and(|m| !m.is_empty()))
                .collect();

            if covering.is_empty() {
                return Err(ResolveError::ScopeNotFound { category });
            }
            if covering.len() > 1 {
                warn!(
                    category = %category,
                    records = covering.len(),
                    "multiple active platform records cover one category"
                );
            }
        }

        Ok(())
    }

    /// Resolve the effective token set for `context`.
    ///
    /// Every key defined at platform scope is present in the result (the
    /// closure guarantee); keys absent from platform and never set at a
    /// more specific scope are absent — no silent defaulting.
    pub fn resolve(&self, context: &TenantContext) -> Result<TokenSet, ResolveError> {
        let mut result = TokenSet::new();

        for scope in context.cascade_chain() {
            let mut records = self.repo.load_active_token_records(&scope)?;
            if records.is_empty() {
                continue;
            }

            // Records at the identical scope key are a data anomaly.
            // Applying in ascending (weight, changed_at) order makes the
            // highest weight — then the latest edit — land last and win
            // every contested key, deterministically.
            if records.len() > 1 {
                records.sort_by(|a, b| {
                    a.weight
                        .cmp(&b.weight)
                        .then(a.changed_at.cmp(&b.changed_at))
                });
                warn!(
                    scope = %scope,
                    records = records.len(),
                    "duplicate active records at one scope, tie-breaking by weight"
                );
            }

            for record in &records {
                apply_record(&mut result, record);
            }
        }

        debug!(
            tenant_id = context.tenant_id.as_str(),
            vertical_id = context.vertical_id.as_str(),
            tier_key = context.tier_key.as_str(),
            tokens = result.len(),
            "token cascade resolved"
        );

        Ok(result)
    }
}

fn apply_record(result: &mut TokenSet, record: &TokenRecord) {
    for (category, map) in &record.tokens {
        for (key, value) in map {
            result.set(*category, key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ej_core::traits::test_helpers::InMemoryScopeStore;

    use super::*;

    fn platform_record() -> TokenRecord {
        TokenRecord::new("platform-base", ScopeKey::Platform)
            .with_token(TokenCategory::Color, "primary", "#111111")
            .with_token(TokenCategory::Color, "secondary", "#333333")
            .with_token(TokenCategory::Typography, "font-base", "Inter")
            .with_token(TokenCategory::Spacing, "md", "1rem")
            .with_token(TokenCategory::Effect, "shadow-card", "0 1px 2px rgba(0,0,0,.08)")
            .with_token(TokenCategory::ComponentVariant, "button", "rounded")
    }

    fn store_with_platform() -> Arc<InMemoryScopeStore> {
        let store = Arc::new(InMemoryScopeStore::new());
        store.put_token_record(platform_record());
        store
    }

    #[test]
    fn platform_closure_passes_with_full_coverage() {
        let merger = TokenCascadeMerger::new(store_with_platform());
        merger.ensure_platform_closure().unwrap();
    }

    #[test]
    fn platform_closure_fails_on_missing_category() {
        let store = Arc::new(InMemoryScopeStore::new());
        store.put_token_record(
            TokenRecord::new("partial", ScopeKey::Platform)
                .with_token(TokenCategory::Color, "primary", "#111111"),
        );
        let merger = TokenCascadeMerger::new(store);
        let err = merger.ensure_platform_closure().unwrap_err();
        assert!(matches!(err, ResolveError::ScopeNotFound { .. }));
    }

    #[test]
    fn vertical_overrides_key_without_erasing_siblings() {
        let store = store_with_platform();
        store.put_token_record(
            TokenRecord::new(
                "agro-brand",
                ScopeKey::Vertical {
                    vertical_id: "agroconecta".into(),
                },
            )
            .with_token(TokenCategory::Color, "primary", "#FF8C42"),
        );

        let merger = TokenCascadeMerger::new(store);
        let ctx = TenantContext::new("agroconecta", "starter", "t1");
        let set = merger.resolve(&ctx).unwrap();

        assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#FF8C42"));
        // inherited, untouched
        assert_eq!(set.get(TokenCategory::Color, "secondary"), Some("#333333"));
    }

    #[test]
    fn duplicate_scope_records_tie_break_on_weight_then_changed_at() {
        let store = store_with_platform();
        let scope = ScopeKey::Vertical {
            vertical_id: "agroconecta".into(),
        };

        let mut low = TokenRecord::new("low", scope.clone())
            .with_token(TokenCategory::Color, "primary", "#AAAAAA")
            .with_token(TokenCategory::Color, "accent", "#00FF00");
        low.weight = 1;
        low.changed_at = 100;

        let mut high = TokenRecord::new("high", scope)
            .with_token(TokenCategory::Color, "primary", "#BBBBBB");
        high.weight = 2;
        high.changed_at = 50;

        store.put_token_record(high);
        store.put_token_record(low);

        let merger = TokenCascadeMerger::new(store);
        let ctx = TenantContext::new("agroconecta", "starter", "t1");
        let set = merger.resolve(&ctx).unwrap();

        // higher weight wins the contested key despite the earlier edit
        assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#BBBBBB"));
        // uncontested key from the losing record still contributes
        assert_eq!(set.get(TokenCategory::Color, "accent"), Some("#00FF00"));
    }

    #[test]
    fn inactive_records_never_participate() {
        let store = store_with_platform();
        let mut inactive = TokenRecord::new(
            "disabled-theme",
            ScopeKey::Vertical {
                vertical_id: "agroconecta".into(),
            },
        )
        .with_token(TokenCategory::Color, "primary", "#DEAD00");
        inactive.active = false;
        store.put_token_record(inactive);

        let merger = TokenCascadeMerger::new(store);
        let ctx = TenantContext::new("agroconecta", "starter", "t1");
        let set = merger.resolve(&ctx).unwrap();
        assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#111111"));
    }
}
