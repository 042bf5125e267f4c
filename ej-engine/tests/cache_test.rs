//! Resolution cache: idempotence, fingerprint revalidation after admin
//! edits, and fallback-aware entitlement freshness.

use std::sync::Arc;

use ej_core::config::EngineConfig;
use ej_core::traits::test_helpers::InMemoryScopeStore;
use ej_core::types::entitlements::{FeatureLimitRecord, LimitValue};
use ej_core::types::scope::{ScopeKey, TenantContext};
use ej_core::types::tokens::{TokenCategory, TokenRecord};

use ej_engine::ResolutionCache;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn platform_record() -> TokenRecord {
    TokenRecord::new("platform-base", ScopeKey::Platform)
        .with_token(TokenCategory::Color, "primary", "#111111")
        .with_token(TokenCategory::Color, "secondary", "#222222")
}

fn cache_over(store: &Arc<InMemoryScopeStore>) -> ResolutionCache<Arc<InMemoryScopeStore>> {
    ResolutionCache::new(Arc::clone(store), &EngineConfig::default())
}

// ═══════════════════════════════════════════════════════════════════════════
// IDEMPOTENCE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn unchanged_records_yield_identical_results() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_token_record(platform_record());
    let cache = cache_over(&store);
    let ctx = TenantContext::new("agroconecta", "starter", "t1");

    let first = cache.resolve_tokens(&ctx).unwrap();
    let second = cache.resolve_tokens(&ctx).unwrap();

    assert_eq!(*first, *second);
    // same Arc: the hit served the memoized value without recomputing
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn entitlement_resolution_is_idempotent() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("default-starter", "_default", "starter")
            .with_limit("products", 10),
    );
    let cache = cache_over(&store);

    let first = cache.resolve_entitlements("agroconecta", "starter").unwrap();
    let second = cache.resolve_entitlements("agroconecta", "starter").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

// ═══════════════════════════════════════════════════════════════════════════
// REVALIDATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn admin_edit_is_visible_on_next_resolve() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_token_record(platform_record());
    let cache = cache_over(&store);
    let ctx = TenantContext::new("agroconecta", "starter", "t1");

    let before = cache.resolve_tokens(&ctx).unwrap();
    assert_eq!(before.get(TokenCategory::Color, "primary"), Some("#111111"));

    // admin edits the platform record: same id, bumped changed_at
    let mut edited = platform_record().with_token(TokenCategory::Color, "primary", "#999999");
    edited.changed_at = 1;
    store.update_token_record(edited);

    let after = cache.resolve_tokens(&ctx).unwrap();
    assert_eq!(after.get(TokenCategory::Color, "primary"), Some("#999999"));
}

#[test]
fn new_record_at_more_specific_scope_invalidates() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_token_record(platform_record());
    let cache = cache_over(&store);
    let ctx = TenantContext::new("agroconecta", "starter", "t1");

    cache.resolve_tokens(&ctx).unwrap();

    store.put_token_record(
        TokenRecord::new(
            "agro-brand",
            ScopeKey::Vertical {
                vertical_id: "agroconecta".into(),
            },
        )
        .with_token(TokenCategory::Color, "primary", "#FF8C42"),
    );

    let after = cache.resolve_tokens(&ctx).unwrap();
    assert_eq!(after.get(TokenCategory::Color, "primary"), Some("#FF8C42"));
}

#[test]
fn entitlement_cache_tracks_the_contributing_record() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("default-starter", "_default", "starter")
            .with_limit("products", 10),
    );
    let cache = cache_over(&store);

    let before = cache.resolve_entitlements("agroconecta", "starter").unwrap();
    assert_eq!(before.limit_for("products"), LimitValue::Capped(10));

    // a vertical-specific record appears: the fallback no longer applies
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-starter", "agroconecta", "starter")
            .with_limit("products", 3),
    );

    let after = cache.resolve_entitlements("agroconecta", "starter").unwrap();
    assert_eq!(after.limit_for("products"), LimitValue::Capped(3));
}

#[test]
fn contexts_do_not_share_entries() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_token_record(platform_record());
    store.put_token_record(
        TokenRecord::new(
            "t2-theme",
            ScopeKey::Tenant {
                vertical_id: "agroconecta".into(),
                tier_key: "starter".into(),
                tenant_id: "T2".into(),
            },
        )
        .with_token(TokenCategory::Color, "primary", "#00B894"),
    );
    let cache = cache_over(&store);

    let t1 = cache
        .resolve_tokens(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();
    let t2 = cache
        .resolve_tokens(&TenantContext::new("agroconecta", "starter", "T2"))
        .unwrap();

    assert_eq!(t1.get(TokenCategory::Color, "primary"), Some("#111111"));
    assert_eq!(t2.get(TokenCategory::Color, "primary"), Some("#00B894"));
}
