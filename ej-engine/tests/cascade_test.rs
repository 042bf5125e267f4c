//! Token cascade scenarios: per-tenant overrides, sibling-key inheritance,
//! and specificity monotonicity.

use std::sync::Arc;

use ej_core::traits::test_helpers::InMemoryScopeStore;
use ej_core::types::scope::{ScopeKey, TenantContext};
use ej_core::types::tokens::{TokenCategory, TokenRecord};

use ej_engine::TokenCascadeMerger;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn vertical(vertical_id: &str) -> ScopeKey {
    ScopeKey::Vertical {
        vertical_id: vertical_id.into(),
    }
}

fn tenant(vertical_id: &str, tier_key: &str, tenant_id: &str) -> ScopeKey {
    ScopeKey::Tenant {
        vertical_id: vertical_id.into(),
        tier_key: tier_key.into(),
        tenant_id: tenant_id.into(),
    }
}

/// Platform base + agroconecta vertical override on color.primary.
fn seeded_store() -> Arc<InMemoryScopeStore> {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_token_record(
        TokenRecord::new("platform-base", ScopeKey::Platform)
            .with_token(TokenCategory::Color, "primary", "#111111")
            .with_token(TokenCategory::Color, "secondary", "#654321")
            .with_token(TokenCategory::Typography, "font-base", "Inter")
            .with_token(TokenCategory::Spacing, "md", "1rem")
            .with_token(TokenCategory::Effect, "shadow-card", "none")
            .with_token(TokenCategory::ComponentVariant, "button", "rounded"),
    );
    store.put_token_record(
        TokenRecord::new("agro-brand", vertical("agroconecta"))
            .with_token(TokenCategory::Color, "primary", "#FF8C42"),
    );
    store
}

// ═══════════════════════════════════════════════════════════════════════════
// CASCADE SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn tenant_without_override_inherits_vertical_value() {
    let merger = TokenCascadeMerger::new(seeded_store());
    let t1 = TenantContext::new("agroconecta", "starter", "T1");

    let set = merger.resolve(&t1).unwrap();
    assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#FF8C42"));
    assert_eq!(set.get(TokenCategory::Color, "secondary"), Some("#654321"));
}

#[test]
fn tenant_override_wins_and_siblings_still_inherit() {
    let store = seeded_store();
    store.put_token_record(
        TokenRecord::new("t2-theme", tenant("agroconecta", "starter", "T2"))
            .with_token(TokenCategory::Color, "primary", "#00B894"),
    );

    let merger = TokenCascadeMerger::new(Arc::clone(&store));
    let t1 = TenantContext::new("agroconecta", "starter", "T1");
    let t2 = TenantContext::new("agroconecta", "starter", "T2");

    let set_t1 = merger.resolve(&t1).unwrap();
    let set_t2 = merger.resolve(&t2).unwrap();

    assert_eq!(set_t1.get(TokenCategory::Color, "primary"), Some("#FF8C42"));
    assert_eq!(set_t2.get(TokenCategory::Color, "primary"), Some("#00B894"));
    // secondary falls back to the platform value for both, untouched
    assert_eq!(set_t1.get(TokenCategory::Color, "secondary"), Some("#654321"));
    assert_eq!(set_t2.get(TokenCategory::Color, "secondary"), Some("#654321"));
}

#[test]
fn specificity_is_monotonic_for_contested_keys() {
    let store = seeded_store();
    // same key defined at vertical and tenant scope with different values
    store.put_token_record(
        TokenRecord::new("t7-theme", tenant("agroconecta", "starter", "T7"))
            .with_token(TokenCategory::Spacing, "md", "1.25rem"),
    );
    store.put_token_record(
        TokenRecord::new("agro-spacing", vertical("agroconecta"))
            .with_token(TokenCategory::Spacing, "md", "0.75rem"),
    );

    let merger = TokenCascadeMerger::new(store);
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T7"))
        .unwrap();

    // the tenant-scope value always equals the resolved value
    assert_eq!(set.get(TokenCategory::Spacing, "md"), Some("1.25rem"));
}

#[test]
fn keys_absent_from_platform_and_everywhere_else_stay_absent() {
    let merger = TokenCascadeMerger::new(seeded_store());
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();
    assert_eq!(set.get(TokenCategory::Color, "tertiary"), None);
}

#[test]
fn other_verticals_do_not_leak() {
    let store = seeded_store();
    store.put_token_record(
        TokenRecord::new("comercio-brand", vertical("comercioconecta"))
            .with_token(TokenCategory::Color, "primary", "#3B82F6"),
    );

    let merger = TokenCascadeMerger::new(store);
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();
    assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#FF8C42"));
}

#[test]
fn resolved_set_renders_css_with_ej_prefix() {
    let merger = TokenCascadeMerger::new(seeded_store());
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();

    let css = set.to_css_block(":root");
    assert!(css.contains("--ej-color-primary: #FF8C42;"));
    assert!(css.contains("--ej-typography-font-base: Inter;"));
}

#[test]
fn plan_scope_sits_between_vertical_and_tenant() {
    let store = seeded_store();
    store.put_token_record(
        TokenRecord::new(
            "agro-starter-plan",
            ScopeKey::Plan {
                vertical_id: "agroconecta".into(),
                tier_key: "starter".into(),
            },
        )
        .with_token(TokenCategory::Color, "primary", "#ABCDEF"),
    );

    let merger = TokenCascadeMerger::new(Arc::clone(&store));

    // plan beats vertical...
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();
    assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#ABCDEF"));

    // ...and tenant beats plan
    store.put_token_record(
        TokenRecord::new("t1-theme", tenant("agroconecta", "starter", "T1"))
            .with_token(TokenCategory::Color, "primary", "#00B894"),
    );
    let set = merger
        .resolve(&TenantContext::new("agroconecta", "starter", "T1"))
        .unwrap();
    assert_eq!(set.get(TokenCategory::Color, "primary"), Some("#00B894"));
}
