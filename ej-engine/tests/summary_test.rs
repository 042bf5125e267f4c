//! Usage summaries and tier-change validation.

use std::sync::Arc;

use ej_core::config::EngineConfig;
use ej_core::traits::test_helpers::InMemoryScopeStore;
use ej_core::types::entitlements::{FeatureLimitRecord, LimitValue};

use ej_engine::{ResolutionCache, UsageMeter, UsageReporter};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn reporter_over(
    store: &Arc<InMemoryScopeStore>,
) -> UsageReporter<Arc<InMemoryScopeStore>, Arc<InMemoryScopeStore>> {
    let cache = Arc::new(ResolutionCache::new(
        Arc::clone(store),
        &EngineConfig::default(),
    ));
    UsageReporter::new(cache, UsageMeter::new(Arc::clone(store)))
}

fn seed_usage(store: &Arc<InMemoryScopeStore>, tenant: &str, feature: &str, times: u64) {
    let meter = UsageMeter::new(Arc::clone(store));
    for _ in 0..times {
        meter.increment(tenant, feature, "2026-02").unwrap();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USAGE SUMMARY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn summary_reflects_effective_limits_and_live_counts() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-starter", "agroconecta", "starter")
            .with_limit("products", 10)
            .with_limit("storage_gb", -1)
            .with_limit("pos_integration", 0),
    );
    seed_usage(&store, "t1", "products", 4);

    let reporter = reporter_over(&store);
    let rows = reporter
        .usage_summary(
            "t1",
            "agroconecta",
            "starter",
            "2026-02",
            &["products", "storage_gb", "pos_integration"],
        )
        .unwrap();

    assert_eq!(rows.len(), 3);

    let products = &rows[0];
    assert_eq!(products.current, 4);
    assert_eq!(products.limit, LimitValue::Capped(10));
    assert!(products.included);
    assert!(!products.unlimited);

    let storage = &rows[1];
    assert!(storage.unlimited);
    assert!(storage.included);

    let pos = &rows[2];
    assert_eq!(pos.limit, LimitValue::Disabled);
    assert!(!pos.included);
}

#[test]
fn summary_never_increments() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-starter", "agroconecta", "starter")
            .with_limit("products", 10),
    );
    seed_usage(&store, "t1", "products", 2);

    let reporter = reporter_over(&store);
    for _ in 0..3 {
        reporter
            .usage_summary("t1", "agroconecta", "starter", "2026-02", &["products"])
            .unwrap();
    }

    let rows = reporter
        .usage_summary("t1", "agroconecta", "starter", "2026-02", &["products"])
        .unwrap();
    assert_eq!(rows[0].current, 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// TIER-CHANGE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn downgrade_below_current_usage_is_flagged() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-free", "agroconecta", "free")
            .with_limit("products", 3)
            .with_limit("flash_offers", 0),
    );
    seed_usage(&store, "t1", "products", 7);
    seed_usage(&store, "t1", "flash_offers", 2);

    let reporter = reporter_over(&store);
    let violations = reporter
        .validate_tier_change(
            "t1",
            "agroconecta",
            "free",
            "2026-02",
            &["products", "flash_offers"],
        )
        .unwrap();

    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].feature_key, "products");
    assert_eq!(violations[0].current, 7);
    assert_eq!(violations[0].new_limit, 3);
    assert_eq!(violations[1].feature_key, "flash_offers");
    assert_eq!(violations[1].new_limit, 0);
}

#[test]
fn upgrade_with_headroom_passes() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-pro", "agroconecta", "profesional")
            .with_limit("products", 100)
            .with_limit("storage_gb", -1),
    );
    seed_usage(&store, "t1", "products", 7);

    let reporter = reporter_over(&store);
    let violations = reporter
        .validate_tier_change(
            "t1",
            "agroconecta",
            "profesional",
            "2026-02",
            &["products", "storage_gb"],
        )
        .unwrap();
    assert!(violations.is_empty());
}

#[test]
fn disabled_but_unused_feature_is_not_a_violation() {
    let store = Arc::new(InMemoryScopeStore::new());
    store.put_feature_limit_record(
        FeatureLimitRecord::new("agro-free", "agroconecta", "free").with_limit("ai_triage", 0),
    );

    let reporter = reporter_over(&store);
    let violations = reporter
        .validate_tier_change("t1", "agroconecta", "free", "2026-02", &["ai_triage"])
        .unwrap();
    assert!(violations.is_empty());
}
