//! `SqliteScopeStore` — SQLite implementation of `ScopeRepository` and
//! `CounterStore`.
//!
//! Single owner of the connection; no code outside this module touches a
//! raw `&Connection`. Record payloads are stored as JSON columns and
//! deserialized into the typed structs on read; a malformed payload skips
//! that record with a warning instead of failing the whole query.
//!
//! The counter increment is one `INSERT … ON CONFLICT … DO UPDATE …
//! RETURNING` statement: the read-modify-write happens inside SQLite, so
//! increments are linearizable per key and never lose an update.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use ej_core::errors::StorageError;
use ej_core::traits::counter_store::CounterStore;
use ej_core::traits::scope_repository::{RecordMeta, ScopeRepository};
use ej_core::types::entitlements::FeatureLimitRecord;
use ej_core::types::limit_rule::LimitRule;
use ej_core::types::scope::ScopeKey;
use ej_core::types::tier::TierDefinition;
use ej_core::types::tokens::{TokenCategory, TokenRecord};
use ej_core::types::usage::UsageKey;
use ej_core::FxHashSet;

/// SQLite-backed store for scoped config records and usage counters.
pub struct SqliteScopeStore {
    conn: Mutex<Connection>,
}

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
}

fn to_json<T: serde::Serialize>(record_id: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::MalformedRecord {
        record_id: record_id.to_string(),
        message: e.to_string(),
    })
}

/// Scope key flattened to its table columns. Absent components store as ''.
fn scope_columns(scope: &ScopeKey) -> (&'static str, &str, &str, &str) {
    match scope {
        ScopeKey::Platform => ("platform", "", "", ""),
        ScopeKey::Vertical { vertical_id } => ("vertical", vertical_id, "", ""),
        ScopeKey::Plan {
            vertical_id,
            tier_key,
        } => ("plan", vertical_id, tier_key, ""),
        ScopeKey::Tenant {
            vertical_id,
            tier_key,
            tenant_id,
        } => ("tenant", vertical_id, tier_key, tenant_id),
    }
}

fn scope_from_columns(
    level: &str,
    vertical_id: String,
    tier_key: String,
    tenant_id: String,
) -> Option<ScopeKey> {
    match level {
        "platform" => Some(ScopeKey::Platform),
        "vertical" => Some(ScopeKey::Vertical { vertical_id }),
        "plan" => Some(ScopeKey::Plan {
            vertical_id,
            tier_key,
        }),
        "tenant" => Some(ScopeKey::Tenant {
            vertical_id,
            tier_key,
            tenant_id,
        }),
        _ => None,
    }
}

impl SqliteScopeStore {
    /// Open a file-backed store, running pending migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqlite_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(sqlite_err)?;
        Self::init(conn)
    }

    /// Open an in-memory store. Used by tests and demos.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqlite_err)?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(sqlite_err)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(sqlite_err)?;
        crate::migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ─── Writers (admin layer and tests; the engine never calls these) ──

    pub fn put_tier_definition(&self, tier: &TierDefinition) -> Result<(), StorageError> {
        let aliases = to_json(&tier.tier_key, &tier.aliases)?;
        let price_ids = to_json(&tier.tier_key, &tier.stripe_price_ids)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tier_definitions (tier_key, aliases, hierarchy_weight, stripe_price_ids)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (tier_key) DO UPDATE SET
                 aliases = excluded.aliases,
                 hierarchy_weight = excluded.hierarchy_weight,
                 stripe_price_ids = excluded.stripe_price_ids",
            params![tier.tier_key, aliases, tier.hierarchy_weight, price_ids],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }

    pub fn put_token_record(&self, record: &TokenRecord) -> Result<(), StorageError> {
        let (level, vertical_id, tier_key, tenant_id) = scope_columns(&record.scope);
        let tokens = to_json(&record.id, &record.tokens)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO token_records
                 (id, level, vertical_id, tier_key, tenant_id, tokens, active, weight, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                 level = excluded.level,
                 vertical_id = excluded.vertical_id,
                 tier_key = excluded.tier_key,
                 tenant_id = excluded.tenant_id,
                 tokens = excluded.tokens,
                 active = excluded.active,
                 weight = excluded.weight,
                 changed_at = excluded.changed_at",
            params![
                record.id,
                level,
                vertical_id,
                tier_key,
                tenant_id,
                tokens,
                record.active,
                record.weight,
                record.changed_at,
            ],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }

    pub fn put_feature_limit_record(
        &self,
        record: &FeatureLimitRecord,
    ) -> Result<(), StorageError> {
        let features = to_json(&record.id, &record.features)?;
        let limits = to_json(&record.id, &record.limits)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO feature_limit_records
                 (id, vertical_id, tier_key, features, limits, active, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (id) DO UPDATE SET
                 vertical_id = excluded.vertical_id,
                 tier_key = excluded.tier_key,
                 features = excluded.features,
                 limits = excluded.limits,
                 active = excluded.active,
                 changed_at = excluded.changed_at",
            params![
                record.id,
                record.vertical_id,
                record.tier_key,
                features,
                limits,
                record.active,
                record.changed_at,
            ],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }

    /// Overwrite a stored token payload with invalid JSON. Test support for
    /// the malformed-record skip path.
    pub fn corrupt_token_payload(&self, id: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE token_records SET tokens = '{not json' WHERE id = ?1",
            params![id],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }

    /// Overwrite a stored limits payload with invalid JSON. Test support.
    pub fn corrupt_feature_payload(&self, id: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE feature_limit_records SET limits = '{not json' WHERE id = ?1",
            params![id],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }

    pub fn put_limit_rule(&self, rule: &LimitRule) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO limit_rules
                 (vertical_id, tier_key, feature_key, limit_value, upgrade_message, expected_conversion)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (vertical_id, tier_key, feature_key) DO UPDATE SET
                 limit_value = excluded.limit_value,
                 upgrade_message = excluded.upgrade_message,
                 expected_conversion = excluded.expected_conversion",
            params![
                rule.vertical_id,
                rule.tier_key,
                rule.feature_key,
                rule.limit_value,
                rule.upgrade_message,
                rule.expected_conversion,
            ],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }
}

impl ScopeRepository for SqliteScopeStore {
    fn load_active_token_records(
        &self,
        scope: &ScopeKey,
    ) -> Result<Vec<TokenRecord>, StorageError> {
        let (level, vertical_id, tier_key, tenant_id) = scope_columns(scope);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, level, vertical_id, tier_key, tenant_id, tokens, active, weight, changed_at
                 FROM token_records
                 WHERE level = ?1 AND vertical_id = ?2 AND tier_key = ?3 AND tenant_id = ?4
                   AND active = 1
                 ORDER BY id",
            )
            .map_err(sqlite_err)?;

        let rows = stmt
            .query_map(params![level, vertical_id, tier_key, tenant_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, i32>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .map_err(sqlite_err)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, level, vertical_id, tier_key, tenant_id, tokens_json, active, weight, changed_at) =
                row.map_err(sqlite_err)?;

            let Some(scope) = scope_from_columns(&level, vertical_id, tier_key, tenant_id) else {
                warn!(record = id.as_str(), level = level.as_str(), "unknown scope level, skipping");
                continue;
            };
            let tokens: BTreeMap<TokenCategory, BTreeMap<String, String>> =
                match serde_json::from_str(&tokens_json) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        warn!(record = id.as_str(), error = %e, "malformed token payload, skipping record");
                        continue;
                    }
                };

            records.push(TokenRecord {
                id,
                scope,
                tokens,
                active,
                weight,
                changed_at,
            });
        }
        Ok(records)
    }

    fn load_token_record_meta(&self, scope: &ScopeKey) -> Result<Vec<RecordMeta>, StorageError> {
        let (level, vertical_id, tier_key, tenant_id) = scope_columns(scope);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, changed_at FROM token_records
                 WHERE level = ?1 AND vertical_id = ?2 AND tier_key = ?3 AND tenant_id = ?4
                   AND active = 1
                 ORDER BY id",
            )
            .map_err(sqlite_err)?;

        let rows = stmt
            .query_map(params![level, vertical_id, tier_key, tenant_id], |row| {
                Ok(RecordMeta {
                    id: row.get(0)?,
                    changed_at: row.get(1)?,
                })
            })
            .map_err(sqlite_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
    }

    fn load_feature_limit_record(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<FeatureLimitRecord>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, vertical_id, tier_key, features, limits, active, changed_at
                 FROM feature_limit_records
                 WHERE vertical_id = ?1 AND tier_key = ?2 AND active = 1
                 ORDER BY changed_at DESC
                 LIMIT 1",
            )
            .map_err(sqlite_err)?;

        let row = stmt
            .query_row(params![vertical_id, tier_key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, bool>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })
            .optional()
            .map_err(sqlite_err)?;

        let Some((id, vertical_id, tier_key, features_json, limits_json, active, changed_at)) = row
        else {
            return Ok(None);
        };

        let features: FxHashSet<String> = match serde_json::from_str(&features_json) {
            Ok(features) => features,
            Err(e) => {
                warn!(record = id.as_str(), error = %e, "malformed feature payload, skipping record");
                return Ok(None);
            }
        };
        let limits: BTreeMap<String, i64> = match serde_json::from_str(&limits_json) {
            Ok(limits) => limits,
            Err(e) => {
                warn!(record = id.as_str(), error = %e, "malformed limits payload, skipping record");
                return Ok(None);
            }
        };

        Ok(Some(FeatureLimitRecord {
            id,
            vertical_id,
            tier_key,
            features,
            limits,
            active,
            changed_at,
        }))
    }

    fn load_feature_limit_meta(
        &self,
        vertical_id: &str,
        tier_key: &str,
    ) -> Result<Option<RecordMeta>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, changed_at FROM feature_limit_records
                 WHERE vertical_id = ?1 AND tier_key = ?2 AND active = 1
                 ORDER BY changed_at DESC
                 LIMIT 1",
            )
            .map_err(sqlite_err)?;

        stmt.query_row(params![vertical_id, tier_key], |row| {
            Ok(RecordMeta {
                id: row.get(0)?,
                changed_at: row.get(1)?,
            })
        })
        .optional()
        .map_err(sqlite_err)
    }

    fn load_limit_rule(
        &self,
        vertical_id: &str,
        tier_key: &str,
        feature_key: &str,
    ) -> Result<Option<LimitRule>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT vertical_id, tier_key, feature_key, limit_value, upgrade_message, expected_conversion
                 FROM limit_rules
                 WHERE vertical_id = ?1 AND tier_key = ?2 AND feature_key = ?3",
            )
            .map_err(sqlite_err)?;

        stmt.query_row(params![vertical_id, tier_key, feature_key], |row| {
            Ok(LimitRule {
                vertical_id: row.get(0)?,
                tier_key: row.get(1)?,
                feature_key: row.get(2)?,
                limit_value: row.get(3)?,
                upgrade_message: row.get(4)?,
                expected_conversion: row.get(5)?,
            })
        })
        .optional()
        .map_err(sqlite_err)
    }

    fn load_tier_definitions(&self) -> Result<Vec<TierDefinition>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT tier_key, aliases, hierarchy_weight, stripe_price_ids
                 FROM tier_definitions
                 ORDER BY hierarchy_weight",
            )
            .map_err(sqlite_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(sqlite_err)?;

        let mut tiers = Vec::new();
        for row in rows {
            let (tier_key, aliases_json, hierarchy_weight, price_ids_json) =
                row.map_err(sqlite_err)?;

            let aliases: Vec<String> = match serde_json::from_str(&aliases_json) {
                Ok(aliases) => aliases,
                Err(e) => {
                    warn!(tier = tier_key.as_str(), error = %e, "malformed alias payload, skipping tier");
                    continue;
                }
            };
            let stripe_price_ids = match serde_json::from_str(&price_ids_json) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(tier = tier_key.as_str(), error = %e, "malformed price id payload, skipping tier");
                    continue;
                }
            };

            tiers.push(TierDefinition {
                tier_key,
                aliases,
                hierarchy_weight,
                stripe_price_ids,
            });
        }
        Ok(tiers)
    }
}

impl CounterStore for SqliteScopeStore {
    fn increment(&self, key: &UsageKey) -> Result<u64, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO usage_counters (tenant_id, feature_key, period_id, count)
                 VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT (tenant_id, feature_key, period_id)
                     DO UPDATE SET count = count + 1
                 RETURNING count",
            )
            .map_err(sqlite_err)?;

        stmt.query_row(
            params![key.tenant_id, key.feature_key, key.period_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(sqlite_err)
    }

    fn peek(&self, key: &UsageKey) -> Result<u64, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT count FROM usage_counters
                 WHERE tenant_id = ?1 AND feature_key = ?2 AND period_id = ?3",
            )
            .map_err(sqlite_err)?;

        stmt.query_row(
            params![key.tenant_id, key.feature_key, key.period_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(sqlite_err)
        .map(|count| count.unwrap_or(0) as u64)
    }
}
