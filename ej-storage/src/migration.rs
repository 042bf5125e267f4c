//! Schema migrations via `PRAGMA user_version`.
//!
//! Each entry in `MIGRATIONS` moves the schema one version forward. Applied
//! inside a transaction; the user_version bump commits together with the
//! DDL, so a crash mid-migration leaves the previous version intact.

use rusqlite::Connection;
use tracing::info;

use ej_core::errors::StorageError;

const MIGRATIONS: &[&str] = &[
    // v1: initial schema
    "
    CREATE TABLE tier_definitions (
        tier_key         TEXT PRIMARY KEY,
        aliases          TEXT NOT NULL DEFAULT '[]',
        hierarchy_weight INTEGER NOT NULL,
        stripe_price_ids TEXT NOT NULL DEFAULT '[]'
    );

    CREATE TABLE token_records (
        id          TEXT PRIMARY KEY,
        level       TEXT NOT NULL,
        vertical_id TEXT NOT NULL DEFAULT '',
        tier_key    TEXT NOT NULL DEFAULT '',
        tenant_id   TEXT NOT NULL DEFAULT '',
        tokens      TEXT NOT NULL DEFAULT '{}',
        active      INTEGER NOT NULL DEFAULT 1,
        weight      INTEGER NOT NULL DEFAULT 0,
        changed_at  INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX idx_token_records_scope
        ON token_records (level, vertical_id, tier_key, tenant_id, active);

    CREATE TABLE feature_limit_records (
        id          TEXT PRIMARY KEY,
        vertical_id TEXT NOT NULL,
        tier_key    TEXT NOT NULL,
        features    TEXT NOT NULL DEFAULT '[]',
        limits      TEXT NOT NULL DEFAULT '{}',
        active      INTEGER NOT NULL DEFAULT 1,
        changed_at  INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX idx_feature_limit_records_key
        ON feature_limit_records (vertical_id, tier_key, active);

    CREATE TABLE limit_rules (
        vertical_id         TEXT NOT NULL,
        tier_key            TEXT NOT NULL,
        feature_key         TEXT NOT NULL,
        limit_value         INTEGER NOT NULL,
        upgrade_message     TEXT NOT NULL DEFAULT '',
        expected_conversion REAL NOT NULL DEFAULT 0,
        PRIMARY KEY (vertical_id, tier_key, feature_key)
    );

    CREATE TABLE usage_counters (
        tenant_id   TEXT NOT NULL,
        feature_key TEXT NOT NULL,
        period_id   TEXT NOT NULL,
        count       INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (tenant_id, feature_key, period_id)
    );
    ",
];

/// Current schema version, equal to `MIGRATIONS.len()`.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

pub fn schema_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StorageError::Sqlite {
            message: e.to_string(),
        })
}

/// Apply every pending migration.
pub fn migrate(conn: &mut Connection) -> Result<(), StorageError> {
    let mut version = schema_version(conn)?;

    while (version as usize) < MIGRATIONS.len() {
        let next = version + 1;
        let tx = conn.transaction().map_err(|e| StorageError::MigrationFailed {
            version: next,
            message: e.to_string(),
        })?;

        tx.execute_batch(MIGRATIONS[version as usize]).map_err(|e| {
            StorageError::MigrationFailed {
                version: next,
                message: e.to_string(),
            }
        })?;
        tx.pragma_update(None, "user_version", next).map_err(|e| {
            StorageError::MigrationFailed {
                version: next,
                message: e.to_string(),
            }
        })?;
        tx.commit().map_err(|e| StorageError::MigrationFailed {
            version: next,
            message: e.to_string(),
        })?;

        info!(version = next, "schema migrated");
        version = next;
    }

    Ok(())
}
