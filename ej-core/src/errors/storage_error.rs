//! Storage-layer errors for repository and counter-store operations.

use super::error_code::{self, EjErrorCode};

/// Errors surfaced by `ScopeRepository` / `CounterStore` implementations.
///
/// The core never retries and never caches a failure; transient errors are
/// returned verbatim and retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("Malformed stored record '{record_id}': {message}")]
    MalformedRecord { record_id: String, message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },
}

impl EjErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_code::STORAGE_UNAVAILABLE,
            Self::Sqlite { .. } => error_code::SQLITE_ERROR,
            Self::MalformedRecord { .. } => error_code::MALFORMED_RECORD,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
        }
    }
}
