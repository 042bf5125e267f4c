//! Tier-registry validation and lookup errors.

use super::error_code::{self, EjErrorCode};

/// Errors from building or querying the tier registry.
///
/// `DuplicateTier` and `AliasConflict` are load-time validation failures:
/// surfaced when the admin layer saves tier definitions, never reachable at
/// resolution time if validation ran.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Duplicate tier key: {tier_key}")]
    DuplicateTier { tier_key: String },

    #[error("Alias '{alias}' claimed by both '{first_tier}' and '{second_tier}'")]
    AliasConflict {
        alias: String,
        first_tier: String,
        second_tier: String,
    },

    #[error("No tier claims the label '{label}'")]
    UnknownLabel { label: String },

    #[error("Tier registry is empty")]
    Empty,

    #[error("Storage error: {0}")]
    Storage(#[from] super::StorageError),
}

impl EjErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateTier { .. } => error_code::DUPLICATE_TIER,
            Self::AliasConflict { .. } => error_code::ALIAS_CONFLICT,
            Self::UnknownLabel { .. } => error_code::UNKNOWN_LABEL,
            Self::Empty => error_code::EMPTY_REGISTRY,
            Self::Storage(e) => e.error_code(),
        }
    }
}
