//! Resolution-layer errors.

use crate::types::tokens::TokenCategory;

use super::error_code::{self, EjErrorCode};

/// Errors from token-cascade or feature-limit resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No active platform-level token record covers `category`. Fatal at
    /// service bootstrap — the service must refuse to start rather than
    /// silently degrade.
    #[error("No active platform-scope token record for category '{category}'")]
    ScopeNotFound { category: TokenCategory },

    #[error("Unknown tier key '{tier_key}'")]
    UnknownTier { tier_key: String },

    #[error("Storage error: {0}")]
    Storage(#[from] super::StorageError),
}

impl EjErrorCode for ResolveError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ScopeNotFound { .. } => error_code::SCOPE_NOT_FOUND,
            Self::UnknownTier { .. } => error_code::UNKNOWN_TIER,
            Self::Storage(e) => e.error_code(),
        }
    }
}
