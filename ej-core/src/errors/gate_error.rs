//! Entitlement-gate errors.
//!
//! A `Blocked` decision is a normal return value, not an error. These
//! variants cover genuine failures underneath the gate only.

use super::error_code::{self, EjErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Entitlement resolution failed: {0}")]
    Resolution(#[from] super::ResolveError),

    /// The atomic increment against a hard cap failed. Unlimited-feature
    /// analytics increments never produce this — those are best-effort.
    #[error("Usage counter failed: {0}")]
    Counter(super::StorageError),
}

impl EjErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Resolution(_) => error_code::GATE_RESOLUTION_FAILED,
            Self::Counter(_) => error_code::GATE_COUNTER_FAILED,
        }
    }
}
