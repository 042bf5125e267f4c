//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the resolution and gating layers.
///
/// Loaded from TOML; every field is optional and falls back through the
/// `effective_*` accessors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Max entries in each resolution cache. Default: 4096.
    pub cache_capacity: Option<u64>,
    /// When a plan label resolves to no tier, fall back to the lowest tier
    /// instead of erroring. Default: false — the normalizer never guesses
    /// unless the operator opts in.
    pub assume_lowest_on_unknown: Option<bool>,
    /// URL embedded in upgrade prompts.
    pub upgrade_url: Option<String>,
}

impl EngineConfig {
    pub const DEFAULT_CACHE_CAPACITY: u64 = 4096;
    pub const DEFAULT_UPGRADE_URL: &'static str = "https://ecosistemajaraba.com/planes";

    /// Parse from a TOML document. Unknown keys are ignored.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn effective_cache_capacity(&self) -> u64 {
        self.cache_capacity.unwrap_or(Self::DEFAULT_CACHE_CAPACITY)
    }

    pub fn effective_assume_lowest(&self) -> bool {
        self.assume_lowest_on_unknown.unwrap_or(false)
    }

    pub fn effective_upgrade_url(&self) -> &str {
        self.upgrade_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_UPGRADE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.effective_cache_capacity(), 4096);
        assert!(!cfg.effective_assume_lowest());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = EngineConfig::from_toml_str(
            "cache_capacity = 128\nassume_lowest_on_unknown = true\n",
        )
        .unwrap();
        assert_eq!(cfg.effective_cache_capacity(), 128);
        assert!(cfg.effective_assume_lowest());
    }
}
