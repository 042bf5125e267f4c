//! Tier registry and alias normalization.
//!
//! The registry is the single authority on canonical tier keys. It is built
//! once from the stored tier definitions, validated eagerly, and rebuilt
//! wholesale whenever the admin layer changes a tier. Lookups after a
//! successful build cannot conflict.

use tracing::{debug, warn};

use ej_core::collections::FxHashMap;
use ej_core::config::EngineConfig;
use ej_core::errors::RegistryError;
use ej_core::traits::scope_repository::ScopeRepository;
use ej_core::types::tier::TierDefinition;

/// Canonical tier keys + flattened alias table + upgrade ladder.
#[derive(Debug)]
pub struct TierRegistry {
    /// Tiers sorted ascending by `hierarchy_weight`.
    tiers: Vec<TierDefinition>,
    /// Normalized alias -> index into `tiers`.
    alias_table: FxHashMap<String, usize>,
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

impl TierRegistry {
    /// Build and validate the registry.
    ///
    /// Fails fast on an empty definition list, a duplicate `tier_key`, or
    /// an alias claimed by two tiers (case-insensitive after trim). Every
    /// tier self-aliases: its canonical key is inserted into the table even
    /// when not listed among the aliases.
    pub fn build(mut definitions: Vec<TierDefinition>) -> Result<Self, RegistryError> {
        if definitions.is_empty() {
            return Err(RegistryError::Empty);
        }

        definitions.sort_by_key(|t| t.hierarchy_weight);

        let mut alias_table: FxHashMap<String, usize> = FxHashMap::default();
        for (idx, tier) in definitions.iter().enumerate() {
            let self_alias = normalize(&tier.tier_key);
            if let Some(&prior) = alias_table.get(&self_alias) {
                let first = &definitions[prior].tier_key;
                if normalize(first) == self_alias {
                    return Err(RegistryError::DuplicateTier {
                        tier_key: tier.tier_key.clone(),
                    });
                }
                return Err(RegistryError::AliasConflict {
                    alias: self_alias,
                    first_tier: first.clone(),
                    second_tier: tier.tier_key.clone(),
                });
            }
            alias_table.insert(self_alias, idx);

            for alias in &tier.aliases {
                let key = normalize(alias);
                if let Some(&prior) = alias_table.get(&key) {
                    if prior == idx {
                        continue; // same tier listing an alias twice is harmless
                    }
                    return Err(RegistryError::AliasConflict {
                        alias: key,
                        first_tier: definitions[prior].tier_key.clone(),
                        second_tier: tier.tier_key.clone(),
                    });
                }
                alias_table.insert(key, idx);
            }
        }

        debug!(
            tiers = definitions.len(),
            aliases = alias_table.len(),
            "tier registry built"
        );

        Ok(Self {
            tiers: definitions,
            alias_table,
        })
    }

    /// Build from the stored definitions. Called at bootstrap and again
    /// whenever the admin layer changes a tier.
    pub fn load(repo: &impl ScopeRepository) -> Result<Self, RegistryError> {
        Self::build(repo.load_tier_definitions()?)
    }

    /// Normalize an arbitrary incoming plan label to its canonical tier
    /// key. Never guesses: an unclaimed label is an error, and treating it
    /// as "lowest tier" requires the explicit [`Self::resolve_or_lowest`]
    /// opt-in.
    pub fn resolve(&self, raw_label: &str) -> Result<&str, RegistryError> {
        let key = normalize(raw_label);
        self.alias_table
            .get(&key)
            .map(|&idx| self.tiers[idx].tier_key.as_str())
            .ok_or(RegistryError::UnknownLabel { label: key })
    }

    /// Config-driven entry point: errors on unclaimed labels unless the
    /// operator opted into the lowest-tier fallback.
    pub fn resolve_with(&self, config: &EngineConfig, raw_label: &str) -> Result<&str, RegistryError> {
        if config.effective_assume_lowest() {
            Ok(self.resolve_or_lowest(raw_label))
        } else {
            self.resolve(raw_label)
        }
    }

    /// Resolve, falling back to the lowest tier for unclaimed labels.
    pub fn resolve_or_lowest(&self, raw_label: &str) -> &str {
        match self.resolve(raw_label) {
            Ok(key) => key,
            Err(_) => {
                let lowest = self.lowest();
                warn!(
                    label = raw_label,
                    fallback = lowest.tier_key.as_str(),
                    "unknown plan label, assuming lowest tier"
                );
                &lowest.tier_key
            }
        }
    }

    /// The definition behind a canonical key (or any alias).
    pub fn get(&self, label: &str) -> Option<&TierDefinition> {
        self.alias_table
            .get(&normalize(label))
            .map(|&idx| &self.tiers[idx])
    }

    /// The tier with the minimum hierarchy weight.
    pub fn lowest(&self) -> &TierDefinition {
        // build() rejects empty registries
        &self.tiers[0]
    }

    /// The next tier up the ladder, by hierarchy weight. `None` for the top
    /// tier — which is also why top-tier tenants never see upgrade prompts.
    pub fn next_tier(&self, tier_key: &str) -> Option<&TierDefinition> {
        let idx = *self.alias_table.get(&normalize(tier_key))?;
        self.tiers.get(idx + 1)
    }

    /// All tiers, ascending by weight.
    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<TierDefinition> {
        vec![
            TierDefinition::new("free", 0).with_alias("gratis"),
            TierDefinition::new("starter", 10).with_alias("Starter Plan"),
            TierDefinition::new("profesional", 20).with_alias("pro"),
            TierDefinition::new("enterprise", 30),
        ]
    }

    #[test]
    fn aliases_normalize_case_and_whitespace() {
        let registry = TierRegistry::build(ladder()).unwrap();
        assert_eq!(registry.resolve("  PRO ").unwrap(), "profesional");
        assert_eq!(registry.resolve("starter plan").unwrap(), "starter");
    }

    #[test]
    fn self_alias_always_holds() {
        let registry = TierRegistry::build(ladder()).unwrap();
        for tier in registry.tiers() {
            assert_eq!(registry.resolve(&tier.tier_key).unwrap(), tier.tier_key);
        }
    }

    #[test]
    fn conflicting_alias_fails_fast() {
        let defs = vec![
            TierDefinition::new("starter", 10).with_alias("basic"),
            TierDefinition::new("profesional", 20).with_alias("Basic"),
        ];
        let err = TierRegistry::build(defs).unwrap_err();
        assert!(matches!(err, RegistryError::AliasConflict { .. }));
    }

    #[test]
    fn duplicate_tier_key_fails_fast() {
        let defs = vec![
            TierDefinition::new("starter", 10),
            TierDefinition::new("starter", 20),
        ];
        let err = TierRegistry::build(defs).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTier { .. }));
    }

    #[test]
    fn upgrade_ladder_follows_weights() {
        let registry = TierRegistry::build(ladder()).unwrap();
        assert_eq!(registry.lowest().tier_key, "free");
        assert_eq!(registry.next_tier("free").unwrap().tier_key, "starter");
        assert_eq!(
            registry.next_tier("profesional").unwrap().tier_key,
            "enterprise"
        );
        assert!(registry.next_tier("enterprise").is_none());
    }

    #[test]
    fn unknown_label_errors_unless_opted_in() {
        let registry = TierRegistry::build(ladder()).unwrap();
        assert!(registry.resolve("mystery").is_err());
        assert_eq!(registry.resolve_or_lowest("mystery"), "free");
    }

    #[test]
    fn resolve_with_honors_the_config_opt_in() {
        let registry = TierRegistry::build(ladder()).unwrap();

        let strict = EngineConfig::default();
        assert!(registry.resolve_with(&strict, "mystery").is_err());

        let lenient = EngineConfig {
            assume_lowest_on_unknown: Some(true),
            ..Default::default()
        };
        assert_eq!(registry.resolve_with(&lenient, "mystery").unwrap(), "free");
    }

    #[test]
    fn empty_definitions_are_rejected() {
        assert!(matches!(
            TierRegistry::build(Vec::new()),
            Err(RegistryError::Empty)
        ));
    }

    #[test]
    fn load_builds_from_the_repository() {
        use ej_core::traits::test_helpers::InMemoryScopeStore;

        let store = InMemoryScopeStore::new();
        for tier in ladder() {
            store.put_tier_definition(tier);
        }
        let registry = TierRegistry::load(&store).unwrap();
        assert_eq!(registry.tiers().len(), 4);
        assert_eq!(registry.resolve("pro").unwrap(), "profesional");
    }
}
