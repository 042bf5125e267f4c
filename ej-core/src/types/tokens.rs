//! Design-token records and the resolved token set.
//!
//! Tokens are partial maps per category. A record never has to be complete:
//! the cascade fills gaps from less specific scopes, and only platform scope
//! is required to be whole (the closure guarantee checked at bootstrap).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::scope::ScopeKey;

/// The fixed token categories. Stored payloads are fixed-shape maps per
/// category, not free-form JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    Color,
    Typography,
    Spacing,
    Effect,
    ComponentVariant,
}

impl TokenCategory {
    /// All categories, in the order they appear in emitted CSS.
    pub const ALL: [TokenCategory; 5] = [
        Self::Color,
        Self::Typography,
        Self::Spacing,
        Self::Effect,
        Self::ComponentVariant,
    ];

    /// Category segment used in flat keys and CSS custom properties.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Typography => "typography",
            Self::Spacing => "spacing",
            Self::Effect => "effect",
            Self::ComponentVariant => "component-variant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "color" => Some(Self::Color),
            "typography" => Some(Self::Typography),
            "spacing" => Some(Self::Spacing),
            "effect" => Some(Self::Effect),
            "component-variant" | "component_variant" => Some(Self::ComponentVariant),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoped token record. Belongs to exactly one [`ScopeKey`]; holds a
/// partial `key -> value` map per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub scope: ScopeKey,
    /// Partial maps per category. BTreeMap keeps merge output deterministic.
    #[serde(default)]
    pub tokens: BTreeMap<TokenCategory, BTreeMap<String, String>>,
    /// Inactive records never participate in the cascade.
    pub active: bool,
    /// Tie-break order among records at the identical scope key. Higher wins.
    #[serde(default)]
    pub weight: i32,
    /// Unix seconds of the last edit. Second-level tie-break: later wins.
    #[serde(default)]
    pub changed_at: i64,
}

impl TokenRecord {
    pub fn new(id: impl Into<String>, scope: ScopeKey) -> Self {
        Self {
            id: id.into(),
            scope,
            tokens: BTreeMap::new(),
            active: true,
            weight: 0,
            changed_at: 0,
        }
    }

    /// Builder-style token insertion, used heavily by tests and fixtures.
    pub fn with_token(
        mut self,
        category: TokenCategory,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.tokens
            .entry(category)
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

/// CSS custom-property namespace for emitted tokens.
pub const CSS_VAR_PREFIX: &str = "--ej";

/// The fully resolved token map for one tenant context.
///
/// Immutable once constructed; safe to share across request handlers
/// without locking. Iteration order (category, then key) is stable, so two
/// resolutions of unchanged inputs are byte-identical when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    categories: BTreeMap<TokenCategory, BTreeMap<String, String>>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a single key. The running cascade calls this for every key
    /// of every applicable record, in ascending specificity.
    pub fn set(&mut self, category: TokenCategory, key: impl Into<String>, value: impl Into<String>) {
        self.categories
            .entry(category)
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn get(&self, category: TokenCategory, key: &str) -> Option<&str> {
        self.categories
            .get(&category)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    pub fn category(&self, category: TokenCategory) -> Option<&BTreeMap<String, String>> {
        self.categories.get(&category)
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeMap::is_empty)
    }

    /// Flat `category.key -> value` view, the consumption contract for
    /// rendering layers.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for (category, map) in &self.categories {
            for (key, value) in map {
                flat.insert(format!("{}.{}", category.as_str(), key), value.clone());
            }
        }
        flat
    }

    /// CSS custom-property pairs: `--ej-<category>-<key>` → value.
    pub fn to_css_properties(&self) -> Vec<(String, String)> {
        let mut props = Vec::with_capacity(self.len());
        for (category, map) in &self.categories {
            for (key, value) in map {
                props.push((
                    format!("{}-{}-{}", CSS_VAR_PREFIX, category.as_str(), key),
                    value.clone(),
                ));
            }
        }
        props
    }

    /// A full CSS declaration block for injection under `selector`.
    pub fn to_css_block(&self, selector: &str) -> String {
        let mut out = String::new();
        out.push_str(selector);
        out.push_str(" {\n");
        for (name, value) in self.to_css_properties() {
            out.push_str("  ");
            out.push_str(&name);
            out.push_str(": ");
            out.push_str(&value);
            out.push_str(";\n");
        }
        out.push('}');
        out
    }
}
