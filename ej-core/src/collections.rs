//! Shared collection aliases.
//!
//! FxHashMap/FxHashSet for hot lookups where iteration order does not
//! matter. Anything whose iteration order is part of an output contract
//! (token maps, fingerprints) uses `BTreeMap` instead.

pub use rustc_hash::{FxHashMap, FxHashSet};
