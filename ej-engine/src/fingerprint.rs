//! Contributing-record fingerprints.
//!
//! A resolution is as fresh as the records it read. Hashing the sorted
//! `(id, changed_at)` pairs of those records gives a cheap equality check:
//! same fingerprint, same inputs, same result. Sorting first makes the
//! digest independent of repository return order.

use xxhash_rust::xxh3::Xxh3;

use ej_core::traits::scope_repository::RecordMeta;

/// xxh3-64 digest over the metadata of every contributing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Digest a set of record metas, order-independent.
    pub fn of_metas(metas: &[RecordMeta]) -> Self {
        let mut sorted: Vec<&RecordMeta> = metas.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id).then(a.changed_at.cmp(&b.changed_at)));

        let mut hasher = Xxh3::new();
        for meta in sorted {
            hasher.update(meta.id.as_bytes());
            hasher.update(&[0]);
            hasher.update(&meta.changed_at.to_le_bytes());
        }
        Self(hasher.digest())
    }

    /// Digest for an optional single contributing record (feature-limit
    /// resolutions read at most one). `None` hashes distinctly from any
    /// real record.
    pub fn of_optional_meta(meta: Option<&RecordMeta>) -> Self {
        match meta {
            Some(m) => Self::of_metas(std::slice::from_ref(m)),
            None => Self(0),
        }
    }
}
