//! First-seen deduplication.

use std::collections::HashSet;
use std::hash::Hash;

/// Keep the first record for each identity key, preserving input order.
pub fn unique_by<T, K, F>(records: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(key(record)))
        .collect()
}
