//! Bounded most-recent-first id lists.
//!
//! A recency list never holds duplicates and never grows past its cap. The
//! helpers return whether the list changed so callers can skip no-op writes.

/// Moves `id` to the front, dropping any earlier occurrence, then truncates
/// to `cap`.
pub fn touch(list: &mut Vec<String>, id: &str, cap: usize) -> bool {
    let before = list.clone();
    list.retain(|existing| existing != id);
    list.insert(0, id.to_string());
    dedupe(list);
    list.truncate(cap);
    *list != before
}

/// Removes every occurrence of `id`.
pub fn remove(list: &mut Vec<String>, id: &str) -> bool {
    let len = list.len();
    list.retain(|existing| existing != id);
    list.len() != len
}

/// Drops later duplicates, keeping first (most recent) positions. Lists
/// written by older clients may already contain repeats.
fn dedupe(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    list.retain(|id| seen.insert(id.clone()));
}
