use std::collections::HashSet;

use crate::source::Source;

/// Concatenates per-branch result lists in submission order. Duplicates
/// survive here; dropping them is the dedup stage's job.
pub fn merge(branches: Vec<Vec<Source>>) -> Vec<Source> {
    branches.into_iter().flatten().collect()
}

/// Drops any source whose normalized title was already seen earlier. First
/// occurrence wins; O(n) over a seen-set.
pub fn dedup_by_title(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(sources.len());
    for source in sources {
        if seen.insert(normalize_title(&source.title)) {
            out.push(source);
        }
    }
    out
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
