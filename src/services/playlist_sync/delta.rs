use std::collections::HashSet;

use crate::spotify_rs::types::Item;

/// Returns the candidates whose uri is not already in `existing`, in candidate order.
///
/// Candidates are not deduplicated against each other, a uri listed twice in
/// `candidates` and absent from `existing` is returned twice.
pub fn compute_delta(existing: &[Item], candidates: &[Item]) -> Vec<Item> {
    let existing_uris: HashSet<&str> = existing.iter().map(Item::uri).collect();

    candidates
        .iter()
        .filter(|candidate| {
            let present = existing_uris.contains(candidate.uri());
            if present {
                tracing::debug!(
                    uri = candidate.uri(),
                    name = candidate.name(),
                    "Skipping track as it is already in playlist"
                );
            }
            !present
        })
        .cloned()
        .collect()
}
