//! Fan-in helpers for multi-query and multi-entry pipelines
//!
//! Query results are merged in source order, so the first query's copy of a
//! duplicate always survives.

use std::collections::HashSet;
use std::future::Future;

use futures::stream::{self, StreamExt};

use super::types::{RawItem, Release};

/// Merge per-query result sets, deduplicating by download URL
///
/// Items without a download URL are never deduplicated.
pub fn merge_unique(result_sets: Vec<Vec<RawItem>>) -> Vec<RawItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for item in result_sets.into_iter().flatten() {
        if item.download_url.is_empty() || seen.insert(item.download_url.clone()) {
            merged.push(item);
        }
    }

    merged
}

/// Keep single-episode releases matching the requested episode, in either
/// per-season or absolute numbering
pub fn filter_by_episode(releases: Vec<Release>, episode: i32, offset: i32) -> Vec<Release> {
    let absolute = episode + offset;
    releases
        .into_iter()
        .filter(|r| {
            r.is_single_episode()
                && (r.episode_number == episode || r.episode_number == absolute)
        })
        .collect()
}

/// Drive `tasks` with at most `limit` in flight, returning outputs in input
/// order once every task has settled
pub async fn settle_bounded<I, F, T>(tasks: I, limit: usize) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T>,
{
    stream::iter(tasks).buffered(limit.max(1)).collect().await
}
