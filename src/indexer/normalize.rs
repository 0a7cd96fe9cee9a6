//! Raw item normalization
//!
//! The single place a [`Release`] is constructed. Every failure degrades a
//! field to its zero value; a record is never rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{NO_EPISODE, Provenance, RawItem, Release, UNKNOWN_SEEDERS};
use super::units::{parse_count, parse_date, parse_size};

static BATCH_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(batch|complete|collection|seasons?|parts?)\b").expect("valid regex")
});

/// What a release-name parser extracts from a free-form title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub episode_numbers: Vec<i32>,
    pub resolution: Option<String>,
    pub release_group: Option<String>,
}

/// Free-form release-name tokenizer
pub trait ReleaseNameParser: Send + Sync {
    fn parse(&self, title: &str) -> ReleaseMetadata;
}

/// Whether a title names a batch by keyword alone
pub fn has_batch_keyword(title: &str) -> bool {
    BATCH_KEYWORD_RE.is_match(title)
}

/// Convert one raw item into a canonical [`Release`]
pub fn normalize(item: RawItem, parser: &dyn ReleaseNameParser) -> Release {
    let metadata = parser.parse(&item.title);
    let curated = item.provenance == Provenance::Curated;

    let mut episode_number = match metadata.episode_numbers.as_slice() {
        [single] => *single,
        _ => NO_EPISODE,
    };

    // Curated entries are season-level picks
    let is_batch =
        curated || metadata.episode_numbers.len() > 1 || has_batch_keyword(&item.title);
    if is_batch {
        episode_number = NO_EPISODE;
    }

    let size_bytes = item
        .size_hint_bytes
        .unwrap_or_else(|| parse_size(&item.formatted_size));

    // A scraped zero stays zero; UNKNOWN_SEEDERS only marks an unscraped curated entry
    let seeders = parse_count(&item.seeders).unwrap_or(if curated { UNKNOWN_SEEDERS } else { 0 });

    let release_group = item
        .release_group_hint
        .filter(|g| !g.is_empty())
        .or(metadata.release_group)
        .unwrap_or_default();

    Release {
        release_date: parse_date(&item.raw_date),
        size_bytes,
        formatted_size: item.formatted_size,
        seeders,
        leechers: parse_count(&item.leechers).unwrap_or(0),
        download_count: parse_count(&item.downloads).unwrap_or(0),
        page_link: item.page_link,
        download_url: item.download_url,
        info_hash: item.info_hash,
        magnet_link: String::new(),
        resolution: metadata.resolution.unwrap_or_default(),
        is_batch,
        episode_number,
        release_group,
        is_best_release: curated,
        confirmed: curated,
        provider_id: None,
        name: item.title,
    }
}

/// Normalize a batch of raw items, preserving order
pub fn normalize_all(items: Vec<RawItem>, parser: &dyn ReleaseNameParser) -> Vec<Release> {
    items.into_iter().map(|item| normalize(item, parser)).collect()
}
