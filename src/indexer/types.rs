//! Core types for the provider system
//!
//! Every source adapts its native shape (feed XML, curated JSON) into a
//! [`RawItem`]; the normalizer is the only place a [`Release`] gets built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for "not a single-episode release or unknown".
pub const NO_EPISODE: i32 = -1;

/// Sentinel for "seeders not reported".
pub const UNKNOWN_SEEDERS: i64 = -1;

/// A normalized downloadable entry (one episode or one batch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,

    /// Publication date, `None` when the source date could not be parsed
    pub release_date: Option<DateTime<Utc>>,

    /// Size in bytes, 0 when the formatted size could not be parsed
    pub size_bytes: u64,

    /// Size string as displayed by the source
    pub formatted_size: String,

    /// `-1` means not reported
    pub seeders: i64,
    pub leechers: i64,
    pub download_count: i64,

    /// Detail page URL, also the target of follow-up fetches
    pub page_link: String,

    /// Direct `.torrent` URL, used as the dedup key when present
    pub download_url: String,

    pub info_hash: String,

    /// Empty until resolved on demand
    pub magnet_link: String,

    pub resolution: String,
    pub is_batch: bool,

    /// [`NO_EPISODE`] unless this is a single-episode release
    pub episode_number: i32,

    pub release_group: String,

    /// Provenance flags set by curated sources
    pub is_best_release: bool,
    pub confirmed: bool,

    /// The provider that found this release
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider_id: Option<String>,
}

impl Release {
    /// Whether this release targets exactly one episode
    pub fn is_single_episode(&self) -> bool {
        self.episode_number != NO_EPISODE
    }

    /// Attach a resolved magnet link
    pub fn with_magnet_link(mut self, magnet: impl Into<String>) -> Self {
        self.magnet_link = magnet.into();
        self
    }
}

/// Where a raw item came from. Drives the provenance flags and the
/// zero-values used for fields the source did not report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Search/RSS feed of a public index
    #[default]
    Feed,
    /// Human-curated best-release catalogue
    Curated,
}

/// Provider-agnostic intermediate record
///
/// Produced by feed extraction or by adapting a curated record, consumed once
/// by [`crate::indexer::normalize::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub page_link: String,
    pub download_url: String,
    pub raw_date: String,
    pub seeders: String,
    pub leechers: String,
    pub downloads: String,
    pub info_hash: String,
    pub formatted_size: String,

    /// Exact byte count when the source knows it (curated file lists)
    pub size_hint_bytes: Option<u64>,

    /// Release group asserted by the source, preferred over the parsed one
    pub release_group_hint: Option<String>,

    pub provenance: Provenance,
}

/// Airing status of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Finished,
    Releasing,
    NotYetReleased,
    Cancelled,
    Hiatus,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Content format of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Caller-supplied media metadata, read-only to this crate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaDescriptor {
    /// External media identifier (AniList id), used by curated sources
    pub id: Option<u64>,
    pub romaji_title: Option<String>,
    pub english_title: Option<String>,
    pub synonyms: Vec<String>,
    pub episode_count: Option<u32>,
    pub status: MediaStatus,
    pub format: MediaFormat,

    /// Cumulative episode count of all prior seasons
    pub absolute_season_offset: Option<u32>,
}

impl MediaDescriptor {
    /// A movie with exactly one episode gets no episode or batch tokens
    pub fn is_single_episode_movie(&self) -> bool {
        self.format == MediaFormat::Movie && self.episode_count.unwrap_or(0) == 1
    }

    /// Finished airing with a known, positive episode count
    pub fn can_batch(&self) -> bool {
        self.status == MediaStatus::Finished && self.episode_count.unwrap_or(0) > 0
    }

    pub fn absolute_offset(&self) -> i32 {
        self.absolute_season_offset.unwrap_or(0) as i32
    }

    /// Best display title: romanized, then English
    pub fn display_title(&self) -> Option<&str> {
        self.romaji_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.english_title.as_deref().filter(|t| !t.is_empty()))
    }
}

/// Options for a plain search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub media: MediaDescriptor,
    pub query: String,
}

/// Options for a synthesized search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartSearchOptions {
    pub media: MediaDescriptor,

    /// Overrides title synthesis when set
    pub query: Option<String>,
    pub batch: bool,
    pub episode_number: i32,
    pub resolution: Option<String>,
}

impl SmartSearchOptions {
    /// The explicit query, if one was given and is not blank
    pub fn explicit_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Requested episode translated to absolute numbering
    pub fn absolute_episode(&self) -> i32 {
        self.episode_number + self.media.absolute_offset()
    }
}

/// Whether a provider is a primary source or a supplementary one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Main,
    Special,
}

/// Filters a provider honours during smart search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SmartSearchFilter {
    Batch,
    EpisodeNumber,
    Resolution,
    Query,
}

/// Static description of what a provider supports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    pub can_smart_search: bool,
    pub smart_search_filters: Vec<SmartSearchFilter>,
    pub supports_adult: bool,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
}

impl ProviderCapabilities {
    pub fn supports_filter(&self, filter: SmartSearchFilter) -> bool {
        self.smart_search_filters.contains(&filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_descriptor_from_json() {
        let media: MediaDescriptor = serde_json::from_str(
            r#"{
                "id": 21,
                "romajiTitle": "One Piece",
                "synonyms": ["OP"],
                "episodeCount": 12,
                "status": "FINISHED",
                "format": "TV",
                "absoluteSeasonOffset": 12
            }"#,
        )
        .unwrap();

        assert_eq!(media.id, Some(21));
        assert_eq!(media.status, MediaStatus::Finished);
        assert_eq!(media.format, MediaFormat::Tv);
        assert!(media.can_batch());
        assert_eq!(media.absolute_offset(), 12);
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let media: MediaDescriptor =
            serde_json::from_str(r#"{"status": "SOMETHING_NEW", "format": "MANGA"}"#).unwrap();
        assert_eq!(media.status, MediaStatus::Unknown);
        assert_eq!(media.format, MediaFormat::Unknown);
    }

    #[test]
    fn test_single_episode_movie() {
        let media = MediaDescriptor {
            format: MediaFormat::Movie,
            episode_count: Some(1),
            ..Default::default()
        };
        assert!(media.is_single_episode_movie());

        let series = MediaDescriptor {
            format: MediaFormat::Movie,
            episode_count: Some(3),
            ..Default::default()
        };
        assert!(!series.is_single_episode_movie());
    }

    #[test]
    fn test_explicit_query_ignores_blank() {
        let opts = SmartSearchOptions {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(opts.explicit_query(), None);
    }
}
