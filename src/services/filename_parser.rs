//! Release-name parser for fansub and scene style torrent titles
//!
//! Parses titles like:
//! - "[SubsPlease] Sousou no Frieren - 05 (1080p) [ABCD1234].mkv"
//! - "[Judas] Vinland Saga S02E03 [1080p][HEVC x265 10bit]"
//! - "[Group] Show - 01 ~ 12 (BD 1920x1080)"
//! - "Show.S01E05.720p.WEB.h264-ETHEL"

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::indexer::normalize::{ReleaseMetadata, ReleaseNameParser};

static LEADING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\[【]([^\]】]+)[\]】]").expect("valid regex"));
static TRAILING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([A-Za-z][A-Za-z0-9]*)(?:\.[A-Za-z0-9]{2,4})?$").expect("valid regex"));

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{3,4})([pi])\b").expect("valid regex"));
static DIMENSIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{3,4}x(\d{3,4})\b").expect("valid regex"));
static UHD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(4K|UHD)\b").expect("valid regex"));

/// Tokens that contain digits but are never episode numbers
static NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \[[0-9a-f]{8}\]                 # crc32
        | \b\d{3,4}[pi]\b               # 1080p
        | \b\d{3,4}x\d{3,4}\b           # 1920x1080
        | \b[xh]\.?26[45]\b             # codecs
        | \b\d{1,2}[-\s]?bits?\b        # 10bit
        | \b(?:aac|flac|ddp?|opus|ac3)\s?\d(?:\.\d)?\b
        | \.(?:mkv|mp4|avi)$
        ",
    )
    .expect("valid regex")
});

static SXXEXX_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS\d{1,2}\s?E(\d{1,4})\s*[-~]\s*(?:E)?(\d{1,4})\b").expect("valid regex")
});
static SXXEXX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS\d{1,2}\s?E(\d{1,4})(?:v\d)?\b").expect("valid regex"));
static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s\[(_])(?:e|ep)?(\d{1,4})(?:v\d)?(\s*(?:-|~|to)\s*)(?:e|ep)?(\d{1,4})(?:v\d)?(?:$|[\s\])_])",
    )
    .expect("valid regex")
});
static DASH_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s-\s(\d{1,4})(?:v\d)?(?:$|[\s\[(])").expect("valid regex"));
static PREFIXED_EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:e|ep|episode)\s?\.?\s?(\d{1,4})(?:v\d)?\b").expect("valid regex")
});
static BRACKETED_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,4})(?:v\d)?\]").expect("valid regex"));

/// Default [`ReleaseNameParser`] tuned for anime release naming
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimeReleaseParser;

impl ReleaseNameParser for AnimeReleaseParser {
    fn parse(&self, title: &str) -> ReleaseMetadata {
        let metadata = ReleaseMetadata {
            episode_numbers: parse_episode_numbers(title),
            resolution: parse_resolution(title),
            release_group: parse_release_group(title),
        };

        trace!(
            title = title,
            episodes = ?metadata.episode_numbers,
            resolution = ?metadata.resolution,
            group = ?metadata.release_group,
            "Parsed release name"
        );

        metadata
    }
}

/// Extract the release group: a leading `[Group]` tag, or a trailing
/// scene-style `-GROUP`.
pub fn parse_release_group(title: &str) -> Option<String> {
    if let Some(caps) = LEADING_GROUP_RE.captures(title) {
        let group = caps[1].trim();
        if !group.is_empty() {
            return Some(group.to_string());
        }
    }

    TRAILING_GROUP_RE
        .captures(title.trim())
        .map(|caps| caps[1].to_string())
}

/// Extract the video resolution, normalized to the `<height>p` form.
pub fn parse_resolution(title: &str) -> Option<String> {
    if let Some(caps) = RESOLUTION_RE.captures(title) {
        return Some(format!("{}{}", &caps[1], caps[2].to_lowercase()));
    }
    if let Some(caps) = DIMENSIONS_RE.captures(title) {
        return Some(format!("{}p", &caps[1]));
    }
    if UHD_RE.is_match(title) {
        return Some("2160p".to_string());
    }
    None
}

/// Extract episode numbers. Ranges yield both ends, single episodes one entry,
/// and titles without an episode marker an empty list.
pub fn parse_episode_numbers(title: &str) -> Vec<i32> {
    if let Some(caps) = SXXEXX_RANGE_RE.captures(title)
        && let Some(range) = episode_range(&caps[1], &caps[2])
    {
        return range;
    }
    if let Some(caps) = SXXEXX_RE.captures(title) {
        return caps[1].parse().map(|ep| vec![ep]).unwrap_or_default();
    }

    let without_group = LEADING_GROUP_RE.replace(title, "");
    let cleaned = NOISE_RE.replace_all(&without_group, " ");

    for caps in RANGE_RE.captures_iter(&cleaned) {
        // "Title 2 - 05" is a sequel number followed by the episode
        if is_spaced_dash(&caps[2]) && caps[1].len() != caps[3].len() {
            continue;
        }
        if let Some(range) = episode_range(&caps[1], &caps[3]) {
            return range;
        }
    }

    for re in [&*DASH_EPISODE_RE, &*PREFIXED_EPISODE_RE, &*BRACKETED_EPISODE_RE] {
        if let Some(ep) = re
            .captures(&cleaned)
            .and_then(|caps| caps[1].parse::<i32>().ok())
        {
            return vec![ep];
        }
    }

    Vec::new()
}

fn is_spaced_dash(separator: &str) -> bool {
    separator.trim() == "-"
        && separator.starts_with(char::is_whitespace)
        && separator.ends_with(char::is_whitespace)
}

fn episode_range(start: &str, end: &str) -> Option<Vec<i32>> {
    let start: i32 = start.parse().ok()?;
    let end: i32 = end.parse().ok()?;

    // "2019-2020" style spans are years, not episodes
    if start >= 1900 && end >= 1900 {
        return None;
    }
    (start < end).then(|| vec![start, end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(title: &str) -> ReleaseMetadata {
        AnimeReleaseParser.parse(title)
    }

    #[test]
    fn test_fansub_single_episode() {
        let result = parse("[SubsPlease] Sousou no Frieren - 05 (1080p) [ABCD1234].mkv");
        assert_eq!(result.episode_numbers, vec![5]);
        assert_eq!(result.resolution.as_deref(), Some("1080p"));
        assert_eq!(result.release_group.as_deref(), Some("SubsPlease"));
    }

    #[test]
    fn test_sxxexx() {
        let result = parse("[Judas] Vinland Saga S02E03 [1080p][HEVC x265 10bit]");
        assert_eq!(result.episode_numbers, vec![3]);
        assert_eq!(result.release_group.as_deref(), Some("Judas"));

        let scene = parse("Show.S01E05.720p.WEB.h264-ETHEL");
        assert_eq!(scene.episode_numbers, vec![5]);
        assert_eq!(scene.resolution.as_deref(), Some("720p"));
        assert_eq!(scene.release_group.as_deref(), Some("ETHEL"));
    }

    #[test]
    fn test_episode_ranges() {
        assert_eq!(
            parse("[Group] Show - 01 ~ 12 (BD 1920x1080)").episode_numbers,
            vec![1, 12]
        );
        assert_eq!(parse("[Group] Show [01-24][1080p]").episode_numbers, vec![1, 24]);
        assert_eq!(parse("Show S01E01-E12 1080p").episode_numbers, vec![1, 12]);
    }

    #[test]
    fn test_resolution_from_dimensions() {
        assert_eq!(
            parse("[Group] Show - 01 ~ 12 (BD 1920x1080)").resolution.as_deref(),
            Some("1080p")
        );
        assert_eq!(parse("Show 4K HDR").resolution.as_deref(), Some("2160p"));
    }

    #[test]
    fn test_numbers_in_titles_are_not_episodes() {
        let result = parse("[Erai-raws] Mob Psycho 100 III - 03 [720p]");
        assert_eq!(result.episode_numbers, vec![3]);

        let result = parse("[Group] 86 - Eighty Six - 11 (1080p)");
        assert_eq!(result.episode_numbers, vec![11]);
    }

    #[test]
    fn test_sequel_number_is_not_a_range() {
        let result = parse("[SubsPlease] Kaguya-sama 2 - 05 (1080p)");
        assert_eq!(result.episode_numbers, vec![5]);

        assert_eq!(parse("[Group] Show 01 - 12 [720p]").episode_numbers, vec![1, 12]);
    }

    #[test]
    fn test_batch_without_numbers() {
        let result = parse("[Group] Show Season 2 Batch [1080p]");
        assert!(result.episode_numbers.is_empty());
    }

    #[test]
    fn test_versioned_episode() {
        assert_eq!(parse("[Group] Show - 07v2 [720p]").episode_numbers, vec![7]);
        assert_eq!(parse("Show EP12 [1080p]").episode_numbers, vec![12]);
    }

    #[test]
    fn test_year_span_is_not_a_range() {
        assert!(parse("Show (2019-2020) Complete").episode_numbers.is_empty());
    }
}
