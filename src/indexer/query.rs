//! Smart search query synthesis
//!
//! Builds boolean-style Nyaa queries (`"a"|"b"` alternations grouped in
//! parentheses) from structured media metadata. Title variants collapse into
//! one alternation; absolute episode numbering gets a query of its own.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::{MediaDescriptor, SmartSearchOptions};
use crate::services::text_utils::{collapse_whitespace, normalize_query_title, zero_pad};

static SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:season|s)\s*(\d{1,2})\b").expect("valid regex"));
static PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:part|p)\s*(\d{1,2})\b").expect("valid regex"));
static ROMAN_III_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\biii\b").expect("valid regex"));
static ROMAN_II_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bii\b").expect("valid regex"));
static ROMAN_SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:iii|ii)\b").expect("valid regex"));

/// Resolutions searched when the caller does not ask for one
const DEFAULT_RESOLUTIONS: &str = "(360|480|720|1080)";

/// A `Title: Subtitle` prefix must be longer than this to become a candidate
const MIN_SUBTITLE_PREFIX_LEN: usize = 8;

/// Title fragments plus the season/part markers pulled out of them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleCandidates {
    pub titles: Vec<String>,
    pub season: u32,
    pub part: u32,
}

/// Build the provider queries for a smart search
///
/// Returns one query, or two when the media also needs an absolute-episode
/// query. An empty vector means no usable title could be derived.
pub fn build_smart_search_queries(opts: &SmartSearchOptions) -> Vec<String> {
    let media = &opts.media;

    let (title_clause, season, part) = match opts.explicit_query() {
        Some(query) => (format!("({})", query), 0, 0),
        None => {
            let candidates = collect_title_candidates(media);
            if candidates.titles.is_empty() {
                debug!("No title candidates for smart search");
                return Vec::new();
            }
            (
                build_title_string(&candidates.titles),
                candidates.season,
                candidates.part,
            )
        }
    };

    let single_movie = media.is_single_episode_movie();
    let mut clause = String::new();

    if opts.batch && media.can_batch() && !single_movie {
        clause.push_str(&build_season_string(season));
        clause.push_str(&build_part_string(part));
        clause.push_str(&build_batch_string(media));
    } else {
        clause.push_str(&build_season_string(season));
        clause.push_str(&build_part_string(part));
        if !single_movie {
            clause.push_str(&build_episode_string(opts.episode_number));
        }
    }

    let resolution_clause = match opts.resolution.as_deref().map(str::trim) {
        Some(res) if !res.is_empty() => format!("({})", res),
        _ => DEFAULT_RESOLUTIONS.to_string(),
    };

    let mut queries = vec![format!("{title_clause}{clause}{resolution_clause}")];

    if !opts.batch && media.absolute_offset() > 0 && !single_movie {
        queries.push(format!(
            "{title_clause}({}){resolution_clause}",
            opts.absolute_episode()
        ));
    }

    debug!(?queries, "Built smart search queries");
    queries
}

/// Derive normalized, deduplicated title candidates from the media titles
pub fn collect_title_candidates(media: &MediaDescriptor) -> TitleCandidates {
    let romaji = media.romaji_title.as_deref().unwrap_or("").trim();
    let english = media.english_title.as_deref().unwrap_or("").trim();
    let main_titles: Vec<&str> = [romaji, english]
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();

    let all_titles = main_titles
        .iter()
        .copied()
        .chain(media.synonyms.iter().map(|s| s.trim()))
        .filter(|t| !t.is_empty());

    let mut season = 0;
    let mut part = 0;
    let mut titles: Vec<String> = Vec::new();

    for title in all_titles {
        let (s, clean) = extract_season_number(title);
        let (p, clean) = extract_part_number(&clean);
        if season == 0 {
            season = s;
        }
        if part == 0 {
            part = p;
        }
        if !clean.is_empty() {
            titles.push(clean);
        }
    }

    if season == 0 {
        season = media
            .synonyms
            .iter()
            .map(|synonym| extract_season_number(synonym).0)
            .find(|s| *s != 0)
            .unwrap_or(0);
    }

    if season == 0 && part == 0 && titles.is_empty() {
        titles.extend(main_titles.iter().map(|t| t.to_string()));
    }

    for title in &main_titles {
        if let Some((prefix, _)) = title.split_once(':')
            && prefix.chars().count() > MIN_SUBTITLE_PREFIX_LEN
        {
            titles.push(prefix.to_string());
        }
    }

    if season == 0 {
        if main_titles.iter().any(|t| ROMAN_III_RE.is_match(t)) {
            season = 3;
        } else if main_titles.iter().any(|t| ROMAN_II_RE.is_match(t)) {
            season = 2;
        }
    }

    let mut normalized: Vec<String> = Vec::with_capacity(titles.len());
    for title in titles {
        let mut clean = normalize_query_title(&title);
        if season != 0 {
            clean = collapse_whitespace(&ROMAN_SEASON_RE.replace_all(&clean, ""));
        }
        if !clean.is_empty() && !normalized.contains(&clean) {
            normalized.push(clean);
        }
    }

    TitleCandidates {
        titles: normalized,
        season,
        part,
    }
}

/// Pull a `season N` / `sN` marker out of a title
pub fn extract_season_number(title: &str) -> (u32, String) {
    extract_marker(&SEASON_RE, title)
}

/// Pull a `part N` / `pN` marker out of a title
pub fn extract_part_number(title: &str) -> (u32, String) {
    extract_marker(&PART_RE, title)
}

fn extract_marker(re: &Regex, title: &str) -> (u32, String) {
    let Some(caps) = re.captures(title) else {
        return (0, title.to_string());
    };
    let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
        return (0, title.to_string());
    };

    let value = number.as_str().parse().unwrap_or(0);
    let clean = format!("{}{}", &title[..whole.start()], &title[whole.end()..]);
    (value, collapse_whitespace(&clean))
}

fn build_title_string(titles: &[String]) -> String {
    match titles {
        [single] => format!("({})", single),
        _ => {
            let quoted: Vec<String> = titles.iter().map(|t| format!("\"{}\"", t)).collect();
            format!("({})", quoted.join("|"))
        }
    }
}

fn build_episode_string(episode: i32) -> String {
    let padded = zero_pad(episode);
    format!("({padded}|e{padded}|e{padded}v|{padded}v|ep{padded}|ep{episode})")
}

fn build_season_string(season: u32) -> String {
    if season == 0 {
        return String::new();
    }
    let padded = zero_pad(season);
    format!("(\"season {season}\"|\"season {padded}\"|\"s{season}\"|\"s{padded}\")")
}

fn build_part_string(part: u32) -> String {
    if part == 0 {
        return String::new();
    }
    format!("(\"part {part}\")")
}

fn build_batch_string(media: &MediaDescriptor) -> String {
    let count = zero_pad(media.episode_count.unwrap_or(0));
    let parts = [
        format!("\"01 - {count}\""),
        format!("\"01 ~ {count}\""),
        "\"Batch\"".to_string(),
        "\"Complete\"".to_string(),
        "\"+ OVA\"".to_string(),
        "\"+ Specials\"".to_string(),
        "\"+ Special\"".to_string(),
        "\"Seasons\"".to_string(),
        "\"Parts\"".to_string(),
    ];
    format!("({})", parts.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::types::{MediaFormat, MediaStatus};
    use pretty_assertions::assert_eq;

    fn media(romaji: &str) -> MediaDescriptor {
        MediaDescriptor {
            id: Some(1),
            romaji_title: Some(romaji.to_string()),
            episode_count: Some(12),
            status: MediaStatus::Finished,
            format: MediaFormat::Tv,
            ..Default::default()
        }
    }

    fn episode_search(media: MediaDescriptor, episode: i32) -> SmartSearchOptions {
        SmartSearchOptions {
            media,
            episode_number: episode,
            ..Default::default()
        }
    }

    #[test]
    fn test_season_marker_becomes_token() {
        let queries = build_smart_search_queries(&episode_search(media("Example Title Season 2"), 3));
        assert_eq!(
            queries,
            vec![
                "(example title)(\"season 2\"|\"season 02\"|\"s2\"|\"s02\")(03|e03|e03v|03v|ep03|ep3)(360|480|720|1080)"
                    .to_string()
            ]
        );

        let title_clause = queries[0].split(')').next().unwrap();
        assert!(!title_clause.contains("season 2"));
    }

    #[test]
    fn test_absolute_episode_adds_second_query() {
        let mut m = media("Example Title");
        m.absolute_season_offset = Some(12);
        let queries = build_smart_search_queries(&episode_search(m, 1));

        assert_eq!(queries.len(), 2);
        assert_eq!(
            queries[0],
            "(example title)(01|e01|e01v|01v|ep01|ep1)(360|480|720|1080)"
        );
        assert_eq!(queries[1], "(example title)(13)(360|480|720|1080)");
    }

    #[test]
    fn test_no_absolute_query_for_batches() {
        let mut m = media("Example Title");
        m.absolute_season_offset = Some(12);
        let opts = SmartSearchOptions {
            batch: true,
            ..episode_search(m, 1)
        };
        assert_eq!(build_smart_search_queries(&opts).len(), 1);
    }

    #[test]
    fn test_multiple_titles_become_alternation() {
        let m = MediaDescriptor {
            english_title: Some("Frieren: Beyond Journey's End".to_string()),
            synonyms: vec!["Frieren".to_string()],
            ..media("Sousou no Frieren")
        };
        let candidates = collect_title_candidates(&m);
        assert_eq!(
            candidates.titles,
            vec![
                "sousou no frieren".to_string(),
                "frieren beyond journey's end".to_string(),
                "frieren".to_string(),
            ]
        );

        let queries = build_smart_search_queries(&episode_search(m, 12));
        assert!(queries[0].starts_with(
            "(\"sousou no frieren\"|\"frieren beyond journey's end\"|\"frieren\")(12|e12|"
        ));
    }

    #[test]
    fn test_long_subtitle_prefix_is_added() {
        let m = MediaDescriptor {
            english_title: Some("Attack on Titan: The Final Season".to_string()),
            ..media("Shingeki no Kyojin: The Final Season")
        };
        let candidates = collect_title_candidates(&m);
        assert!(candidates.titles.contains(&"shingeki no kyojin".to_string()));
        assert!(candidates.titles.contains(&"attack on titan".to_string()));
    }

    #[test]
    fn test_short_subtitle_prefix_is_ignored() {
        let candidates = collect_title_candidates(&media("Re:Zero kara Hajimeru"));
        assert_eq!(candidates.titles, vec!["re zero kara hajimeru".to_string()]);
    }

    #[test]
    fn test_first_season_marker_wins() {
        let m = MediaDescriptor {
            english_title: Some("Show Season 3".to_string()),
            synonyms: vec!["Show S4".to_string()],
            ..media("Show 2nd Season")
        };
        let candidates = collect_title_candidates(&m);
        assert_eq!(candidates.season, 3);
        assert_eq!(candidates.titles, vec!["show 2nd season".to_string(), "show".to_string()]);
    }

    #[test]
    fn test_season_from_synonym_only() {
        let m = MediaDescriptor {
            synonyms: vec!["Kaguya S2".to_string()],
            ..media("Kaguya-sama wa Kokurasetai")
        };
        let candidates = collect_title_candidates(&m);
        assert_eq!(candidates.season, 2);
        assert_eq!(
            candidates.titles,
            vec!["kaguya sama wa kokurasetai".to_string(), "kaguya".to_string()]
        );
    }

    #[test]
    fn test_part_marker() {
        let candidates = collect_title_candidates(&media("Vinland Saga Part 2"));
        assert_eq!(candidates.part, 2);
        assert_eq!(candidates.titles, vec!["vinland saga".to_string()]);

        let queries = build_smart_search_queries(&episode_search(media("Vinland Saga Part 2"), 4));
        assert_eq!(
            queries[0],
            "(vinland saga)(\"part 2\")(04|e04|e04v|04v|ep04|ep4)(360|480|720|1080)"
        );
    }

    #[test]
    fn test_roman_numeral_season() {
        let candidates = collect_title_candidates(&media("Overlord III"));
        assert_eq!(candidates.season, 3);
        assert_eq!(candidates.titles, vec!["overlord".to_string()]);

        let candidates = collect_title_candidates(&media("Mob Psycho 100 II"));
        assert_eq!(candidates.season, 2);
        assert_eq!(candidates.titles, vec!["mob psycho 100".to_string()]);
    }

    #[test]
    fn test_roman_iii_beats_ii() {
        let m = MediaDescriptor {
            english_title: Some("Title II".to_string()),
            ..media("Title III")
        };
        assert_eq!(collect_title_candidates(&m).season, 3);
    }

    #[test]
    fn test_batch_query() {
        let opts = SmartSearchOptions {
            batch: true,
            resolution: Some("1080".to_string()),
            ..episode_search(media("Example Title Season 2"), 1)
        };
        let queries = build_smart_search_queries(&opts);
        assert_eq!(
            queries,
            vec![
                "(example title)(\"season 2\"|\"season 02\"|\"s2\"|\"s02\")(\"01 - 12\"|\"01 ~ 12\"|\"Batch\"|\"Complete\"|\"+ OVA\"|\"+ Specials\"|\"+ Special\"|\"Seasons\"|\"Parts\")(1080)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_batch_falls_back_when_airing() {
        let mut m = media("Example Title");
        m.status = MediaStatus::Releasing;
        let opts = SmartSearchOptions {
            batch: true,
            ..episode_search(m, 2)
        };
        assert_eq!(
            build_smart_search_queries(&opts),
            vec!["(example title)(02|e02|e02v|02v|ep02|ep2)(360|480|720|1080)".to_string()]
        );
    }

    #[test]
    fn test_single_episode_movie_has_no_episode_token() {
        let mut m = media("Kimi no Na wa");
        m.format = MediaFormat::Movie;
        m.episode_count = Some(1);
        m.absolute_season_offset = Some(5);

        let queries = build_smart_search_queries(&episode_search(m.clone(), 1));
        assert_eq!(queries, vec!["(kimi no na wa)(360|480|720|1080)".to_string()]);

        let batch = SmartSearchOptions {
            batch: true,
            ..episode_search(m, 1)
        };
        assert_eq!(
            build_smart_search_queries(&batch),
            vec!["(kimi no na wa)(360|480|720|1080)".to_string()]
        );
    }

    #[test]
    fn test_explicit_query_keeps_episode_and_resolution() {
        let opts = SmartSearchOptions {
            query: Some("Frieren S01".to_string()),
            resolution: Some("720".to_string()),
            ..episode_search(media("Ignored Title Season 4"), 10)
        };
        assert_eq!(
            build_smart_search_queries(&opts),
            vec!["(Frieren S01)(10|e10|e10v|10v|ep10|ep10)(720)".to_string()]
        );
    }

    #[test]
    fn test_no_titles_no_queries() {
        let m = MediaDescriptor {
            status: MediaStatus::Finished,
            ..Default::default()
        };
        assert!(build_smart_search_queries(&episode_search(m, 1)).is_empty());
    }

    #[test]
    fn test_extract_markers() {
        assert_eq!(
            extract_season_number("Show Season 2 Extra"),
            (2, "Show Extra".to_string())
        );
        assert_eq!(extract_season_number("Show s03"), (3, "Show".to_string()));
        assert_eq!(extract_season_number("Show"), (0, "Show".to_string()));
        assert_eq!(extract_part_number("Show Part 2"), (2, "Show".to_string()));
        assert_eq!(extract_part_number("Show p1"), (1, "Show".to_string()));
    }
}
