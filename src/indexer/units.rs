//! Size and date parsing for index feeds
//!
//! Both parsers are best-effort: anything they cannot read degrades to a
//! zero value instead of an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([\d.,]+)\s*([KMGT]?i?B)\b").expect("valid size regex"));

/// Convert a formatted size ("1.5 GiB", "700 MB") into bytes
///
/// `*iB` suffixes scale by powers of 1024, `KB/MB/GB/TB` and bare `B` by
/// powers of 1000. Unmatched strings yield 0.
pub fn parse_size(formatted: &str) -> u64 {
    let Some(caps) = SIZE_RE.captures(formatted) else {
        return 0;
    };

    let Ok(value) = caps[1].replace(',', "").parse::<f64>() else {
        return 0;
    };

    let unit = caps[2].to_uppercase();
    let base: f64 = if unit.ends_with("IB") { 1024.0 } else { 1000.0 };
    let exponent = match unit.chars().next() {
        Some('K') => 1,
        Some('M') => 2,
        Some('G') => 3,
        Some('T') => 4,
        _ => 0,
    };

    let bytes = value * base.powi(exponent);
    if bytes.is_finite() && bytes > 0.0 {
        bytes.round() as u64
    } else {
        0
    }
}

/// Parse a feed or API date into UTC
///
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 and the space-separated
/// timestamp format used by PocketBase-style JSON APIs.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
    ];
    for fmt in formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive_formats = [
        "%a, %d %b %Y %H:%M:%S GMT",
        "%Y-%m-%d %H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    debug!(date = s, "Failed to parse date");
    None
}

/// Parse a counter such as seeders or downloads ("1,234")
pub fn parse_count(s: &str) -> Option<i64> {
    s.trim().replace(',', "").parse().ok()
}
