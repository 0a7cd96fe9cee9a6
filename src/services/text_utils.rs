//! Shared text normalization utilities
//!
//! Used by the query synthesizer.

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a title fragment for use inside a search query.
/// Colons and hyphens become spaces, whitespace is collapsed, case is lowered.
///
/// # Example
/// ```ignore
/// assert_eq!(normalize_query_title("Re:Zero - Starting Life"), "re zero starting life");
/// ```
pub fn normalize_query_title(title: &str) -> String {
    collapse_whitespace(&title.replace([':', '-'], " ")).to_lowercase()
}

/// Render a number with at least two digits ("3" -> "03", "12" -> "12").
pub fn zero_pad(value: impl std::fmt::Display) -> String {
    let s = value.to_string();
    if s.len() < 2 { format!("0{}", s) } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a   b \t c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_normalize_query_title() {
        assert_eq!(
            normalize_query_title("Re:Zero - Starting Life"),
            "re zero starting life"
        );
        assert_eq!(normalize_query_title("  Spy x  Family "), "spy x family");
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(3), "03");
        assert_eq!(zero_pad(0), "00");
        assert_eq!(zero_pad(12), "12");
        assert_eq!(zero_pad(120), "120");
    }
}
