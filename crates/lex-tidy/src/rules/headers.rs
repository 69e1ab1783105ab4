//! Deterministic header normalization.
//!
//! `unit_price` becomes `Unit Price`. Spreadsheet tools add markers such as
//! `.1` or `#2` when a header repeats; these are stripped when the remainder
//! names another column, so the repeat is numbered `(2)`, `(3)`, ... instead.

use crate::types::HeaderMapping;
use crate::utils::{collapse_whitespace, strip_punctuation, title_case};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static DUPLICATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[.#](\d+)$").expect("Invalid regex: duplicate marker"));

/// Normalize a single header with no collision handling.
///
/// Returns an empty string when nothing printable remains.
pub fn normalize_header(name: &str) -> String {
    let spaced = name.trim().replace(['_', '.'], " ");
    title_case(&collapse_whitespace(&strip_punctuation(&spaced)))
}

/// Normalize a full header row, disambiguating collisions.
///
/// Collisions are suffixed `" (2)"`, `" (3)"`, ... in order of first
/// occurrence. Headers that normalize to nothing become `Column N` with `N`
/// the 1-based column position.
pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> Vec<HeaderMapping> {
    let plain: Vec<String> = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect();
    let plain_set: HashSet<&str> = plain.iter().map(String::as_str).collect();

    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut mappings = Vec::with_capacity(headers.len());

    for (index, header) in headers.iter().enumerate() {
        let original = header.as_ref();
        let mut base = plain[index].clone();

        if let Some(caps) = DUPLICATE_MARKER.captures(original.trim()) {
            let stripped = normalize_header(&caps[1]);
            if !stripped.is_empty() && stripped != base && plain_set.contains(stripped.as_str()) {
                base = stripped;
            }
        }

        if base.is_empty() {
            base = format!("Column {}", index + 1);
        }

        let mut candidate = base.clone();
        let mut suffix = 2;
        while used.contains(&candidate) {
            candidate = format!("{base} ({suffix})");
            suffix += 1;
        }
        used.insert(candidate.clone());

        mappings.push(HeaderMapping {
            position: index,
            original: original.to_string(),
            normalized: candidate,
        });
    }

    mappings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn normalized(headers: &[&str]) -> Vec<String> {
        normalize_headers(headers)
            .into_iter()
            .map(|m| m.normalized)
            .collect()
    }

    #[test]
    fn test_normalize_header_basic() {
        assert_eq!(normalize_header("  unit_price "), "Unit Price");
        assert_eq!(normalize_header("first.name"), "First Name");
        assert_eq!(normalize_header("GROSS($)"), "Gross");
        assert_eq!(normalize_header("num__of   votes"), "Num Of Votes");
        assert_eq!(normalize_header("???"), "");
    }

    #[test]
    fn test_collision_with_duplicate_markers() {
        assert_eq!(
            normalized(&["title_year", "title_year.1", "title_year#2"]),
            vec!["Title Year", "Title Year (2)", "Title Year (3)"]
        );
    }

    #[test]
    fn test_marker_kept_without_collision() {
        assert_eq!(normalized(&["version.2", "name"]), vec!["Version 2", "Name"]);
    }

    #[test]
    fn test_plain_collision() {
        assert_eq!(
            normalized(&["Movie Title", "movie_title", "MOVIE.TITLE"]),
            vec!["Movie Title", "Movie Title (2)", "Movie Title (3)"]
        );
    }

    #[test]
    fn test_earlier_survivors_not_renumbered() {
        let mappings = normalize_headers(&["a", "b", "a_", "b"]);
        assert_eq!(mappings[0].normalized, "A");
        assert_eq!(mappings[1].normalized, "B");
        assert_eq!(mappings[2].normalized, "A (2)");
        assert_eq!(mappings[3].normalized, "B (2)");
    }

    #[test]
    fn test_empty_header_becomes_positional() {
        assert_eq!(normalized(&["id", "", "%%"]), vec!["Id", "Column 2", "Column 3"]);
    }

    #[test]
    fn test_accented_headers_keep_their_letters() {
        assert_eq!(
            normalized(&["größe", "gre", "prénom"]),
            vec!["Größe", "Gre", "Prénom"]
        );
        assert_eq!(normalize_header("Straße_Nr."), "Straße Nr");
        assert_eq!(normalize_header("ÅRSTALL (kr)"), "Årstall Kr");
        assert_eq!(normalize_header("東京 人口"), "東京 人口");
    }

    #[test]
    fn test_mapping_keeps_original() {
        let mappings = normalize_headers(&["unit_price"]);
        assert_eq!(mappings[0].original, "unit_price");
    }

    proptest! {
        #[test]
        fn prop_normalized_headers_unique(
            headers in prop::collection::vec("[\\p{L}\\p{N}_ .#%]{0,12}", 0..12)
        ) {
            let names = normalized(&headers.iter().map(String::as_str).collect::<Vec<_>>());
            let unique: HashSet<&String> = names.iter().collect();
            prop_assert_eq!(unique.len(), names.len());
            prop_assert!(names.iter().all(|n| !n.is_empty()));
        }
    }
}
