//! Dotted version comparison.
//!
//! Release tags published by homebrew projects are rarely strict semver:
//! `"16.1.0"`, `"1.7"`, `"v6.2.0"` and `"0.9.1-rc2"` all show up in the wild.
//! Versions are compared segment by segment after padding the shorter one
//! with `"0"` segments, so `"1.2"` and `"1.2.0"` are equal.
//!
//! Within a segment, runs of digits compare numerically and everything else
//! compares by byte order. A digit run sorts before a non-digit run, and when
//! one segment is a prefix of the other the longer one is higher
//! (`"0-beta"` > `"0"`).

use std::cmp::Ordering;

const DELIMITER: char = '.';

/// Returns `true` if `version` is strictly higher than `other`.
///
/// # Example
///
/// ```
/// use empusa::version::is_higher_than;
///
/// assert!(is_higher_than("2.0", "1.9.9"));
/// assert!(!is_higher_than("1.2.0", "1.2"));
/// ```
pub fn is_higher_than(version: &str, other: &str) -> bool {
    compare_versions(version, other) == Ordering::Greater
}

/// Compare two dotted version strings.
pub fn compare_versions(version: &str, other: &str) -> Ordering {
    let mut left: Vec<&str> = version.split(DELIMITER).collect();
    let mut right: Vec<&str> = other.split(DELIMITER).collect();

    let len = left.len().max(right.len());
    left.resize(len, "0");
    right.resize(len, "0");

    left.iter()
        .zip(right.iter())
        .map(|(l, r)| compare_segment(l, r))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn compare_segment(left: &str, right: &str) -> Ordering {
    let left = chunks(if left.is_empty() { "0" } else { left });
    let right = chunks(if right.is_empty() { "0" } else { right });

    for (l, r) in left.iter().zip(right.iter()) {
        let ordering = match (l, r) {
            (Chunk::Number(a), Chunk::Number(b)) => compare_numeric(a, b),
            (Chunk::Text(a), Chunk::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ordering.is_ne() {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}

/// Compare two digit runs without parsing, so arbitrarily long runs work.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn chunks(segment: &str) -> Vec<Chunk<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (idx, ch) in segment.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(current) if current != is_digit => {
                result.push(make_chunk(&segment[start..idx], current));
                start = idx;
                in_digits = Some(is_digit);
            }
            None => in_digits = Some(is_digit),
            _ => {}
        }
    }

    if let Some(current) = in_digits {
        result.push(make_chunk(&segment[start..], current));
    }

    result
}

fn make_chunk(text: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(text)
    } else {
        Chunk::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_versions_are_not_higher() {
        assert!(!is_higher_than("1.2.3", "1.2.3"));
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
    }

    #[test]
    fn test_padding_makes_versions_equal() {
        assert!(!is_higher_than("1.2.0", "1.2"));
        assert!(!is_higher_than("1.2", "1.2.0"));
        assert_eq!(compare_versions("1.2", "1.2.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(is_higher_than("1.10", "1.9"));
        assert!(is_higher_than("1.3", "1.2.9"));
        assert!(is_higher_than("2.0.0", "1.9.9"));
        assert!(is_higher_than("2.0", "1.9.9"));
        assert!(!is_higher_than("1.9.9", "2.0"));
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(compare_versions("1.02", "1.2"), Ordering::Equal);
        assert!(is_higher_than("1.010", "1.9"));
    }

    #[test]
    fn test_long_digit_runs_do_not_overflow() {
        assert!(is_higher_than(
            "1.99999999999999999999999",
            "1.99999999999999999999998"
        ));
    }

    #[test]
    fn test_mixed_segments() {
        // A suffix makes the segment longer, hence higher.
        assert!(is_higher_than("1.0-beta", "1.0"));
        assert!(is_higher_than("0.9.1-rc2", "0.9.1-rc1"));
        assert!(is_higher_than("1.0b", "1.0a"));
        // Digit runs sort before text runs.
        assert!(is_higher_than("v1.0", "2.0"));
        assert!(is_higher_than("v6.2.0", "v6.1.9"));
    }

    #[test]
    fn test_empty_and_malformed_inputs_do_not_panic() {
        assert_eq!(compare_versions("", "0"), Ordering::Equal);
        assert_eq!(compare_versions("", ""), Ordering::Equal);
        assert_eq!(compare_versions("1..2", "1.0.2"), Ordering::Equal);
        assert!(is_higher_than("1", ""));
        assert!(!is_higher_than("...", "0.0.0.0"));
        assert!(is_higher_than("é", "1"));
    }

    #[test]
    fn test_chunks_split_digit_and_text_runs() {
        assert_eq!(
            chunks("12rc3"),
            vec![Chunk::Number("12"), Chunk::Text("rc"), Chunk::Number("3")]
        );
        assert!(chunks("").is_empty());
    }

    proptest! {
        #[test]
        fn prop_never_higher_than_itself(v in "[0-9a-z.\\-]{0,16}") {
            prop_assert!(!is_higher_than(&v, &v));
        }

        #[test]
        fn prop_trailing_zero_segments_are_equal(parts in proptest::collection::vec(0u32..1000, 1..5), zeros in 1usize..4) {
            let base = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
            let padded = format!("{}{}", base, ".0".repeat(zeros));
            prop_assert_eq!(compare_versions(&base, &padded), Ordering::Equal);
        }

        #[test]
        fn prop_antisymmetric(a in "[0-9.]{0,12}", b in "[0-9.]{0,12}") {
            prop_assert!(!(is_higher_than(&a, &b) && is_higher_than(&b, &a)));
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }

        #[test]
        fn prop_matches_tuple_ordering(a in (0u32..50, 0u32..50, 0u32..50), b in (0u32..50, 0u32..50, 0u32..50)) {
            let va = format!("{}.{}.{}", a.0, a.1, a.2);
            let vb = format!("{}.{}.{}", b.0, b.1, b.2);
            prop_assert_eq!(compare_versions(&va, &vb), a.cmp(&b));
        }
    }
}
