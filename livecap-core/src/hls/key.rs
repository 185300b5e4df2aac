//! Segment dedup keys
//!
//! A key is only a comparison token: the capture loop writes a segment when
//! its key sorts after the last one written.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Derive the dedup key of a manifest reference.
///
/// Query and fragment are dropped, then the extension of the final path
/// component, then everything up to and including the last hyphen
/// (a hyphen in first position is kept). A reference carrying a query is
/// reduced to its file name first, so `dir/live-abc-00042.ts?t=1` and
/// `hd/00042.ts?t=1` both become `00042`. Without a query the directory
/// stays: `dir/00042.ts` keys as `dir/00042`.
#[must_use]
pub fn segment_key(reference: &str) -> String {
    let path = reference
        .find(['?', '#'])
        .map_or(reference, |end| &reference[..end]);
    let has_query = reference.find('?').is_some_and(|q| q > 0);

    let name_start = path.rfind('/').map_or(0, |slash| slash + 1);
    let (path, name_start) = if has_query {
        (&path[name_start..], 0)
    } else {
        (path, name_start)
    };

    let stem = match path[name_start..].rfind('.') {
        Some(dot) => &path[..name_start + dot],
        None => path,
    };

    match stem.rfind('-') {
        Some(hyphen) if hyphen > 0 => stem[hyphen + 1..].to_string(),
        _ => stem.to_string(),
    }
}

/// How two keys are ordered when deciding whether a segment is new.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrder {
    /// Plain string comparison. Correct while keys share one width.
    #[default]
    Lexical,
    /// Trailing digit runs compared as integers, so `999 < 1000`.
    /// Keys without trailing digits fall back to string comparison.
    Numeric,
}

impl KeyOrder {
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexical => a.cmp(b),
            Self::Numeric => match (trailing_digits(a), trailing_digits(b)) {
                (Some(x), Some(y)) => compare_digit_runs(x, y).then_with(|| a.cmp(b)),
                _ => a.cmp(b),
            },
        }
    }

    /// True when `key` sorts strictly after `high_water`.
    #[must_use]
    pub fn is_after(self, key: &str, high_water: &str) -> bool {
        self.compare(key, high_water) == Ordering::Greater
    }
}

fn trailing_digits(s: &str) -> Option<&str> {
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&s[start..])
}

// Arbitrary length, so no integer parsing.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strips_prefix_and_extension() {
        assert_eq!(segment_key("live_1234_abc-00042.ts"), "00042");
        assert_eq!(
            segment_key("https://cdn.example.com/live/live_1234-1681234567.m4s?expires=9&sign=x"),
            "1681234567"
        );
    }

    #[test]
    fn test_key_keeps_directory_without_hyphen() {
        assert_eq!(segment_key("1681/1681234567.ts"), "1681/1681234567");
        assert_eq!(segment_key("1681234567"), "1681234567");
    }

    #[test]
    fn test_query_reduces_key_to_file_name() {
        assert_eq!(segment_key("hd/00042.ts?t=1"), "00042");
        assert_eq!(
            segment_key("https://cdn.example.com/live/hd/1681234567.ts?expires=9"),
            "1681234567"
        );
        assert_eq!(segment_key("hd/00042.ts#frag"), "hd/00042");
    }

    #[test]
    fn test_key_ignores_dots_in_directories() {
        assert_eq!(segment_key("v1.2/seg7"), "v1.2/seg7");
        assert_eq!(segment_key("-12.ts"), "-12");
    }

    #[test]
    fn test_lexical_order() {
        assert!(KeyOrder::Lexical.is_after("00043", "00042"));
        assert!(!KeyOrder::Lexical.is_after("00042", "00042"));
        // width change misorders under plain string comparison
        assert!(!KeyOrder::Lexical.is_after("1000", "999"));
    }

    #[test]
    fn test_numeric_order() {
        assert!(KeyOrder::Numeric.is_after("1000", "999"));
        assert!(KeyOrder::Numeric.is_after("seg-1000", "seg-999"));
        assert!(!KeyOrder::Numeric.is_after("0999", "999"));
        assert!(!KeyOrder::Numeric.is_after("999", "999"));
        assert!(KeyOrder::Numeric.is_after("b", "a"));
    }

    #[test]
    fn test_key_order_deserializes_lowercase() {
        let order: KeyOrder = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(order, KeyOrder::Numeric);
    }
}
