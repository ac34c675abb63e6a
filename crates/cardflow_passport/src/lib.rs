//! Canonicalizes raw passport identifier strings for matching and uniqueness.
//!
//! No I/O: every function here is a pure transform over `&str`/`Vec<String>`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MIN_LENGTH: usize = 5;
pub const DEFAULT_MAX_LENGTH: usize = 12;

static SEPARATOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.\-/,]+").unwrap());
static PASSPORT_FORMAT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]?\d+$").unwrap());

/// Resolves effective min/max length bounds, falling back to the defaults
/// whenever the caller-supplied bound is missing or nonsensical.
pub fn length_bounds(min_length: Option<usize>, max_length: Option<usize>) -> (usize, usize) {
    let mut resolved_min = min_length.unwrap_or(DEFAULT_MIN_LENGTH);
    if resolved_min == 0 {
        resolved_min = DEFAULT_MIN_LENGTH;
    }
    let mut resolved_max = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
    if resolved_max < resolved_min {
        resolved_max = resolved_min.max(DEFAULT_MAX_LENGTH);
    }
    (resolved_min, resolved_max)
}

/// Canonicalizes a raw passport string: upper-case, strip the separator
/// class, enforce `^[A-Z]?\d+$`, enforce length bounds. Returns `None` for
/// anything that fails any of those checks.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    normalize_with_bounds(raw, None, None)
}

pub fn normalize_with_bounds(
    raw: Option<&str>,
    min_length: Option<usize>,
    max_length: Option<usize>,
) -> Option<String> {
    let value = raw?;
    if value.is_empty() {
        return None;
    }

    let upper = value.to_uppercase();
    let cleaned = SEPARATOR_PATTERN.replace_all(&upper, "").trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    if !PASSPORT_FORMAT_PATTERN.is_match(&cleaned) {
        return None;
    }

    let (min_len, max_len) = length_bounds(min_length, max_length);
    if cleaned.len() < min_len || cleaned.len() > max_len {
        return None;
    }

    Some(cleaned)
}

/// Normalizes a list of candidate passport strings, de-duplicating while
/// preserving the order of first occurrence.
pub fn normalize_candidates<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    normalize_candidates_with_bounds(values, None, None)
}

pub fn normalize_candidates_with_bounds<I, S>(
    values: I,
    min_length: Option<usize>,
    max_length: Option<usize>,
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let Some(candidate) = normalize_with_bounds(Some(value.as_ref()), min_length, max_length)
        else {
            continue;
        };
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_upper_cases() {
        assert_eq!(normalize(Some("n-12 34.56")), Some("N123456".to_string()));
    }

    #[test]
    fn rejects_bad_format() {
        assert_eq!(normalize(Some("ABC-123")), None);
        assert_eq!(normalize(Some("12AB34")), None);
    }

    #[test]
    fn rejects_out_of_bounds_length() {
        assert_eq!(normalize(Some("1234")), None); // 4 chars, below default min 5
        assert_eq!(normalize(Some("1234567890123")), None); // 13 chars, above default max 12
    }

    #[test]
    fn accepts_boundary_lengths() {
        assert_eq!(normalize(Some("12345")), Some("12345".to_string())); // exactly min
        assert_eq!(
            normalize(Some("123456789012")),
            Some("123456789012".to_string())
        ); // exactly max
    }

    #[test]
    fn is_idempotent() {
        let once = normalize(Some("n.123456")).unwrap();
        let twice = normalize(Some(&once)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn handles_none_and_empty() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
    }

    #[test]
    fn candidates_dedup_preserving_first_occurrence() {
        let candidates = normalize_candidates(["N-123456", "n123456", "N-654321"]);
        assert_eq!(candidates, vec!["N123456".to_string(), "N654321".to_string()]);
    }

    #[test]
    fn custom_bounds_are_honored() {
        assert_eq!(normalize_with_bounds(Some("12"), Some(2), Some(4)), Some("12".to_string()));
        assert_eq!(normalize_with_bounds(Some("12345"), Some(2), Some(4)), None);
    }
}
