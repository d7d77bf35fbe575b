//! # Listing Rules
//!
//! Pagination and search for list endpoints.
//!
//! Query values arrive as raw text so that malformed input is clamped
//! instead of rejected:
//!
//! - `offset`: absent → 0; unparsable or negative → 100.
//! - `limit`: absent → 10; unparsable, negative, or above 100 → 100.
//!
//! Numbers are read leniently from the leading digits (`"12abc"` is 12),
//! matching what browsers and form encoders tend to send.

use regex::{Regex, RegexBuilder};

/// Offset used when none is given.
pub const DEFAULT_OFFSET: usize = 0;
/// Page size used when none is given.
pub const DEFAULT_LIMIT: usize = 10;
/// Largest page size, and the value malformed inputs clamp to.
pub const MAX_LIMIT: usize = 100;
/// Offset substituted for malformed or negative input.
pub const CLAMPED_OFFSET: usize = 100;

/// Compiled patterns larger than this fall back to a literal match.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of matching items skipped.
    pub offset: usize,
    /// Maximum number of items returned.
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Resolve raw `offset` and `limit` query values.
    pub fn from_query(offset: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            offset: resolve_offset(offset),
            limit: resolve_limit(limit),
        }
    }

    /// Slice one page out of an already filtered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

fn resolve_offset(raw: Option<&str>) -> usize {
    match raw {
        None => DEFAULT_OFFSET,
        Some(text) => match leading_integer(text) {
            Some(n) if n >= 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => CLAMPED_OFFSET,
        },
    }
}

fn resolve_limit(raw: Option<&str>) -> usize {
    match raw {
        None => DEFAULT_LIMIT,
        Some(text) => match leading_integer(text) {
            Some(n) if (0..=MAX_LIMIT as i64).contains(&n) => n as usize,
            _ => MAX_LIMIT,
        },
    }
}

/// Parse an optionally signed run of leading decimal digits.
///
/// Saturates instead of overflowing. Returns `None` when no digit follows
/// the optional sign.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let run: &str = {
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        &digits[..end]
    };
    if run.is_empty() {
        return None;
    }
    let magnitude = run.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Case-insensitive product-name filter.
///
/// The search term is tried as a regular expression first. Terms that do
/// not compile are matched literally instead of failing the request.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: Regex,
}

impl NameFilter {
    /// Build a filter from a search term. Blank terms yield `None`.
    pub fn new(term: &str) -> Option<Self> {
        if term.is_empty() {
            return None;
        }
        let pattern = build(term).or_else(|| build(&regex::escape(term)))?;
        Some(Self { pattern })
    }

    /// Whether `name` matches the term.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

fn build(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_apply_when_absent() {
        assert_eq!(Page::from_query(None, None), Page { offset: 0, limit: 10 });
    }

    #[test]
    fn negative_and_oversized_values_clamp_to_100() {
        assert_eq!(
            Page::from_query(Some("-1"), Some("1000")),
            Page { offset: 100, limit: 100 }
        );
        assert_eq!(Page::from_query(None, Some("-5")).limit, 100);
    }

    #[test]
    fn unparsable_values_clamp_to_100() {
        assert_eq!(
            Page::from_query(Some("abc"), Some("")),
            Page { offset: 100, limit: 100 }
        );
    }

    #[test]
    fn leading_digits_are_used() {
        assert_eq!(Page::from_query(Some("3rd"), Some("7.9")), Page { offset: 3, limit: 7 });
        assert_eq!(Page::from_query(Some("  20"), Some("+5")), Page { offset: 20, limit: 5 });
    }

    #[test]
    fn boundary_limits_are_kept() {
        assert_eq!(Page::from_query(None, Some("0")).limit, 0);
        assert_eq!(Page::from_query(None, Some("100")).limit, 100);
        assert_eq!(Page::from_query(None, Some("101")).limit, 100);
    }

    #[test]
    fn slice_skips_then_takes() {
        let page = Page { offset: 2, limit: 3 };
        assert_eq!(page.slice(0..10), vec![2, 3, 4]);
        assert!(Page { offset: 20, limit: 3 }.slice(0..10).is_empty());
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let filter = NameFilter::new("camis").unwrap();
        assert!(filter.matches("CAMISETA azul"));
        assert!(!filter.matches("Calça"));
    }

    #[test]
    fn name_filter_accepts_patterns() {
        let filter = NameFilter::new("^cam.*azul$").unwrap();
        assert!(filter.matches("Camiseta Azul"));
        assert!(!filter.matches("Camiseta Verde"));
    }

    #[test]
    fn invalid_pattern_falls_back_to_literal() {
        let filter = NameFilter::new("shirt (xl").unwrap();
        assert!(filter.matches("Shirt (XL) black"));
        assert!(!filter.matches("shirt xl"));
    }

    #[test]
    fn blank_term_means_no_filter() {
        assert!(NameFilter::new("").is_none());
    }

    proptest! {
        #[test]
        fn resolved_limit_never_exceeds_max(raw in ".*") {
            prop_assert!(Page::from_query(None, Some(&raw)).limit <= MAX_LIMIT);
        }

        #[test]
        fn in_range_values_are_taken_verbatim(offset in 0usize..10_000, limit in 0usize..=100) {
            let page = Page::from_query(Some(&offset.to_string()), Some(&limit.to_string()));
            prop_assert_eq!(page, Page { offset, limit });
        }

        #[test]
        fn negative_offsets_clamp(offset in 1i64..1_000_000) {
            let raw = format!("-{offset}");
            prop_assert_eq!(Page::from_query(Some(&raw), None).offset, CLAMPED_OFFSET);
        }
    }
}
