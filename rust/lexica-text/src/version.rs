//! Version-string comparison for dictionary staleness checks.

use std::cmp::Ordering;

/// Compares two dot-separated version strings.
///
/// Segments are compared pairwise: numerically on their leading digits
/// first, then lexicographically on the full segment text (so `1.2b` and
/// `1.2c` order by the letter). A version with more segments orders after
/// its prefix, and the empty string orders before everything else.
pub fn compare_version_string(x: &str, y: &str) -> Ordering {
    if x.is_empty() && y.is_empty() {
        return Ordering::Equal;
    }
    if x.is_empty() {
        return Ordering::Less;
    }
    if y.is_empty() {
        return Ordering::Greater;
    }
    let xx: Vec<&str> = x.split('.').collect();
    let yy: Vec<&str> = y.split('.').collect();
    for (sx, sy) in xx.iter().zip(&yy) {
        match leading_int(sx).cmp(&leading_int(sy)) {
            Ordering::Equal => {}
            other => return other,
        }
        match sx.cmp(sy) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    xx.len().cmp(&yy.len())
}

/// The value of a segment's leading decimal digits; 0 when there are none.
fn leading_int(s: &str) -> i64 {
    let digits: &str = {
        let end = s
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(s.len(), |(i, _)| i);
        &s[..end]
    };
    digits.parse().unwrap_or(0)
}
