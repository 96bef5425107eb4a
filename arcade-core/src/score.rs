//! Score reporting protocol between a game payload and the launcher.
//!
//! A well-behaved payload prints `FINAL_SCORE:<nonnegative integer>` once,
//! ideally as its last line. The extractor tolerates the marker appearing
//! anywhere and surrounded by unrelated output.
//!
//! When the marker is absent the last run of decimal digits anywhere in the
//! output is taken instead. That fallback cannot tell a score from any other
//! number a payload happens to print, so payloads should always emit the
//! marker.

/// Token a payload prints immediately before its score digits.
pub const SCORE_MARKER: &str = "FINAL_SCORE:";

/// Highest score accepted for persistence.
pub const MAX_SCORE: u64 = 999_999;

/// Extract a score from captured stdout. Never fails.
///
/// 1. The digits following the last `FINAL_SCORE:` that is immediately
///    followed by at least one digit.
/// 2. Otherwise the last run of ASCII digits anywhere in the text.
/// 3. Otherwise 0.
///
/// No range clamping happens here; see [`sanitize_score`]. Digit runs too
/// large for `u64` saturate to `u64::MAX`.
///
/// # Complexity
/// O(n) in the length of `output`.
#[must_use]
pub fn extract_score(output: &str) -> u64 {
    marker_score(output)
        .or_else(|| last_digit_run(output))
        .map_or(0, parse_saturating)
}

/// Clamp an extracted score to the persistable range.
///
/// Values above [`MAX_SCORE`] are treated as bogus and become 0.
#[must_use]
pub fn sanitize_score(score: u64) -> u64 {
    if score > MAX_SCORE {
        0
    } else {
        score
    }
}

fn marker_score(output: &str) -> Option<&str> {
    output
        .match_indices(SCORE_MARKER)
        .filter_map(|(at, _)| leading_digits(&output[at + SCORE_MARKER.len()..]))
        .last()
}

fn leading_digits(s: &str) -> Option<&str> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}

fn last_digit_run(output: &str) -> Option<&str> {
    let bytes = output.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |p| p + 1);
    Some(&output[start..end])
}

fn parse_saturating(digits: &str) -> u64 {
    digits.bytes().fold(0u64, |acc, d| {
        acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
    })
}
