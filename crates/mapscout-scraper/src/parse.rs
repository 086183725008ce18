//! Low-level string parsing for the numeric listing fields.
//!
//! Ratings and review counts arrive as localized display text
//! (`"4.6"`, `"4,6"`, `"(1,234)"`, `"1 234 reviews"`). These functions use
//! manual character scanning rather than `regex` to stay dependency-light.
//! Malformed input always yields `None`, never an error — a bad numeric
//! string must not cost us the rest of the record.

/// Attempts to parse a star rating from localized display text.
///
/// Takes the first number in the string; a single `.` or `,` directly
/// between digits is treated as the decimal separator. Values outside
/// `[0, 5]` are treated as malformed.
///
/// Returns `None` when no parseable rating is found.
#[must_use]
pub(crate) fn parse_rating(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let len = bytes.len();

    let mut i = 0usize;
    while i < len && !bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == len {
        return None;
    }

    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &raw[int_start..i];

    let mut frac_part = "";
    if i + 1 < len && (bytes[i] == b'.' || bytes[i] == b',') && bytes[i + 1].is_ascii_digit() {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_part = &raw[frac_start..j];
    }

    let value = if frac_part.is_empty() {
        int_part.parse::<f64>().ok()?
    } else {
        format!("{int_part}.{frac_part}").parse::<f64>().ok()?
    };

    (0.0..=5.0).contains(&value).then_some(value)
}

/// Attempts to parse a review count from localized display text.
///
/// Takes the first digit run, absorbing grouping separators (`,`, `.`,
/// regular/narrow no-break spaces) that sit directly between digits, and
/// stops at anything else — `"(1,234)"` and `"1 234 reviews"` both parse
/// to the plain integer.
///
/// Returns `None` when no digits are found or the value overflows.
#[must_use]
pub(crate) fn parse_review_count(raw: &str) -> Option<u32> {
    let mut digits = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            continue; // still scanning for the first digit
        }
        let is_grouping = matches!(c, ',' | '.' | ' ' | '\u{00a0}' | '\u{202f}');
        if is_grouping && chars.peek().is_some_and(char::is_ascii_digit) {
            continue;
        }
        break;
    }

    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
