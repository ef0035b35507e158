//! Locale-formatted price text to a number.
//!
//! Marketplace prices arrive as e.g. `"1 234,56 ₽"`, `"12.34"` or `"1 500 ₽"` (with a
//! non-breaking or thin space as the thousands separator). Anything that does not reduce to a
//! finite, non-negative number comes back as `None` so callers can tell "no price" apart from
//! a literal zero.

const CURRENCY_GLYPHS: &[char] = &['₽', '$', '€', '£', '¥', '₴', '₸', '¢'];

/// Normalize a price string. `None` means the text carries no usable price.
pub fn normalize_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_GLYPHS.contains(c))
        .collect();
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }

    let canonical = canonical_decimal(cleaned);
    let value = canonical.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Rewrite separators so the last `,` or `.` is the decimal point and every earlier one is
/// treated as a thousands separator.
fn canonical_decimal(s: &str) -> String {
    let Some(decimal_at) = s.rfind([',', '.']) else {
        return s.to_string();
    };
    s.char_indices()
        .filter_map(|(i, c)| match c {
            ',' | '.' if i == decimal_at => Some('.'),
            ',' | '.' => None,
            other => Some(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let v = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
        assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
    }

    #[test]
    fn thousands_space_and_decimal_comma() {
        approx(normalize_price("1 234,56 ₽"), 1234.56);
    }

    #[test]
    fn non_breaking_and_thin_spaces() {
        approx(normalize_price("1\u{a0}500\u{202f}000 ₽"), 1_500_000.0);
    }

    #[test]
    fn plain_decimal_point() {
        approx(normalize_price("12.34 ₽"), 12.34);
        approx(normalize_price("  0.5  "), 0.5);
        approx(normalize_price("$99"), 99.0);
    }

    #[test]
    fn mixed_separators_take_last_as_decimal() {
        approx(normalize_price("1.234,5"), 1234.5);
        approx(normalize_price("1,234.5"), 1234.5);
    }

    #[test]
    fn literal_zero_is_distinct_from_absent() {
        approx(normalize_price("0 ₽"), 0.0);
        assert_eq!(normalize_price(""), None);
    }

    #[test]
    fn unparsable_is_absent() {
        assert_eq!(normalize_price("договорная"), None);
        assert_eq!(normalize_price("₽"), None);
        assert_eq!(normalize_price("12abc"), None);
        assert_eq!(normalize_price("-5"), None);
        assert_eq!(normalize_price("inf"), None);
    }
}
