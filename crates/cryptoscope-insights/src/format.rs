//! Human-readable number formatting for alert and email copy.

/// Format an integer with comma thousands separators, e.g. `1234567` → `"1,234,567"`.
#[must_use]
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a signed delta with an explicit sign, e.g. `+1,200` or `-35`.
#[must_use]
pub fn format_delta(value: i64) -> String {
    if value >= 0 {
        format!("+{}", format_count(value))
    } else {
        format_count(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_000_000), "1,000,000");
        assert_eq!(format_count(-12_345), "-12,345");
    }

    #[test]
    fn delta_carries_sign() {
        assert_eq!(format_delta(1_200), "+1,200");
        assert_eq!(format_delta(0), "+0");
        assert_eq!(format_delta(-35), "-35");
    }
}
