//! Quantity and date formatting

use chrono::NaiveDate;

/// Format an unsigned integer with `,` thousands separators
///
/// # Examples
/// ```
/// use label_text::format_thousands;
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(6733), "6,733");
/// assert_eq!(format_thousands(1234567), "1,234,567");
/// ```
pub fn format_thousands(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Format a quantity string for display
///
/// Non-negative integers get thousands separators. Anything else (blank,
/// negative, decimal, free text) passes through unchanged apart from
/// surrounding whitespace.
pub fn format_quantity(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match trimmed.parse::<u64>() {
        Ok(n) => format_thousands(n),
        Err(_) => trimmed.to_string(),
    }
}

/// Convert an ISO `yyyy-MM-dd` date to `yyyy/MM/dd`
///
/// Input that is not exactly a valid `yyyy-MM-dd` date is returned as-is.
///
/// # Examples
/// ```
/// use label_text::format_slash_date;
/// assert_eq!(format_slash_date("2025-11-14"), "2025/11/14");
/// assert_eq!(format_slash_date("invalid-date-format"), "invalid-date-format");
/// ```
pub fn format_slash_date(raw: &str) -> String {
    if !is_iso_date_shape(raw) {
        return raw.to_string();
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%Y/%m/%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// chrono accepts unpadded fields, the label format does not
fn is_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
