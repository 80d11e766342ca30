//! en-US number formatting for summaries and axis ticks.

/// Format as whole-dollar currency: `1234.56` becomes `$1,235`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

/// Format as a whole number with thousands separators.
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(rounded.abs() as u64))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_rounding_and_grouping() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1234.56), "$1,235");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000");
    }

    #[test]
    fn test_currency_negative() {
        assert_eq!(format_currency(-2500.0), "-$2,500");
        // Rounds to zero, no stray sign
        assert_eq!(format_currency(-0.2), "$0");
    }

    #[test]
    fn test_number_grouping() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(12345.0), "12,345");
        assert_eq!(format_number(-1234.0), "-1,234");
    }
}
