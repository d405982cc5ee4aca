//! Number formatting shared by the calculator and the dashboard.
//!
//! Output follows en-US conventions: comma thousands separators, at most
//! three fraction digits for grouped numbers, and half-away-from-zero
//! rounding for fixed precision.

/// Round to `digits` decimals and render with exactly that many.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    format!("{:.*}", digits, rounded)
}

/// Thousands-grouped rendering with up to three fraction digits, trailing zeros dropped.
pub fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = to_fixed(value.abs(), 3);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Grouped value with a leading "+" when positive; negatives keep their own sign.
pub fn signed_grouped(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", group_thousands(value))
    } else {
        group_thousands(value)
    }
}

/// "$" followed by the grouped, rounded integer amount.
pub fn format_usd(value: f64) -> String {
    format!("${}", group_thousands(value.round()))
}

/// Short human form used by projections: 1.23B, 4.56M, 7.89K, 12.35.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{}B", to_fixed(value / 1_000_000_000.0, 2))
    } else if abs >= 1_000_000.0 {
        format!("{}M", to_fixed(value / 1_000_000.0, 2))
    } else if abs >= 1_000.0 {
        format!("{}K", to_fixed(value / 1_000.0, 2))
    } else {
        to_fixed(value, 2)
    }
}

/// Scenario label for a token supply: 150000000 -> "150M", 1000000000 -> "1B".
pub fn supply_label(supply: u64) -> String {
    if supply >= 1_000_000_000 && supply % 1_000_000_000 == 0 {
        format!("{}B", supply / 1_000_000_000)
    } else if supply >= 1_000_000 && supply % 1_000_000 == 0 {
        format!("{}M", supply / 1_000_000)
    } else {
        group_digits(&supply.to_string())
    }
}

/// Parse a leading decimal number, ignoring a trailing "%" and surrounding space.
pub fn parse_percent(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_pads_and_rounds() {
        assert_eq!(to_fixed(20.0, 2), "20.00");
        assert_eq!(to_fixed(0.05, 6), "0.050000");
        assert_eq!(to_fixed(-1.5, 2), "-1.50");
        assert_eq!(to_fixed(0.125, 2), "0.13");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1_234_567.0), "1,234,567");
        assert_eq!(group_thousands(-200_000.0), "-200,000");
        assert_eq!(group_thousands(1234.5), "1,234.5");
        assert_eq!(group_thousands(0.12345), "0.123");
    }

    #[test]
    fn test_signed_grouped() {
        assert_eq!(signed_grouped(200_000.0), "+200,000");
        assert_eq!(signed_grouped(-42.0), "-42");
        assert_eq!(signed_grouped(0.0), "0");
    }

    #[test]
    fn test_format_usd_rounds_to_integer() {
        assert_eq!(format_usd(3750.4), "$3,750");
        assert_eq!(format_usd(1_234_567.6), "$1,234,568");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(1_230_000_000.0), "1.23B");
        assert_eq!(format_compact(4_560_000.0), "4.56M");
        assert_eq!(format_compact(7_890.0), "7.89K");
        assert_eq!(format_compact(12.346), "12.35");
    }

    #[test]
    fn test_supply_label() {
        assert_eq!(supply_label(150_000_000), "150M");
        assert_eq!(supply_label(1_000_000_000), "1B");
        assert_eq!(supply_label(1_500), "1,500");
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("0.050000%"), Some(0.05));
        assert_eq!(parse_percent(" 12.5 % "), Some(12.5));
        assert_eq!(parse_percent("-"), None);
        assert_eq!(parse_percent(""), None);
    }
}
