//! Currency, percentage and date formatting

use crate::numeral::{format_chinese_number, format_rmb_uppercase};
use crate::{Result, TextError};
use chrono::{Datelike, NaiveDate};

/// Currency symbol used for yuan amounts
pub const CURRENCY_SYMBOL: &str = "¥";

/// Chinese text formatting utilities
pub struct ChineseFormatter;

impl ChineseFormatter {
    /// Format an integer in capitalized numerals
    pub fn format_number(n: i64) -> Result<String> {
        format_chinese_number(n)
    }

    /// Format an amount as capitalized currency text
    pub fn format_rmb(amount: f64) -> String {
        format_rmb_uppercase(amount)
    }

    /// Format an amount as `¥0.00`
    pub fn format_currency(amount: f64) -> String {
        format_currency(amount)
    }

    /// Format a date as `2026年10月19日`
    pub fn format_date(year: i32, month: u32, day: u32) -> String {
        format_chinese_date(year, month, day)
    }
}

/// Format an amount as a yuan string with exactly two decimals
///
/// # Examples
/// ```
/// use cn_text::format_currency;
/// assert_eq!(format_currency(113.0), "¥113.00");
/// assert_eq!(format_currency(0.005), "¥0.01");
/// ```
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{CURRENCY_SYMBOL}0.00");
    }
    format_cents((amount * 100.0).round() as i64)
}

/// Format an amount in cents as a yuan string (`12345` → `¥123.45`)
pub fn format_cents(cents: i64) -> String {
    format!("{CURRENCY_SYMBOL}{}", format_cents_plain(cents))
}

/// Format an amount in cents without a currency symbol (`12345` → `123.45`)
pub fn format_cents_plain(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Format a percentage rate (`13.0` → `13%`, `6.5` → `6.5%`)
pub fn format_percent(rate: f64) -> String {
    format!("{rate}%")
}

/// Format a date as `2026年10月19日`
pub fn format_chinese_date(year: i32, month: u32, day: u32) -> String {
    format!("{year}年{month}月{day}日")
}

/// Parse an ISO date (`YYYY-MM-DD`) and format it as `2026年10月19日`
pub fn format_iso_date(text: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| TextError::InvalidDate(text.to_string()))?;
    Ok(format_chinese_date(date.year(), date.month(), date.day()))
}

/// Render a float with a formatting pattern
///
/// `#,###.##` selects thousand separators and two decimals; the number of
/// `#`/`0` after the last `.` sets the precision. An empty pattern means
/// `#,###.##`.
///
/// # Examples
/// ```
/// use cn_text::render_float;
/// assert_eq!(render_float("#,###.##", 1234.5), "1,234.50");
/// assert_eq!(render_float("0.0", 2.25), "2.3");
/// ```
pub fn render_float(pattern: &str, n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let pattern = if pattern.is_empty() { "#,###.##" } else { pattern };
    let (int_pattern, precision) = match pattern.rfind('.') {
        Some(pos) => (
            &pattern[..pos],
            pattern[pos + 1..]
                .chars()
                .filter(|c| matches!(c, '#' | '0'))
                .count(),
        ),
        None => (pattern, 0),
    };
    let grouped = int_pattern.contains(',');

    let scale = 10_f64.powi(precision as i32);
    let scaled = (n.abs() * scale).round();
    let int_part = (scaled / scale).trunc() as u64;
    let frac_part = (scaled - int_part as f64 * scale).round() as u64;

    let int_text = if grouped {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };
    let sign = if n < 0.0 && scaled > 0.0 { "-" } else { "" };

    if precision > 0 {
        format!("{sign}{int_text}.{frac_part:0>precision$}")
    } else {
        format!("{sign}{int_text}")
    }
}

/// Insert `,` every three digits from the right
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "¥0.00");
        assert_eq!(format_currency(113.0), "¥113.00");
        assert_eq!(format_currency(100.5), "¥100.50");
        assert_eq!(format_currency(f64::NAN), "¥0.00");
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(11300), "¥113.00");
        assert_eq!(format_cents(5), "¥0.05");
        assert_eq!(format_cents_plain(-250), "-2.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(13.0), "13%");
        assert_eq!(format_percent(6.5), "6.5%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn test_format_dates() {
        assert_eq!(format_chinese_date(2026, 10, 19), "2026年10月19日");
        assert_eq!(format_iso_date("2026-01-05").unwrap(), "2026年1月5日");
        assert!(format_iso_date("05/01/2026").is_err());
    }

    #[test]
    fn test_render_float() {
        assert_eq!(render_float("#,###.##", 1234.56), "1,234.56");
        assert_eq!(render_float("#,###.##", 1000000.0), "1,000,000.00");
        assert_eq!(render_float("#,###.##", -100.5), "-100.50");
        assert_eq!(render_float("", 12.0), "12.00");
        assert_eq!(render_float("#", 12.6), "13");
        assert_eq!(render_float("#,###.##", -0.001), "0.00");
    }

    #[test]
    fn test_render_float_special() {
        assert_eq!(render_float("", f64::NAN), "NaN");
        assert_eq!(render_float("", f64::INFINITY), "Infinity");
        assert_eq!(render_float("", f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(100), "100");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_formatter_facade() {
        assert_eq!(ChineseFormatter::format_rmb(113.0), "壹佰壹拾叁元整");
        assert_eq!(ChineseFormatter::format_currency(2.0), "¥2.00");
        assert_eq!(ChineseFormatter::format_number(11).unwrap(), "壹拾壹");
    }
}
