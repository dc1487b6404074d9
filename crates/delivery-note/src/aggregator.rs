//! Line aggregation: row amounts, subtotal, tax and grand total
//!
//! Amounts are carried as integer cents. Each row is rounded to cents before
//! summing, so the subtotal always equals the sum of the displayed row
//! amounts. Invalid input never fails: unparsable or negative quantities and
//! prices count as 0, a row whose amount exceeds [`MAX_ROW_CENTS`] counts as
//! 0, and an unusable tax rate falls back to 13%. Sums saturate instead of
//! overflowing.

use crate::schema::LineItem;
use crate::DEFAULT_TAX_RATE;
use cn_text::{format_cents, format_cents_plain, format_cents_uppercase, format_percent};
use serde::Serialize;

/// Parse the longest numeric prefix of `text`, skipping leading whitespace
///
/// `"12kg"` parses as 12, `" .5"` as 0.5 and `"1e3"` as 1000. Returns `None`
/// when no digits start the text.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Quantity or unit price; anything unusable or negative is 0
pub fn parse_amount(text: &str) -> f64 {
    parse_float_prefix(text)
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(0.0)
}

/// Tax rate in percent; empty, negative or non-numeric text gives 13
pub fn parse_tax_rate(text: &str) -> f64 {
    parse_float_prefix(text)
        .map(normalize_tax_rate)
        .unwrap_or(DEFAULT_TAX_RATE)
}

/// Replace negative or non-finite rates with the default
pub fn normalize_tax_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate >= 0.0 {
        rate
    } else {
        DEFAULT_TAX_RATE
    }
}

/// Largest row amount taken into account, in cents (one trillion yuan)
pub const MAX_ROW_CENTS: i64 = 100_000_000_000_000;

/// Row amount in cents; amounts beyond [`MAX_ROW_CENTS`] count as 0
fn to_cents(amount: f64) -> i64 {
    let cents = (amount * 100.0).round();
    if cents.is_finite() && cents <= MAX_ROW_CENTS as f64 {
        cents as i64
    } else {
        0
    }
}

/// Computed totals for a set of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Rounded amount of each row, in cents
    pub row_cents: Vec<i64>,
    pub subtotal_cents: i64,
    /// Tax rate applied, in percent
    pub tax_rate: f64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
}

impl AggregateResult {
    pub fn subtotal(&self) -> f64 {
        self.subtotal_cents as f64 / 100.0
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_cents as f64 / 100.0
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total_cents as f64 / 100.0
    }

    /// Capitalized numeral text for the grand total
    ///
    /// Empty when the total is beyond what the numerals can express.
    pub fn amount_in_words(&self) -> String {
        format_cents_uppercase(self.grand_total_cents).unwrap_or_default()
    }

    /// Display strings for the totals area
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            subtotal: format_cents(self.subtotal_cents),
            tax_rate: format_percent(self.tax_rate),
            tax_amount: format_cents(self.tax_cents),
            grand_total: format_cents(self.grand_total_cents),
            amount_in_words: self.amount_in_words(),
            row_amounts: self.row_cents.iter().map(|&c| format_cents_plain(c)).collect(),
        }
    }
}

/// Presentation strings derived from an [`AggregateResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    /// 合计金额, e.g. `¥100.00`
    pub subtotal: String,
    /// 税率, e.g. `13%`
    pub tax_rate: String,
    /// 税额
    pub tax_amount: String,
    /// 价税合计
    pub grand_total: String,
    /// 大写金额
    pub amount_in_words: String,
    /// Row amounts without currency symbol, e.g. `100.00`
    pub row_amounts: Vec<String>,
}

/// Aggregate rows with a tax rate given as text
pub fn aggregate(items: &[LineItem], tax_rate: &str) -> AggregateResult {
    aggregate_with_rate(items, parse_tax_rate(tax_rate))
}

/// Aggregate rows with a numeric tax rate in percent
pub fn aggregate_with_rate(items: &[LineItem], tax_rate: f64) -> AggregateResult {
    let tax_rate = normalize_tax_rate(tax_rate);

    let row_cents: Vec<i64> = items
        .iter()
        .map(|item| to_cents(parse_amount(&item.quantity) * parse_amount(&item.price)))
        .collect();
    let subtotal_cents = row_cents
        .iter()
        .fold(0_i64, |total, &cents| total.saturating_add(cents));
    // Float-to-int casts saturate, so an absurd rate cannot wrap
    let tax_cents = (subtotal_cents as f64 * tax_rate / 100.0).round() as i64;

    AggregateResult {
        row_cents,
        subtotal_cents,
        tax_rate,
        tax_cents,
        grand_total_cents: subtotal_cents.saturating_add(tax_cents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12"), Some(12.0));
        assert_eq!(parse_float_prefix("  3.5"), Some(3.5));
        assert_eq!(parse_float_prefix("12kg"), Some(12.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("-2"), Some(-2.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_parse_amount_clamps() {
        assert_eq!(parse_amount("2"), 2.0);
        assert_eq!(parse_amount("-3"), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("Infinity"), 0.0);
    }

    #[test]
    fn test_parse_tax_rate_defaults() {
        assert_eq!(parse_tax_rate("6"), 6.0);
        assert_eq!(parse_tax_rate("0"), 0.0);
        assert_eq!(parse_tax_rate(""), 13.0);
        assert_eq!(parse_tax_rate("abc"), 13.0);
        assert_eq!(parse_tax_rate("-1"), 13.0);
    }

    #[test]
    fn test_all_zero_rows() {
        let items = vec![LineItem::default(), LineItem::new("0", "0")];
        let result = aggregate(&items, "13");
        assert_eq!(result.subtotal_cents, 0);
        assert_eq!(result.tax_cents, 0);
        assert_eq!(result.grand_total_cents, 0);
        assert_eq!(result.amount_in_words(), "零元整");
    }

    #[test]
    fn test_empty_items() {
        let result = aggregate(&[], "");
        assert_eq!(result.subtotal_cents, 0);
        assert_eq!(result.tax_rate, 13.0);
        assert!(result.row_cents.is_empty());
    }

    #[test]
    fn test_basic_totals() {
        let result = aggregate(&[LineItem::new("2", "50")], "13");
        assert_eq!(result.subtotal(), 100.0);
        assert_eq!(result.tax_amount(), 13.0);
        assert_eq!(result.grand_total(), 113.0);
    }

    #[test]
    fn test_round_then_sum() {
        let items = vec![LineItem::new("0.1", "0.05"); 3];
        let result = aggregate(&items, "0");
        assert_eq!(result.row_cents, vec![1, 1, 1]);
        assert_eq!(result.subtotal_cents, 3);
    }

    #[test]
    fn test_invalid_inputs_degrade_to_zero() {
        let items = vec![
            LineItem::new("-2", "50"),
            LineItem::new("abc", "50"),
            LineItem::new("3", "10"),
        ];
        let result = aggregate(&items, "abc");
        assert_eq!(result.row_cents, vec![0, 0, 3000]);
        assert_eq!(result.tax_rate, 13.0);
        assert_eq!(result.tax_cents, 390);
    }

    #[test]
    fn test_grand_total_is_sum_of_displayed_parts() {
        let items = vec![LineItem::new("3", "3.33"), LineItem::new("1", "0.07")];
        let result = aggregate(&items, "6.5");
        assert_eq!(result.subtotal_cents, 1006);
        assert_eq!(result.tax_cents, 65);
        assert_eq!(result.grand_total_cents, result.subtotal_cents + result.tax_cents);
    }

    #[test]
    fn test_summary_strings() {
        let result = aggregate(&[LineItem::new("2", "50"), LineItem::new("1", "0.5")], "6.5");
        let summary = result.summary();
        assert_eq!(
            summary,
            NoteSummary {
                subtotal: "¥100.50".to_string(),
                tax_rate: "6.5%".to_string(),
                tax_amount: "¥6.53".to_string(),
                grand_total: "¥107.03".to_string(),
                amount_in_words: "壹佰零柒元叁分".to_string(),
                row_amounts: vec!["100.00".to_string(), "0.50".to_string()],
            }
        );
    }

    #[test]
    fn test_oversized_rows_count_as_zero() {
        let items = vec![
            LineItem::new("1e10", "1e10"),
            LineItem::new("1e10", "1e10"),
            LineItem::new("2", "50"),
        ];
        let result = aggregate(&items, "13");
        assert_eq!(result.row_cents, vec![0, 0, 10000]);
        assert_eq!(result.grand_total_cents, 11300);
    }

    #[test]
    fn test_large_totals_saturate() {
        let items = vec![LineItem::new("1e6", "1e6"); 200_000];
        let result = aggregate(&items, "1e300");
        assert_eq!(result.subtotal_cents, i64::MAX);
        assert_eq!(result.tax_cents, i64::MAX);
        assert_eq!(result.grand_total_cents, i64::MAX);
        assert_eq!(result.amount_in_words(), "");
    }

    #[test]
    fn test_idempotent() {
        let items = vec![LineItem::new("7", "12.34")];
        assert_eq!(aggregate(&items, "13"), aggregate(&items, "13"));
    }
}
