//! Capitalized Chinese numerals (大写) for currency amounts

use crate::{Result, TextError};

/// Capitalized digit names (0-9)
const DIGITS: [&str; 10] = ["零", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"];

/// Unit for each integer position, least-significant first
const POSITION_UNITS: [&str; 9] = ["", "拾", "佰", "仟", "万", "拾", "佰", "仟", "亿"];

/// Fractional units: tenths (角) and hundredths (分)
const FRACTION_UNITS: [&str; 2] = ["角", "分"];

/// Number of integer digits the unit table covers (up to 亿)
pub const MAX_INTEGER_DIGITS: usize = POSITION_UNITS.len();

/// Largest formattable amount, in cents (999,999,999.99)
const MAX_CENTS: f64 = 99_999_999_999.0;

/// Text for a zero amount
pub const ZERO_YUAN: &str = "零元整";

/// Format an amount as capitalized Chinese currency text
///
/// The amount is rounded to cents first. Amounts that cannot be expressed
/// (non-finite, or an integer part beyond the 亿 position) produce an empty string so a
/// live display never shows a wrong figure.
///
/// # Examples
/// ```
/// use cn_text::format_rmb_uppercase;
/// assert_eq!(format_rmb_uppercase(0.0), "零元整");
/// assert_eq!(format_rmb_uppercase(113.0), "壹佰壹拾叁元整");
/// assert_eq!(format_rmb_uppercase(100.50), "壹佰元伍角");
/// assert_eq!(format_rmb_uppercase(0.05), "零元伍分");
/// ```
pub fn format_rmb_uppercase(amount: f64) -> String {
    try_format_rmb_uppercase(amount).unwrap_or_default()
}

/// Format an amount as capitalized Chinese currency text, reporting
/// amounts outside the supported range
///
/// Negative amounts are prefixed with 负.
pub fn try_format_rmb_uppercase(amount: f64) -> Result<String> {
    if !amount.is_finite() {
        return Err(TextError::NotFinite);
    }

    let cents = (amount.abs() * 100.0).round();
    if cents > MAX_CENTS {
        return Err(TextError::AmountOutOfRange(amount));
    }

    format_cents_uppercase(cents as i64 * amount.signum() as i64)
}

/// Format an amount given in cents as capitalized Chinese currency text
pub fn format_cents_uppercase(cents: i64) -> Result<String> {
    if cents.unsigned_abs() > MAX_CENTS as u64 {
        return Err(TextError::AmountOutOfRange(cents as f64 / 100.0));
    }
    if cents == 0 {
        return Ok(ZERO_YUAN.to_string());
    }

    let mut text = String::new();
    if cents < 0 {
        text.push('负');
    }

    let cents = cents.unsigned_abs();
    let yuan = cents / 100;
    if yuan == 0 {
        text.push_str("零元");
    } else {
        text.push_str(&integer_numeral(yuan));
        text.push('元');
    }

    let jiao = (cents / 10 % 10) as usize;
    let fen = (cents % 10) as usize;
    if jiao == 0 && fen == 0 {
        text.push('整');
    } else {
        for (digit, unit) in [jiao, fen].into_iter().zip(FRACTION_UNITS) {
            if digit > 0 {
                text.push_str(DIGITS[digit]);
                text.push_str(unit);
            }
        }
    }

    Ok(text)
}

/// Format an integer in capitalized Chinese numerals, without currency units
///
/// # Examples
/// ```
/// use cn_text::format_chinese_number;
/// assert_eq!(format_chinese_number(0).unwrap(), "零");
/// assert_eq!(format_chinese_number(1005).unwrap(), "壹仟零伍");
/// assert_eq!(format_chinese_number(200000).unwrap(), "贰拾万");
/// ```
pub fn format_chinese_number(n: i64) -> Result<String> {
    if n == 0 {
        return Ok(DIGITS[0].to_string());
    }

    let magnitude = n.unsigned_abs();
    if magnitude.to_string().len() > MAX_INTEGER_DIGITS {
        return Err(TextError::NumberOutOfRange(n));
    }

    let text = integer_numeral(magnitude);
    Ok(if n < 0 { format!("负{text}") } else { text })
}

/// Walk the digits least-significant first, collecting pieces in reverse
/// reading order.
///
/// A zero run emits a single 零, and only when a non-zero digit sits below
/// it. A zero digit at a 万/亿 boundary ends the zero run without a 零; the
/// unit itself is emitted only when its four-digit group holds a value.
fn integer_numeral(n: u64) -> String {
    debug_assert!(n > 0);

    let digits: Vec<usize> = n
        .to_string()
        .bytes()
        .rev()
        .map(|b| (b - b'0') as usize)
        .collect();

    let mut pieces: Vec<&str> = Vec::with_capacity(digits.len() * 2);
    let mut pending_zero = false;
    let mut seen_non_zero = false;

    for (position, &digit) in digits.iter().enumerate() {
        let unit = POSITION_UNITS[position];

        if digit == 0 {
            if is_group_boundary(position) {
                if group_has_value(&digits, position) {
                    pieces.push(unit);
                }
                pending_zero = false;
            } else {
                pending_zero = true;
            }
            continue;
        }

        if pending_zero && seen_non_zero {
            pieces.push(DIGITS[0]);
        }
        pending_zero = false;
        seen_non_zero = true;

        pieces.push(unit);
        pieces.push(DIGITS[digit]);
    }

    pieces.iter().rev().copied().collect()
}

/// 万 (position 4) and 亿 (position 8)
fn is_group_boundary(position: usize) -> bool {
    position > 0 && position % 4 == 0
}

/// Whether any digit in the group headed by `position` is non-zero
fn group_has_value(digits: &[usize], position: usize) -> bool {
    digits
        .iter()
        .skip(position)
        .take(4)
        .any(|&digit| digit != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_amount() {
        assert_eq!(format_rmb_uppercase(0.0), "零元整");
        assert_eq!(format_rmb_uppercase(0.001), "零元整");
        assert_eq!(format_rmb_uppercase(-0.0), "零元整");
    }

    #[test]
    fn test_whole_amounts() {
        assert_eq!(format_rmb_uppercase(1.0), "壹元整");
        assert_eq!(format_rmb_uppercase(10.0), "壹拾元整");
        assert_eq!(format_rmb_uppercase(113.0), "壹佰壹拾叁元整");
        assert_eq!(format_rmb_uppercase(999.0), "玖佰玖拾玖元整");
    }

    #[test]
    fn test_trailing_zeros_are_silent() {
        assert_eq!(format_rmb_uppercase(100.0), "壹佰元整");
        assert_eq!(format_rmb_uppercase(1000.0), "壹仟元整");
        assert_eq!(format_rmb_uppercase(1010.0), "壹仟零壹拾元整");
    }

    #[test]
    fn test_inner_zero_runs() {
        assert_eq!(format_rmb_uppercase(101.0), "壹佰零壹元整");
        assert_eq!(format_rmb_uppercase(1001.0), "壹仟零壹元整");
        assert_eq!(format_rmb_uppercase(10005.0), "壹万零伍元整");
    }

    #[test]
    fn test_wan_boundary() {
        assert_eq!(format_rmb_uppercase(10000.0), "壹万元整");
        assert_eq!(format_rmb_uppercase(200000.0), "贰拾万元整");
        assert_eq!(format_rmb_uppercase(100005.0), "壹拾万伍元整");
        assert_eq!(format_rmb_uppercase(12005.0), "壹万贰仟零伍元整");
        assert_eq!(format_rmb_uppercase(12345678.0), "壹仟贰佰叁拾肆万伍仟陆佰柒拾捌元整");
    }

    #[test]
    fn test_yi_boundary() {
        assert_eq!(format_rmb_uppercase(100000000.0), "壹亿元整");
        assert_eq!(format_rmb_uppercase(100000005.0), "壹亿零伍元整");
        assert_eq!(format_rmb_uppercase(100010000.0), "壹亿零壹万元整");
        assert_eq!(format_rmb_uppercase(101000000.0), "壹亿零壹佰万元整");
        assert_eq!(format_rmb_uppercase(900000000.0), "玖亿元整");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(format_rmb_uppercase(100.50), "壹佰元伍角");
        assert_eq!(format_rmb_uppercase(0.05), "零元伍分");
        assert_eq!(format_rmb_uppercase(0.5), "零元伍角");
        assert_eq!(format_rmb_uppercase(12.34), "壹拾贰元叁角肆分");
        assert_eq!(format_rmb_uppercase(3.07), "叁元柒分");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_rmb_uppercase(-113.0), "负壹佰壹拾叁元整");
        assert_eq!(format_cents_uppercase(-5).unwrap(), "负零元伍分");
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(format_rmb_uppercase(999_999_999.99), "玖亿玖仟玖佰玖拾玖万玖仟玖佰玖拾玖元玖角玖分");
        assert!(matches!(
            try_format_rmb_uppercase(1_000_000_000.0),
            Err(TextError::AmountOutOfRange(_))
        ));
        assert!(matches!(
            format_cents_uppercase(100_000_000_100),
            Err(TextError::AmountOutOfRange(_))
        ));
        assert_eq!(format_rmb_uppercase(1_000_000_001.0), "");
        assert!(matches!(
            try_format_rmb_uppercase(f64::NAN),
            Err(TextError::NotFinite)
        ));
        assert_eq!(format_rmb_uppercase(f64::INFINITY), "");
    }

    #[test]
    fn test_format_chinese_number() {
        assert_eq!(format_chinese_number(0).unwrap(), "零");
        assert_eq!(format_chinese_number(7).unwrap(), "柒");
        assert_eq!(format_chinese_number(-20).unwrap(), "负贰拾");
        assert_eq!(format_chinese_number(999_999_999).unwrap(), "玖亿玖仟玖佰玖拾玖万玖仟玖佰玖拾玖");
        assert!(format_chinese_number(1_000_000_000).is_err());
    }

    #[test]
    fn test_idempotent() {
        let first = format_rmb_uppercase(4321.09);
        let second = format_rmb_uppercase(4321.09);
        assert_eq!(first, second);
        assert_eq!(first, "肆仟叁佰贰拾壹元玖分");
    }
}
