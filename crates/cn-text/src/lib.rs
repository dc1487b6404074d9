//! CN Text - Chinese text helpers for delivery notes
//!
//! This crate provides:
//! - Capitalized currency numerals (壹佰壹拾叁元整)
//! - Yuan amount, percentage and date formatting
//! - CJK-aware line wrapping
//!
//! # Example
//!
//! ```
//! use cn_text::{format_currency, format_rmb_uppercase, wrap_text};
//!
//! assert_eq!(format_rmb_uppercase(113.0), "壹佰壹拾叁元整");
//! assert_eq!(format_currency(113.0), "¥113.00");
//! assert_eq!(wrap_text("产品名称很长", 8), vec!["产品名称", "很长"]);
//! ```

mod formatter;
mod linebreak;
mod numeral;

pub use formatter::{ChineseFormatter, CURRENCY_SYMBOL};
pub use numeral::{MAX_INTEGER_DIGITS, ZERO_YUAN};

pub use formatter::{
    format_cents, format_cents_plain, format_chinese_date, format_currency, format_iso_date,
    format_percent, render_float,
};
pub use linebreak::{char_width, display_width, is_line_start_forbidden, is_wide_char, wrap_text};
pub use numeral::{
    format_cents_uppercase, format_chinese_number, format_rmb_uppercase, try_format_rmb_uppercase,
};

use thiserror::Error;

/// Errors that can occur during Chinese text formatting
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Amount out of range for Chinese numerals: {0}")]
    AmountOutOfRange(f64),

    #[error("Number out of range for Chinese numerals: {0}")]
    NumberOutOfRange(i64),

    #[error("Amount is not a finite number")]
    NotFinite,

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for Chinese text operations
pub type Result<T> = std::result::Result<T, TextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rmb_uppercase() {
        assert_eq!(format_rmb_uppercase(0.0), "零元整");
        assert_eq!(format_rmb_uppercase(113.0), "壹佰壹拾叁元整");
        assert_eq!(format_rmb_uppercase(100.50), "壹佰元伍角");
        assert_eq!(format_rmb_uppercase(10000.0), "壹万元整");
        assert_eq!(format_rmb_uppercase(100000000.0), "壹亿元整");
        assert_eq!(format_rmb_uppercase(0.05), "零元伍分");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TextError::InvalidDate("x".into()).to_string(),
            "Invalid date: x"
        );
        assert_eq!(
            TextError::NotFinite.to_string(),
            "Amount is not a finite number"
        );
    }
}
