//! PDF Core - Low-level PDF generation
//!
//! This crate provides functionality for:
//! - Building documents page by page
//! - Embedding TrueType/OpenType fonts as subsetted CID fonts
//! - Inserting text at specific coordinates
//! - Drawing lines and rectangles
//! - Inserting images (JPEG, PNG)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, FontFamilyBuilder, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page();
//! doc.register_font_family("simhei", FontFamilyBuilder::new().regular(font_bytes))?;
//! doc.set_font("simhei", 12.0)?;
//! doc.insert_text("出库单", page, 297.64, 40.0, Align::Center)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod graphics;
mod image;
mod text;

pub use document::PdfDocument;
pub use font::{FontData, FontFamily, FontFamilyBuilder, FontWeight};
pub use graphics::{Color, LineStyle, RectStyle};
pub use image::{calculate_scaled_dimensions, detect_format, ImageFormat, ImageScaleMode};

use thiserror::Error;

/// A4 page width in points
pub const A4_WIDTH: f64 = 595.28;

/// A4 page height in points
pub const A4_HEIGHT: f64 = 841.89;

/// Points per millimetre
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Convert millimetres to points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_MM
}

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Font subset error: {0}")]
    FontSubsetError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Horizontal text alignment relative to the anchor point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-9);
        assert!((mm_to_pt(210.0) - A4_WIDTH).abs() < 0.01);
        assert!((mm_to_pt(297.0) - A4_HEIGHT).abs() < 0.01);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PdfError::InvalidPage(3, 1).to_string(),
            "Invalid page number: 3 (document has 1 pages)"
        );
    }
}
