//! Delivery Note - 出库单 form model, totals and export
//!
//! This crate provides:
//! - Form schema types (settings, form fields, line items, JSON template)
//! - Line aggregation: row amounts, subtotal, tax and grand total in cents
//! - Template export/import/apply
//! - Settings and daily export counter persistence over a key-value store
//! - Note numbering
//! - A4 PDF rendering and a print-ready HTML page
//!
//! # Example
//!
//! ```
//! use delivery_note::{aggregate, LineItem};
//!
//! let items = vec![LineItem::new("2", "50")];
//! let totals = aggregate(&items, "13");
//! assert_eq!(totals.summary().grand_total, "¥113.00");
//! assert_eq!(totals.summary().amount_in_words, "壹佰壹拾叁元整");
//! ```

pub mod aggregator;
pub mod export;
pub mod logo;
pub mod print;
mod renderer;
mod schema;
pub mod storage;
pub mod template;

pub use aggregator::{aggregate, aggregate_with_rate, parse_amount, parse_tax_rate, AggregateResult, NoteSummary};
pub use export::{export_pdf, export_print_html, pdf_file_name, ExportedFile};
pub use print::render_print_html;
pub use renderer::{FontSet, NoteRenderer};
pub use schema::*;
pub use storage::{FileStore, KeyValueStore, MemoryStore, NoteStore};

use thiserror::Error;

/// Tax rate used when none (or an invalid one) is given, in percent
pub const DEFAULT_TAX_RATE: f64 = 13.0;

/// Default document title
pub const DEFAULT_DOC_TITLE: &str = "出库单";

/// Template format version written by `template::collect`
pub const TEMPLATE_VERSION: &str = "1.0";

/// Errors that can occur while handling delivery notes
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Not a JSON template file: {0}")]
    NotJsonFile(String),

    #[error("Failed to parse template: {0}")]
    TemplateParse(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Logo error: {0}")]
    Logo(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for delivery note operations
pub type Result<T> = std::result::Result<T, NoteError>;
