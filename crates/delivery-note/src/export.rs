//! PDF and print exports
//!
//! Every successful export bumps the daily export counter, which feeds the
//! serial part of the next note number.

use crate::print::render_print_html;
use crate::renderer::{FontSet, NoteRenderer};
use crate::schema::DeliveryNote;
use crate::storage::{KeyValueStore, NoteStore};
use crate::Result;
use chrono::NaiveDate;
use tracing::info;

/// Output of an export: suggested file name and contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `出库单_{noteNumber}.pdf`
pub fn pdf_file_name(note_number: &str) -> String {
    format!("出库单_{note_number}.pdf")
}

fn print_file_name(note_number: &str) -> String {
    format!("出库单_{note_number}.html")
}

/// Render the note to PDF and count the export
pub fn export_pdf<S: KeyValueStore>(
    note: &DeliveryNote,
    fonts: &FontSet,
    store: &mut NoteStore<S>,
    today: NaiveDate,
) -> Result<ExportedFile> {
    let bytes = NoteRenderer::new(note).render(fonts)?;
    let count = store.increment_export_count(today)?;
    info!(note = %note.note_number, count, size = bytes.len(), "Exported PDF");

    Ok(ExportedFile {
        file_name: pdf_file_name(&note.note_number),
        bytes,
    })
}

/// Render the print page and count the export
pub fn export_print_html<S: KeyValueStore>(
    note: &DeliveryNote,
    store: &mut NoteStore<S>,
    today: NaiveDate,
) -> Result<ExportedFile> {
    let html = render_print_html(note);
    let count = store.increment_export_count(today)?;
    info!(note = %note.note_number, count, "Exported print page");

    Ok(ExportedFile {
        file_name: print_file_name(&note.note_number),
        bytes: html.into_bytes(),
    })
}
