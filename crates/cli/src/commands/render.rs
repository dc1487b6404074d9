//! `delivery-note render` command implementation

use anyhow::{Context, Result};
use chrono::Local;
use delivery_note::{export_pdf, FontSet};
use std::path::PathBuf;

use super::{load_note, open_store, write_output};

pub fn run(
    note_path: PathBuf,
    font: PathBuf,
    bold_font: Option<PathBuf>,
    output: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let regular = std::fs::read(&font)
        .with_context(|| format!("Failed to read font {}", font.display()))?;
    let mut fonts = FontSet::new(regular);
    if let Some(path) = bold_font {
        let bold = std::fs::read(&path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        fonts = fonts.with_bold(bold);
    }

    let mut store = open_store(data_dir)?;
    let note = load_note(&note_path, &mut store)?;
    let file = export_pdf(&note, &fonts, &mut store, Local::now().date_naive())
        .context("Failed to render PDF")?;

    let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
    write_output(&path, &file.bytes)
}
