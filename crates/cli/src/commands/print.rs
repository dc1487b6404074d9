//! `delivery-note print` command implementation

use anyhow::Result;
use chrono::Local;
use delivery_note::export_print_html;
use std::path::PathBuf;

use super::{load_note, open_store, write_output};

pub fn run(note_path: PathBuf, output: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let mut store = open_store(data_dir)?;
    let note = load_note(&note_path, &mut store)?;
    let file = export_print_html(&note, &mut store, Local::now().date_naive())?;

    let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
    write_output(&path, &file.bytes)
}
