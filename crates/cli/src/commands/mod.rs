//! Command implementations

pub mod print;
pub mod render;
pub mod settings;
pub mod template;
pub mod total;

use anyhow::{Context, Result};
use chrono::Local;
use delivery_note::{DeliveryNote, FileStore, FormData, LineItem, NoteStore, Settings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const STORE_FILE: &str = "store.json";

/// Note file as written by hand or by `template import`
///
/// Settings and the note number are optional: missing settings come from
/// the store and a missing number is generated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFile {
    #[serde(default)]
    pub settings: Option<Settings>,

    #[serde(default)]
    pub form_data: FormData,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub note_number: Option<String>,
}

fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "rspdft", "delivery-note")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("Could not determine a data directory; pass --data-dir")
}

/// Open the persistent store under `data_dir` (or the platform default)
pub fn open_store(data_dir: Option<PathBuf>) -> Result<NoteStore<FileStore>> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let path = dir.join(STORE_FILE);
    debug!(path = %path.display(), "Opening store");
    let store = FileStore::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    Ok(NoteStore::new(store))
}

pub fn read_note_file(path: &Path) -> Result<NoteFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid note file {}", path.display()))
}

/// Complete a note file with stored settings and a generated number
pub fn resolve_note(file: NoteFile, store: &mut NoteStore<FileStore>) -> Result<DeliveryNote> {
    let settings = match file.settings {
        Some(settings) => settings,
        None => store.load_settings(),
    };
    let note_number = match file.note_number.filter(|n| !n.trim().is_empty()) {
        Some(number) => number,
        None => store.generate_note_number(Local::now().naive_local())?,
    };

    let mut note = DeliveryNote {
        settings,
        form_data: file.form_data,
        items: file.items,
        note_number,
    };
    if note.items.is_empty() {
        note.items.push(LineItem::blank(1));
    }
    note.renumber();
    Ok(note)
}

pub fn load_note(path: &Path, store: &mut NoteStore<FileStore>) -> Result<DeliveryNote> {
    resolve_note(read_note_file(path)?, store)
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_fills_settings_and_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(Some(dir.path().to_path_buf())).unwrap();
        store
            .save_settings(&Settings {
                company_name: "华东物流".to_string(),
                ..Settings::default()
            })
            .unwrap();

        let file: NoteFile =
            serde_json::from_str(r#"{"items":[{"seq":5,"quantity":2,"price":"50"}]}"#).unwrap();
        let note = resolve_note(file, &mut store).unwrap();

        assert_eq!(note.settings.company_name, "华东物流");
        assert_eq!(note.note_number.len(), 17);
        assert!(note.note_number.ends_with("001"));
        assert_eq!(note.items[0].seq, 1);
        assert_eq!(note.items[0].quantity, "2");
    }

    #[test]
    fn test_resolve_keeps_given_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(Some(dir.path().to_path_buf())).unwrap();
        let file = NoteFile {
            note_number: Some("20261019093000007".to_string()),
            ..NoteFile::default()
        };
        let note = resolve_note(file, &mut store).unwrap();
        assert_eq!(note.note_number, "20261019093000007");
        assert_eq!(note.items, vec![LineItem::blank(1)]);
    }
}
