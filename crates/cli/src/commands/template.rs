//! `delivery-note template` command implementation

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use delivery_note::{template, DeliveryNote};
use std::path::PathBuf;

use super::{load_note, open_store, write_output};

pub fn export(note_path: PathBuf, output: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let mut store = open_store(data_dir)?;
    let note = load_note(&note_path, &mut store)?;
    let json = template::export(&template::collect(&note, Utc::now()))?;

    let path = output
        .unwrap_or_else(|| PathBuf::from(template::export_file_name(Local::now().date_naive())));
    write_output(&path, json.as_bytes())
}

pub fn import(file: PathBuf, output: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed = template::import(&file_name, &text)?;

    let mut store = open_store(data_dir)?;
    let now = Local::now().naive_local();
    let number = store.generate_note_number(now)?;
    let mut note = DeliveryNote::new(store.load_settings(), now.date(), number);
    template::apply(&parsed, &mut note, &mut store)?;

    let json = serde_json::to_string_pretty(&note)?;
    match output {
        Some(path) => write_output(&path, json.as_bytes()),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
