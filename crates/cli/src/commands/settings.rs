//! `delivery-note settings` command implementation

use anyhow::{Context, Result};
use delivery_note::logo::encode_data_url;
use delivery_note::{parse_tax_rate, Settings};
use std::path::PathBuf;
use tracing::info;

use super::open_store;

/// Fields to change; `None` leaves the stored value
#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub company: Option<String>,
    pub tax_rate: Option<String>,
    pub title: Option<String>,
    pub logo: Option<PathBuf>,
    pub clear_logo: bool,
}

impl SettingsUpdate {
    fn apply(self, settings: &mut Settings) -> Result<()> {
        if let Some(company) = self.company {
            settings.company_name = company;
        }
        if let Some(rate) = self.tax_rate {
            settings.tax_rate = parse_tax_rate(&rate);
        }
        if let Some(title) = self.title {
            settings.doc_title = title;
        }
        if self.clear_logo {
            settings.logo = None;
        }
        if let Some(path) = self.logo {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read logo {}", path.display()))?;
            settings.logo = Some(encode_data_url(&bytes)?);
        }
        Ok(())
    }
}

pub fn show(data_dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(data_dir)?;
    let mut settings = store.load_settings();
    if let Some(logo) = settings.logo.as_mut() {
        *logo = format!("<{} bytes>", logo.len());
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn set(update: SettingsUpdate, data_dir: Option<PathBuf>) -> Result<()> {
    let mut store = open_store(data_dir)?;
    let mut settings = store.load_settings();
    update.apply(&mut settings)?;
    store.save_settings(&settings)?;
    info!(company = %settings.company_name, tax_rate = settings.tax_rate, "Settings saved");
    println!("Settings saved");
    Ok(())
}

pub fn clear(data_dir: Option<PathBuf>) -> Result<()> {
    open_store(data_dir)?.clear_all()?;
    println!("Settings and export counter cleared");
    Ok(())
}
