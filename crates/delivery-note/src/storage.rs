//! Settings and export counter persistence
//!
//! Everything lives in a flat string key-value store: the settings blob as
//! JSON, today's export count, and the date that count belongs to.

use crate::schema::Settings;
use crate::{NoteError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key of the settings JSON blob
pub const SETTINGS_KEY: &str = "delivery_note_settings";

/// Key of today's export count
pub const EXPORT_COUNT_KEY: &str = "delivery_note_export_count";

/// Key of the date (`YYYY-MM-DD`) the export count belongs to
pub const EXPORT_DATE_KEY: &str = "delivery_note_export_date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Flat string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file
///
/// Every change rewrites the file through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                NoteError::Storage(format!("{} is not a valid store: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Delivery note persistence over a key-value store
#[derive(Debug, Clone, Default)]
pub struct NoteStore<S> {
    store: S,
}

impl<S: KeyValueStore> NoteStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Stored settings, or defaults when absent or unreadable
    pub fn load_settings(&self) -> Settings {
        let text = match self.store.get(SETTINGS_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return Settings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read settings, using defaults");
                return Settings::default();
            }
        };

        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "Stored settings are corrupt, using defaults");
            Settings::default()
        })
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        let text = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &text).inspect_err(|e| {
            warn!(error = %e, "Failed to save settings");
        })
    }

    fn stored_count(&self) -> Result<u32> {
        let Some(text) = self.store.get(EXPORT_COUNT_KEY)? else {
            return Ok(0);
        };
        Ok(text.trim().parse().unwrap_or_else(|_| {
            warn!(value = %text, "Stored export count is not a number, treating as 0");
            0
        }))
    }

    fn is_current_day(&self, today: NaiveDate) -> Result<bool> {
        let stored = self.store.get(EXPORT_DATE_KEY)?;
        Ok(stored
            .and_then(|text| NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok())
            == Some(today))
    }

    /// Number of exports made `today`
    ///
    /// When the stored count belongs to another day it is reset: the date
    /// becomes `today` and the count 0.
    pub fn today_export_count(&mut self, today: NaiveDate) -> Result<u32> {
        if self.is_current_day(today)? {
            return self.stored_count();
        }

        debug!(%today, "Export counter reset for new day");
        self.store
            .set(EXPORT_DATE_KEY, &today.format(DATE_FORMAT).to_string())?;
        self.store.set(EXPORT_COUNT_KEY, "0")?;
        Ok(0)
    }

    /// Record one export made `today`, returning the new count
    pub fn increment_export_count(&mut self, today: NaiveDate) -> Result<u32> {
        let previous = if self.is_current_day(today)? {
            self.stored_count()?
        } else {
            0
        };
        let count = previous.saturating_add(1);

        self.store
            .set(EXPORT_DATE_KEY, &today.format(DATE_FORMAT).to_string())?;
        self.store.set(EXPORT_COUNT_KEY, &count.to_string())?;
        debug!(%today, count, "Export recorded");
        Ok(count)
    }

    /// Note number: `YYYYMMDDHHMMSS` followed by the next 3-digit serial
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use delivery_note::{MemoryStore, NoteStore};
    ///
    /// let mut store = NoteStore::new(MemoryStore::new());
    /// let now = NaiveDate::from_ymd_opt(2026, 1, 29)
    ///     .unwrap()
    ///     .and_hms_opt(20, 55, 0)
    ///     .unwrap();
    /// assert_eq!(store.generate_note_number(now).unwrap(), "20260129205500001");
    /// ```
    pub fn generate_note_number(&mut self, now: NaiveDateTime) -> Result<String> {
        let serial = self.today_export_count(now.date())?.saturating_add(1);
        Ok(format!("{}{serial:03}", now.format("%Y%m%d%H%M%S")))
    }

    /// Remove settings and the export counter
    pub fn clear_all(&mut self) -> Result<()> {
        for key in [SETTINGS_KEY, EXPORT_COUNT_KEY, EXPORT_DATE_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_settings_default_when_missing() {
        let store = NoteStore::new(MemoryStore::new());
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut store = NoteStore::new(MemoryStore::new());
        let settings = Settings {
            company_name: "华东物流".to_string(),
            logo: Some("data:image/png;base64,AAAA".to_string()),
            tax_rate: 6.0,
            doc_title: "送货单".to_string(),
        };
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings(), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut memory = MemoryStore::new();
        memory.set(SETTINGS_KEY, "{not json").unwrap();
        let store = NoteStore::new(memory);
        assert_eq!(store.load_settings(), Settings::default());
    }

    #[test]
    fn test_counter_same_day() {
        let mut store = NoteStore::new(MemoryStore::new());
        assert_eq!(store.today_export_count(day(19)).unwrap(), 0);
        assert_eq!(store.increment_export_count(day(19)).unwrap(), 1);
        assert_eq!(store.increment_export_count(day(19)).unwrap(), 2);
        assert_eq!(store.today_export_count(day(19)).unwrap(), 2);
    }

    #[test]
    fn test_counter_day_rollover() {
        let mut store = NoteStore::new(MemoryStore::new());
        store.increment_export_count(day(18)).unwrap();
        store.increment_export_count(day(18)).unwrap();

        assert_eq!(store.today_export_count(day(19)).unwrap(), 0);
        assert_eq!(
            store.inner().get(EXPORT_DATE_KEY).unwrap().as_deref(),
            Some("2026-10-19")
        );
        assert_eq!(store.inner().get(EXPORT_COUNT_KEY).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_increment_restarts_on_new_day() {
        let mut store = NoteStore::new(MemoryStore::new());
        store.increment_export_count(day(18)).unwrap();
        store.increment_export_count(day(18)).unwrap();
        assert_eq!(store.increment_export_count(day(19)).unwrap(), 1);
    }

    #[test]
    fn test_unparsable_stored_date_resets() {
        let mut memory = MemoryStore::new();
        memory.set(EXPORT_DATE_KEY, "Mon Oct 19 2026").unwrap();
        memory.set(EXPORT_COUNT_KEY, "7").unwrap();
        let mut store = NoteStore::new(memory);
        assert_eq!(store.today_export_count(day(19)).unwrap(), 0);
    }

    #[test]
    fn test_note_number_uses_next_serial() {
        let mut store = NoteStore::new(MemoryStore::new());
        let now = day(19).and_hms_opt(9, 5, 7).unwrap();
        assert_eq!(store.generate_note_number(now).unwrap(), "20261019090507001");

        store.increment_export_count(day(19)).unwrap();
        store.increment_export_count(day(19)).unwrap();
        assert_eq!(store.generate_note_number(now).unwrap(), "20261019090507003");
    }

    #[test]
    fn test_note_number_serial_past_999() {
        let mut memory = MemoryStore::new();
        memory.set(EXPORT_DATE_KEY, "2026-10-19").unwrap();
        memory.set(EXPORT_COUNT_KEY, "999").unwrap();
        let mut store = NoteStore::new(memory);
        let now = day(19).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(store.generate_note_number(now).unwrap(), "202610190000001000");
    }

    #[test]
    fn test_counter_at_u32_max_saturates() {
        let mut memory = MemoryStore::new();
        memory.set(EXPORT_DATE_KEY, "2026-10-19").unwrap();
        memory.set(EXPORT_COUNT_KEY, "4294967295").unwrap();
        let mut store = NoteStore::new(memory);

        let now = day(19).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(store.generate_note_number(now).unwrap(), "202610190000004294967295");
        assert_eq!(store.increment_export_count(day(19)).unwrap(), u32::MAX);
    }

    #[test]
    fn test_clear_all() {
        let mut store = NoteStore::new(MemoryStore::new());
        store.save_settings(&Settings::default()).unwrap();
        store.increment_export_count(day(19)).unwrap();
        store.clear_all().unwrap();

        for key in [SETTINGS_KEY, EXPORT_COUNT_KEY, EXPORT_DATE_KEY] {
            assert_eq!(store.inner().get(key).unwrap(), None);
        }
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(FileStore::open(&path), Err(NoteError::Storage(_))));
    }
}
