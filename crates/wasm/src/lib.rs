//! WASM bindings for the delivery note generator
//!
//! This crate provides a JavaScript-friendly API for:
//! - Live totals and the capitalized amount text
//! - Settings, export counter and note numbers in `localStorage`
//! - Template export/import
//! - PDF and print-page rendering
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { calculateTotals, NoteStore, Template, renderPdf } from 'delivery-note-wasm';
//!
//! await init();
//!
//! const totals = calculateTotals([{ quantity: "2", price: "50" }], "13");
//! // totals.display.grandTotal === "¥113.00"
//!
//! const store = new NoteStore();
//! const note = {
//!   settings: store.loadSettings(),
//!   formData: { customerName: "张三" },
//!   items: [{ name: "螺丝", quantity: "2", price: "50" }],
//!   noteNumber: store.generateNoteNumber(),
//! };
//! const pdf = store.exportPdf(note, fontBytes);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use delivery_note::{
    aggregate, aggregate_with_rate, export_pdf, export_print_html, pdf_file_name, render_print_html,
    template, AggregateResult, DeliveryNote, FontSet, KeyValueStore, LineItem, NoteError,
    NoteRenderer, NoteSummary, Settings,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser-local date and time
fn local_now() -> Result<NaiveDateTime, JsValue> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .and_then(|date| date.and_hms_opt(now.get_hours(), now.get_minutes(), now.get_seconds()))
        .ok_or_else(|| JsValue::from_str("Invalid system date"))
}

fn utc_now() -> Result<DateTime<Utc>, JsValue> {
    DateTime::from_timestamp_millis(js_sys::Date::now() as i64)
        .ok_or_else(|| JsValue::from_str("Invalid system time"))
}

/// Totals as returned to JavaScript
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalsView {
    subtotal: f64,
    tax_rate: f64,
    tax_amount: f64,
    grand_total: f64,
    amount_in_words: String,
    display: NoteSummary,
}

impl From<AggregateResult> for TotalsView {
    fn from(result: AggregateResult) -> Self {
        Self {
            subtotal: result.subtotal(),
            tax_rate: result.tax_rate,
            tax_amount: result.tax_amount(),
            grand_total: result.grand_total(),
            amount_in_words: result.amount_in_words(),
            display: result.summary(),
        }
    }
}

/// Compute row amounts and totals
///
/// @param items - Array of `{ quantity, price }` rows; values may be strings or numbers
/// @param taxRate - Tax rate in percent, as a string or number
/// @returns `{ subtotal, taxRate, taxAmount, grandTotal, amountInWords, display }`
#[wasm_bindgen(js_name = calculateTotals)]
pub fn calculate_totals(items: JsValue, tax_rate: JsValue) -> Result<JsValue, JsValue> {
    let items: Vec<LineItem> = serde_wasm_bindgen::from_value(items)?;
    let result = match (tax_rate.as_f64(), tax_rate.as_string()) {
        (Some(rate), _) => aggregate_with_rate(&items, rate),
        (None, Some(text)) => aggregate(&items, &text),
        (None, None) => aggregate(&items, ""),
    };
    Ok(serde_wasm_bindgen::to_value(&TotalsView::from(result))?)
}

/// Capitalized RMB text for an amount
///
/// @param amount - Amount in yuan
/// @returns Numeral text (e.g. "壹佰壹拾叁元整"); empty when out of range
#[wasm_bindgen(js_name = numberToChinese)]
pub fn number_to_chinese(amount: f64) -> String {
    cn_text::format_rmb_uppercase(amount)
}

/// Render a note to PDF bytes without counting the export
///
/// @param note - Note object (`settings`, `formData`, `items`, `noteNumber`)
/// @param fontBytes - TTF/OTF with CJK glyphs (Uint8Array)
/// @param boldFontBytes - Optional bold face
/// @returns PDF bytes (Uint8Array)
#[wasm_bindgen(js_name = renderPdf)]
pub fn render_pdf(
    note: JsValue,
    font_bytes: &[u8],
    bold_font_bytes: Option<Vec<u8>>,
) -> Result<Vec<u8>, JsValue> {
    let note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
    NoteRenderer::new(&note)
        .render(&font_set(font_bytes, bold_font_bytes))
        .map_err(js_error)
}

/// Render a note as a standalone print page
#[wasm_bindgen(js_name = renderPrintHtml)]
pub fn render_print_html_js(note: JsValue) -> Result<String, JsValue> {
    let note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
    Ok(render_print_html(&note))
}

/// `出库单_{noteNumber}.pdf`
#[wasm_bindgen(js_name = pdfFileName)]
pub fn pdf_file_name_js(note_number: &str) -> String {
    pdf_file_name(note_number)
}

fn font_set(regular: &[u8], bold: Option<Vec<u8>>) -> FontSet {
    FontSet {
        regular: regular.to_vec(),
        bold,
    }
}

/// `window.localStorage` as a key-value store
struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    fn open() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let storage = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is not available"))?;
        Ok(Self { storage })
    }
}

fn storage_error(e: JsValue) -> NoteError {
    NoteError::Storage(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> delivery_note::Result<Option<String>> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> delivery_note::Result<()> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> delivery_note::Result<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }
}

/// Settings, export counter and note numbers persisted in `localStorage`
#[wasm_bindgen]
pub struct NoteStore {
    inner: delivery_note::NoteStore<LocalStorage>,
}

#[wasm_bindgen]
impl NoteStore {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<NoteStore, JsValue> {
        Ok(NoteStore {
            inner: delivery_note::NoteStore::new(LocalStorage::open()?),
        })
    }

    /// Stored settings, or defaults
    #[wasm_bindgen(js_name = loadSettings)]
    pub fn load_settings(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.load_settings())?)
    }

    /// Persist settings; throws when the write fails (e.g. quota exceeded)
    #[wasm_bindgen(js_name = saveSettings)]
    pub fn save_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: Settings = serde_wasm_bindgen::from_value(settings)?;
        self.inner.save_settings(&settings).map_err(js_error)
    }

    #[wasm_bindgen(js_name = todayExportCount)]
    pub fn today_export_count(&mut self) -> Result<u32, JsValue> {
        let today = local_now()?.date();
        self.inner.today_export_count(today).map_err(js_error)
    }

    #[wasm_bindgen(js_name = incrementExportCount)]
    pub fn increment_export_count(&mut self) -> Result<u32, JsValue> {
        let today = local_now()?.date();
        self.inner.increment_export_count(today).map_err(js_error)
    }

    /// `YYYYMMDDHHMMSS` + 3-digit daily serial
    #[wasm_bindgen(js_name = generateNoteNumber)]
    pub fn generate_note_number(&mut self) -> Result<String, JsValue> {
        self.inner.generate_note_number(local_now()?).map_err(js_error)
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) -> Result<(), JsValue> {
        self.inner.clear_all().map_err(js_error)
    }

    /// Render the note to PDF and count the export
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(
        &mut self,
        note: JsValue,
        font_bytes: &[u8],
        bold_font_bytes: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, JsValue> {
        let note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
        let today = local_now()?.date();
        let file = export_pdf(&note, &font_set(font_bytes, bold_font_bytes), &mut self.inner, today)
            .map_err(js_error)?;
        Ok(file.bytes)
    }

    /// Render the print page and count the export
    #[wasm_bindgen(js_name = exportPrintHtml)]
    pub fn export_print_html(&mut self, note: JsValue) -> Result<String, JsValue> {
        let note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
        let today = local_now()?.date();
        let file = export_print_html(&note, &mut self.inner, today).map_err(js_error)?;
        String::from_utf8(file.bytes).map_err(js_error)
    }
}

/// Template export and import
#[wasm_bindgen]
pub struct Template;

#[wasm_bindgen]
impl Template {
    /// Whether parsed JSON has `settings`, `formData` and `items`
    pub fn validate(value: JsValue) -> bool {
        serde_wasm_bindgen::from_value::<serde_json::Value>(value)
            .map(|value| template::validate(&value))
            .unwrap_or(false)
    }

    /// Parse and validate an uploaded file
    ///
    /// @param fileName - Must end in `.json`
    /// @param text - File contents
    /// @returns Template object
    pub fn parse(file_name: &str, text: &str) -> Result<JsValue, JsValue> {
        let parsed = template::import(file_name, text).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&parsed)?)
    }

    /// Export the current note as pretty-printed template JSON
    pub fn collect(note: JsValue) -> Result<String, JsValue> {
        let note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
        template::export(&template::collect(&note, utc_now()?)).map_err(js_error)
    }

    /// Suggested download name, `出库单模板_YYYY-MM-DD.json`
    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name() -> Result<String, JsValue> {
        Ok(template::export_file_name(local_now()?.date()))
    }

    /// Apply a parsed template to a note, storing its settings
    ///
    /// @returns The updated note
    pub fn apply(value: JsValue, note: JsValue, store: &mut NoteStore) -> Result<JsValue, JsValue> {
        let parsed: delivery_note::NoteTemplate = serde_wasm_bindgen::from_value(value)?;
        let mut note: DeliveryNote = serde_wasm_bindgen::from_value(note)?;
        template::apply(&parsed, &mut note, &mut store.inner).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&note)?)
    }
}
