//! Form schema types
//!
//! Field names follow the JSON used by the browser form and template files
//! (camelCase). Numeric inputs are kept as the text the user typed; parsing
//! happens in the aggregator.

use crate::aggregator::{aggregate_with_rate, parse_tax_rate, AggregateResult};
use crate::{DEFAULT_DOC_TITLE, DEFAULT_TAX_RATE, TEMPLATE_VERSION};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "text_or_number")]
    pub company_name: String,

    /// Logo image as a `data:` URL
    #[serde(default)]
    pub logo: Option<String>,

    /// Tax rate in percent
    #[serde(default = "default_tax_rate", deserialize_with = "lenient_tax_rate")]
    pub tax_rate: f64,

    #[serde(default = "default_doc_title", deserialize_with = "text_or_number")]
    pub doc_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            logo: None,
            tax_rate: DEFAULT_TAX_RATE,
            doc_title: DEFAULT_DOC_TITLE.to_string(),
        }
    }
}

/// Free-text form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    #[serde(default, deserialize_with = "text_or_number")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub delivery_address: String,
    /// ISO date (`YYYY-MM-DD`) as entered
    #[serde(default, deserialize_with = "text_or_number")]
    pub delivery_date: String,
    /// 制单人
    #[serde(default, deserialize_with = "text_or_number")]
    pub maker: String,
    /// 拣货人
    #[serde(default, deserialize_with = "text_or_number")]
    pub picker: String,
    /// 审核人
    #[serde(default, deserialize_with = "text_or_number")]
    pub reviewer: String,
}

/// One row of the item table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub seq: u32,
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub spec: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub unit: String,
    /// Quantity as typed
    #[serde(default, deserialize_with = "text_or_number")]
    pub quantity: String,
    /// Unit price as typed
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub remark: String,
}

impl LineItem {
    /// Empty row with a sequence number
    pub fn blank(seq: u32) -> Self {
        Self {
            seq,
            ..Self::default()
        }
    }

    /// Row with only quantity and price filled in
    pub fn new(quantity: &str, price: &str) -> Self {
        Self {
            quantity: quantity.to_string(),
            price: price.to_string(),
            ..Self::default()
        }
    }

    /// Whether every field is blank
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.spec, &self.unit, &self.quantity, &self.price, &self.remark]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Settings section of a template; the tax rate stays as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    #[serde(default, deserialize_with = "text_or_number")]
    pub company_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub tax_rate: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub doc_title: String,
}

/// Exported form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTemplate {
    #[serde(default = "default_version", deserialize_with = "text_or_number")]
    pub version: String,

    /// ISO-8601 timestamp of the export
    #[serde(default, deserialize_with = "text_or_number")]
    pub export_time: String,

    pub settings: TemplateSettings,

    pub form_data: FormData,

    pub items: Vec<LineItem>,
}

/// Complete form state used for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNote {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub form_data: FormData,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default, deserialize_with = "text_or_number")]
    pub note_number: String,
}

impl Default for DeliveryNote {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            form_data: FormData::default(),
            items: vec![LineItem::blank(1)],
            note_number: String::new(),
        }
    }
}

impl DeliveryNote {
    /// Fresh form: stored settings, today's delivery date, one blank row
    pub fn new(settings: Settings, today: NaiveDate, note_number: String) -> Self {
        Self {
            settings,
            form_data: FormData {
                delivery_date: today.format("%Y-%m-%d").to_string(),
                ..FormData::default()
            },
            items: vec![LineItem::blank(1)],
            note_number,
        }
    }

    /// Append a row, numbering it after the existing rows
    pub fn add_item(&mut self, mut item: LineItem) {
        item.seq = self.items.len() as u32 + 1;
        self.items.push(item);
    }

    /// Remove a row and renumber the rest. Returns the removed row.
    pub fn remove_item(&mut self, index: usize) -> Option<LineItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Renumber rows from 1 in table order
    pub fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.seq = index as u32 + 1;
        }
    }

    /// Title to print, falling back to the default
    pub fn title(&self) -> &str {
        match self.settings.doc_title.trim() {
            "" => DEFAULT_DOC_TITLE,
            title => title,
        }
    }

    /// Totals for the current rows and tax rate
    pub fn totals(&self) -> AggregateResult {
        aggregate_with_rate(&self.items, self.settings.tax_rate)
    }
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_doc_title() -> String {
    DEFAULT_DOC_TITLE.to_string()
}

fn default_version() -> String {
    TEMPLATE_VERSION.to_string()
}

/// Accept a string, a number or null as text
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

/// Tax rate from a number or text, defaulting when unusable
fn lenient_tax_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_f64()
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
            .unwrap_or(DEFAULT_TAX_RATE),
        Value::String(text) => parse_tax_rate(&text),
        _ => DEFAULT_TAX_RATE,
    })
}

fn lenient_seq<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_u64().unwrap_or(0) as u32,
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
