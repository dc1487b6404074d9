//! Template export, import and apply
//!
//! A template is the whole form state as JSON: settings (without the logo),
//! form fields and item rows.

use crate::aggregator::parse_tax_rate;
use crate::schema::{DeliveryNote, LineItem, NoteTemplate, Settings, TemplateSettings};
use crate::storage::{KeyValueStore, NoteStore};
use crate::{NoteError, Result, DEFAULT_DOC_TITLE, DEFAULT_TAX_RATE, TEMPLATE_VERSION};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, warn};

/// Build a template from the current form state
///
/// Rows are renumbered from 1 in table order.
pub fn collect(note: &DeliveryNote, now: DateTime<Utc>) -> NoteTemplate {
    let items = note
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| LineItem {
            seq: index as u32 + 1,
            ..item.clone()
        })
        .collect();

    NoteTemplate {
        version: TEMPLATE_VERSION.to_string(),
        export_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        settings: TemplateSettings {
            company_name: note.settings.company_name.clone(),
            tax_rate: note.settings.tax_rate.to_string(),
            doc_title: note.title().to_string(),
        },
        form_data: note.form_data.clone(),
        items,
    }
}

/// Serialize a template as pretty-printed JSON (2-space indent)
pub fn export(template: &NoteTemplate) -> Result<String> {
    Ok(serde_json::to_string_pretty(template)?)
}

/// Suggested file name for an exported template
pub fn export_file_name(date: NaiveDate) -> String {
    format!("出库单模板_{}.json", date.format("%Y-%m-%d"))
}

/// Check the top-level shape of a template document
pub fn validate(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    object.get("settings").is_some_and(Value::is_object)
        && object.get("formData").is_some_and(Value::is_object)
        && object.get("items").is_some_and(Value::is_array)
}

/// Parse and validate an uploaded template file
pub fn import(file_name: &str, text: &str) -> Result<NoteTemplate> {
    if !file_name.to_ascii_lowercase().ends_with(".json") {
        return Err(NoteError::NotJsonFile(file_name.to_string()));
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| NoteError::TemplateParse(e.to_string()))?;

    if !validate(&value) {
        warn!(file = file_name, "Rejected template with missing sections");
        return Err(NoteError::InvalidTemplate(
            "expected settings and formData objects and an items array".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| NoteError::InvalidTemplate(e.to_string()))
}

/// Load a template into the form and store its settings
///
/// Template settings replace the form's only when non-empty. The stored
/// settings are replaced outright, with the logo cleared. Form fields and
/// rows are copied; an empty row list leaves one blank row.
pub fn apply<S: KeyValueStore>(
    template: &NoteTemplate,
    note: &mut DeliveryNote,
    store: &mut NoteStore<S>,
) -> Result<()> {
    let settings = &template.settings;
    if !settings.company_name.is_empty() {
        note.settings.company_name = settings.company_name.clone();
    }
    if !settings.tax_rate.is_empty() {
        note.settings.tax_rate = parse_tax_rate(&settings.tax_rate);
    }
    if !settings.doc_title.is_empty() {
        note.settings.doc_title = settings.doc_title.clone();
    }

    store.save_settings(&Settings {
        company_name: settings.company_name.clone(),
        logo: None,
        tax_rate: if settings.tax_rate.is_empty() {
            DEFAULT_TAX_RATE
        } else {
            parse_tax_rate(&settings.tax_rate)
        },
        doc_title: if settings.doc_title.is_empty() {
            DEFAULT_DOC_TITLE.to_string()
        } else {
            settings.doc_title.clone()
        },
    })?;

    note.form_data = template.form_data.clone();

    note.items = if template.items.is_empty() {
        vec![LineItem::blank(1)]
    } else {
        template.items.clone()
    };
    note.renumber();

    info!(rows = note.items.len(), "Template applied");
    Ok(())
}
