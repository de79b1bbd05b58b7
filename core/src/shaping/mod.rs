//! Result shaping: long-to-wide pivoting, class-list merging and export
//! rendering.
//!
//! Raw query results come back as long (subject, property, value) rows.
//! Consumers want one record per subject with a column per property, so
//! the pivot groups rows by subject and joins multi-valued fields.

use crate::config::AppConfig;
use crate::errors::Result;
use crate::executor::ResultSet;
use crate::ontology::{ClassSource, ResourceClass};
use crate::sparql::{extract_label_from_uri, format_property_name};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Separator between the values of a multi-valued field.
const VALUE_SEPARATOR: &str = " | ";

/// One pivoted record: a subject with its display label and one field per
/// visible property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WideRecord {
    #[serde(rename = "URI")]
    pub uri: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

/// Pivot long (subject, property, value) rows into one record per subject.
///
/// Subjects keep their first-seen order. Hidden properties are dropped,
/// values with an empty resolved label fall back to the raw value, and
/// repeated values of a field are deduplicated before joining.
pub fn pivot(rows: &ResultSet, config: &AppConfig) -> Vec<WideRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut by_subject: HashMap<String, (String, BTreeMap<String, Vec<String>>)> = HashMap::new();

    for i in rows.row_indices() {
        let Some(subject) = rows.get_any(i, &["subject", "Subject", "URI"]) else {
            continue;
        };
        let subject = subject.to_string();
        let entry = by_subject.entry(subject.clone()).or_insert_with(|| {
            order.push(subject.clone());
            (String::new(), BTreeMap::new())
        });

        if entry.0.is_empty() {
            if let Some(label) = rows.get_any(i, &["subjectLabel", "Label"]) {
                entry.0 = label.to_string();
            }
        }

        let Some(property) = rows.get_any(i, &["property", "Property"]) else {
            continue;
        };
        let Some(field) = format_property_name(config, property) else {
            continue;
        };

        let raw = rows.get_any(i, &["value", "Value"]).unwrap_or_default();
        let display = match rows.get(i, "valueLabel") {
            Some(label) if !label.is_empty() => label,
            _ => raw,
        };
        if display.is_empty() {
            continue;
        }

        let values = entry.1.entry(field).or_default();
        if !values.iter().any(|v| v == display) {
            values.push(display.to_string());
        }
    }

    order
        .into_iter()
        .map(|uri| {
            let (label, fields) = by_subject.remove(&uri).unwrap_or_default();
            let label = if label.is_empty() {
                extract_label_from_uri(&uri)
            } else {
                label
            };
            WideRecord {
                uri,
                label,
                fields: fields
                    .into_iter()
                    .map(|(k, vs)| (k, vs.join(VALUE_SEPARATOR)))
                    .collect(),
            }
        })
        .collect()
}

/// Merge the manual class mapping with discovered class URIs.
///
/// Configured entries are authoritative: a discovered URI already present
/// in the mapping is dropped. The result is sorted by label.
pub fn merge_classes(config: &AppConfig, discovered: &[String]) -> Vec<ResourceClass> {
    let mut classes: Vec<ResourceClass> = config
        .manual_class_mapping
        .iter()
        .map(|(label, uri)| ResourceClass {
            label: label.clone(),
            uri: uri.clone(),
            source: ClassSource::Config,
        })
        .collect();

    for uri in discovered {
        if classes.iter().any(|c| &c.uri == uri) {
            continue;
        }
        classes.push(ResourceClass {
            label: extract_label_from_uri(uri),
            uri: uri.clone(),
            source: ClassSource::Auto,
        });
    }

    classes.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    classes
}

/// Render pivoted records as a JSON array.
pub fn to_json(records: &[WideRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Render pivoted records as CSV with a `URI,Label,...` header.
///
/// The column set is the union of all field names, in sorted order, so
/// every row has the same width.
pub fn to_csv(records: &[WideRecord]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for field in record.fields.keys() {
            if !columns.contains(&field.as_str()) {
                columns.push(field);
            }
        }
    }
    columns.sort_unstable();

    let mut out = String::from("URI,Label");
    for column in &columns {
        out.push(',');
        out.push_str(&csv_escape(column));
    }
    out.push('\n');

    for record in records {
        out.push_str(&csv_escape(&record.uri));
        out.push(',');
        out.push_str(&csv_escape(&record.label));
        for column in &columns {
            out.push(',');
            if let Some(value) = record.fields.get(*column) {
                out.push_str(&csv_escape(value));
            }
        }
        out.push('\n');
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
