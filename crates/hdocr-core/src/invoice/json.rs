//! Fallback for responses where the model answered with JSON instead of a table.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::record::TableRow;

use super::rules::{JSON_BLOCK, match_label};
use super::RowExtractor;

/// Recovers rows from the outermost JSON array or object in a response.
///
/// Keys are matched like header labels, so `ten_hang`, `Tên hàng` and
/// `name` all land in the name field. An object wrapping an array of
/// objects (`{"products": [...]}`) is unwrapped.
#[derive(Debug, Clone, Default)]
pub struct JsonRowExtractor;

impl JsonRowExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Vec<TableRow> {
        let Some(block) = JSON_BLOCK.find(text) else {
            return Vec::new();
        };

        let value: Value = match serde_json::from_str(block.as_str()) {
            Ok(value) => value,
            Err(e) => {
                debug!("Ignoring unparsable JSON block: {}", e);
                return Vec::new();
            }
        };

        let rows: Vec<TableRow> = match &value {
            Value::Array(items) => items.iter().filter_map(row_from_value).collect(),
            Value::Object(map) => match nested_items(map) {
                Some(items) => items.iter().filter_map(row_from_value).collect(),
                None => row_from_object(map).into_iter().collect(),
            },
            _ => Vec::new(),
        };

        debug!("Recovered {} rows from JSON", rows.len());
        rows
    }
}

impl RowExtractor for JsonRowExtractor {
    fn extract_rows(&self, text: &str) -> Vec<TableRow> {
        self.extract(text)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

fn nested_items(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.values().find_map(|v| match v {
        Value::Array(items) if items.iter().any(Value::is_object) => Some(items),
        _ => None,
    })
}

fn row_from_value(value: &Value) -> Option<TableRow> {
    value.as_object().and_then(row_from_object)
}

fn row_from_object(map: &Map<String, Value>) -> Option<TableRow> {
    let mut row = TableRow::default();
    let mut mapped = false;

    for (key, value) in map {
        let Some(field) = match_label(&key.replace('_', " ")).map(|label| label.field) else {
            continue;
        };
        if !row.get(field).is_empty() {
            continue;
        }
        row.set(field, scalar_text(value));
        mapped = true;
    }

    mapped.then_some(row)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
