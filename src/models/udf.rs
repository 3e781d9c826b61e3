//! Typed view over the user-defined-fields blob attached to a subgroup.
//!
//! The blob is ad hoc JSON. A handful of keys are well known and consumed by
//! the grid, so they get typed accessors and explicit defaults; everything
//! else is carried through untouched.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Prefix shared by all awaiting-production keys.
pub const AWAITING_PRODUCTION_PREFIX: &str = "awaiting_production_";

/// Suffix marking tooltip keys.
pub const TOOLTIP_SUFFIX: &str = "_tooltip";

/// Parsed user-defined fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UdfFields {
    /// Row should be highlighted
    pub is_highlight: bool,
    /// Item is no longer sold
    pub inactive: bool,
    /// Bundle/line identifier, "" when absent
    pub line_bundle: String,
    /// Stock on hand, 0 when absent
    pub stock: f64,
    /// Fast-moving item flag
    pub selling_fast: bool,
    /// Slow-moving item flag
    pub selling_slow: bool,
    /// Quantity waiting for production, 0 when absent
    pub awaiting_production_qty: f64,
    /// Expected production date as `YYYY-MM-DD` (raw text when unparseable), "" when absent
    pub awaiting_production_date: String,
    /// Any other `awaiting_production_*` keys
    pub awaiting_production_other: BTreeMap<String, Value>,
    /// Every `*_tooltip` key rendered as text
    pub tooltips: BTreeMap<String, String>,
    /// Unrecognized keys
    pub extra: BTreeMap<String, Value>,
}

impl UdfFields {
    /// Parses the blob best-effort.
    ///
    /// Accepts a JSON object or a string containing one. Anything else, or
    /// malformed JSON, logs a warning and yields the defaults.
    #[must_use]
    pub fn parse(raw: Option<&Value>, record_id: &str) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match raw {
            Value::Null => Self::default(),
            Value::Object(map) => Self::from_map(map),
            Value::String(text) if text.trim().is_empty() => Self::default(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Self::from_map(&map),
                Ok(other) => {
                    warn!(
                        record_id,
                        kind = json_kind(&other),
                        "UDF blob is not a JSON object, using defaults"
                    );
                    Self::default()
                }
                Err(e) => {
                    warn!(record_id, error = %e, "Failed to parse UDF blob, using defaults");
                    Self::default()
                }
            },
            other => {
                warn!(
                    record_id,
                    kind = json_kind(other),
                    "UDF blob is not a JSON object, using defaults"
                );
                Self::default()
            }
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut fields = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "is_highlight" => fields.is_highlight = as_flag(value),
                "inactive" => fields.inactive = as_flag(value),
                "selling_fast" => fields.selling_fast = as_flag(value),
                "selling_slow" => fields.selling_slow = as_flag(value),
                "line_bundle" => fields.line_bundle = as_text(value),
                "stock" => fields.stock = as_number(value).unwrap_or(0.0),
                "awaiting_production_qty" => {
                    fields.awaiting_production_qty = as_number(value).unwrap_or(0.0);
                }
                "awaiting_production_date" => {
                    fields.awaiting_production_date = normalize_date(&as_text(value));
                }
                k if k.starts_with(AWAITING_PRODUCTION_PREFIX) => {
                    fields.awaiting_production_other.insert(key.clone(), value.clone());
                }
                k if k.ends_with(TOOLTIP_SUFFIX) => {
                    fields.tooltips.insert(key.clone(), as_text(value));
                }
                _ => {
                    fields.extra.insert(key.clone(), value.clone());
                }
            }
        }

        fields
    }

    /// Every field to write onto a row, known keys first with defaults applied.
    ///
    /// Tooltips always include `price_tooltip` and `stock_tooltip`.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries = vec![
            ("is_highlight".to_string(), Value::Bool(self.is_highlight)),
            ("inactive".to_string(), Value::Bool(self.inactive)),
            ("line_bundle".to_string(), Value::String(self.line_bundle.clone())),
            ("stock".to_string(), number_value(self.stock)),
            ("selling_fast".to_string(), Value::Bool(self.selling_fast)),
            ("selling_slow".to_string(), Value::Bool(self.selling_slow)),
            (
                "awaiting_production_qty".to_string(),
                number_value(self.awaiting_production_qty),
            ),
            (
                "awaiting_production_date".to_string(),
                Value::String(self.awaiting_production_date.clone()),
            ),
        ];

        for (key, value) in &self.awaiting_production_other {
            entries.push((key.clone(), value.clone()));
        }

        let mut tooltips = self.tooltips.clone();
        for key in ["price_tooltip", "stock_tooltip"] {
            tooltips.entry(key.to_string()).or_default();
        }
        for (key, text) in tooltips {
            entries.push((key, Value::String(text)));
        }

        for (key, value) in &self.extra {
            entries.push((key.clone(), value.clone()));
        }

        entries
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interprets booleans stored as bool, number, or text ("true", "1", "Y").
fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "y" | "yes"
        ),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a number stored as JSON number or numeric text.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

/// Converts an f64 into a JSON number, falling back to 0 for non-finite values.
#[must_use]
pub fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or_else(|| Value::from(0), Value::Number)
}

/// Normalizes a date to `YYYY-MM-DD`; unparseable text is returned as-is.
fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return date.format("%Y-%m-%d").to_string();
    }
    trimmed.to_string()
}
