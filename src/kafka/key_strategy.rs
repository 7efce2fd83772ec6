use serde_json::Value;
use tracing::debug;

/// Derives a record key from a JSON value.
#[derive(Debug, Clone, Default)]
pub enum KeyStrategy {
    /// Keyless records.
    #[default]
    None,
    /// The same key for every record.
    Fixed(String),
    /// A dotted path into the value, e.g. `device.id`.
    FieldPath(String),
    /// Several dotted paths, joined with `:`.
    Composite(Vec<String>),
}

impl KeyStrategy {
    pub fn from_fields(fields: Vec<String>) -> Self {
        match fields.len() {
            0 => KeyStrategy::None,
            1 => KeyStrategy::FieldPath(fields.into_iter().next().unwrap_or_default()),
            _ => KeyStrategy::Composite(fields),
        }
    }

    pub fn extract_key(&self, value: &Value) -> Option<String> {
        match self {
            KeyStrategy::None => None,
            KeyStrategy::Fixed(key) => Some(key.clone()),
            KeyStrategy::FieldPath(path) => extract_field_value(value, path),
            KeyStrategy::Composite(fields) => extract_composite_key(value, fields),
        }
    }
}

fn extract_field_value(record: &Value, field_path: &str) -> Option<String> {
    let mut current = record;

    for part in field_path.split('.') {
        match current.get(part) {
            Some(value) => current = value,
            None => {
                debug!("Field '{}' not found in record", part);
                return None;
            }
        }
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        _ => Some(current.to_string()),
    }
}

fn extract_composite_key(record: &Value, fields: &[String]) -> Option<String> {
    let mut key_parts = Vec::with_capacity(fields.len());

    for field in fields {
        match extract_field_value(record, field) {
            Some(value) => key_parts.push(value),
            None => {
                debug!("Missing field '{}' for composite key", field);
                return None;
            }
        }
    }

    if key_parts.is_empty() {
        None
    } else {
        Some(key_parts.join(":"))
    }
}
