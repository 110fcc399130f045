//! Decoding of persisted field shapes
//!
//! Storage layers that only accept scalar fields hand list/object values back
//! as JSON-encoded strings. Everything here accepts both the structured and
//! the string-encoded form and recovers malformed input to the empty default
//! of the expected type instead of failing.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Decode a list field (array or JSON-encoded array). Malformed input yields `[]`.
pub fn decode_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                warn!("malformed serialized list, substituting empty list");
                Vec::new()
            }
        },
        Some(_) => {
            warn!("non-list value in list field, substituting empty list");
            Vec::new()
        }
    }
}

/// Decode an object field (object or JSON-encoded object). Malformed input yields `{}`.
pub fn decode_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) if s.trim().is_empty() => Map::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("malformed serialized object, substituting empty object");
                Map::new()
            }
        },
        Some(_) => {
            warn!("non-object value in object field, substituting empty object");
            Map::new()
        }
    }
}

/// Decode a field straight into a typed value, falling back to `T::default()`.
pub fn decode<T: DeserializeOwned + Default>(value: Option<&Value>) -> T {
    let structured = match value {
        None | Some(Value::Null) => return T::default(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(_) => {
                warn!("malformed serialized field, substituting default");
                return T::default();
            }
        },
        Some(v) => v.clone(),
    };

    serde_json::from_value(structured).unwrap_or_else(|e| {
        warn!("unexpected field shape ({}), substituting default", e);
        T::default()
    })
}

/// Interpret a value as a finite number.
///
/// Numbers pass through, numeric strings are parsed; null, empty strings,
/// booleans and containers are not numbers.
pub fn decode_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Lenient list-of-strings view used by search and filtering.
///
/// Arrays yield their string elements (objects contribute their `name`);
/// a string holding a JSON array is exploded; any other string is a single item.
pub fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(item_name).collect(),
        Some(Value::String(s)) => {
            if s.trim_start().starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                    return items.iter().filter_map(item_name).collect();
                }
            }
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s.clone()]
            }
        }
        _ => Vec::new(),
    }
}

fn item_name(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Encode lists and objects as JSON strings for scalar-only storage; scalars pass through.
pub fn encode_structured(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}
