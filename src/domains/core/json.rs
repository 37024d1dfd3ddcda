//! Serde helpers for payloads the backend sometimes stores as JSON text.
//!
//! Form schemas and submission contents are persisted as serialized JSON
//! strings by some deployments and as native JSON by others.

use log::warn;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Accepts either a JSON list or a string holding one. An empty string is an empty list.
pub fn list_or_json_string<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => serde_json::from_str(&text).map_err(D::Error::custom),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

/// Accepts either a JSON object or a string holding one.
///
/// Stored submission content must never fail a listing, so anything that is
/// not an object is logged and treated as empty.
pub fn lenient_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(object_from_value(raw))
}

/// Reads `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn object_from_value(raw: Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        Value::String(text) if text.trim().is_empty() => Map::new(),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!("Stored content is JSON but not an object ({}), ignoring", type_name(&other));
                Map::new()
            }
            Err(e) => {
                warn!("Stored content is not valid JSON, ignoring: {}", e);
                Map::new()
            }
        },
        other => {
            warn!("Stored content has unexpected shape ({}), ignoring", type_name(&other));
            Map::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "list_or_json_string", default)]
        items: Vec<u32>,
        #[serde(deserialize_with = "lenient_object", default)]
        content: Map<String, Value>,
        #[serde(deserialize_with = "null_as_default", default)]
        note: String,
    }

    #[test]
    fn test_list_accepts_both_shapes() {
        let native: Holder = serde_json::from_value(json!({"items": [1, 2]})).unwrap();
        assert_eq!(native.items, vec![1, 2]);

        let text: Holder = serde_json::from_value(json!({"items": "[3,4]"})).unwrap();
        assert_eq!(text.items, vec![3, 4]);

        let empty: Holder = serde_json::from_value(json!({"items": ""})).unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_lenient_object_never_fails() {
        let text: Holder = serde_json::from_value(json!({"content": "{\"1\":\"Jane\"}"})).unwrap();
        assert_eq!(text.content.get("1"), Some(&json!("Jane")));

        let broken: Holder = serde_json::from_value(json!({"content": "{not json"})).unwrap();
        assert!(broken.content.is_empty());

        let wrong: Holder = serde_json::from_value(json!({"content": [1, 2]})).unwrap();
        assert!(wrong.content.is_empty());
    }

    #[test]
    fn test_null_reads_as_default() {
        let null: Holder = serde_json::from_value(json!({"note": null})).unwrap();
        assert_eq!(null.note, "");

        let set: Holder = serde_json::from_value(json!({"note": "kept"})).unwrap();
        assert_eq!(set.note, "kept");
    }
}
