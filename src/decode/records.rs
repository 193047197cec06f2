//! Record extraction from vendor response bodies
//!
//! A record path selects the array of objects inside a JSON body:
//! dot notation with array indexing (`result`, `data.items[0]`), or a full
//! JSONPath when it contains a wildcard.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// Extract the records of a response body.
///
/// Without a path the body itself is the record array (or a single record).
pub fn extract_records(body: &JsonValue, records_path: Option<&str>) -> Result<Vec<JsonObject>> {
    let values = match records_path {
        Some(path) if path.contains('*') && !path.contains("[-") => {
            extract_with_jsonpath(body, path)?
        }
        Some(path) => match extract_path(body, path) {
            Some(JsonValue::Array(items)) => items.clone(),
            Some(JsonValue::Null) | None => Vec::new(),
            Some(other) => vec![other.clone()],
        },
        None => match body {
            JsonValue::Array(items) => items.clone(),
            other => vec![other.clone()],
        },
    };

    values
        .into_iter()
        .map(|value| match value {
            JsonValue::Object(object) => Ok(object),
            other => Err(Error::vendor(
                None,
                format!("expected a JSON object record, got {}", type_name(&other)),
            )),
        })
        .collect()
}

/// Resolve a dot-notation path with optional array indexing
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match part.find('[') {
            Some(bracket) => {
                let name = &part[..bracket];
                let index = part[bracket + 1..].strip_suffix(']')?;

                if !name.is_empty() {
                    current = current.get(name)?;
                }

                let items = current.as_array()?;
                let index: i64 = index.parse().ok()?;
                let position = if index < 0 {
                    items.len().checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
                } else {
                    usize::try_from(index).ok()?
                };
                current = items.get(position)?;
            }
            None => current = current.get(part)?,
        }
    }

    Some(current)
}

/// Evaluate a JSONPath expression, returning every match
pub fn extract_with_jsonpath(value: &JsonValue, path: &str) -> Result<Vec<JsonValue>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        JsonValue::Array(matches) => Ok(matches),
        JsonValue::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
