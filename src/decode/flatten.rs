//! Object flattening
//!
//! Turns one raw vendor object into an [`Object`] holding only the
//! requested attributes, coerced to their declared types.

use super::records::extract_with_jsonpath;
use super::types::{
    AttributeConfig, AttributeType, AttributeValue, EntityConfig, FlattenOptions, Object,
};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;

/// Flatten a raw object according to the entity configuration.
///
/// Absent and null attributes are omitted. A missing unique id is an error.
pub fn flatten_object(
    raw: &JsonValue,
    entity: &EntityConfig,
    options: &FlattenOptions,
) -> Result<Object> {
    let mut attributes = BTreeMap::new();

    for attribute in &entity.attributes {
        if let Some(value) = extract_attribute(raw, attribute, options)? {
            attributes.insert(attribute.id.clone(), value);
        } else if attribute.unique_id {
            return Err(Error::conversion(format!(
                "entity '{}' object has no value for unique id attribute '{}' ({})",
                entity.id, attribute.id, attribute.external_id
            )));
        }
    }

    let mut child_objects = BTreeMap::new();
    for child in &entity.child_entities {
        let Some(value) = lookup(raw, &child.external_id, &options.nested_delimiter) else {
            continue;
        };

        let items = match value {
            JsonValue::Array(items) => items,
            JsonValue::Null => continue,
            other => vec![other],
        };

        let children = items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| flatten_object(item, child, options))
            .collect::<Result<Vec<_>>>()?;
        child_objects.insert(child.id.clone(), children);
    }

    Ok(Object {
        attributes,
        child_objects,
    })
}

fn extract_attribute(
    raw: &JsonValue,
    attribute: &AttributeConfig,
    options: &FlattenOptions,
) -> Result<Option<AttributeValue>> {
    let value = if attribute.external_id.starts_with('$') {
        let mut matches = extract_with_jsonpath(raw, &attribute.external_id)?;
        matches.retain(|m| !m.is_null());
        match matches.len() {
            0 => None,
            1 => matches.pop(),
            _ if attribute.list => Some(JsonValue::Array(matches)),
            n => {
                return Err(Error::conversion(format!(
                    "attribute '{}' matched {n} values but is not a list",
                    attribute.id
                )))
            }
        }
    } else {
        lookup(raw, &attribute.external_id, &options.nested_delimiter)
    };

    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    if attribute.list {
        let items = match value {
            JsonValue::Array(items) => items,
            single => vec![single],
        };
        let values = items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| coerce(item, attribute, options))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(AttributeValue::List(values)));
    }

    coerce(&value, attribute, options).map(Some)
}

/// Literal key first, then a nested path split by the delimiter
fn lookup(raw: &JsonValue, external_id: &str, delimiter: &str) -> Option<JsonValue> {
    if let Some(value) = raw.get(external_id) {
        return Some(value.clone());
    }
    if delimiter.is_empty() || !external_id.contains(delimiter) {
        return None;
    }

    let mut current = raw;
    for part in external_id.split(delimiter) {
        current = current.get(part)?;
    }
    Some(current.clone())
}

fn coerce(
    value: &JsonValue,
    attribute: &AttributeConfig,
    options: &FlattenOptions,
) -> Result<AttributeValue> {
    let mismatch = || {
        Error::conversion(format!(
            "attribute '{}' value {value} cannot be converted to {:?}",
            attribute.id, attribute.attr_type
        ))
    };

    match attribute.attr_type {
        AttributeType::String => Ok(AttributeValue::String(match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })),
        AttributeType::Bool => match value {
            JsonValue::Bool(b) => Ok(AttributeValue::Bool(*b)),
            JsonValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(AttributeValue::Bool(true)),
                "false" | "0" => Ok(AttributeValue::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        AttributeType::Int64 => match value {
            JsonValue::Number(n) => n.as_i64().map(AttributeValue::Int64).ok_or_else(mismatch),
            JsonValue::String(s) => s
                .trim()
                .parse()
                .map(AttributeValue::Int64)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        AttributeType::Double => match value {
            JsonValue::Number(n) => n.as_f64().map(AttributeValue::Double).ok_or_else(mismatch),
            JsonValue::String(s) => s
                .trim()
                .parse()
                .map(AttributeValue::Double)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        AttributeType::DateTime => match value {
            JsonValue::String(s) => parse_date_time(s, options).map(AttributeValue::DateTime),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(AttributeValue::DateTime)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}

/// Parse a vendor date-time and normalize it to UTC
pub fn parse_date_time(value: &str, options: &FlattenOptions) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for layout in &options.date_time_formats {
        if layout.has_timezone {
            if let Ok(parsed) = DateTime::parse_from_str(value, &layout.format) {
                return Ok(parsed.with_timezone(&Utc));
            }
            continue;
        }

        let naive = NaiveDateTime::parse_from_str(value, &layout.format).ok().or_else(|| {
            NaiveDate::parse_from_str(value, &layout.format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });
        if let Some(naive) = naive {
            return localize(naive, options.local_time_zone_offset);
        }
    }

    Err(Error::conversion(format!(
        "'{value}' does not match any configured date-time format"
    )))
}

fn localize(naive: NaiveDateTime, offset_seconds: Option<i32>) -> Result<DateTime<Utc>> {
    let Some(seconds) = offset_seconds else {
        return Ok(naive.and_utc());
    };

    let offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
        Error::config(format!("local time zone offset {seconds}s is out of range"))
    })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::conversion(format!("ambiguous local date-time {naive}")))
}
