//! Flattening types
//!
//! Entity configuration arrives with every request; output objects are
//! statically typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Options
// ============================================================================

/// Default delimiter for nested attribute paths (`manager__value`)
pub const DEFAULT_NESTED_DELIMITER: &str = "__";

/// Datasource-level flattening options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlattenOptions {
    /// Delimiter splitting an external id into a nested path
    pub nested_delimiter: String,

    /// Accepted date-time layouts, tried in order after RFC 3339
    pub date_time_formats: Vec<DateTimeFormat>,

    /// Offset in seconds east of UTC for layouts without a zone
    pub local_time_zone_offset: Option<i32>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            nested_delimiter: DEFAULT_NESTED_DELIMITER.to_string(),
            date_time_formats: vec![
                DateTimeFormat::new("%Y-%m-%dT%H:%M:%S%.f%z", true),
                DateTimeFormat::new("%Y-%m-%d %H:%M:%S", false),
                DateTimeFormat::new("%Y-%m-%d", false),
            ],
            local_time_zone_offset: None,
        }
    }
}

/// A chrono `strftime` layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeFormat {
    pub format: String,
    #[serde(default)]
    pub has_timezone: bool,
}

impl DateTimeFormat {
    /// Create a date-time layout
    pub fn new(format: impl Into<String>, has_timezone: bool) -> Self {
        Self {
            format: format.into(),
            has_timezone,
        }
    }
}

// ============================================================================
// Entity Configuration
// ============================================================================

/// Requested entity and the attributes to extract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    /// Caller-side entity id, used as the key for child objects
    pub id: String,

    /// Vendor entity name
    pub external_id: String,

    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,

    /// Nested arrays of objects flattened with their own configuration
    #[serde(default)]
    pub child_entities: Vec<EntityConfig>,
}

impl EntityConfig {
    /// Attribute flagged as the unique id
    pub fn unique_id_attribute(&self) -> Option<&AttributeConfig> {
        self.attributes.iter().find(|a| a.unique_id)
    }
}

/// One attribute to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConfig {
    /// Output attribute id
    pub id: String,

    /// Vendor field: literal key, nested path or JSONPath (`$...`)
    pub external_id: String,

    #[serde(rename = "type", default)]
    pub attr_type: AttributeType,

    #[serde(default)]
    pub list: bool,

    #[serde(default)]
    pub unique_id: bool,
}

impl AttributeConfig {
    /// Create a single-valued attribute
    pub fn new(
        id: impl Into<String>,
        external_id: impl Into<String>,
        attr_type: AttributeType,
    ) -> Self {
        Self {
            id: id.into(),
            external_id: external_id.into(),
            attr_type,
            list: false,
            unique_id: false,
        }
    }

    /// Mark as list-valued
    #[must_use]
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// Mark as the unique id
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique_id = true;
        self
    }
}

/// Declared attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Bool,
    Int64,
    Double,
    DateTime,
}

// ============================================================================
// Output
// ============================================================================

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int64(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    List(Vec<AttributeValue>),
}

/// A flattened object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub attributes: BTreeMap<String, AttributeValue>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub child_objects: BTreeMap<String, Vec<Object>>,
}

impl Object {
    /// Get an attribute value
    pub fn get(&self, id: &str) -> Option<&AttributeValue> {
        self.attributes.get(id)
    }
}
