//! Response decoding and flattening
//!
//! # Overview
//!
//! Vendor responses are decoded in two steps:
//!
//! 1. [`extract_records`] pulls the array of raw objects out of a response
//!    body using the datasource's record path
//! 2. [`flatten_object`] turns each raw object into an [`Object`] with the
//!    requested, typed attributes
//!
//! Attribute external ids are literal keys, nested paths joined by the
//! configured delimiter (`manager__value`), or JSONPath expressions
//! (`$.emails[*].value`). Date-times are normalized to UTC.

mod flatten;
mod records;
mod types;

pub use flatten::{flatten_object, parse_date_time};
pub use records::{extract_path, extract_records, extract_with_jsonpath};
pub use types::{
    AttributeConfig, AttributeType, AttributeValue, DateTimeFormat, EntityConfig,
    FlattenOptions, Object, DEFAULT_NESTED_DELIMITER,
};
