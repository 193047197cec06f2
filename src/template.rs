//! Template interpolation for REST definitions
//!
//! Handles `{{ variable }}` interpolation in endpoint paths, query values and
//! filter templates. Variables are looked up under three roots:
//!
//! - `config.*`: the request's datasource config
//! - `collection.*`: the outer object while paging member entities
//! - `vars.*` (or a bare name): values supplied by the caller, such as the
//!   attribute and values of a relation filter

use crate::error::{Error, Result};
use crate::types::JsonValue;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Datasource config values
    pub config: JsonValue,
    /// Current outer object
    pub collection: JsonValue,
    /// Additional variables
    pub vars: JsonValue,
}

impl TemplateContext {
    /// Create context with config values
    pub fn with_config(config: JsonValue) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Context for the members of the outer object `collection_id`
    #[must_use]
    pub fn for_collection(&self, collection_id: &str) -> Self {
        Self {
            config: self.config.clone(),
            collection: serde_json::json!({ "id": collection_id }),
            vars: self.vars.clone(),
        }
    }

    /// Set additional variables
    #[must_use]
    pub fn with_vars(mut self, vars: JsonValue) -> Self {
        self.vars = vars;
        self
    }

    /// Get a value by path (e.g., "config.instance")
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();

        let root = match parts[0] {
            "config" => &self.config,
            "collection" => &self.collection,
            "vars" => &self.vars,
            // Bare names are variables
            _ => return get_nested_value(&self.vars, &parts),
        };

        get_nested_value(root, &parts[1..])
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut current = value;
    for part in path {
        current = current.as_object()?.get(*part)?;
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut missing = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let full_match = &cap[0];
        let var_path = &cap[1];

        match ctx.get(var_path) {
            Some(JsonValue::Null) | None => missing.push(var_path.to_string()),
            Some(value) => {
                result = result.replace(full_match, &value_to_string(value)?);
            }
        }
    }

    if missing.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Null => Ok(String::new()),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(Error::template(format!(
            "cannot substitute a non-scalar value: {value}"
        ))),
    }
}
