//! YAML loader for REST definitions
//!
//! Definitions are loaded by built-in name (e.g. `servicenow`), from a single
//! YAML file, or from every `*.yaml` / `*.yml` file of a directory.

use super::builtin;
use super::types::{RestDefinition, RestPagination};
use crate::error::{Error, Result};
use crate::template::extract_variables;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a definition from a built-in name or a file path
pub fn load_definition(path: impl AsRef<Path>) -> Result<RestDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = builtin::get_builtin(&path_str) {
            return load_definition_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Definition '{}' not found. Built-in definitions: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read definition file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_definition_from_str(&content)
}

/// Load a definition from a YAML string
pub fn load_definition_from_str(yaml: &str) -> Result<RestDefinition> {
    let definition: RestDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse definition YAML: {e}")))?;

    validate_definition(&definition)?;
    Ok(definition)
}

/// Load every definition in a directory, sorted by file name
pub fn load_definitions_dir(dir: impl AsRef<Path>) -> Result<Vec<RestDefinition>> {
    let dir = dir.as_ref();
    let mut paths = fs::read_dir(dir)
        .map_err(|e| {
            Error::config(format!(
                "Failed to read definitions directory '{}': {e}",
                dir.display()
            ))
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect::<Vec<_>>();
    paths.sort();

    let mut definitions = Vec::with_capacity(paths.len());
    for path in paths {
        let definition = load_definition(&path).map_err(|e| {
            Error::config(format!("{}: {e}", path.display()))
        })?;
        debug!(name = %definition.name, path = %path.display(), "Loaded REST definition");
        definitions.push(definition);
    }
    Ok(definitions)
}

/// Validate a definition
fn validate_definition(definition: &RestDefinition) -> Result<()> {
    if definition.name.is_empty() {
        return Err(Error::config("Definition name cannot be empty"));
    }

    if definition.entities.is_empty() {
        return Err(Error::config(format!(
            "Definition '{}' must define at least one entity",
            definition.name
        )));
    }

    if let Some(filter) = &definition.filter {
        if filter.param.is_empty() {
            return Err(Error::config(format!(
                "Definition '{}' filter param cannot be empty",
                definition.name
            )));
        }
        for variable in extract_variables(&filter.in_template) {
            if variable != "attribute" && variable != "values" {
                return Err(Error::config(format!(
                    "Definition '{}' filter template uses unknown variable '{variable}'",
                    definition.name
                )));
            }
        }
    }

    for (id, entity) in &definition.entities {
        if entity.path.is_empty() {
            return Err(Error::config(format!("Entity '{id}' path cannot be empty")));
        }
        if entity.unique_attribute.is_empty() {
            return Err(Error::config(format!(
                "Entity '{id}' unique_attribute cannot be empty"
            )));
        }

        let uses_collection = std::iter::once(&entity.path)
            .chain(entity.query.values())
            .flat_map(|template| extract_variables(template))
            .any(|v| v.starts_with("collection."));
        match (&entity.member_of, uses_collection) {
            (Some(_), false) => {
                return Err(Error::config(format!(
                    "Member entity '{id}' must reference {{{{ collection.id }}}} in its path or query"
                )));
            }
            (None, true) => {
                return Err(Error::config(format!(
                    "Entity '{id}' references the collection but has no member_of"
                )));
            }
            _ => {}
        }

        if let Some(member_of) = entity.member_of.as_ref().filter(|m| m.resolve_members) {
            let Some(member_entity) = member_of.member_entity.as_deref() else {
                return Err(Error::config(format!(
                    "Entity '{id}' resolves members but names no member_entity"
                )));
            };
            if !definition.entities.contains_key(member_entity) {
                return Err(Error::config(format!(
                    "Entity '{id}' resolves members of unknown entity '{member_entity}'"
                )));
            }
            if definition.filter.is_none() {
                return Err(Error::config(format!(
                    "Entity '{id}' resolves members but definition '{}' has no filter dialect",
                    definition.name
                )));
            }
        }

        if let RestPagination::Token { token_path, .. } = &entity.pagination {
            if token_path.is_empty() {
                return Err(Error::config(format!(
                    "Entity '{id}' token pagination needs a token_path"
                )));
            }
        }
    }

    // Checks member_of targets
    definition.registry()?;

    Ok(())
}
