//! Built-in REST definitions embedded in the binary
//!
//! Lets a definition be referenced by name (`servicenow`) instead of a path.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in definition YAML by name
pub static BUILTIN_DEFINITIONS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // ITSM
        m.insert("servicenow", include_str!("../../../adapters/servicenow.yaml"));

        // Developer Tools
        m.insert("github", include_str!("../../../adapters/github.yaml"));

        m
    });

/// Get a built-in definition by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_DEFINITIONS.get(name).copied()
}

/// Check if a name is a built-in definition
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_DEFINITIONS.contains_key(name)
}

/// List all built-in definition names, sorted
pub fn list_builtin() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTIN_DEFINITIONS.keys().copied().collect();
    names.sort_unstable();
    names
}
