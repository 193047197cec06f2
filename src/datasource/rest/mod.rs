//! Definition-driven REST datasource
//!
//! Each vendor API is described by a YAML [`RestDefinition`] and served by
//! one [`RestAdapter`]. Built-in definitions live under `adapters/` and are
//! embedded in the binary.

mod adapter;
mod builtin;
mod loader;
mod source;
mod types;

pub use adapter::RestAdapter;
pub use builtin::{get_builtin, is_builtin, list_builtin};
pub use loader::{load_definition, load_definition_from_str, load_definitions_dir};
pub use types::{
    FilterDialect, RestDatasourceConfig, RestDefinition, RestEntity, RestMemberOf,
    RestPagination,
};
