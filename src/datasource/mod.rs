//! Datasource adapters
//!
//! - [`rest`]: vendors described by YAML definitions
//! - [`iam`]: AWS IAM, through an embedder-supplied SDK binding

pub mod iam;
pub mod rest;
