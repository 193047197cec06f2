// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Adapters
//!
//! Paginated object retrieval for identity and ITSM datasources.
//!
//! Every adapter answers one question: *give me the next page of entity X*.
//! A sync is driven by the caller, which passes back the opaque cursor of the
//! previous response until it comes back empty. The adapter keeps no state
//! between calls; everything needed to resume lives in the cursor.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_adapters::cli::build_registry;
//! use solidafy_adapters::config::AdapterConfig;
//! use solidafy_adapters::datasource::rest::load_definition;
//! use std::sync::Arc;
//!
//! let registry = build_registry(
//!     Arc::new(AdapterConfig::default()),
//!     [load_definition("servicenow")?],
//! )?;
//!
//! let mut request: GetPageRequest = serde_json::from_str(request_json)?;
//! loop {
//!     let page = registry.handle(&request).await?;
//!     // Process page.objects
//!     if page.is_last() {
//!         break;
//!     }
//!     request.cursor = page.next_cursor;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              AdapterRegistry::handle(GetPageRequest)              │
//! │   page size / entity checks → dispatch → AdapterError mapping     │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────────┬───────────────┴───────────────┬─────────────────┐
//! │  Datasources  │          Pagination           │    Assembly     │
//! ├───────────────┼───────────────────────────────┼─────────────────┤
//! │ REST (YAML)   │ Single collection             │ Flatten         │
//! │ AWS IAM       │ Member (two-level)            │ Typed values    │
//! │               │ Multi-account                 │ Child entities  │
//! │               │ Advanced filters              │ Cursor encoding │
//! └───────────────┴───────────────────────────────┴─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and wire error codes
pub mod error;

/// Common types and type aliases
pub mod types;

/// Datasource credentials
pub mod auth;

/// HTTP client with rate limiting
pub mod http;

/// Composite cursors and their codec
pub mod cursor;

/// Single-collection, member and multi-account pagination
pub mod pagination;

/// Advanced (implicit and related) filters
pub mod filter;

/// Record extraction and object flattening
pub mod decode;

/// GetPage envelopes and response assembly
pub mod engine;

/// Entity metadata
pub mod entity;

/// Adapter trait and registry
pub mod adapter;

/// Datasource adapters
pub mod datasource;

/// Adapter limits
pub mod config;

/// Template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use adapter::{Adapter, AdapterRegistry};
pub use engine::{GetPageRequest, GetPageResponse};
pub use error::{AdapterError, Error, ErrorCode, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
