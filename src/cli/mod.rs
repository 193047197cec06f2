//! CLI module
//!
//! # Commands
//!
//! - `serve` - Serve `GetPage` over HTTP
//! - `get-page` - Fetch a single page with a REST definition
//! - `cursor decode|encode` - Inspect or build cursors
//! - `list` - List built-in definitions

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, CursorCommand};
pub use runner::{build_registry, Runner};
pub use server::{router, serve, ServerConfig};
