//! CLI commands and argument parsing

use crate::types::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated object retrieval adapters
#[derive(Parser, Debug)]
#[command(name = "solidafy-adapters")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Adapter limits file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (same as `--log-level debug`)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve GetPage over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Directory of REST definition YAML files (default: built-in definitions)
        #[arg(long)]
        definitions_dir: Option<PathBuf>,
    },

    /// Fetch one page with a REST definition
    GetPage {
        /// Built-in definition name or path to a definition YAML file
        #[arg(short, long)]
        definition: String,

        /// GetPage request JSON file
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Inspect or build cursors
    Cursor {
        #[command(subcommand)]
        command: CursorCommand,
    },

    /// List built-in definitions and their entities
    List,
}

/// Cursor subcommands
#[derive(Subcommand, Debug)]
pub enum CursorCommand {
    /// Print the JSON inside a cursor
    Decode {
        /// Cursor as returned in `nextCursor`
        value: String,
    },

    /// Encode a cursor JSON document
    Encode {
        /// Cursor JSON, e.g. '{"cursor":"2"}'
        json: String,
    },
}

impl Cli {
    /// Effective log level
    pub fn level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            self.log_level.into()
        }
    }
}
