//! CLI runner - executes commands

use crate::adapter::AdapterRegistry;
use crate::cli::commands::{Cli, Commands, CursorCommand};
use crate::cli::server::{self, ServerConfig};
use crate::config::AdapterConfig;
use crate::cursor;
use crate::datasource::rest::{
    get_builtin, list_builtin, load_definition, load_definition_from_str, load_definitions_dir,
    RestAdapter, RestDefinition,
};
use crate::engine::GetPageRequest;
use crate::error::{Error, Result, ResultExt};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Serve {
                port,
                definitions_dir,
            } => self.serve(*port, definitions_dir.as_deref()).await,
            Commands::GetPage {
                definition,
                request,
            } => self.get_page(definition, request).await,
            Commands::Cursor { command } => match command {
                CursorCommand::Decode { value } => decode_cursor(value),
                CursorCommand::Encode { json } => encode_cursor(json),
            },
            Commands::List => list_definitions(),
        }
    }

    /// Load adapter limits
    fn load_config(&self) -> Result<Arc<AdapterConfig>> {
        let config = match &self.cli.config {
            Some(path) => AdapterConfig::load(path)?,
            None => AdapterConfig::default(),
        };
        Ok(Arc::new(config))
    }

    async fn serve(&self, port: u16, definitions_dir: Option<&Path>) -> Result<()> {
        let definitions = match definitions_dir {
            Some(dir) => load_definitions_dir(dir)?,
            None => list_builtin()
                .into_iter()
                .filter_map(get_builtin)
                .map(load_definition_from_str)
                .collect::<Result<Vec<_>>>()?,
        };

        let registry = build_registry(self.load_config()?, definitions)?;
        info!(datasource_types = ?registry.datasource_types(), "Loaded adapters");

        server::serve(registry, ServerConfig { port }).await
    }

    async fn get_page(&self, definition: &str, request: &Path) -> Result<()> {
        let definition = load_definition(definition)?;
        let registry = build_registry(self.load_config()?, [definition])?;

        let content = fs::read_to_string(request)
            .with_context(|| format!("Failed to read request file '{}'", request.display()))?;
        let request: GetPageRequest = serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid GetPage request JSON: {e}")))?;

        match registry.handle(&request).await {
            Ok(response) => {
                print_json(&json!(response));
                Ok(())
            }
            Err(error) => {
                print_json(&json!({ "error": error }));
                Err(Error::Other(error.to_string()))
            }
        }
    }
}

/// Registry with one REST adapter per definition
pub fn build_registry(
    config: Arc<AdapterConfig>,
    definitions: impl IntoIterator<Item = RestDefinition>,
) -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new(Arc::clone(&config));
    for definition in definitions {
        let adapter = RestAdapter::new(Arc::clone(&config), Arc::new(definition))?;
        registry.register(Arc::new(adapter))?;
    }
    Ok(registry)
}

fn decode_cursor(value: &str) -> Result<()> {
    let decoded = cursor::unmarshal::<Value>(value.trim())?;
    print_json(&decoded.unwrap_or(Value::Null));
    Ok(())
}

fn encode_cursor(json: &str) -> Result<()> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::cursor(format!("cursor is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(Error::cursor("cursor JSON must be an object"));
    }
    println!("{}", cursor::marshal_string(&value)?);
    Ok(())
}

fn list_definitions() -> Result<()> {
    let definitions = list_builtin()
        .into_iter()
        .filter_map(get_builtin)
        .map(load_definition_from_str)
        .collect::<Result<Vec<_>>>()?;

    let listed: Vec<Value> = definitions
        .iter()
        .map(|definition| {
            let entities: Vec<Value> = definition
                .entities
                .iter()
                .map(|(id, entity)| {
                    json!({
                        "id": id,
                        "unique_attribute": entity.unique_attribute,
                        "member_of": entity.member_of.as_ref().map(|m| &m.collection),
                    })
                })
                .collect();
            json!({ "name": definition.name, "entities": entities })
        })
        .collect();

    print_json(&json!({ "definitions": listed }));
    Ok(())
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
