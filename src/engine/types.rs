//! Engine types
//!
//! The `GetPage` request and response envelopes.

use crate::auth::AuthCredentials;
use crate::decode::{EntityConfig, Object};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A request for one page of objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPageRequest {
    pub datasource: DatasourceConfig,
    pub entity: EntityConfig,
    pub page_size: usize,
    /// Opaque cursor from the previous response; empty on the first call
    #[serde(default)]
    pub cursor: String,
}

/// Datasource identity, credentials and adapter-specific config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceConfig {
    pub id: String,

    /// Adapter type the registry dispatches on
    #[serde(rename = "type")]
    pub datasource_type: String,

    /// Vendor base address
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub auth: Option<AuthCredentials>,

    /// Adapter-specific JSON config
    #[serde(default)]
    pub config: JsonValue,
}

impl DatasourceConfig {
    /// Parse the adapter-specific config.
    ///
    /// A missing config parses as an empty object.
    pub fn parse_config<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.config {
            JsonValue::Null => JsonValue::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| {
            Error::datasource(format!(
                "datasource '{}' has an invalid '{}' config: {e}",
                self.id, self.datasource_type
            ))
        })
    }
}

/// One page of flattened objects
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPageResponse {
    pub objects: Vec<Object>,
    /// Cursor for the next call; empty once the sync is complete
    pub next_cursor: String,
}

impl GetPageResponse {
    /// Check if the sync is complete
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }
}
