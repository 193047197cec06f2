//! Adapter-wide configuration
//!
//! Limits applied to every `GetPage` request regardless of datasource,
//! loaded from YAML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Limits shared by all adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Largest page size a caller may request
    pub max_page_size: usize,

    /// Largest number of resource account roles a datasource may list
    pub max_resource_accounts: usize,

    /// Timeout for all vendor calls of one request, unless the datasource
    /// config overrides it
    pub request_timeout_seconds: u64,

    /// Detail fetches in flight per request, unless the datasource config
    /// overrides it
    pub max_concurrency: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
            max_resource_accounts: 100,
            request_timeout_seconds: 30,
            max_concurrency: 10,
        }
    }
}

impl AdapterConfig {
    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse adapter config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(Error::config("max_page_size must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("max_concurrency must be at least 1"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(Error::config("request_timeout_seconds must be at least 1"));
        }
        Ok(())
    }

    /// Request timeout, with an optional per-datasource override
    pub fn request_timeout(&self, override_seconds: Option<u64>) -> Duration {
        Duration::from_secs(
            override_seconds
                .filter(|s| *s > 0)
                .unwrap_or(self.request_timeout_seconds),
        )
    }

    /// Detail fetch concurrency, with an optional per-datasource override
    pub fn concurrency(&self, override_value: Option<usize>) -> usize {
        override_value
            .filter(|c| *c > 0)
            .unwrap_or(self.max_concurrency)
    }

    /// Check a requested page size against the limits
    pub fn check_page_size(&self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(Error::page_request("page size must be greater than 0"));
        }
        if page_size > self.max_page_size {
            return Err(Error::PageSizeTooLarge {
                requested: page_size,
                max: self.max_page_size,
            });
        }
        Ok(())
    }

    /// Check a resource account list against the limits
    pub fn check_resource_accounts(&self, count: usize) -> Result<()> {
        if count > self.max_resource_accounts {
            return Err(Error::TooManyResourceAccounts {
                count,
                max: self.max_resource_accounts,
            });
        }
        Ok(())
    }
}
