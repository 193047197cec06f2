//! Error types for Solidafy adapters
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! At the request boundary every `Error` collapses into an [`AdapterError`],
//! a stable `(code, message)` pair.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Solidafy adapters
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid datasource config: {message}")]
    InvalidDatasourceConfig { message: String },

    #[error("Invalid entity config: {message}")]
    InvalidEntityConfig { message: String },

    #[error("Entity '{entity}' is not supported by this adapter")]
    UnsupportedEntity { entity: String },

    #[error("Page size {requested} exceeds the maximum of {max}")]
    PageSizeTooLarge { requested: usize, max: usize },

    #[error("{count} resource accounts configured, the maximum is {max}")]
    TooManyResourceAccounts { count: usize, max: usize },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Page Request Errors
    // ============================================================================
    #[error("Invalid page request config: {message}")]
    InvalidPageRequest { message: String },

    #[error("Invalid cursor: {message}")]
    InvalidCursor { message: String },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("OAuth2 error: {message}")]
    OAuth2 { message: String },

    // ============================================================================
    // HTTP / Vendor Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request did not complete within the configured request timeout of {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Vendor API error: {message}")]
    Vendor {
        status: Option<u16>,
        message: String,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("Failed to convert object: {message}")]
    Conversion { message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid datasource config error
    pub fn datasource(message: impl Into<String>) -> Self {
        Self::InvalidDatasourceConfig {
            message: message.into(),
        }
    }

    /// Create an invalid entity config error
    pub fn entity(message: impl Into<String>) -> Self {
        Self::InvalidEntityConfig {
            message: message.into(),
        }
    }

    /// Create an unsupported entity error
    pub fn unsupported_entity(entity: impl Into<String>) -> Self {
        Self::UnsupportedEntity {
            entity: entity.into(),
        }
    }

    /// Create an invalid page request error
    pub fn page_request(message: impl Into<String>) -> Self {
        Self::InvalidPageRequest {
            message: message.into(),
        }
    }

    /// Create an invalid cursor error
    pub fn cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a vendor error
    pub fn vendor(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Vendor {
            status,
            message: message.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Create a conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Stable error code reported to the caller
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidDatasourceConfig { .. }
            | Error::TooManyResourceAccounts { .. }
            | Error::Auth { .. }
            | Error::InvalidUrl(_) => ErrorCode::InvalidDatasourceConfig,
            Error::InvalidEntityConfig { .. } | Error::UnsupportedEntity { .. } => {
                ErrorCode::InvalidEntityConfig
            }
            Error::InvalidPageRequest { .. }
            | Error::InvalidCursor { .. }
            | Error::PageSizeTooLarge { .. } => ErrorCode::InvalidPageRequestConfig,
            _ => ErrorCode::Internal,
        }
    }

    /// HTTP status reported by the vendor, when one could be extracted
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Vendor { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable by an external retry layer
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::Vendor {
                status: Some(status),
                ..
            } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for Solidafy adapters
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes surfaced to the caller of `GetPage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The datasource config (address, auth, adapter config JSON) is invalid
    InvalidDatasourceConfig,
    /// The requested entity or its attributes are invalid
    InvalidEntityConfig,
    /// Page size or cursor is invalid
    InvalidPageRequestConfig,
    /// Vendor failure, conversion failure or timeout
    Internal,
}

impl ErrorCode {
    /// Whether the failure was caused by the caller's request rather than the adapter
    pub fn is_client_error(self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidDatasourceConfig => "invalid datasource config",
            Self::InvalidEntityConfig => "invalid entity config",
            Self::InvalidPageRequestConfig => "invalid page request config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Structured error returned over the request boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterError {
    /// Human-readable description
    pub message: String,
    /// Stable error code
    pub code: ErrorCode,
}

impl From<Error> for AdapterError {
    fn from(err: Error) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            code,
        }
    }
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for AdapterError {}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
