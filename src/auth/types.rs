//! Auth credential types
//!
//! Credentials arrive with every `GetPage` request and live only for that
//! request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Datasource credentials carried by a request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthCredentials {
    /// HTTP Basic authentication
    Basic { username: String, password: String },

    /// Bearer token authentication
    Bearer { token: String },

    /// A complete `Authorization` header value
    HttpAuthorization { header: String },

    /// API key in a named header
    ApiKey {
        header: String,
        value: String,
        /// Prefix added before the value (e.g. "SSWS ")
        #[serde(default)]
        prefix: Option<String>,
    },

    /// OAuth2 client credentials flow
    Oauth2ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
        /// Additional token request body parameters
        #[serde(default)]
        token_body: HashMap<String, String>,
    },

    /// Temporary cloud credentials (access key pair)
    AccessKey {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default)]
        session_token: Option<String>,
    },
}

impl AuthCredentials {
    /// Name of the credential kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::HttpAuthorization { .. } => "http_authorization",
            Self::ApiKey { .. } => "api_key",
            Self::Oauth2ClientCredentials { .. } => "oauth2_client_credentials",
            Self::AccessKey { .. } => "access_key",
        }
    }
}

impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .finish_non_exhaustive(),
            Self::Oauth2ClientCredentials {
                token_url,
                client_id,
                scopes,
                ..
            } => f
                .debug_struct("Oauth2ClientCredentials")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .field("scopes", scopes)
                .finish_non_exhaustive(),
            Self::AccessKey { access_key_id, .. } => f
                .debug_struct("AccessKey")
                .field("access_key_id", access_key_id)
                .finish_non_exhaustive(),
            other => write!(f, "{}(<redacted>)", other.kind()),
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_deserialize_tagged() {
        let creds: AuthCredentials = serde_json::from_value(json!({
            "type": "api_key",
            "header": "Authorization",
            "value": "secret",
            "prefix": "SSWS "
        }))
        .unwrap();
        assert_eq!(creds.kind(), "api_key");

        let creds: AuthCredentials = serde_json::from_value(json!({
            "type": "oauth2_client_credentials",
            "token_url": "https://idp/token",
            "client_id": "id",
            "client_secret": "s"
        }))
        .unwrap();
        assert!(matches!(
            creds,
            AuthCredentials::Oauth2ClientCredentials { ref scopes, .. } if scopes.is_empty()
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = AuthCredentials::Basic {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));

        let rendered = format!(
            "{:?}",
            AuthCredentials::Bearer {
                token: "tok".to_string()
            }
        );
        assert_eq!(rendered, "bearer(<redacted>)");
    }
}
