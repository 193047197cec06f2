//! Authenticator implementation
//!
//! Applies request credentials to outgoing vendor requests. An OAuth2 token
//! is fetched at most once per request and dropped with the authenticator.

use super::types::AuthCredentials;
use crate::error::{Error, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

/// Applies one request's credentials to HTTP requests
pub struct Authenticator {
    credentials: Option<AuthCredentials>,
    token: OnceCell<String>,
    http_client: Client,
}

impl Authenticator {
    /// Create an authenticator sharing `http_client` for token requests
    pub fn new(credentials: Option<AuthCredentials>, http_client: Client) -> Self {
        Self {
            credentials,
            token: OnceCell::new(),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let Some(credentials) = &self.credentials else {
            return Ok(req);
        };

        match credentials {
            AuthCredentials::Basic { username, password } => {
                Ok(req.basic_auth(username, Some(password)))
            }

            AuthCredentials::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthCredentials::HttpAuthorization { header } => {
                Ok(req.header(AUTHORIZATION, header.as_str()))
            }

            AuthCredentials::ApiKey {
                header,
                value,
                prefix,
            } => {
                let value = format!("{}{value}", prefix.as_deref().unwrap_or(""));
                Ok(req.header(header.as_str(), value))
            }

            AuthCredentials::Oauth2ClientCredentials { .. } => {
                let token = self
                    .token
                    .get_or_try_init(|| self.fetch_oauth2_client_credentials(credentials))
                    .await?;
                Ok(req.bearer_auth(token))
            }

            AuthCredentials::AccessKey { .. } => Err(Error::auth(
                "access key credentials cannot be used for HTTP datasources",
            )),
        }
    }

    /// Fetch OAuth2 token using client credentials flow
    async fn fetch_oauth2_client_credentials(
        &self,
        credentials: &AuthCredentials,
    ) -> Result<String> {
        let AuthCredentials::Oauth2ClientCredentials {
            token_url,
            client_id,
            client_secret,
            scopes,
            token_body,
        } = credentials
        else {
            return Err(Error::auth("token fetch requires OAuth2 client credentials"));
        };

        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", client_id.clone()),
            ("client_secret", client_secret.clone()),
        ];

        if !scopes.is_empty() {
            form.push(("scope", scopes.join(" ")));
        }

        for (key, value) in token_body {
            form.push((key.as_str(), value.clone()));
        }

        debug!(token_url = %token_url, "Fetching OAuth2 token");

        let response = self
            .http_client
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::OAuth2 {
                message: format!("Token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.access_token)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .field("has_token", &self.token.initialized())
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}
