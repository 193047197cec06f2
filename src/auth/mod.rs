//! Authentication module
//!
//! Supports: Basic, Bearer, raw Authorization header, API key header,
//! OAuth2 client credentials
//!
//! Credentials are request-scoped: an [`Authenticator`] is built for one
//! `GetPage` call and any token it fetches is dropped with it.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthCredentials;
