//! Base64/JSON cursor codec
//!
//! An empty string always means "no cursor": at the start of a sync it is
//! what the caller sends, at the end it is what the adapter returns.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a cursor for the caller. `None` encodes to the empty string.
pub fn marshal<C: Serialize>(cursor: Option<&C>) -> Result<String> {
    match cursor {
        None => Ok(String::new()),
        Some(cursor) => {
            let json = serde_json::to_vec(cursor)
                .map_err(|e| Error::Other(format!("Failed to encode cursor: {e}")))?;
            Ok(STANDARD.encode(json))
        }
    }
}

/// Encode a cursor that is known to exist
pub fn marshal_string<C: Serialize>(cursor: &C) -> Result<String> {
    marshal(Some(cursor))
}

/// Decode a caller-supplied cursor. The empty string decodes to `None`.
///
/// Malformed input is always an error, never a silent restart.
pub fn unmarshal<C: DeserializeOwned>(encoded: &str) -> Result<Option<C>> {
    if encoded.is_empty() {
        return Ok(None);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| Error::cursor(format!("failed to decode base64 cursor: {e}")))?;

    let cursor = serde_json::from_slice(&bytes)
        .map_err(|e| Error::cursor(format!("failed to unmarshal JSON cursor: {e}")))?;

    Ok(Some(cursor))
}
