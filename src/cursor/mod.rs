//! Cursor module
//!
//! Opaque pagination tokens handed back to the caller between `GetPage` calls.
//!
//! # Overview
//!
//! All pagination state lives in the caller-held cursor string. The
//! structures here carry up to three independent position markers
//! ([`CompositeCursor`]), the per-account position used for cross-account
//! iteration ([`AccountCursor`]) and the advanced filter positions
//! ([`AdvancedFilterCursor`]). Every one of them travels as base64 encoded
//! JSON; account cursors are nested as a string inside a composite cursor.

mod codec;
mod types;

pub use codec::{marshal, marshal_string, unmarshal};
pub use types::{
    AccountCursor, AdvancedFilterCursor, CompositeCursor, ImplicitFilterCursor,
    RelatedFilterCursor,
};
