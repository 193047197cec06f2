//! Pagination module
//!
//! Supports: single collections, two-level member collections, resource
//! account iteration and client-side slicing
//!
//! # Overview
//!
//! Vendor list calls take a native marker and return `(items, next_marker)`.
//! The paginators here turn one such call (or a short, fixed sequence of
//! them) into one page for the caller, and compute the [`CompositeCursor`]
//! that resumes the sync on the next call.
//!
//! [`CompositeCursor`]: crate::cursor::CompositeCursor

mod accounts;
mod member;
mod single;
mod types;

pub use accounts::{AccountIterator, Credentials, RoleAssumer};
pub use member::{lookup_path, unique_value, MemberPaginator};
pub use single::{paginate_single, slice_page};
pub use types::{CollectionLister, CursorPage, ListPage, MemberIdentifiers, MemberSource};
