//! Pagination types and traits
//!
//! Defines the vendor-facing seams every paginator is written against.

use crate::cursor::CompositeCursor;
use crate::error::Result;
use crate::types::JsonObject;
use async_trait::async_trait;

/// One page as returned by a vendor list call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Raw vendor objects
    pub objects: Vec<JsonObject>,
    /// Vendor-native marker for the next page, `None` when exhausted
    pub next_marker: Option<String>,
}

impl ListPage {
    /// Create a page
    pub fn new(objects: Vec<JsonObject>, next_marker: Option<String>) -> Self {
        Self {
            objects,
            next_marker,
        }
    }

    /// Create the last page of a collection
    pub fn last(objects: Vec<JsonObject>) -> Self {
        Self {
            objects,
            next_marker: None,
        }
    }

    /// Check if this is the last page
    pub fn is_last(&self) -> bool {
        self.next_marker.is_none()
    }
}

/// One page for the caller plus the cursor that resumes the sync
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorPage {
    /// Objects for this page
    pub objects: Vec<JsonObject>,
    /// Cursor for the next call, `None` when the sync is complete
    pub next_cursor: Option<CompositeCursor>,
}

impl CursorPage {
    /// Create a page
    pub fn new(objects: Vec<JsonObject>, next_cursor: Option<CompositeCursor>) -> Self {
        Self {
            objects,
            next_cursor,
        }
    }

    /// An empty page that ends the sync
    pub fn done() -> Self {
        Self::default()
    }

    /// Check if the sync is complete
    pub fn is_done(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// A single vendor collection
#[async_trait]
pub trait CollectionLister: Send + Sync {
    /// Fetch one page starting at `marker` (`None` = beginning)
    async fn list(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage>;
}

/// An outer collection whose items each own an inner member collection
#[async_trait]
pub trait MemberSource: Send + Sync {
    /// Fetch one page of outer items (e.g. groups)
    async fn list_collections(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage>;

    /// Fetch one page of the members of the outer item `collection_id`
    async fn list_members(
        &self,
        collection_id: &str,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage>;
}

/// How outer and member objects are identified and linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIdentifiers {
    /// Attribute of the outer object holding its unique value (e.g. `GroupName`)
    pub collection_unique_attribute: String,
    /// Attribute written into each member object carrying the outer unique value
    pub collection_attribute: String,
    /// Attribute of the member object holding its unique value (e.g. `UserName`)
    pub member_unique_attribute: String,
}

impl MemberIdentifiers {
    /// Create identifiers
    pub fn new(
        collection_unique_attribute: impl Into<String>,
        collection_attribute: impl Into<String>,
        member_unique_attribute: impl Into<String>,
    ) -> Self {
        Self {
            collection_unique_attribute: collection_unique_attribute.into(),
            collection_attribute: collection_attribute.into(),
            member_unique_attribute: member_unique_attribute.into(),
        }
    }
}
