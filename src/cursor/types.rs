//! Cursor types
//!
//! Field names follow the wire format (`cursor`, `collectionId`,
//! `collectionCursor`, ...). Unset fields are omitted when encoding and
//! unknown fields are rejected when decoding, so a cursor of one kind never
//! decodes as another.

use serde::{Deserialize, Serialize};

/// Position within up to two nested collections.
///
/// `cursor` tracks the current (inner, or only) collection, `collection_id`
/// names the outer item being iterated and `collection_cursor` is the marker
/// used to fetch the next outer item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompositeCursor<T = String> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_cursor: Option<T>,
}

impl<T> Default for CompositeCursor<T> {
    fn default() -> Self {
        Self {
            cursor: None,
            collection_id: None,
            collection_cursor: None,
        }
    }
}

impl<T> CompositeCursor<T> {
    /// Cursor positioned within a single collection
    pub fn with_cursor(cursor: T) -> Self {
        Self {
            cursor: Some(cursor),
            ..Default::default()
        }
    }

    /// Cursor positioned between two outer items
    pub fn with_collection_cursor(collection_cursor: T) -> Self {
        Self {
            collection_cursor: Some(collection_cursor),
            ..Default::default()
        }
    }

    /// True when no field is set. Such a cursor carries no position.
    pub fn is_empty(&self) -> bool {
        self.cursor.is_none() && self.collection_id.is_none() && self.collection_cursor.is_none()
    }
}

/// Position within a list of resource accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountCursor<T = String> {
    /// Index into the configured resource account roles
    #[serde(default)]
    pub offset: usize,
    /// Vendor-native marker within that account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<T>,
}

impl<T> Default for AccountCursor<T> {
    fn default() -> Self {
        Self {
            offset: 0,
            next_marker: None,
        }
    }
}

impl<T> AccountCursor<T> {
    /// Create an account cursor
    pub fn new(offset: usize, next_marker: Option<T>) -> Self {
        Self {
            offset,
            next_marker,
        }
    }
}

/// Position within the implicit (scope x member) filter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImplicitFilterCursor {
    #[serde(default)]
    pub entity_filter_index: usize,
    #[serde(default)]
    pub member_filter_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CompositeCursor>,
}

/// Position within the related-entity filter list.
///
/// `related_entity_cursor` is the position that produced the current batch of
/// related IDs, so the batch can be fetched again on the next call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelatedFilterCursor {
    #[serde(default)]
    pub entity_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_cursor: Option<CompositeCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_cursor: Option<CompositeCursor>,
}

/// Cursor for advanced-filter syncs. At most one side is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvancedFilterCursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_filter_cursor: Option<ImplicitFilterCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_filter_cursor: Option<RelatedFilterCursor>,
}

impl AdvancedFilterCursor {
    /// Wrap an implicit filter position
    pub fn implicit(cursor: ImplicitFilterCursor) -> Self {
        Self {
            implicit_filter_cursor: Some(cursor),
            related_filter_cursor: None,
        }
    }

    /// Wrap a related filter position
    pub fn related(cursor: RelatedFilterCursor) -> Self {
        Self {
            implicit_filter_cursor: None,
            related_filter_cursor: Some(cursor),
        }
    }

    /// True when neither side is populated
    pub fn is_empty(&self) -> bool {
        self.implicit_filter_cursor.is_none() && self.related_filter_cursor.is_none()
    }
}
