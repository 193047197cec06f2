//! Two-level member pagination
//!
//! Iterates an outer collection (e.g. groups) one item at a time and pages
//! through each item's members. Only the identity of the current outer item
//! is ever held; the next outer item is found with a size-1 "peek" call.
//!
//! Cursor transitions:
//!
//! | incoming                          | inner result  | outgoing                                  |
//! |-----------------------------------|---------------|-------------------------------------------|
//! | no `collectionId`                 | -             | peek outer at `collectionCursor`          |
//! | `collectionId` = g                | next marker m | `{cursor: m, collectionId: g, collectionCursor}` |
//! | `collectionId` = g                | exhausted     | `{collectionCursor}` or done if outer is exhausted |

use super::types::{CursorPage, MemberIdentifiers, MemberSource};
use crate::cursor::CompositeCursor;
use crate::error::{Error, Result};
use crate::types::{scalar_to_string, JsonObject, JsonValue};
use tracing::debug;

/// Attribute holding the synthesized unique id of a member object
pub const ID_ATTRIBUTE: &str = "id";

/// Paginator for entities that are members of another entity
#[derive(Debug, Clone)]
pub struct MemberPaginator {
    identifiers: MemberIdentifiers,
    tag: bool,
}

impl MemberPaginator {
    /// Create a member paginator that tags members with their collection
    pub fn new(identifiers: MemberIdentifiers) -> Self {
        Self {
            identifiers,
            tag: true,
        }
    }

    /// Create a member paginator that returns members unchanged.
    ///
    /// Used when the members are the requested entity itself and the outer
    /// collection only narrows the scope.
    pub fn scoped(identifiers: MemberIdentifiers) -> Self {
        Self {
            identifiers,
            tag: false,
        }
    }

    /// Fetch one page of members.
    pub async fn get_page(
        &self,
        source: &dyn MemberSource,
        cursor: Option<CompositeCursor>,
        page_size: usize,
    ) -> Result<CursorPage> {
        let cursor = cursor.unwrap_or_default();

        let (collection_id, collection_cursor, inner_marker) = match cursor.collection_id {
            Some(collection_id) => (collection_id, cursor.collection_cursor, cursor.cursor),
            None => {
                if cursor.cursor.is_some() {
                    return Err(Error::cursor(
                        "cursor carries a member position without a collection id",
                    ));
                }

                let outer = source
                    .list_collections(cursor.collection_cursor.as_deref(), 1)
                    .await?;

                let Some(first) = outer.objects.first() else {
                    debug!(
                        has_next = outer.next_marker.is_some(),
                        "Outer collection returned no items"
                    );
                    return Ok(CursorPage::new(
                        Vec::new(),
                        outer.next_marker.map(CompositeCursor::with_collection_cursor),
                    ));
                };

                let collection_id =
                    unique_value(first, &self.identifiers.collection_unique_attribute)?;
                debug!(collection_id = %collection_id, "Advanced to next outer item");
                (collection_id, outer.next_marker, None)
            }
        };

        let inner = source
            .list_members(&collection_id, inner_marker.as_deref(), page_size)
            .await?;

        let mut objects = inner.objects;
        if self.tag {
            for object in &mut objects {
                self.tag_member(object, &collection_id)?;
            }
        }

        let next_cursor = match inner.next_marker {
            Some(marker) => Some(CompositeCursor {
                cursor: Some(marker),
                collection_id: Some(collection_id),
                collection_cursor,
            }),
            None => collection_cursor.map(CompositeCursor::with_collection_cursor),
        };

        Ok(CursorPage::new(objects, next_cursor))
    }

    /// Add the synthesized id and the outer unique value to a member object
    pub fn tag_member(&self, object: &mut JsonObject, collection_id: &str) -> Result<()> {
        let member_id = unique_value(object, &self.identifiers.member_unique_attribute)?;

        object.insert(
            ID_ATTRIBUTE.to_string(),
            JsonValue::String(format!("{member_id}-{collection_id}")),
        );
        object.insert(
            self.identifiers.collection_attribute.clone(),
            JsonValue::String(collection_id.to_string()),
        );

        Ok(())
    }
}

/// Look up a dotted path (`user.value`) in an object
pub fn lookup_path<'a>(object: &'a JsonObject, path: &str) -> Option<&'a JsonValue> {
    if let Some(value) = object.get(path) {
        return Some(value);
    }

    let mut parts = path.split('.');
    let mut current = object.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Extract the unique value of an object as a string
pub fn unique_value(object: &JsonObject, attribute: &str) -> Result<String> {
    lookup_path(object, attribute)
        .and_then(scalar_to_string)
        .ok_or_else(|| {
            Error::conversion(format!(
                "object is missing a value for unique attribute '{attribute}'"
            ))
        })
}
