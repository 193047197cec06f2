//! Single-collection pagination
//!
//! The vendor marker is carried verbatim in the `cursor` field.

use super::types::{CollectionLister, CursorPage, ListPage};
use crate::cursor::CompositeCursor;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use tracing::debug;

/// Fetch one page of a single collection.
///
/// The page size is handed to the vendor untouched; no buffering or
/// re-slicing happens here.
pub async fn paginate_single(
    lister: &dyn CollectionLister,
    cursor: Option<CompositeCursor>,
    page_size: usize,
) -> Result<CursorPage> {
    let marker = match cursor {
        Some(cursor) => {
            if cursor.collection_id.is_some() || cursor.collection_cursor.is_some() {
                return Err(Error::cursor(
                    "cursor carries a collection position for an entity without a parent collection",
                ));
            }
            cursor.cursor
        }
        None => None,
    };

    let page = lister.list(marker.as_deref(), page_size).await?;
    debug!(
        objects = page.objects.len(),
        has_next = page.next_marker.is_some(),
        "Fetched single collection page"
    );

    Ok(CursorPage::new(
        page.objects,
        page.next_marker.map(CompositeCursor::with_cursor),
    ))
}

/// Client-side slicing for vendors that return a whole collection at once.
///
/// The marker is the decimal offset of the first item of the page.
pub fn slice_page(
    mut objects: Vec<JsonObject>,
    marker: Option<&str>,
    page_size: usize,
) -> Result<ListPage> {
    let offset = match marker {
        Some(m) => m
            .parse::<usize>()
            .map_err(|e| Error::cursor(format!("invalid offset marker '{m}': {e}")))?,
        None => 0,
    };

    if offset >= objects.len() {
        return Ok(ListPage::last(Vec::new()));
    }

    let end = offset.saturating_add(page_size.max(1)).min(objects.len());
    let next_marker = (end < objects.len()).then(|| end.to_string());
    objects.truncate(end);
    let page = objects.split_off(offset);

    Ok(ListPage::new(page, next_marker))
}
