//! Related filters
//!
//! A related filter returns the objects of an entity whose relation
//! attribute points at objects in a filtered scope. Each call resolves one
//! batch of related ids from the scope, then reads one page of the entity
//! filtered by those ids. The scope position that produced the batch is kept
//! in the cursor so the same ids are resolved again on the next call.

use super::implicit::ScopedMembers;
use super::types::{FilterSource, RelatedFilter};
use crate::cursor::{CompositeCursor, RelatedFilterCursor};
use crate::error::{Error, Result};
use crate::pagination::{paginate_single, unique_value, CollectionLister, ListPage};
use crate::types::JsonObject;
use async_trait::async_trait;
use tracing::debug;

/// One entity read through a fixed filter
struct FilteredEntity<'a> {
    source: &'a dyn FilterSource,
    entity: &'a str,
    filter: Option<&'a str>,
}

#[async_trait]
impl CollectionLister for FilteredEntity<'_> {
    async fn list(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        self.source
            .list_entity(self.entity, self.filter, marker, page_size)
            .await
    }
}

/// Fetch one page through the related filters
pub(crate) async fn related_page(
    source: &dyn FilterSource,
    filters: &[RelatedFilter],
    cursor: RelatedFilterCursor,
    page_size: usize,
) -> Result<(Vec<JsonObject>, Option<RelatedFilterCursor>)> {
    let filter = filters.get(cursor.entity_index).ok_or_else(|| {
        Error::cursor(format!(
            "related filter index {} is out of range for {} related filters",
            cursor.entity_index,
            filters.len()
        ))
    })?;

    let (ids, next_related) =
        related_ids(source, filter, cursor.related_entity_cursor.clone(), page_size).await?;

    if ids.is_empty() {
        debug!(
            entity = %filter.entity,
            scope_entity = %filter.related_scope.scope_entity,
            "Related id batch is empty, advancing scope"
        );
        let next = advance(filters.len(), cursor.entity_index, next_related);
        return Ok((Vec::new(), next));
    }

    let relation = source.relation_filter(&filter.related_attribute, &ids)?;
    let entity_filter = match filter.entity_filter.as_deref() {
        Some(extra) => source.and_filters(&relation, extra),
        None => relation,
    };

    let lister = FilteredEntity {
        source,
        entity: &filter.entity,
        filter: Some(&entity_filter),
    };
    let page = paginate_single(&lister, cursor.entity_cursor, page_size).await?;

    debug!(
        entity = %filter.entity,
        related_ids = ids.len(),
        objects = page.objects.len(),
        "Fetched related filter page"
    );

    let next = match page.next_cursor {
        Some(entity_cursor) => Some(RelatedFilterCursor {
            entity_index: cursor.entity_index,
            entity_cursor: Some(entity_cursor),
            related_entity_cursor: cursor.related_entity_cursor,
        }),
        None => advance(filters.len(), cursor.entity_index, next_related),
    };

    Ok((page.objects, next))
}

/// Resolve one batch of related ids starting at `position`, returning the
/// ids and the position of the following batch
async fn related_ids(
    source: &dyn FilterSource,
    filter: &RelatedFilter,
    position: Option<CompositeCursor>,
    page_size: usize,
) -> Result<(Vec<String>, Option<CompositeCursor>)> {
    let scope = &filter.related_scope;

    let (objects, next, unique_attribute) = match &scope.member {
        Some(member) => {
            let scoped = ScopedMembers {
                source,
                scope_entity: &scope.scope_entity,
                scope_entity_filter: scope.scope_entity_filter.as_deref(),
                member,
            };
            let page = scoped
                .paginator()?
                .get_page(&scoped, position, page_size)
                .await?;
            let unique = source.unique_attribute(&member.member_entity)?;
            (page.objects, page.next_cursor, unique)
        }
        None => {
            let lister = FilteredEntity {
                source,
                entity: &scope.scope_entity,
                filter: scope.scope_entity_filter.as_deref(),
            };
            let page = paginate_single(&lister, position, page_size).await?;
            let unique = source.unique_attribute(&scope.scope_entity)?;
            (page.objects, page.next_cursor, unique)
        }
    };

    let ids = objects
        .iter()
        .map(|object| unique_value(object, &unique_attribute))
        .collect::<Result<Vec<_>>>()?;

    Ok((ids, next))
}

fn advance(
    filter_count: usize,
    entity_index: usize,
    next_related: Option<CompositeCursor>,
) -> Option<RelatedFilterCursor> {
    match next_related {
        Some(related) => Some(RelatedFilterCursor {
            entity_index,
            entity_cursor: None,
            related_entity_cursor: Some(related),
        }),
        None if entity_index + 1 < filter_count => Some(RelatedFilterCursor {
            entity_index: entity_index + 1,
            entity_cursor: None,
            related_entity_cursor: None,
        }),
        None => None,
    }
}
