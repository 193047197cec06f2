//! Implicit (scope) filters
//!
//! Each scope filter is read as a two-level collection: the filtered scope
//! entity is the outer collection, the filtered member entity the inner one.
//! Scope filters and their member filters are visited in configuration
//! order.

use super::types::{FilterSource, MemberFilter, ScopeFilter};
use crate::cursor::ImplicitFilterCursor;
use crate::error::{Error, Result};
use crate::pagination::{ListPage, MemberIdentifiers, MemberPaginator, MemberSource};
use crate::types::JsonObject;
use async_trait::async_trait;
use tracing::debug;

/// A scope filter paired with one of its member filters, viewed as a
/// member collection
pub(crate) struct ScopedMembers<'a> {
    pub source: &'a dyn FilterSource,
    pub scope_entity: &'a str,
    pub scope_entity_filter: Option<&'a str>,
    pub member: &'a MemberFilter,
}

impl ScopedMembers<'_> {
    /// Paginator that walks this scope without tagging members
    pub fn paginator(&self) -> Result<MemberPaginator> {
        let scope_unique = self.source.unique_attribute(self.scope_entity)?;
        let member_unique = self.source.unique_attribute(&self.member.member_entity)?;
        Ok(MemberPaginator::scoped(MemberIdentifiers::new(
            scope_unique.clone(),
            scope_unique,
            member_unique,
        )))
    }
}

#[async_trait]
impl MemberSource for ScopedMembers<'_> {
    async fn list_collections(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        self.source
            .list_entity(self.scope_entity, self.scope_entity_filter, marker, page_size)
            .await
    }

    async fn list_members(
        &self,
        collection_id: &str,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        self.source
            .list_scoped_members(
                self.scope_entity,
                collection_id,
                &self.member.member_entity,
                self.member.member_entity_filter.as_deref(),
                marker,
                page_size,
            )
            .await
    }
}

/// Fetch one page through the implicit filters
pub(crate) async fn implicit_page(
    source: &dyn FilterSource,
    filters: &[ScopeFilter],
    cursor: ImplicitFilterCursor,
    page_size: usize,
) -> Result<(Vec<JsonObject>, Option<ImplicitFilterCursor>)> {
    let scope = filters.get(cursor.entity_filter_index).ok_or_else(|| {
        Error::cursor(format!(
            "implicit filter index {} is out of range for {} scope filters",
            cursor.entity_filter_index,
            filters.len()
        ))
    })?;
    let member = scope.members.get(cursor.member_filter_index).ok_or_else(|| {
        Error::cursor(format!(
            "member filter index {} is out of range for {} member filters",
            cursor.member_filter_index,
            scope.members.len()
        ))
    })?;

    let scoped = ScopedMembers {
        source,
        scope_entity: &scope.scope_entity,
        scope_entity_filter: scope.scope_entity_filter.as_deref(),
        member,
    };
    let page = scoped
        .paginator()?
        .get_page(&scoped, cursor.cursor, page_size)
        .await?;

    let next = match page.next_cursor {
        Some(inner) => Some(ImplicitFilterCursor {
            cursor: Some(inner),
            ..cursor
        }),
        None => advance(filters, cursor.entity_filter_index, cursor.member_filter_index),
    };

    debug!(
        scope_entity = %scope.scope_entity,
        member_entity = %member.member_entity,
        objects = page.objects.len(),
        done = next.is_none(),
        "Fetched implicit filter page"
    );

    Ok((page.objects, next))
}

fn advance(
    filters: &[ScopeFilter],
    entity_index: usize,
    member_index: usize,
) -> Option<ImplicitFilterCursor> {
    let fresh = |entity_filter_index, member_filter_index| ImplicitFilterCursor {
        entity_filter_index,
        member_filter_index,
        cursor: None,
    };

    if member_index + 1 < filters[entity_index].members.len() {
        Some(fresh(entity_index, member_index + 1))
    } else if entity_index + 1 < filters.len() {
        Some(fresh(entity_index + 1, 0))
    } else {
        None
    }
}
