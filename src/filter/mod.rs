//! Advanced filter module
//!
//! Datasources can narrow a sync to objects reachable from a filtered scope:
//!
//! - **Implicit filters** (`getObjectsByScope`): members of scope objects,
//!   e.g. the users of groups whose name starts with `eng`
//! - **Related filters** (`getRelatedObjects`): objects whose relation
//!   attribute points into a scope, e.g. incidents assigned to those users
//!
//! The kind of filter is chosen on the first page and recorded in the
//! [`AdvancedFilterCursor`]; it stays fixed for the rest of the sync.

mod implicit;
mod related;
mod types;

pub use types::{
    AdvancedFilters, FilterSource, FilteredPage, MemberFilter, RelatedFilter, RelatedScope,
    ScopeFilter,
};

use crate::cursor::{AdvancedFilterCursor, ImplicitFilterCursor, RelatedFilterCursor};
use crate::error::{Error, Result};
use tracing::debug;

/// Pages an entity through the advanced filters configured for it
#[derive(Debug, Clone)]
pub struct AdvancedFilterPaginator {
    entity: String,
    implicit: Vec<ScopeFilter>,
    related: Vec<RelatedFilter>,
}

impl AdvancedFilterPaginator {
    /// Create a paginator for `entity`, or `None` when no filter applies
    pub fn new(filters: &AdvancedFilters, entity: &str) -> Option<Self> {
        let implicit = filters.implicit_for(entity);
        let related = filters.related_for(entity);
        if implicit.is_empty() && related.is_empty() {
            return None;
        }

        Some(Self {
            entity: entity.to_string(),
            implicit,
            related,
        })
    }

    /// Fetch one page.
    pub async fn get_page(
        &self,
        source: &dyn FilterSource,
        cursor: Option<AdvancedFilterCursor>,
        page_size: usize,
    ) -> Result<FilteredPage> {
        let cursor = match cursor {
            Some(cursor) if cursor.is_empty() => {
                return Err(Error::cursor(format!(
                    "advanced filter cursor for '{}' carries no filter position",
                    self.entity
                )))
            }
            cursor => cursor.unwrap_or_default(),
        };

        match (cursor.implicit_filter_cursor, cursor.related_filter_cursor) {
            (Some(_), Some(_)) => Err(Error::cursor(
                "advanced filter cursor carries both an implicit and a related position",
            )),
            (Some(position), None) => {
                if self.implicit.is_empty() {
                    return Err(Error::cursor(format!(
                        "implicit filter cursor given but no implicit filter is configured for '{}'",
                        self.entity
                    )));
                }
                self.implicit(source, position, page_size).await
            }
            (None, Some(position)) => {
                if !self.implicit.is_empty() || self.related.is_empty() {
                    return Err(Error::cursor(format!(
                        "related filter cursor given but '{}' is synced through implicit filters",
                        self.entity
                    )));
                }
                self.related(source, position, page_size).await
            }
            (None, None) if !self.implicit.is_empty() => {
                debug!(entity = %self.entity, "Starting implicit filter sync");
                self.implicit(source, ImplicitFilterCursor::default(), page_size)
                    .await
            }
            (None, None) => {
                debug!(entity = %self.entity, "Starting related filter sync");
                self.related(source, RelatedFilterCursor::default(), page_size)
                    .await
            }
        }
    }

    async fn implicit(
        &self,
        source: &dyn FilterSource,
        position: ImplicitFilterCursor,
        page_size: usize,
    ) -> Result<FilteredPage> {
        let (objects, next) =
            implicit::implicit_page(source, &self.implicit, position, page_size).await?;
        Ok(FilteredPage::new(objects, next.map(AdvancedFilterCursor::implicit)))
    }

    async fn related(
        &self,
        source: &dyn FilterSource,
        position: RelatedFilterCursor,
        page_size: usize,
    ) -> Result<FilteredPage> {
        let (objects, next) =
            related::related_page(source, &self.related, position, page_size).await?;
        Ok(FilteredPage::new(objects, next.map(AdvancedFilterCursor::related)))
    }
}
