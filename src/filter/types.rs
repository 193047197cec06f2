//! Advanced filter configuration and the vendor seam

use crate::cursor::AdvancedFilterCursor;
use crate::error::Result;
use crate::pagination::ListPage;
use crate::types::JsonObject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Advanced filters from the datasource config (`advancedFilters`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilters {
    /// Return members of filtered scope objects
    #[serde(default)]
    pub get_objects_by_scope: Vec<ScopeFilter>,

    /// Return objects related to filtered scope objects
    #[serde(default)]
    pub get_related_objects: Vec<RelatedFilter>,
}

impl AdvancedFilters {
    /// Scope filters with a member filter for `entity`, each restricted to
    /// those member filters
    pub fn implicit_for(&self, entity: &str) -> Vec<ScopeFilter> {
        self.get_objects_by_scope
            .iter()
            .filter_map(|scope| {
                let members: Vec<MemberFilter> = scope
                    .members
                    .iter()
                    .filter(|m| m.member_entity == entity)
                    .cloned()
                    .collect();
                (!members.is_empty()).then(|| ScopeFilter {
                    scope_entity: scope.scope_entity.clone(),
                    scope_entity_filter: scope.scope_entity_filter.clone(),
                    members,
                })
            })
            .collect()
    }

    /// Related filters that return `entity`
    pub fn related_for(&self, entity: &str) -> Vec<RelatedFilter> {
        self.get_related_objects
            .iter()
            .filter(|r| r.entity == entity)
            .cloned()
            .collect()
    }
}

/// A filtered scope entity and the member entities to return from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFilter {
    pub scope_entity: String,
    #[serde(default)]
    pub scope_entity_filter: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberFilter>,
}

/// Member entity of a scope, with its own filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilter {
    pub member_entity: String,
    #[serde(default)]
    pub member_entity_filter: Option<String>,
}

/// Objects of `entity` whose `related_attribute` matches an id in scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFilter {
    pub entity: String,
    #[serde(default)]
    pub entity_filter: Option<String>,
    pub related_attribute: String,
    pub related_scope: RelatedScope,
}

/// Where related ids come from: the scope entity itself, or one of its
/// member entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedScope {
    pub scope_entity: String,
    #[serde(default)]
    pub scope_entity_filter: Option<String>,
    #[serde(default)]
    pub member: Option<MemberFilter>,
}

// ============================================================================
// Vendor Seam
// ============================================================================

/// Vendor operations the advanced filters are written against.
///
/// Filters are opaque strings in the vendor's query language.
#[async_trait]
pub trait FilterSource: Send + Sync {
    /// List one page of `entity`, optionally filtered
    async fn list_entity(
        &self,
        entity: &str,
        filter: Option<&str>,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage>;

    /// List one page of `member_entity` inside the `scope_entity` object
    /// identified by `collection_id`
    async fn list_scoped_members(
        &self,
        scope_entity: &str,
        collection_id: &str,
        member_entity: &str,
        filter: Option<&str>,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage>;

    /// Unique attribute of `entity`
    fn unique_attribute(&self, entity: &str) -> Result<String>;

    /// Filter matching objects whose `attribute` is one of `values`
    fn relation_filter(&self, attribute: &str, values: &[String]) -> Result<String>;

    /// Conjunction of two filters
    fn and_filters(&self, left: &str, right: &str) -> String;
}

/// One page of filtered objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredPage {
    pub objects: Vec<JsonObject>,
    pub next_cursor: Option<AdvancedFilterCursor>,
}

impl FilteredPage {
    /// Create a page
    pub fn new(objects: Vec<JsonObject>, next_cursor: Option<AdvancedFilterCursor>) -> Self {
        Self {
            objects,
            next_cursor,
        }
    }
}
