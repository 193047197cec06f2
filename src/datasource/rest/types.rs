//! REST definition types
//!
//! A [`RestDefinition`] describes one vendor API in YAML: where each entity
//! is listed, how the vendor paginates it and how filters are written in the
//! vendor's query language.

use crate::decode::FlattenOptions;
use crate::entity::{EntityInfo, EntityRegistry, MemberOf};
use crate::error::{Error, Result};
use crate::filter::AdvancedFilters;
use crate::http::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Definition
// ============================================================================

/// A vendor API definition loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestDefinition {
    /// Datasource type served by this definition (e.g. "servicenow")
    pub name: String,

    /// Query parameter carrying the page size
    #[serde(default)]
    pub page_size_param: Option<String>,

    /// Path to the records array in list responses (default: the body itself)
    #[serde(default)]
    pub records_path: Option<String>,

    /// How filters are expressed, for vendors that support them
    #[serde(default)]
    pub filter: Option<FilterDialect>,

    /// Client-side rate limit for this vendor
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Default decoding options, overridable per datasource
    #[serde(default)]
    pub flatten: FlattenOptions,

    /// Entities by external id
    pub entities: BTreeMap<String, RestEntity>,
}

impl RestDefinition {
    /// Look up an entity, failing with `UnsupportedEntity`
    pub fn entity(&self, external_id: &str) -> Result<&RestEntity> {
        self.entities
            .get(external_id)
            .ok_or_else(|| Error::unsupported_entity(external_id))
    }

    /// The member entity listing `member_entity` objects inside `scope_entity`.
    ///
    /// Either an entity named `member_entity` that is a member of the scope,
    /// or one whose `member_of.member_entity` names it.
    pub fn scoped_members(&self, scope_entity: &str, member_entity: &str) -> Result<&RestEntity> {
        self.entities
            .iter()
            .find_map(|(id, entity)| {
                let member_of = entity.member_of.as_ref()?;
                let returns = member_of.member_entity.as_deref().unwrap_or(id);
                (member_of.collection == scope_entity && returns == member_entity)
                    .then_some(entity)
            })
            .ok_or_else(|| {
                Error::datasource(format!(
                    "'{}' has no endpoint listing {member_entity} objects of a {scope_entity}",
                    self.name
                ))
            })
    }

    /// Entity metadata table for the adapter
    pub fn registry(&self) -> Result<EntityRegistry> {
        let infos = self
            .entities
            .iter()
            .map(|(id, entity)| {
                let info = EntityInfo::new(id, &entity.unique_attribute);
                match &entity.member_of {
                    Some(member_of) => {
                        let collection = self.entities.get(&member_of.collection).ok_or_else(|| {
                            Error::config(format!(
                                "entity '{id}' is a member of unknown entity '{}'",
                                member_of.collection
                            ))
                        })?;
                        Ok(info.member_of(MemberOf {
                            collection: member_of.collection.clone(),
                            collection_attribute: member_of.collection_attribute.clone(),
                            member_unique_attribute: member_of.member_unique_attribute.clone(),
                            collection_unique_attribute: collection.unique_attribute.clone(),
                        }))
                    }
                    None => Ok(info),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        EntityRegistry::new(infos)
    }
}

/// Filter syntax of the vendor's query language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDialect {
    /// Query parameter carrying the filter (e.g. `sysparm_query`)
    pub param: String,

    /// Joins two filters (e.g. `^` for ServiceNow)
    #[serde(default = "default_conjunction")]
    pub conjunction: String,

    /// Membership filter, rendered with `attribute` and `values`
    /// (e.g. `{{ attribute }}IN{{ values }}`)
    pub in_template: String,

    /// Separator between values in `in_template`
    #[serde(default = "default_separator")]
    pub values_separator: String,
}

fn default_conjunction() -> String {
    " AND ".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

// ============================================================================
// Entities
// ============================================================================

/// Where and how one entity is listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestEntity {
    /// Endpoint path, may use `{{ config.* }}` and `{{ collection.id }}`
    pub path: String,

    /// Fixed query parameters
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Attribute holding the unique value of a returned object
    pub unique_attribute: String,

    /// Overrides the definition's records path
    #[serde(default)]
    pub records_path: Option<String>,

    #[serde(default)]
    pub pagination: RestPagination,

    /// Set for entities listed per outer object
    #[serde(default)]
    pub member_of: Option<RestMemberOf>,
}

/// Native pagination scheme of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RestPagination {
    /// Whole collection in one response, sliced client-side
    #[default]
    None,

    /// Numeric offset in a query parameter
    Offset {
        offset_param: String,
        /// Overrides the definition's page size parameter
        #[serde(default)]
        limit_param: Option<String>,
    },

    /// Opaque token read from the response body
    Token {
        token_param: String,
        /// Dot path to the next token in the body
        token_path: String,
    },

    /// RFC 8288 `Link` header
    LinkHeader {
        #[serde(default = "default_rel")]
        rel: String,
    },
}

fn default_rel() -> String {
    "next".to_string()
}

/// Link from a member entity endpoint to its collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestMemberOf {
    /// External id of the collection entity
    pub collection: String,
    /// Attribute written into each member with the collection's unique value
    pub collection_attribute: String,
    /// Attribute of a returned member holding its unique value
    pub member_unique_attribute: String,
    /// Entity whose objects the endpoint returns, when it differs from the
    /// member entity itself (e.g. a group members endpoint returning users)
    #[serde(default)]
    pub member_entity: Option<String>,
    /// The endpoint returns link rows rather than member objects.
    ///
    /// `member_unique_attribute` of each row holds the unique value of a
    /// `member_entity` object, which is then listed through the filter
    /// dialect. Requires `member_entity` and a `filter` dialect.
    #[serde(default)]
    pub resolve_members: bool,
}

// ============================================================================
// Datasource Config
// ============================================================================

/// Adapter-specific datasource config (`config` of the request)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestDatasourceConfig {
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    #[serde(default)]
    pub advanced_filters: Option<AdvancedFilters>,

    /// Overrides the definition's decoding options
    #[serde(default)]
    pub flatten: Option<FlattenOptions>,
}
