//! Static entity metadata
//!
//! Every adapter knows a fixed set of entities up front: how each one is
//! identified and, for member entities, which collection it belongs to.
//! The table is built once when the adapter is created and only read
//! afterwards.

use crate::error::{Error, Result};
use crate::pagination::MemberIdentifiers;
use std::collections::BTreeMap;

/// Link from a member entity to the collection entity that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOf {
    /// External id of the collection entity (e.g. `Group`)
    pub collection: String,
    /// Attribute written into each member carrying the collection's unique value
    pub collection_attribute: String,
    /// Attribute of the member holding its unique value
    pub member_unique_attribute: String,
    /// Attribute of the collection object holding its unique value
    pub collection_unique_attribute: String,
}

impl MemberOf {
    /// Identifiers used by the member paginator
    pub fn identifiers(&self) -> MemberIdentifiers {
        MemberIdentifiers::new(
            &self.collection_unique_attribute,
            &self.collection_attribute,
            &self.member_unique_attribute,
        )
    }
}

/// Metadata for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub external_id: String,
    pub unique_attribute: String,
    pub member_of: Option<MemberOf>,
}

impl EntityInfo {
    /// An entity read from a single collection
    pub fn new(external_id: impl Into<String>, unique_attribute: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            unique_attribute: unique_attribute.into(),
            member_of: None,
        }
    }

    /// Mark the entity as a member of `member_of.collection`
    #[must_use]
    pub fn member_of(mut self, member_of: MemberOf) -> Self {
        self.member_of = Some(member_of);
        self
    }

    /// Check if this entity is read through its collection
    pub fn is_member(&self) -> bool {
        self.member_of.is_some()
    }
}

/// Immutable lookup table of the entities an adapter supports
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, EntityInfo>,
}

impl EntityRegistry {
    /// Build the registry.
    ///
    /// Duplicate external ids and member entities pointing at an unknown
    /// collection are rejected.
    pub fn new(entities: impl IntoIterator<Item = EntityInfo>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for info in entities {
            let id = info.external_id.clone();
            if map.insert(id.clone(), info).is_some() {
                return Err(Error::config(format!("entity '{id}' is defined twice")));
            }
        }

        for info in map.values() {
            if let Some(member_of) = &info.member_of {
                if !map.contains_key(&member_of.collection) {
                    return Err(Error::config(format!(
                        "entity '{}' is a member of unknown entity '{}'",
                        info.external_id, member_of.collection
                    )));
                }
            }
        }

        Ok(Self { entities: map })
    }

    /// Look up an entity, failing with `UnsupportedEntity` when unknown
    pub fn get(&self, external_id: &str) -> Result<&EntityInfo> {
        self.entities
            .get(external_id)
            .ok_or_else(|| Error::unsupported_entity(external_id))
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.entities.contains_key(external_id)
    }

    /// External ids in sorted order
    pub fn external_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
