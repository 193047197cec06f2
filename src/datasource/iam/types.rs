//! IAM datasource types
//!
//! The entity set, the datasource config and the SDK seams an embedder
//! implements to bind a real IAM client.

use crate::auth::AuthCredentials;
use crate::entity::{EntityInfo, EntityRegistry, MemberOf};
use crate::error::{Error, Result};
use crate::pagination::{Credentials, ListPage, RoleAssumer};
use crate::types::JsonObject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Entities
// ============================================================================

/// Entities served by the IAM adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IamEntity {
    User,
    Group,
    Role,
    Policy,
    IdentityProvider,
    /// Users of a group
    GroupMember,
    /// Managed policies attached to a group
    GroupPolicy,
    /// Managed policies attached to a role
    RolePolicy,
    /// Managed policies attached to a user
    UserPolicy,
}

impl IamEntity {
    pub const ALL: [IamEntity; 9] = [
        IamEntity::User,
        IamEntity::Group,
        IamEntity::Role,
        IamEntity::Policy,
        IamEntity::IdentityProvider,
        IamEntity::GroupMember,
        IamEntity::GroupPolicy,
        IamEntity::RolePolicy,
        IamEntity::UserPolicy,
    ];

    /// External id used in `GetPage` requests
    pub fn external_id(self) -> &'static str {
        match self {
            IamEntity::User => "User",
            IamEntity::Group => "Group",
            IamEntity::Role => "Role",
            IamEntity::Policy => "Policy",
            IamEntity::IdentityProvider => "IdentityProvider",
            IamEntity::GroupMember => "GroupMember",
            IamEntity::GroupPolicy => "GroupPolicy",
            IamEntity::RolePolicy => "RolePolicy",
            IamEntity::UserPolicy => "UserPolicy",
        }
    }

    /// Parse an external id
    pub fn from_external_id(external_id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.external_id() == external_id)
            .ok_or_else(|| Error::unsupported_entity(external_id))
    }

    /// Attribute holding the vendor's unique value for this entity
    pub fn unique_attribute(self) -> &'static str {
        match self {
            IamEntity::User => "UserName",
            IamEntity::Group => "GroupName",
            IamEntity::Role => "RoleName",
            IamEntity::Policy | IamEntity::IdentityProvider => "Arn",
            IamEntity::GroupMember
            | IamEntity::GroupPolicy
            | IamEntity::RolePolicy
            | IamEntity::UserPolicy => "id",
        }
    }

    /// Collection entity for member entities
    pub fn collection(self) -> Option<IamEntity> {
        match self {
            IamEntity::GroupMember | IamEntity::GroupPolicy => Some(IamEntity::Group),
            IamEntity::RolePolicy => Some(IamEntity::Role),
            IamEntity::UserPolicy => Some(IamEntity::User),
            _ => None,
        }
    }

    fn member_unique_attribute(self) -> Option<&'static str> {
        match self {
            IamEntity::GroupMember => Some("UserName"),
            IamEntity::GroupPolicy | IamEntity::RolePolicy | IamEntity::UserPolicy => {
                Some("PolicyArn")
            }
            _ => None,
        }
    }

    /// Metadata for the entity registry
    pub fn info(self) -> EntityInfo {
        let info = EntityInfo::new(self.external_id(), self.unique_attribute());
        match (self.collection(), self.member_unique_attribute()) {
            (Some(collection), Some(member_unique)) => info.member_of(MemberOf {
                collection: collection.external_id().to_string(),
                collection_attribute: collection.unique_attribute().to_string(),
                member_unique_attribute: member_unique.to_string(),
                collection_unique_attribute: collection.unique_attribute().to_string(),
            }),
            _ => info,
        }
    }

    /// Registry of every IAM entity
    pub fn registry() -> Result<EntityRegistry> {
        EntityRegistry::new(Self::ALL.into_iter().map(Self::info))
    }
}

impl std::fmt::Display for IamEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.external_id())
    }
}

// ============================================================================
// Datasource Config
// ============================================================================

/// Adapter-specific datasource config (`config` of the request)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamDatasourceConfig {
    #[serde(default)]
    pub region: String,

    /// Roles to assume, one per resource account. Empty means the
    /// request's own account only.
    #[serde(default)]
    pub resource_account_roles: Vec<String>,

    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// Extract the access key pair from the request's credentials
pub fn access_key_credentials(auth: Option<&AuthCredentials>) -> Result<Credentials> {
    match auth {
        Some(AuthCredentials::AccessKey {
            access_key_id,
            secret_access_key,
            session_token,
        }) => Ok(Credentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            session_token: session_token.clone(),
            expiration: None,
        }),
        Some(other) => Err(Error::auth(format!(
            "IAM datasources require access_key credentials, got {}",
            other.kind()
        ))),
        None => Err(Error::auth("IAM datasources require access_key credentials")),
    }
}

// ============================================================================
// SDK Seams
// ============================================================================

/// IAM operations used by the adapter.
///
/// List calls take the vendor's marker and a `MaxItems` value and return
/// raw objects with the vendor's field names.
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn list_users(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage>;

    async fn list_groups(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage>;

    async fn list_roles(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage>;

    async fn list_policies(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage>;

    /// Identity providers are returned in one unpaginated response
    async fn list_identity_providers(&self) -> Result<Vec<JsonObject>>;

    /// Full user, including tags and permissions boundary
    async fn get_user(&self, user_name: &str) -> Result<JsonObject>;

    /// Full role, including tags and last-used information
    async fn get_role(&self, role_name: &str) -> Result<JsonObject>;

    async fn list_group_members(
        &self,
        group_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage>;

    async fn list_attached_group_policies(
        &self,
        group_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage>;

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage>;

    async fn list_attached_user_policies(
        &self,
        user_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage>;
}

/// Builds SDK clients for one request
#[async_trait]
pub trait IamClientFactory: Send + Sync {
    /// IAM client authenticated with `credentials`
    async fn client(&self, region: &str, credentials: &Credentials) -> Result<Arc<dyn IamApi>>;

    /// Role assumer authenticated with the request's own credentials
    async fn role_assumer(
        &self,
        region: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RoleAssumer>>;
}
