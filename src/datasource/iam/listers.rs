//! Entity dispatch onto IAM list calls

use super::types::{IamApi, IamEntity};
use crate::error::{Error, Result};
use crate::pagination::{slice_page, CollectionLister, ListPage, MemberSource};
use async_trait::async_trait;

/// A top-level IAM collection
pub(crate) struct IamCollection<'a> {
    pub api: &'a dyn IamApi,
    pub entity: IamEntity,
}

#[async_trait]
impl CollectionLister for IamCollection<'_> {
    async fn list(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        match self.entity {
            IamEntity::User => self.api.list_users(marker, page_size).await,
            IamEntity::Group => self.api.list_groups(marker, page_size).await,
            IamEntity::Role => self.api.list_roles(marker, page_size).await,
            IamEntity::Policy => self.api.list_policies(marker, page_size).await,
            IamEntity::IdentityProvider => {
                let all = self.api.list_identity_providers().await?;
                slice_page(all, marker, page_size)
            }
            IamEntity::GroupMember
            | IamEntity::GroupPolicy
            | IamEntity::RolePolicy
            | IamEntity::UserPolicy => Err(Error::Other(format!(
                "{} is a member entity and has no top-level collection",
                self.entity
            ))),
        }
    }
}

/// Members of an IAM collection (users of a group, policies of a role, ...)
pub(crate) struct IamMembers<'a> {
    pub api: &'a dyn IamApi,
    pub entity: IamEntity,
}

#[async_trait]
impl MemberSource for IamMembers<'_> {
    async fn list_collections(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        let Some(collection) = self.entity.collection() else {
            return Err(Error::Other(format!(
                "{} is not a member entity",
                self.entity
            )));
        };

        IamCollection {
            api: self.api,
            entity: collection,
        }
        .list(marker, page_size)
        .await
    }

    async fn list_members(
        &self,
        collection_id: &str,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        match self.entity {
            IamEntity::GroupMember => {
                self.api
                    .list_group_members(collection_id, marker, page_size)
                    .await
            }
            IamEntity::GroupPolicy => {
                self.api
                    .list_attached_group_policies(collection_id, marker, page_size)
                    .await
            }
            IamEntity::RolePolicy => {
                self.api
                    .list_attached_role_policies(collection_id, marker, page_size)
                    .await
            }
            IamEntity::UserPolicy => {
                self.api
                    .list_attached_user_policies(collection_id, marker, page_size)
                    .await
            }
            other => Err(Error::Other(format!("{other} is not a member entity"))),
        }
    }
}
