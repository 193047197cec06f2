//! IAM adapter
//!
//! Flat entities are read with the single-collection paginator, member
//! entities with the member paginator. When resource account roles are
//! configured, either one is wrapped in the account iterator and run
//! against a client for the assumed role.

use super::listers::{IamCollection, IamMembers};
use super::types::{
    access_key_credentials, IamApi, IamClientFactory, IamDatasourceConfig, IamEntity,
};
use crate::adapter::Adapter;
use crate::config::AdapterConfig;
use crate::cursor::{self, CompositeCursor};
use crate::decode::FlattenOptions;
use crate::engine::{assemble_page, fetch_details, with_timeout, GetPageRequest, GetPageResponse};
use crate::entity::{EntityRegistry, MemberOf};
use crate::error::{Error, Result};
use crate::pagination::{
    paginate_single, unique_value, AccountIterator, Credentials, CursorPage, MemberPaginator,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Datasource type served by [`IamAdapter`]
pub const DATASOURCE_TYPE: &str = "aws-iam";

/// `GetPage` over an IAM SDK client
pub struct IamAdapter {
    config: Arc<AdapterConfig>,
    entities: EntityRegistry,
    factory: Arc<dyn IamClientFactory>,
}

impl IamAdapter {
    /// Create an adapter building its SDK clients with `factory`
    pub fn new(config: Arc<AdapterConfig>, factory: Arc<dyn IamClientFactory>) -> Result<Self> {
        Ok(Self {
            config,
            entities: IamEntity::registry()?,
            factory,
        })
    }

    async fn fetch(
        &self,
        datasource: &IamDatasourceConfig,
        credentials: &Credentials,
        entity: IamEntity,
        cursor: Option<CompositeCursor>,
        page_size: usize,
        concurrency: usize,
    ) -> Result<CursorPage> {
        if datasource.resource_account_roles.is_empty() {
            let api = self.factory.client(&datasource.region, credentials).await?;
            return self
                .entity_page(api.as_ref(), entity, cursor, page_size, concurrency)
                .await;
        }

        let accounts = AccountIterator::new(&datasource.resource_account_roles)?;
        let is_member = entity.collection().is_some();

        let (account, local) = if is_member {
            accounts.enter_member(cursor)?
        } else {
            let account = accounts.enter_flat(cursor.as_ref())?;
            let local = account.next_marker.clone().map(CompositeCursor::with_cursor);
            (account, local)
        };

        let role_arn = accounts.role_arn(&account)?;
        debug!(account = account.offset, role_arn, entity = %entity, "Reading resource account");

        let assumer = self
            .factory
            .role_assumer(&datasource.region, credentials)
            .await?;
        let account_credentials = assumer.assume_role(role_arn).await?;
        let api = self
            .factory
            .client(&datasource.region, &account_credentials)
            .await?;

        let page = self
            .entity_page(api.as_ref(), entity, local, page_size, concurrency)
            .await?;

        let next_cursor = if is_member {
            accounts.leave_member(&account, page.next_cursor)?
        } else {
            accounts.leave_flat(&account, page.next_cursor.and_then(|c| c.cursor))?
        };

        Ok(CursorPage::new(page.objects, next_cursor))
    }

    /// One page of `entity` from a single account
    async fn entity_page(
        &self,
        api: &dyn IamApi,
        entity: IamEntity,
        cursor: Option<CompositeCursor>,
        page_size: usize,
        concurrency: usize,
    ) -> Result<CursorPage> {
        if entity.collection().is_some() {
            let identifiers = self
                .entities
                .get(entity.external_id())?
                .member_of
                .as_ref()
                .map(MemberOf::identifiers)
                .ok_or_else(|| Error::Other(format!("{entity} has no collection metadata")))?;

            return MemberPaginator::new(identifiers)
                .get_page(&IamMembers { api, entity }, cursor, page_size)
                .await;
        }

        let mut page = paginate_single(&IamCollection { api, entity }, cursor, page_size).await?;

        // List calls return summaries; users and roles need a detail call each
        match entity {
            IamEntity::User => {
                page.objects = fetch_details(page.objects, concurrency, |summary| async move {
                    let name = unique_value(&summary, entity.unique_attribute())?;
                    api.get_user(&name).await
                })
                .await?;
            }
            IamEntity::Role => {
                page.objects = fetch_details(page.objects, concurrency, |summary| async move {
                    let name = unique_value(&summary, entity.unique_attribute())?;
                    api.get_role(&name).await
                })
                .await?;
            }
            _ => {}
        }

        Ok(page)
    }
}

#[async_trait]
impl Adapter for IamAdapter {
    fn datasource_type(&self) -> &str {
        DATASOURCE_TYPE
    }

    fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    async fn get_page(&self, request: &GetPageRequest) -> Result<GetPageResponse> {
        let datasource: IamDatasourceConfig = request.datasource.parse_config()?;
        if datasource.region.is_empty() {
            return Err(Error::datasource("IAM datasource config requires a region"));
        }
        self.config
            .check_resource_accounts(datasource.resource_account_roles.len())?;

        let credentials = access_key_credentials(request.datasource.auth.as_ref())?;
        let entity = IamEntity::from_external_id(&request.entity.external_id)?;
        let cursor = cursor::unmarshal::<CompositeCursor>(&request.cursor)?
            .filter(|c| !c.is_empty());

        let timeout = self.config.request_timeout(datasource.request_timeout_seconds);
        let concurrency = self.config.concurrency(datasource.max_concurrency);

        debug!(
            entity = %entity,
            accounts = datasource.resource_account_roles.len(),
            resumed = cursor.is_some(),
            "Fetching IAM page"
        );

        let page = with_timeout(
            timeout,
            self.fetch(
                &datasource,
                &credentials,
                entity,
                cursor,
                request.page_size,
                concurrency,
            ),
        )
        .await?;

        assemble_page(
            page.objects,
            &request.entity,
            &FlattenOptions::default(),
            page.next_cursor.as_ref(),
        )
    }
}

impl std::fmt::Debug for IamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamAdapter")
            .field("config", &self.config)
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}
