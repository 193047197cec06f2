//! REST adapter
//!
//! One adapter per [`RestDefinition`]. Each request picks a strategy for the
//! requested entity:
//!
//! 1. advanced filters configured for the entity: advanced filter paginator
//! 2. member entity: member paginator over the collection endpoint
//! 3. otherwise: single-collection paginator

use super::source::{EntityLister, EntityMembers, RestSource};
use super::types::{RestDatasourceConfig, RestDefinition};
use crate::adapter::Adapter;
use crate::config::AdapterConfig;
use crate::cursor::{self, AdvancedFilterCursor, CompositeCursor};
use crate::engine::{assemble_page, with_timeout, GetPageRequest, GetPageResponse};
use crate::entity::{EntityRegistry, MemberOf};
use crate::error::{Error, Result};
use crate::filter::AdvancedFilterPaginator;
use crate::http::{HttpClient, HttpClientConfig};
use crate::pagination::{paginate_single, MemberPaginator};
use crate::template::TemplateContext;
use crate::types::JsonObject;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// `GetPage` over a YAML-defined REST API
pub struct RestAdapter {
    config: Arc<AdapterConfig>,
    definition: Arc<RestDefinition>,
    entities: EntityRegistry,
    client: HttpClient,
}

/// Objects of one page and the cursor that resumes the sync
enum Fetched {
    Plain(Vec<JsonObject>, Option<CompositeCursor>),
    Filtered(Vec<JsonObject>, Option<AdvancedFilterCursor>),
}

impl RestAdapter {
    /// Create an adapter for `definition`
    pub fn new(config: Arc<AdapterConfig>, definition: Arc<RestDefinition>) -> Result<Self> {
        let entities = definition.registry()?;

        let mut http = HttpClientConfig::builder().timeout(config.request_timeout(None));
        http = match &definition.rate_limit {
            Some(rate_limit) => http.rate_limit(rate_limit.clone()),
            None => http.no_rate_limit(),
        };
        for (key, value) in &definition.headers {
            http = http.header(key, value);
        }

        let client = HttpClient::with_config(http.build())?;
        debug!(
            name = %definition.name,
            entities = entities.len(),
            rate_limited = client.has_rate_limiter(),
            "Created REST adapter"
        );

        Ok(Self {
            config,
            definition,
            entities,
            client,
        })
    }

    /// Definition served by this adapter
    pub fn definition(&self) -> &RestDefinition {
        &self.definition
    }

    async fn fetch(
        &self,
        source: &RestSource<'_>,
        request: &GetPageRequest,
        datasource: &RestDatasourceConfig,
    ) -> Result<Fetched> {
        let external_id = request.entity.external_id.as_str();

        if let Some(paginator) = datasource
            .advanced_filters
            .as_ref()
            .and_then(|filters| AdvancedFilterPaginator::new(filters, external_id))
        {
            let cursor = cursor::unmarshal::<AdvancedFilterCursor>(&request.cursor)?;
            debug!(entity = external_id, "Paging through advanced filters");
            let page = paginator.get_page(source, cursor, request.page_size).await?;
            return Ok(Fetched::Filtered(page.objects, page.next_cursor));
        }

        let entity = self.definition.entity(external_id)?;
        let cursor = cursor::unmarshal::<CompositeCursor>(&request.cursor)?
            .filter(|c| !c.is_empty());

        let page = match self.entities.get(external_id)?.member_of.as_ref() {
            Some(member_of) => {
                let collection = self.definition.entity(&member_of.collection)?;
                let members = EntityMembers {
                    source,
                    collection,
                    members: entity,
                };
                MemberPaginator::new(MemberOf::identifiers(member_of))
                    .get_page(&members, cursor, request.page_size)
                    .await?
            }
            None => {
                let lister = EntityLister {
                    source,
                    entity,
                    filter: None,
                };
                paginate_single(&lister, cursor, request.page_size).await?
            }
        };

        Ok(Fetched::Plain(page.objects, page.next_cursor))
    }
}

#[async_trait]
impl Adapter for RestAdapter {
    fn datasource_type(&self) -> &str {
        &self.definition.name
    }

    fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    async fn get_page(&self, request: &GetPageRequest) -> Result<GetPageResponse> {
        let datasource: RestDatasourceConfig = request.datasource.parse_config()?;

        let address = request.datasource.address.trim();
        if address.is_empty() {
            return Err(Error::datasource(format!(
                "datasource '{}' has no address",
                request.datasource.id
            )));
        }
        Url::parse(address)?;

        let timeout = self.config.request_timeout(datasource.request_timeout_seconds);
        let client = self
            .client
            .with_credentials(request.datasource.auth.clone())
            .with_base_url(address)
            .with_timeout(timeout);

        let source = RestSource {
            definition: &self.definition,
            client: &client,
            context: TemplateContext::with_config(request.datasource.config.clone()),
        };

        let fetched = with_timeout(timeout, self.fetch(&source, request, &datasource)).await?;

        let options = datasource
            .flatten
            .as_ref()
            .unwrap_or(&self.definition.flatten);

        match fetched {
            Fetched::Plain(objects, next) => {
                assemble_page(objects, &request.entity, options, next.as_ref())
            }
            Fetched::Filtered(objects, next) => {
                assemble_page(objects, &request.entity, options, next.as_ref())
            }
        }
    }
}

impl std::fmt::Debug for RestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapter")
            .field("name", &self.definition.name)
            .field("entities", &self.entities.len())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

