//! Adapter trait and registry
//!
//! An [`Adapter`] serves `GetPage` for one datasource type. The
//! [`AdapterRegistry`] is the request boundary: it validates the request,
//! dispatches on the datasource type and turns every failure into an
//! [`AdapterError`].

use crate::config::AdapterConfig;
use crate::engine::{GetPageRequest, GetPageResponse};
use crate::entity::EntityRegistry;
use crate::error::{AdapterError, Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One datasource type's implementation of `GetPage`
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Datasource type this adapter serves (e.g. `aws-iam`)
    fn datasource_type(&self) -> &str;

    /// Entities this adapter can return
    fn entities(&self) -> &EntityRegistry;

    /// Fetch one page.
    ///
    /// The page size has already been checked against the adapter limits
    /// and the entity is known to be supported.
    async fn get_page(&self, request: &GetPageRequest) -> Result<GetPageResponse>;
}

/// Datasource type to adapter lookup
#[derive(Clone)]
pub struct AdapterRegistry {
    config: Arc<AdapterConfig>,
    adapters: BTreeMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new(config: Arc<AdapterConfig>) -> Self {
        Self {
            config,
            adapters: BTreeMap::new(),
        }
    }

    /// Register an adapter under its datasource type
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Result<()> {
        let datasource_type = adapter.datasource_type().to_string();
        if self.adapters.contains_key(&datasource_type) {
            return Err(Error::config(format!(
                "an adapter for datasource type '{datasource_type}' is already registered"
            )));
        }
        debug!(datasource_type = %datasource_type, entities = adapter.entities().len(), "Registered adapter");
        self.adapters.insert(datasource_type, adapter);
        Ok(())
    }

    /// Adapter-wide limits
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Registered datasource types, sorted
    pub fn datasource_types(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Look up the adapter for a datasource type
    pub fn get(&self, datasource_type: &str) -> Result<&Arc<dyn Adapter>> {
        self.adapters.get(datasource_type).ok_or_else(|| {
            Error::datasource(format!(
                "no adapter for datasource type '{datasource_type}'"
            ))
        })
    }

    /// Serve one `GetPage` request
    pub async fn handle(
        &self,
        request: &GetPageRequest,
    ) -> std::result::Result<GetPageResponse, AdapterError> {
        match self.dispatch(request).await {
            Ok(response) => {
                info!(
                    datasource = %request.datasource.id,
                    entity = %request.entity.external_id,
                    objects = response.objects.len(),
                    last_page = response.is_last(),
                    "Served page"
                );
                Ok(response)
            }
            Err(err) => {
                let retryable = err.is_retryable();
                let error = AdapterError::from(err);
                warn!(
                    datasource = %request.datasource.id,
                    entity = %request.entity.external_id,
                    code = %error.code,
                    retryable,
                    "GetPage failed: {}",
                    error.message
                );
                Err(error)
            }
        }
    }

    async fn dispatch(&self, request: &GetPageRequest) -> Result<GetPageResponse> {
        self.config.check_page_size(request.page_size)?;

        let adapter = self.get(&request.datasource.datasource_type)?;
        adapter.entities().get(&request.entity.external_id)?;

        if request.entity.unique_id_attribute().is_none() {
            return Err(Error::entity(format!(
                "entity '{}' has no unique id attribute",
                request.entity.id
            )));
        }

        adapter.get_page(request).await
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("config", &self.config)
            .field("datasource_types", &self.datasource_types())
            .finish()
    }
}
