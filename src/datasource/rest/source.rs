//! REST vendor calls
//!
//! [`RestSource`] performs one native list call for an entity and maps the
//! endpoint's pagination scheme onto a vendor marker:
//!
//! | scheme        | marker                         | next page exists when           |
//! |---------------|--------------------------------|---------------------------------|
//! | `none`        | decimal offset (client-side)   | items remain after the slice    |
//! | `offset`      | decimal offset                 | a full page came back           |
//! | `token`       | token from the body            | the token is present, non-empty |
//! | `link_header` | absolute URL of the next page  | a `Link` with the rel exists    |

use super::types::{FilterDialect, RestDefinition, RestEntity, RestMemberOf, RestPagination};
use crate::decode::{extract_path, extract_records};
use crate::error::{Error, Result};
use crate::filter::FilterSource;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{slice_page, unique_value, CollectionLister, ListPage, MemberSource};
use crate::template::{render, TemplateContext};
use crate::types::scalar_to_string;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Vendor calls for one request
pub(crate) struct RestSource<'a> {
    pub definition: &'a RestDefinition,
    pub client: &'a HttpClient,
    pub context: TemplateContext,
}

impl RestSource<'_> {
    /// Fetch one native page of `entity`.
    ///
    /// `collection_id` is set when listing the members of an outer object.
    pub async fn list(
        &self,
        entity: &RestEntity,
        collection_id: Option<&str>,
        filter: Option<&str>,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        let context = match collection_id {
            Some(id) => self.context.for_collection(id),
            None => self.context.clone(),
        };

        let mut query = entity
            .query
            .iter()
            .map(|(key, value)| render(value, &context).map(|rendered| (key.clone(), rendered)))
            .collect::<Result<Vec<(String, String)>>>()?;

        // A filter joins the endpoint's own query instead of repeating the param
        if let Some(filter) = filter {
            let dialect = self.dialect()?;
            match query.iter_mut().find(|(key, _)| *key == dialect.param) {
                Some((_, fixed)) => *fixed = self.and_filters(fixed.as_str(), filter),
                None => query.push((dialect.param.clone(), filter.to_string())),
            }
        }

        let mut request = RequestConfig::new();
        for (key, value) in query {
            request = request.query(key, value);
        }

        let path = render(&entity.path, &context)?;
        let records_path = entity
            .records_path
            .as_deref()
            .or(self.definition.records_path.as_deref());

        match &entity.pagination {
            RestPagination::None => {
                let response = self.client.get_json(&path, request).await?;
                let records = extract_records(&response.body, records_path)?;
                slice_page(records, marker, page_size)
            }

            RestPagination::Offset {
                offset_param,
                limit_param,
            } => {
                let offset = match marker {
                    Some(m) => m
                        .parse::<usize>()
                        .map_err(|e| Error::cursor(format!("invalid offset marker '{m}': {e}")))?,
                    None => 0,
                };
                request = request.query(offset_param, offset.to_string());
                if let Some(param) = limit_param.as_ref().or(self.definition.page_size_param.as_ref()) {
                    request = request.query(param, page_size.to_string());
                }

                let response = self.client.get_json(&path, request).await?;
                let records = extract_records(&response.body, records_path)?;
                let next_marker =
                    (records.len() >= page_size).then(|| (offset + records.len()).to_string());
                Ok(ListPage::new(records, next_marker))
            }

            RestPagination::Token {
                token_param,
                token_path,
            } => {
                if let Some(token) = marker {
                    request = request.query(token_param, token);
                }
                request = self.with_page_size(request, page_size);

                let response = self.client.get_json(&path, request).await?;
                let records = extract_records(&response.body, records_path)?;
                let next_marker = extract_path(&response.body, token_path)
                    .and_then(scalar_to_string)
                    .filter(|token| !token.is_empty());
                Ok(ListPage::new(records, next_marker))
            }

            RestPagination::LinkHeader { rel } => {
                let url = match marker {
                    // The next link already carries every query parameter
                    Some(next) => {
                        request = RequestConfig::new();
                        Url::parse(next)
                            .map_err(|e| Error::cursor(format!("invalid next page URL '{next}': {e}")))?
                    }
                    None => {
                        request = self.with_page_size(request, page_size);
                        Url::parse(&self.client.build_url(&path))?
                    }
                };

                let response = self.client.get_json(url.as_str(), request).await?;
                let records = extract_records(&response.body, records_path)?;
                let next_marker = next_link(&response.headers, rel, &url)?;
                Ok(ListPage::new(records, next_marker))
            }
        }
    }

    /// List the `member_entity` objects referenced by one page of link rows
    async fn resolve_members(
        &self,
        links: ListPage,
        member_of: &RestMemberOf,
        member_entity: &str,
        filter: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        let ids = links
            .objects
            .iter()
            .map(|row| unique_value(row, &member_of.member_unique_attribute))
            .collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(ListPage::new(Vec::new(), links.next_marker));
        }

        let target = self.definition.entity(member_entity)?;
        let by_id = self.relation_filter(&target.unique_attribute, &ids)?;
        let filter = match filter {
            Some(filter) => self.and_filters(&by_id, filter),
            None => by_id,
        };

        let mut objects = Vec::with_capacity(ids.len());
        let mut marker: Option<String> = None;
        loop {
            let page = self
                .list(target, None, Some(&filter), marker.as_deref(), page_size)
                .await?;
            objects.extend(page.objects);
            match page.next_marker {
                Some(next) if objects.len() < ids.len() => marker = Some(next),
                _ => break,
            }
        }

        debug!(
            member_entity,
            referenced = ids.len(),
            resolved = objects.len(),
            "Resolved member references"
        );
        Ok(ListPage::new(objects, links.next_marker))
    }

    fn dialect(&self) -> Result<&FilterDialect> {
        self.definition.filter.as_ref().ok_or_else(|| {
            Error::datasource(format!("'{}' does not support filters", self.definition.name))
        })
    }

    fn with_page_size(&self, request: RequestConfig, page_size: usize) -> RequestConfig {
        match &self.definition.page_size_param {
            Some(param) => request.query(param, page_size.to_string()),
            None => request,
        }
    }
}

/// Resolve the `rel` link of a response against the request URL
fn next_link(headers: &HeaderMap, rel: &str, request_url: &Url) -> Result<Option<String>> {
    let Some(link) = headers.get("link").and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    let Some(target) = parse_link_header(link, rel) else {
        return Ok(None);
    };

    let next = request_url
        .join(target)
        .map_err(|e| Error::vendor(None, format!("invalid Link header target '{target}': {e}")))?;
    debug!(next = %next, "Following Link header");
    Ok(Some(next.to_string()))
}

/// Parse a Link header and extract the URL for the given rel
pub(crate) fn parse_link_header<'h>(header: &'h str, target_rel: &str) -> Option<&'h str> {
    // <url>; rel="next", <url>; rel="prev"
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel) {
            if rel.split_whitespace().any(|r| r == target_rel) {
                return Some(url);
            }
        }
    }

    None
}

// ============================================================================
// Pagination Seams
// ============================================================================

/// A top-level entity, optionally filtered
pub(crate) struct EntityLister<'a> {
    pub source: &'a RestSource<'a>,
    pub entity: &'a RestEntity,
    pub filter: Option<&'a str>,
}

#[async_trait]
impl CollectionLister for EntityLister<'_> {
    async fn list(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        self.source
            .list(self.entity, None, self.filter, marker, page_size)
            .await
    }
}

/// A member entity and its collection
pub(crate) struct EntityMembers<'a> {
    pub source: &'a RestSource<'a>,
    pub collection: &'a RestEntity,
    pub members: &'a RestEntity,
}

#[async_trait]
impl MemberSource for EntityMembers<'_> {
    async fn list_collections(&self, marker: Option<&str>, page_size: usize) -> Result<ListPage> {
        self.source
            .list(self.collection, None, None, marker, page_size)
            .await
    }

    async fn list_members(
        &self,
        collection_id: &str,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        self.source
            .list(self.members, Some(collection_id), None, marker, page_size)
            .await
    }
}

#[async_trait]
impl FilterSource for RestSource<'_> {
    async fn list_entity(
        &self,
        entity: &str,
        filter: Option<&str>,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        let entity = self.definition.entity(entity)?;
        self.list(entity, None, filter, marker, page_size).await
    }

    async fn list_scoped_members(
        &self,
        scope_entity: &str,
        collection_id: &str,
        member_entity: &str,
        filter: Option<&str>,
        marker: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        let endpoint = self.definition.scoped_members(scope_entity, member_entity)?;
        match endpoint.member_of.as_ref().filter(|m| m.resolve_members) {
            Some(member_of) => {
                let links = self
                    .list(endpoint, Some(collection_id), None, marker, page_size)
                    .await?;
                self.resolve_members(links, member_of, member_entity, filter, page_size)
                    .await
            }
            None => {
                self.list(endpoint, Some(collection_id), filter, marker, page_size)
                    .await
            }
        }
    }

    fn unique_attribute(&self, entity: &str) -> Result<String> {
        Ok(self.definition.entity(entity)?.unique_attribute.clone())
    }

    fn relation_filter(&self, attribute: &str, values: &[String]) -> Result<String> {
        let dialect = self.dialect()?;

        let context = TemplateContext::default().with_vars(json!({
            "attribute": attribute,
            "values": values.join(&dialect.values_separator),
        }));
        render(&dialect.in_template, &context)
    }

    fn and_filters(&self, left: &str, right: &str) -> String {
        let conjunction = self
            .definition
            .filter
            .as_ref()
            .map_or(" AND ", |d| d.conjunction.as_str());
        format!("{left}{conjunction}{right}")
    }
}
