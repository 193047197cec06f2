//! Execution engine module
//!
//! Request envelopes and the steps shared by every adapter.
//!
//! # Overview
//!
//! The engine module provides:
//! - [`GetPageRequest`] / [`GetPageResponse`] - the request boundary types
//! - [`assemble_page`] - flattens raw vendor objects and encodes the cursor
//! - [`fetch_details`] - bounded fan-out for per-object detail calls
//! - [`with_timeout`] - runs one request's vendor calls under its timeout

mod types;

pub use types::{DatasourceConfig, GetPageRequest, GetPageResponse};

use crate::cursor;
use crate::decode::{flatten_object, EntityConfig, FlattenOptions};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Flatten a page of raw objects and encode the outgoing cursor.
///
/// Any object that fails to flatten fails the whole page.
pub fn assemble_page<C: Serialize>(
    raw: Vec<JsonObject>,
    entity: &EntityConfig,
    options: &FlattenOptions,
    next_cursor: Option<&C>,
) -> Result<GetPageResponse> {
    let objects = raw
        .into_iter()
        .map(|object| flatten_object(&JsonValue::Object(object), entity, options))
        .collect::<Result<Vec<_>>>()?;

    let next_cursor = cursor::marshal(next_cursor)?;

    debug!(
        entity = %entity.id,
        objects = objects.len(),
        last_page = next_cursor.is_empty(),
        "Assembled page"
    );

    Ok(GetPageResponse {
        objects,
        next_cursor,
    })
}

/// Run `fetch` for every item with at most `max_concurrency` in flight.
///
/// Results keep the input order. The first failure is returned and every
/// fetch still in flight is dropped.
pub async fn fetch_details<T, U, F, Fut>(
    items: Vec<T>,
    max_concurrency: usize,
    fetch: F,
) -> Result<Vec<U>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    let count = items.len();
    let mut results = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let detail = fetch(item);
            async move { detail.await.map(|value| (index, value)) }
        })
        .buffer_unordered(max_concurrency.max(1))
        .try_collect::<Vec<(usize, U)>>()
        .await?;

    results.sort_unstable_by_key(|(index, _)| *index);

    debug!(count, max_concurrency, "Fetched object details");
    Ok(results.into_iter().map(|(_, value)| value).collect())
}

/// Run a request's vendor calls under the request timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
