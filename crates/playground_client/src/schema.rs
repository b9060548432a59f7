//! Schema client.
//!
//! [`SchemaClient::new`] issues `GET <api-root>/openapi.json` immediately and
//! exactly once. Every call to [`SchemaClient::paths_future`] hands out the
//! same shared future, and [`SchemaClient::paths`] reads the resolved value
//! synchronously once it is available.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::FetchError;
use crate::fetch::{Decoded, Format, Payload};
use crate::route::RouteClient;

/// Well-known schema document path
pub const SCHEMA_PATH: &str = "/openapi.json";

/// Errors surfaced while loading the schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to fetch schema: {0}")]
    Fetch(#[from] FetchError),

    #[error("Schema document has no `paths` object")]
    MissingPaths,

    #[error("Schema fetch task ended unexpectedly: {0}")]
    Aborted(String),
}

/// The schema's `paths` object
pub type Paths = Map<String, Value>;

/// Shared handle on the single schema fetch
pub type PathsFuture = Shared<BoxFuture<'static, Result<Arc<Paths>, Arc<SchemaError>>>>;

/// One-shot loader for the route table behind an API root
#[derive(Clone)]
pub struct SchemaClient {
    api: RouteClient,
    paths: PathsFuture,
}

impl std::fmt::Debug for SchemaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaClient")
            .field("url", &self.api.url())
            .field("loaded", &self.paths.peek().is_some())
            .finish()
    }
}

impl SchemaClient {
    /// Start loading the schema behind `api`.
    ///
    /// Must be called from within a tokio runtime: the fetch is spawned
    /// right away rather than on first poll.
    pub fn new(api: RouteClient) -> Self {
        let fetch_api = api.clone();
        let task = tokio::spawn(async move { fetch_paths(&fetch_api).await });

        let paths = async move {
            match task.await {
                Ok(result) => result.map(Arc::new).map_err(Arc::new),
                Err(e) => Err(Arc::new(SchemaError::Aborted(e.to_string()))),
            }
        }
        .boxed()
        .shared();

        Self { api, paths }
    }

    /// The route client rooted at the API root
    pub fn api(&self) -> &RouteClient {
        &self.api
    }

    /// Future resolving with the schema's `paths` object
    pub fn paths_future(&self) -> PathsFuture {
        self.paths.clone()
    }

    /// The `paths` object, once the fetch has completed successfully
    pub fn paths(&self) -> Option<Arc<Paths>> {
        self.paths.peek().and_then(|r| r.as_ref().ok().cloned())
    }
}

async fn fetch_paths(api: &RouteClient) -> Result<Paths, SchemaError> {
    tracing::info!(url = %api.url(), "Fetching schema");

    let document = match api.fetch(Payload::empty(), SCHEMA_PATH, Some(Method::GET), Some(Format::Json)).await? {
        Decoded::Json(document) => document,
        _ => return Err(SchemaError::MissingPaths),
    };

    match document {
        Value::Object(mut doc) => match doc.remove("paths") {
            Some(Value::Object(paths)) => {
                tracing::info!(count = paths.len(), "Schema loaded");
                Ok(paths)
            }
            _ => Err(SchemaError::MissingPaths),
        },
        _ => Err(SchemaError::MissingPaths),
    }
}
