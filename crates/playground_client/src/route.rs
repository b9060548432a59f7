//! Path-building route client.
//!
//! A [`RouteClient`] holds an accumulated URL plus a default method and
//! decoding format. Extending it never mutates: `api.at("users").at("123")`
//! yields a new client for `<base>/users/123` while `api` keeps its own URL.
//! Routes described by a schema fetched at runtime are therefore resolved by
//! path at call time instead of through one hand-written method per endpoint.

use reqwest::{Client, Method};

use crate::error::FetchError;
use crate::fetch::{fetch_response, Decoded, Format, Payload};

/// Immutable builder for requests under a base URL
#[derive(Debug, Clone)]
pub struct RouteClient {
    url: String,
    method: Method,
    format: Format,
    client: Client,
}

impl RouteClient {
    /// Create a client rooted at `url` that POSTs and decodes text by default
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_defaults(url, Method::POST, Format::Text)
    }

    /// Create a client with explicit default method and format
    pub fn with_defaults(url: impl Into<String>, method: Method, format: Format) -> Self {
        Self::with_client(Client::new(), url, method, format)
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: Client, url: impl Into<String>, method: Method, format: Format) -> Self {
        Self {
            url: url.into(),
            method,
            format,
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Client for `<url>/<segment>`
    pub fn at(&self, segment: &str) -> Self {
        self.extend(&format!("/{}", segment), None, None)
    }

    /// Client for `<url><extension>`, optionally overriding method and format
    pub fn extend(&self, extension: &str, method: Option<Method>, format: Option<Format>) -> Self {
        Self {
            url: format!("{}{}", self.url, extension),
            method: method.unwrap_or_else(|| self.method.clone()),
            format: format.unwrap_or(self.format),
            client: self.client.clone(),
        }
    }

    /// Invoke the accumulated URL with this client's defaults
    pub async fn call(&self, payload: Payload) -> Result<Decoded, FetchError> {
        self.fetch(payload, "", None, None).await
    }

    /// Invoke the accumulated URL with an explicit method and format
    pub async fn invoke(&self, method: Method, payload: Payload, format: Format) -> Result<Decoded, FetchError> {
        self.fetch(payload, "", Some(method), Some(format)).await
    }

    /// Invoke `<url><extension>`, falling back to this client's defaults
    pub async fn fetch(
        &self,
        payload: Payload,
        extension: &str,
        method: Option<Method>,
        format: Option<Format>,
    ) -> Result<Decoded, FetchError> {
        let url = format!("{}{}", self.url, extension);
        fetch_response(
            &self.client,
            &url,
            payload,
            method.unwrap_or_else(|| self.method.clone()),
            format.unwrap_or(self.format),
        )
        .await
    }

    pub async fn post(&self, payload: Payload, extension: &str, format: Option<Format>) -> Result<Decoded, FetchError> {
        self.fetch(payload, extension, Some(Method::POST), format).await
    }

    pub async fn get(&self, payload: Payload, extension: &str, format: Option<Format>) -> Result<Decoded, FetchError> {
        self.fetch(payload, extension, Some(Method::GET), format).await
    }

    pub async fn put(&self, payload: Payload, extension: &str, format: Option<Format>) -> Result<Decoded, FetchError> {
        self.fetch(payload, extension, Some(Method::PUT), format).await
    }

    pub async fn patch(&self, payload: Payload, extension: &str, format: Option<Format>) -> Result<Decoded, FetchError> {
        self.fetch(payload, extension, Some(Method::PATCH), format).await
    }

    pub async fn delete(&self, payload: Payload, extension: &str, format: Option<Format>) -> Result<Decoded, FetchError> {
        self.fetch(payload, extension, Some(Method::DELETE), format).await
    }
}
