//! Single-request helper.
//!
//! [`fetch_response`] places the payload according to the method, sends one
//! request, and normalises the outcome:
//!
//! - `GET`/`HEAD` with a structured payload: `key=value` pairs appended to the
//!   URL's query string, no body
//! - multipart form payload: sent as-is, no JSON content type
//! - anything else: JSON body with `Content-Type: application/json`
//!
//! A 2xx response resolves with the body decoded per [`Format`]; any other
//! status rejects with the decoded error body (or the status text when that
//! fails). No retries, no timeout, no caching.

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// How a response body should be handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// UTF-8 text
    #[default]
    Text,
    /// Parsed JSON value
    Json,
    /// Raw bytes
    Blob,
    /// The unread response itself
    Result,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Json => "json",
            Format::Blob => "blob",
            Format::Result => "result",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file chosen for upload
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    /// File name sent with the form part
    pub file_name: String,
    /// File contents
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }
}

/// One multipart form field
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

/// Ordered multipart form payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    parts: Vec<(String, FormValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        self.parts.push((name.into(), value));
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn into_multipart(self) -> reqwest::multipart::Form {
        self.parts
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File(file) => form.part(
                    name,
                    reqwest::multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name),
                ),
            })
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured name→value data
    Json(Map<String, Value>),
    /// Binary multipart form
    Form(FormPayload),
}

impl Payload {
    pub fn empty() -> Self {
        Payload::Json(Map::new())
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(data: Map<String, Value>) -> Self {
        Payload::Json(data)
    }
}

impl From<FormPayload> for Payload {
    fn from(form: FormPayload) -> Self {
        Payload::Form(form)
    }
}

/// A response whose body has not been read yet
#[derive(Debug)]
pub struct RawResponse {
    inner: reqwest::Response,
}

impl RawResponse {
    pub fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// `Content-Type` header, if present and valid UTF-8
    pub fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// `Content-Disposition` header, if present and valid UTF-8
    pub fn content_disposition(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
    }

    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.inner.text().await
    }

    pub async fn bytes(self) -> Result<Bytes, reqwest::Error> {
        self.inner.bytes().await
    }

    pub async fn json(self) -> Result<Value, reqwest::Error> {
        self.inner.json().await
    }
}

/// A response body decoded per [`Format`]
#[derive(Debug)]
pub enum Decoded {
    Text(String),
    Json(Value),
    Blob(Bytes),
    Raw(RawResponse),
}

impl Decoded {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_raw(self) -> Option<RawResponse> {
        match self {
            Decoded::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Render one query-string value the way it is written into the URL
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append `key=value` pairs to a URL: `?` for the first pair when the URL has
/// no query yet, `&` otherwise. Values are not percent-encoded.
pub fn append_query(url: &mut String, data: &Map<String, Value>) {
    for (key, value) in data {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(key);
        url.push('=');
        url.push_str(&query_value(value));
    }
}

async fn decode(response: reqwest::Response, format: Format) -> Result<Decoded, reqwest::Error> {
    Ok(match format {
        Format::Text => Decoded::Text(response.text().await?),
        Format::Json => Decoded::Json(response.json().await?),
        Format::Blob => Decoded::Blob(response.bytes().await?),
        Format::Result => Decoded::Raw(RawResponse::new(response)),
    })
}

/// Perform one request and produce exactly one outcome.
///
/// # Arguments
///
/// * `client` - Shared connection pool
/// * `url` - Target URL
/// * `payload` - Structured data or multipart form
/// * `method` - HTTP method
/// * `format` - Decoding applied to the response body
pub async fn fetch_response(
    client: &Client,
    url: &str,
    payload: Payload,
    method: Method,
    format: Format,
) -> Result<Decoded, FetchError> {
    let mut url = url.to_string();

    let request = match payload {
        Payload::Form(form) => client
            .request(method.clone(), &url)
            .multipart(form.into_multipart()),
        Payload::Json(data) if method == Method::GET || method == Method::HEAD => {
            append_query(&mut url, &data);
            client.request(method.clone(), &url)
        }
        Payload::Json(data) => client.request(method.clone(), &url).json(&data),
    };

    tracing::debug!(%method, %url, %format, "Fetching");

    let response = request.send().await.map_err(|e| {
        tracing::error!(%method, %url, error = %e, "Request failed");
        FetchError::Transport(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%method, %url, %status, "Request rejected");
        let body = match decode(response, format).await {
            Ok(body) => body,
            Err(_) => Decoded::Text(status.canonical_reason().unwrap_or_default().to_string()),
        };
        return Err(FetchError::Status { status, body });
    }

    decode(response, format).await.map_err(FetchError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_test_server;
    use axum::extract::{Multipart, RawQuery};
    use axum::http::HeaderMap as AxumHeaders;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    fn echo_router() -> Router {
        Router::new()
            .route(
                "/search",
                get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
            )
            .route(
                "/echo",
                post(|headers: AxumHeaders, body: String| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({ "content_type": content_type, "body": body }))
                }),
            )
            .route(
                "/upload",
                post(|mut multipart: Multipart| async move {
                    let mut names = Vec::new();
                    while let Ok(Some(field)) = multipart.next_field().await {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let data = field.text().await.unwrap_or_default();
                        names.push(json!({ "name": name, "file_name": file_name, "data": data }));
                    }
                    Json(Value::Array(names))
                }),
            )
            .route(
                "/fail",
                get(|| async {
                    (
                        axum::http::StatusCode::BAD_REQUEST,
                        Json(json!({ "detail": "bad input" })),
                    )
                }),
            )
            .route(
                "/teapot",
                get(|| async { (axum::http::StatusCode::IM_A_TEAPOT, "not json") }),
            )
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => Payload::Json(map),
            _ => Payload::empty(),
        }
    }

    #[test]
    fn test_append_query_builds_pairs_in_order() {
        let mut url = "/search".to_string();
        let data = json!({ "q": "hi", "n": 5 });
        append_query(&mut url, data.as_object().unwrap());
        assert_eq!(url, "/search?q=hi&n=5");
    }

    #[test]
    fn test_append_query_extends_existing_query() {
        let mut url = "/search?page=2".to_string();
        let data = json!({ "flag": true });
        append_query(&mut url, data.as_object().unwrap());
        assert_eq!(url, "/search?page=2&flag=true");
    }

    #[test]
    fn test_append_query_empty_payload_leaves_url() {
        let mut url = "/search".to_string();
        append_query(&mut url, &Map::new());
        assert_eq!(url, "/search");
    }

    #[tokio::test]
    async fn test_get_payload_goes_to_query_string() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let result = fetch_response(
            &client,
            &format!("http://{}/search", addr),
            payload(json!({ "q": "hi", "n": 5 })),
            Method::GET,
            Format::Text,
        )
        .await
        .unwrap();

        assert_eq!(result.as_text(), Some("q=hi&n=5"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_post_payload_is_json_body() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let result = fetch_response(
            &client,
            &format!("http://{}/echo", addr),
            payload(json!({ "a": 1 })),
            Method::POST,
            Format::Json,
        )
        .await
        .unwrap();

        let Decoded::Json(body) = result else {
            panic!("expected json");
        };
        assert_eq!(body["content_type"], "application/json");
        assert_eq!(body["body"], r#"{"a":1}"#);
        handle.abort();
    }

    #[tokio::test]
    async fn test_form_payload_is_multipart() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let mut form = FormPayload::new();
        form.append("label", FormValue::Text("hello".to_string()));
        form.append("file", FormValue::File(FileUpload::new("data.zip", "PK")));

        let result = fetch_response(
            &client,
            &format!("http://{}/upload", addr),
            Payload::Form(form),
            Method::POST,
            Format::Json,
        )
        .await
        .unwrap();

        let Decoded::Json(parts) = result else {
            panic!("expected json");
        };
        assert_eq!(parts[0]["name"], "label");
        assert_eq!(parts[0]["data"], "hello");
        assert_eq!(parts[1]["name"], "file");
        assert_eq!(parts[1]["file_name"], "data.zip");
        handle.abort();
    }

    #[tokio::test]
    async fn test_error_status_rejects_with_decoded_body() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let err = fetch_response(
            &client,
            &format!("http://{}/fail", addr),
            Payload::empty(),
            Method::GET,
            Format::Text,
        )
        .await
        .unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body.as_text(), Some(r#"{"detail":"bad input"}"#));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn test_error_status_falls_back_to_status_text() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let err = fetch_response(
            &client,
            &format!("http://{}/teapot", addr),
            Payload::empty(),
            Method::GET,
            Format::Json,
        )
        .await
        .unwrap_err();

        match err {
            FetchError::Status { body, .. } => assert_eq!(body.as_text(), Some("I'm a teapot")),
            other => panic!("unexpected error: {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn test_result_format_rejects_with_raw_response() {
        let (addr, handle) = spawn_test_server(echo_router()).await;
        let client = Client::new();

        let err = fetch_response(
            &client,
            &format!("http://{}/fail", addr),
            Payload::empty(),
            Method::GET,
            Format::Result,
        )
        .await
        .unwrap_err();

        let FetchError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        let raw = body.into_raw().expect("raw response");
        assert_eq!(raw.content_type(), Some("application/json"));
        assert_eq!(raw.text().await.unwrap(), r#"{"detail":"bad input"}"#);
        handle.abort();
    }

    #[tokio::test]
    async fn test_transport_failure_rejects() {
        let client = Client::new();
        // Port 9 (discard) on localhost is not served in test environments
        let err = fetch_response(
            &client,
            "http://127.0.0.1:9/nothing",
            Payload::empty(),
            Method::GET,
            Format::Text,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }
}
