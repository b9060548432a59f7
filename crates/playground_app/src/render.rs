//! Result classification and error normalisation.
//!
//! A raw response is classified by its `Content-Type`:
//!
//! | Content type                           | Outcome                      |
//! |----------------------------------------|------------------------------|
//! | `image/*`                              | inline image via a blob URL  |
//! | `application/zip`, `application/yaml`  | download plus a blob link    |
//! | anything else                          | body text, verbatim          |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use playground_client::{Decoded, FetchError, RawResponse};
use serde_json::Value;

use crate::preview::pretty_json;

/// Content types that trigger a download
pub const DOWNLOAD_TYPES: [&str; 2] = ["application/zip", "application/yaml"];

/// File name used when the response names none
pub const FALLBACK_FILENAME: &str = "download";

/// A response body after classification
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Image { content_type: String, bytes: Bytes },
    Download { filename: String, content_type: String, bytes: Bytes },
    Text(String),
}

/// Read and classify a raw response
pub async fn classify_response(raw: RawResponse) -> Result<Converted, reqwest::Error> {
    let content_type = raw.content_type().unwrap_or_default().to_string();

    if content_type.starts_with("image") {
        let bytes = raw.bytes().await?;
        return Ok(Converted::Image { content_type, bytes });
    }

    if DOWNLOAD_TYPES.contains(&content_type.as_str()) {
        let filename = content_disposition_filename(raw.content_disposition());
        let bytes = raw.bytes().await?;
        return Ok(Converted::Download {
            filename,
            content_type,
            bytes,
        });
    }

    Ok(Converted::Text(raw.text().await?))
}

/// File name announced by a `Content-Disposition` header.
///
/// Takes the text after the first `filename=`, drops every `"` and keeps only
/// the final path component.
pub fn content_disposition_filename(header: Option<&str>) -> String {
    let Some((_, name)) = header.and_then(|h| h.split_once("filename=")) else {
        return FALLBACK_FILENAME.to_string();
    };
    let name = name.replace('"', "");
    let name = name.trim();
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Human-readable message for an error body
pub fn error_message(text: &str) -> String {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return text.to_string();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => match object.get("detail") {
            Some(detail) if object.len() == 1 => match detail {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            _ => pretty_json(&Value::Object(object)),
        },
        _ => text.to_string(),
    }
}

/// Normalise any invocation failure to one displayable string
pub async fn resolve_error(error: FetchError) -> String {
    match error {
        FetchError::Status { status, body } => match body {
            Decoded::Text(text) => error_message(&text),
            Decoded::Json(value) => error_message(&value.to_string()),
            Decoded::Blob(bytes) => error_message(&String::from_utf8_lossy(&bytes)),
            Decoded::Raw(raw) => match raw.text().await {
                Ok(text) => error_message(&text),
                Err(e) => {
                    tracing::warn!(%status, error = %e, "Failed to read error body");
                    status.canonical_reason().unwrap_or_default().to_string()
                }
            },
        },
        other => other.to_string(),
    }
}

/// What the result panel shows
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Image {
        blob_url: String,
        content_type: String,
        size: usize,
    },
    Download {
        filename: String,
        blob_url: String,
        saved_to: Option<PathBuf>,
    },
    Markup(String),
    /// Embedded destination of a redirect-only route
    Frame { url: String },
}

impl Rendered {
    /// Target opened by the "open result" action
    pub fn open_target(&self) -> Option<&str> {
        match self {
            Rendered::Frame { url } => Some(url),
            Rendered::Image { blob_url, .. } | Rendered::Download { blob_url, .. } => Some(blob_url),
            Rendered::Markup(_) => None,
        }
    }
}

/// A registered in-memory object
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Bytes,
}

/// In-memory objects addressed by `blob:` URLs
#[derive(Debug, Default)]
pub struct BlobStore {
    origin: String,
    blobs: HashMap<String, Blob>,
}

impl BlobStore {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            blobs: HashMap::new(),
        }
    }

    /// Register bytes and return their `blob:<origin>/<uuid>` URL
    pub fn register(&mut self, content_type: impl Into<String>, bytes: Bytes) -> String {
        let url = format!("blob:{}/{}", self.origin, uuid::Uuid::new_v4());
        self.blobs.insert(
            url.clone(),
            Blob {
                content_type: content_type.into(),
                bytes,
            },
        );
        url
    }

    pub fn get(&self, url: &str) -> Option<&Blob> {
        self.blobs.get(url)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Write a blob to `dir`, named after its id and content subtype
    pub fn export(&self, url: &str, dir: &Path) -> std::io::Result<PathBuf> {
        let blob = self.get(url).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("unknown blob {}", url))
        })?;
        let id = url.rsplit('/').next().unwrap_or("blob");
        let extension = blob
            .content_type
            .split_once('/')
            .map(|(_, sub)| sub.split(|c| c == '+' || c == ';').next().unwrap_or(sub).trim())
            .filter(|sub| !sub.is_empty())
            .unwrap_or("bin");

        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", id, extension));
        std::fs::write(&path, &blob.bytes)?;
        Ok(path)
    }

    /// Drop every registered blob
    pub fn clear(&mut self) {
        self.blobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_filename() {
        assert_eq!(
            content_disposition_filename(Some(r#"attachment; filename="report.zip""#)),
            "report.zip"
        );
        assert_eq!(content_disposition_filename(Some("attachment; filename=a.yaml")), "a.yaml");
        assert_eq!(content_disposition_filename(Some("attachment")), "download");
        assert_eq!(content_disposition_filename(None), "download");
        assert_eq!(
            content_disposition_filename(Some(r#"attachment; filename="../x/y.zip""#)),
            "y.zip"
        );
    }

    #[test]
    fn test_error_message_detail_only() {
        assert_eq!(error_message(r#"{"detail": "bad input"}"#), "bad input");
        assert_eq!(error_message(r#"{"detail": {"code": 3}}"#), r#"{"code":3}"#);
    }

    #[test]
    fn test_error_message_other_shape_is_pretty() {
        assert_eq!(
            error_message(r#"{"detail":"x","other":1}"#),
            "{\n    \"detail\": \"x\",\n    \"other\": 1\n}"
        );
    }

    #[test]
    fn test_error_message_raw_text() {
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
        assert_eq!(error_message("{not json}"), "{not json}");
    }

    #[tokio::test]
    async fn test_resolve_error_status_text() {
        let error = FetchError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: Decoded::Text(r#"{"detail":"nope"}"#.to_string()),
        };
        assert_eq!(resolve_error(error).await, "nope");
    }

    #[test]
    fn test_blob_store_register_and_export() {
        let mut store = BlobStore::new("http://h");
        let url = store.register("image/png", Bytes::from_static(b"\x89PNG"));
        assert!(url.starts_with("blob:http://h/"));
        assert_eq!(store.get(&url).unwrap().content_type, "image/png");

        let dir = tempfile::tempdir().unwrap();
        let path = store.export(&url, dir.path()).unwrap();
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG");

        store.clear();
        assert!(store.is_empty());
        assert!(store.export(&url, dir.path()).is_err());
    }

    #[test]
    fn test_open_target() {
        assert_eq!(Rendered::Markup("x".into()).open_target(), None);
        let frame = Rendered::Frame {
            url: "http://h/go/".into(),
        };
        assert_eq!(frame.open_target(), Some("http://h/go/"));
    }
}
