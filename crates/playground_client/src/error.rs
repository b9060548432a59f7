//! Request failure types.

use reqwest::StatusCode;
use thiserror::Error;

use crate::fetch::Decoded;

/// Errors produced by a single request.
///
/// # Variants
///
/// - `Transport`: the request never produced a response (DNS, refused
///   connection, broken body stream)
/// - `Status`: the service answered with a non-2xx status; `body` carries the
///   decoded error body, the status text when decoding failed, or the raw
///   response when the caller asked for [`Format::Result`](crate::Format::Result)
/// - `Decode`: a 2xx response whose body could not be decoded in the
///   requested format
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Rejection value
        body: Decoded,
    },

    #[error("Failed to decode response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl FetchError {
    /// Status code of an HTTP-level failure
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(e) | FetchError::Decode(e) => e.status(),
        }
    }
}
