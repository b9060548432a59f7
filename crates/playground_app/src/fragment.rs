//! Shareable link state.
//!
//! The playground's location carries `base64(JSON({route, data}))` in its
//! fragment. Restoring a link reselects the route and reseeds its inputs;
//! decoding is best-effort and a bad fragment leaves the default state.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Path the playground is mounted at under the API root
pub const PLAYGROUND_PATH: &str = "/api";

/// Fragment decoding failures
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("Fragment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Fragment is not a route state object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Selected route plus its parameter values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentState {
    pub route: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl FragmentState {
    pub fn new(route: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            route: route.into(),
            data,
        }
    }

    pub fn encode(&self) -> String {
        // Serialising a String key map never fails
        let json = serde_json::to_string(self).unwrap_or_default();
        BASE64.encode(json)
    }

    /// Decode a fragment, with or without its leading `#`
    pub fn decode(fragment: &str) -> Result<Self, FragmentError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let bytes = BASE64.decode(fragment.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// The playground's own address: a base URL plus the state fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    base: String,
    hash: String,
}

impl Location {
    /// Location of the playground served by `api_root`
    pub fn for_api_root(api_root: &str) -> Self {
        Self {
            base: format!("{}{}", api_root, PLAYGROUND_PATH),
            hash: String::new(),
        }
    }

    /// Parse a full link, splitting off everything after the first `#`
    pub fn from_link(link: &str) -> Self {
        match link.split_once('#') {
            Some((base, hash)) => Self {
                base: base.to_string(),
                hash: hash.to_string(),
            },
            None => Self {
                base: link.to_string(),
                hash: String::new(),
            },
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn set_base(&mut self, base: impl Into<String>) {
        self.base = base.into();
    }

    /// Fragment without the leading `#`
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn set_hash(&mut self, hash: impl Into<String>) {
        let hash = hash.into();
        self.hash = hash.strip_prefix('#').map(str::to_string).unwrap_or(hash);
    }

    /// Full link including the fragment, if any
    pub fn href(&self) -> String {
        if self.hash.is_empty() {
            self.base.clone()
        } else {
            format!("{}#{}", self.base, self.hash)
        }
    }
}
