//! # Playground Client
//!
//! HTTP plumbing for the API playground.
//!
//! ## Layers
//! - **fetch**: one request, one outcome. Payload placement (query string,
//!   JSON body, multipart form) and response decoding (`text`, `json`, `blob`,
//!   raw `result`).
//! - **route**: [`RouteClient`], an immutable builder accumulating a path
//!   (`api.at("users").at("123")`) and invoking it with any HTTP method.
//! - **schema**: [`SchemaClient`], which fetches `/openapi.json` exactly once
//!   and shares the resulting `paths` object with every awaiter.
//! - **model**: route descriptors and the route table built from that schema.

pub mod error;
pub mod fetch;
pub mod model;
pub mod route;
pub mod schema;

pub use error::FetchError;
pub use fetch::{fetch_response, Decoded, FileUpload, FormPayload, FormValue, Format, Payload, RawResponse};
pub use model::{InputKind, ParameterDescriptor, ParameterLocation, RouteDescriptor, RouteTable};
pub use reqwest::Method;
pub use route::RouteClient;
pub use schema::{Paths, PathsFuture, SchemaClient, SchemaError, SCHEMA_PATH};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fetch::{Decoded, Format, Payload};
    pub use crate::model::{RouteDescriptor, RouteTable};
    pub use crate::route::RouteClient;
    pub use crate::schema::SchemaClient;
}
