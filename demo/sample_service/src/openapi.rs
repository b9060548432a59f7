//! Hand-written OpenAPI document.
//!
//! Form fields are declared with `"in": "form"`, which the playground reads
//! as a request to send multipart data.

use serde_json::{json, Value};

/// The service's `/openapi.json` document
pub fn openapi_document() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Sample Service",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/hello": {
                "get": {
                    "summary": "Plain text greeting",
                    "tags": ["text"]
                }
            },
            "/greet": {
                "get": {
                    "summary": "Personalised greeting",
                    "description": "Repeats the greeting `times` times, upper-cased when `loud` is set.",
                    "tags": ["text"],
                    "parameters": [
                        { "name": "name", "in": "query", "schema": { "type": "string", "default": "world" } },
                        { "name": "loud", "in": "query", "schema": { "type": "boolean", "default": false } },
                        { "name": "times", "in": "query", "schema": { "type": "integer", "default": "1" } }
                    ]
                }
            },
            "/add": {
                "get": {
                    "summary": "Add two numbers",
                    "tags": ["json"],
                    "parameters": [
                        { "name": "x", "in": "query", "schema": { "type": "number", "default": 1 } },
                        { "name": "y", "in": "query", "schema": { "type": "number", "default": 2 } }
                    ]
                }
            },
            "/html": {
                "get": { "summary": "HTML fragment", "tags": ["markup"] }
            },
            "/json": {
                "get": { "summary": "JSON document", "tags": ["json"] }
            },
            "/pixel": {
                "get": { "summary": "One pixel PNG", "tags": ["binary"] }
            },
            "/archive": {
                "get": { "summary": "Zip archive download", "tags": ["binary"] }
            },
            "/config.yaml": {
                "get": { "summary": "YAML download", "tags": ["binary"] }
            },
            "/fail": {
                "get": { "summary": "Structured error", "tags": ["errors"] }
            },
            "/fail_verbose": {
                "get": { "summary": "Structured error with extra fields", "tags": ["errors"] }
            },
            "/go/{path}": {
                "get": {
                    "summary": "Temporary Redirect to another page of this service",
                    "tags": ["redirect"],
                    "parameters": [
                        { "name": "path", "in": "path", "schema": { "type": "string", "default": "html" } }
                    ]
                }
            },
            "/echo": {
                "post": {
                    "summary": "Echo the request body",
                    "tags": ["json"],
                    "parameters": [
                        { "name": "text", "in": "query", "schema": { "type": "string", "default": "ping" } },
                        { "name": "shout", "in": "query", "schema": { "type": "boolean", "default": true } }
                    ]
                }
            },
            "/upload": {
                "post": {
                    "summary": "Upload a zip archive",
                    "tags": ["binary"],
                    "parameters": [
                        { "name": "file", "in": "form" },
                        { "name": "label", "in": "form", "schema": { "type": "string", "default": "bundle" } }
                    ]
                }
            },
            "/favicon.ico": {
                "get": { "summary": "Favicon" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_has_paths() {
        let doc = openapi_document();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("/hello"));
        assert!(paths["/upload"]["post"]["parameters"][0]["in"] == "form");
    }

    #[test]
    fn test_redirect_route_is_marked() {
        let doc = openapi_document();
        let summary = doc["paths"]["/go/{path}"]["get"]["summary"].as_str().unwrap();
        assert!(summary.to_lowercase().contains("temporary redirect"));
    }
}
