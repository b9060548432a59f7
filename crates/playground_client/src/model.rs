//! Route table built from an OpenAPI `paths` object.
//!
//! Only the slice of the document the playground renders is modelled:
//! `summary`, `description`, `tags` and `parameters[{name, in, schema.default}]`
//! of each path's `get` or `post` operation. Anything else is ignored, and
//! a path item that does not fit this shape is skipped with a warning.

use std::collections::HashMap;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Accepted upload extension for file inputs
pub const FILE_ACCEPT: &str = ".zip";

/// Summary marker identifying redirect-only endpoints
const REDIRECT_MARKER: &str = "temporary redirect";

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Form,
    Header,
    Cookie,
    #[serde(other)]
    Other,
}

/// Input widget chosen for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Checkbox,
    Number,
    Text,
    /// File picker restricted to one extension
    File { accept: &'static str },
}

impl InputKind {
    /// Infer the input kind from a parameter's declaration.
    ///
    /// First match wins: a form field named `file` is a file picker; a boolean
    /// default is a checkbox; a truthy numeric default is a number input;
    /// everything else is free text.
    pub fn infer(name: &str, location: ParameterLocation, default: Option<&Value>) -> Self {
        if location == ParameterLocation::Form && name == "file" {
            return InputKind::File { accept: FILE_ACCEPT };
        }
        match default {
            Some(Value::Bool(_)) => InputKind::Checkbox,
            Some(value) if is_truthy(value) && is_numeric(value) => InputKind::Number,
            _ => InputKind::Text,
        }
    }
}

/// JavaScript-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty() && s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Text shown in an input seeded with `value`
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One parameter of a route
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Name, unique within its route
    pub name: String,
    pub location: ParameterLocation,
    /// Declared `schema.default`
    pub default: Option<Value>,
    pub kind: InputKind,
}

/// One callable endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDescriptor {
    pub path: String,
    pub method: Method,
    pub summary: String,
    pub description: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub tags: Vec<String>,
    /// Truthy declared defaults, by parameter name
    pub defaults: Map<String, Value>,
}

impl RouteDescriptor {
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether any parameter is a form field
    pub fn is_form(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Form)
    }

    /// Whether the summary marks this route as redirect-only
    pub fn is_redirect(&self) -> bool {
        self.summary.to_lowercase().contains(REDIRECT_MARKER)
    }

    /// Build a descriptor from a schema operation object
    pub fn from_operation(path: &str, method: Method, operation: Operation) -> Self {
        let mut defaults = Map::new();
        let parameters = operation
            .parameters
            .into_iter()
            .map(|param| {
                let default = param.schema.and_then(|s| s.default);
                if let Some(value) = default.as_ref().filter(|v| is_truthy(v)) {
                    defaults.insert(param.name.clone(), value.clone());
                }
                ParameterDescriptor {
                    kind: InputKind::infer(&param.name, param.location, default.as_ref()),
                    name: param.name,
                    location: param.location,
                    default,
                }
            })
            .collect();

        Self {
            path: path.to_string(),
            method,
            summary: operation.summary.unwrap_or_default(),
            description: operation.description.filter(|d| !d.is_empty()),
            parameters,
            tags: operation.tags,
            defaults,
        }
    }
}

/// Schema operation object (the subset the playground reads)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
}

/// Schema parameter object
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub schema: Option<ParameterSchema>,
}

/// Schema parameter `schema` object
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParameterSchema {
    pub default: Option<Value>,
}

/// Schema path item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
}

/// Routes by path, GET routes first then POST routes, each in schema order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Build the table from a schema's `paths` object.
    ///
    /// Paths containing `favicon` are ignored. A path with a `get` operation
    /// contributes only that operation, even when it also has `post`.
    pub fn from_paths(paths: &Map<String, Value>) -> Self {
        let mut get_routes = Vec::new();
        let mut post_routes = Vec::new();

        for (path, item) in paths {
            if path.contains("favicon") {
                continue;
            }
            let item: PathItem = match serde_json::from_value(item.clone()) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(%path, error = %e, "Skipping malformed path item");
                    continue;
                }
            };
            if let Some(get) = item.get {
                if item.post.is_some() {
                    tracing::debug!(%path, "Path declares get and post; using get");
                }
                get_routes.push(RouteDescriptor::from_operation(path, Method::GET, get));
            } else if let Some(post) = item.post {
                post_routes.push(RouteDescriptor::from_operation(path, Method::POST, post));
            }
        }

        let routes: Vec<RouteDescriptor> = get_routes.into_iter().chain(post_routes).collect();
        let index = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.path.clone(), i))
            .collect();

        Self { routes, index }
    }

    pub fn get(&self, path: &str) -> Option<&RouteDescriptor> {
        self.index.get(path).map(|&i| &self.routes[i])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// All routes in display order
    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn get_routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().filter(|r| r.method == Method::GET)
    }

    pub fn post_routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().filter(|r| r.method == Method::POST)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_paths() -> Map<String, Value> {
        let doc = json!({
            "/submit": {
                "post": {
                    "summary": "Submit a form",
                    "tags": ["forms"],
                    "parameters": [
                        { "name": "file", "in": "form" },
                        { "name": "label", "in": "form", "schema": { "default": "" } }
                    ]
                }
            },
            "/hello": {
                "get": {
                    "summary": "A simple hello world function.",
                    "description": "Says hello.",
                    "tags": [],
                    "parameters": [
                        { "name": "name", "in": "query", "schema": { "type": "string", "default": "world" } },
                        { "name": "loud", "in": "query", "schema": { "default": false } },
                        { "name": "times", "in": "query", "schema": { "default": "3" } },
                        { "name": "zero", "in": "query", "schema": { "default": 0 } }
                    ]
                }
            },
            "/favicon.ico": { "get": { "summary": "icon" } },
            "/both": {
                "get": { "summary": "both via get" },
                "post": { "summary": "both via post" }
            },
            "/bad": { "get": "not an operation" },
            "/nothing": { "put": { "summary": "unsupported" } }
        });
        doc.as_object().unwrap().clone()
    }

    #[test]
    fn test_from_paths_orders_get_before_post() {
        let table = RouteTable::from_paths(&sample_paths());
        let order: Vec<&str> = table.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(order, vec!["/hello", "/both", "/submit"]);
        assert_eq!(table.get_routes().count(), 2);
        assert_eq!(table.post_routes().count(), 1);
    }

    #[test]
    fn test_from_paths_skips_favicon_and_unsupported() {
        let table = RouteTable::from_paths(&sample_paths());
        assert!(!table.contains("/favicon.ico"));
        assert!(!table.contains("/nothing"));
        assert!(!table.contains("/bad"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_get_takes_priority_over_post() {
        let table = RouteTable::from_paths(&sample_paths());
        let both = table.get("/both").unwrap();
        assert_eq!(both.method, Method::GET);
        assert_eq!(both.summary, "both via get");
    }

    #[test]
    fn test_input_kinds_follow_defaults() {
        let table = RouteTable::from_paths(&sample_paths());
        let hello = table.get("/hello").unwrap();
        let kinds: Vec<InputKind> = hello.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![InputKind::Text, InputKind::Checkbox, InputKind::Number, InputKind::Text]
        );

        let submit = table.get("/submit").unwrap();
        assert_eq!(submit.parameters[0].kind, InputKind::File { accept: ".zip" });
        assert!(submit.is_form());
        assert!(!hello.is_form());
    }

    #[test]
    fn test_only_truthy_defaults_are_recorded() {
        let table = RouteTable::from_paths(&sample_paths());
        let hello = table.get("/hello").unwrap();
        assert_eq!(hello.defaults.get("name"), Some(&json!("world")));
        assert_eq!(hello.defaults.get("times"), Some(&json!("3")));
        assert!(!hello.defaults.contains_key("loud"));
        assert!(!hello.defaults.contains_key("zero"));
    }

    #[test]
    fn test_descriptor_fields() {
        let table = RouteTable::from_paths(&sample_paths());
        let hello = table.get("/hello").unwrap();
        assert!(hello.is_get());
        assert_eq!(hello.description.as_deref(), Some("Says hello."));
        assert_eq!(hello.parameters[0].location, ParameterLocation::Query);

        let submit = table.get("/submit").unwrap();
        assert_eq!(submit.tags, vec!["forms".to_string()]);
        assert!(submit.description.is_none());
    }

    #[test]
    fn test_redirect_detection() {
        let op = Operation {
            summary: Some("Temporary Redirect to the docs".to_string()),
            ..Default::default()
        };
        let route = RouteDescriptor::from_operation("/go", Method::GET, op);
        assert!(route.is_redirect());
    }

    #[test]
    fn test_unknown_location_is_other() {
        let param: Parameter =
            serde_json::from_value(json!({ "name": "x", "in": "matrix" })).unwrap();
        assert_eq!(param.location, ParameterLocation::Other);
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(2.5)));
        assert!(is_truthy(&json!([])));
    }
}
