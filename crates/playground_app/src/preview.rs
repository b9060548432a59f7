//! Live request previews shown on an expanded card.

use playground_client::RouteDescriptor;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::params::{ParamValue, Params};

/// Placeholder dropped from routes when building request URLs
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Route with the `{path}` placeholder removed
pub fn strip_path_placeholder(route: &str) -> String {
    route.replace(PATH_PLACEHOLDER, "")
}

/// Loose comparison of an entered value against a recorded default.
///
/// Booleans compare with booleans and with the strings `"true"`/`"false"`;
/// everything else compares by string form, so a default of `5` matches an
/// entered `"5"`. A missing default never matches.
pub fn matches_default(default: Option<&Value>, value: &ParamValue) -> bool {
    match (default, value) {
        (None, _) => false,
        (Some(Value::Bool(d)), ParamValue::Bool(v)) => d == v,
        (Some(Value::Bool(d)), ParamValue::Text(v)) => v == if *d { "true" } else { "false" },
        (Some(Value::String(d)), ParamValue::Bool(v)) => d == if *v { "true" } else { "false" },
        (Some(Value::Number(d)), ParamValue::Text(v)) => {
            d.to_string() == *v
                || matches!((d.as_f64(), v.trim().parse::<f64>()), (Some(a), Ok(b)) if a == b)
        }
        (Some(Value::String(d)), ParamValue::Text(v)) => d == v,
        _ => false,
    }
}

/// Default declared for `name`, falsy ones included
fn declared_default<'a>(route: &'a RouteDescriptor, name: &str) -> Option<&'a Value> {
    route
        .parameters
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.default.as_ref())
        .or_else(|| route.defaults.get(name))
}

/// Resolved request URL.
///
/// GET routes carry `k=v` for every truthy value that differs from its
/// declared default.
pub fn url_preview(base_url: &str, route: &RouteDescriptor, params: &Params) -> String {
    let mut url = format!("{}{}", base_url, strip_path_placeholder(&route.path));
    if route.is_get() {
        let query: Vec<String> = params
            .iter()
            .filter(|(name, value)| value.is_truthy() && !matches_default(declared_default(route, name), value))
            .map(|(name, value)| format!("{}={}", name, query_text(value)))
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
    }
    url
}

fn query_text(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Text(s) => s.clone(),
        ParamValue::File(f) => f.file_name.clone(),
    }
}

/// Python `requests` snippet equivalent to the current inputs
pub fn requests_preview(base_url: &str, route: &RouteDescriptor, params: &Params) -> String {
    let body: Map<String, Value> = params
        .iter()
        .filter(|(name, value)| !matches_default(route.defaults.get(*name), value))
        .map(|(name, value)| (name.to_string(), value.to_json()))
        .collect();

    let json = pretty_json(&Value::Object(body))
        .replace(": false", ": False")
        .replace(": true", ": True");

    format!(
        "import requests\n\nrequests.{}(\n  \"{}{}\",\n  {}\n).json()",
        route.method.as_str().to_lowercase(),
        base_url,
        strip_path_placeholder(&route.path),
        json
    )
}

/// JSON pretty-printed with four-space indentation
pub fn pretty_json(value: &Value) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_client::RouteTable;
    use serde_json::json;

    fn routes() -> RouteTable {
        let doc = json!({
            "/search": {
                "get": {
                    "summary": "Search",
                    "parameters": [
                        { "name": "q", "in": "query", "schema": { "default": "rust" } },
                        { "name": "n", "in": "query", "schema": { "default": 5 } },
                        { "name": "exact", "in": "query", "schema": { "default": true } }
                    ]
                }
            },
            "/page": {
                "get": {
                    "summary": "Page",
                    "parameters": [
                        { "name": "page", "in": "query", "schema": { "default": 0 } },
                        { "name": "q", "in": "query", "schema": { "default": "rust" } }
                    ]
                }
            },
            "/files/{path}": {
                "post": {
                    "summary": "Store",
                    "parameters": [{ "name": "path", "in": "path" }]
                }
            }
        });
        RouteTable::from_paths(doc.as_object().unwrap())
    }

    fn search_params(q: &str, n: &str, exact: bool) -> Params {
        [
            ("q".to_string(), ParamValue::Text(q.to_string())),
            ("n".to_string(), ParamValue::Text(n.to_string())),
            ("exact".to_string(), ParamValue::Bool(exact)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_url_preview_omits_defaults() {
        let table = routes();
        let route = table.get("/search").unwrap();
        let url = url_preview("http://h", route, &search_params("rust", "5", true));
        assert_eq!(url, "http://h/search");
    }

    #[test]
    fn test_url_preview_includes_changed_value_only() {
        let table = routes();
        let route = table.get("/search").unwrap();
        let url = url_preview("http://h", route, &search_params("tokio", "5", true));
        assert_eq!(url, "http://h/search?q=tokio");
    }

    #[test]
    fn test_url_preview_skips_falsy_values() {
        let table = routes();
        let route = table.get("/search").unwrap();
        let url = url_preview("http://h", route, &search_params("", "7", false));
        assert_eq!(url, "http://h/search?n=7");
    }

    #[test]
    fn test_url_preview_omits_zero_default() {
        let table = routes();
        let route = table.get("/page").unwrap();
        let mut params = Params::new();
        params.insert("page", ParamValue::Text("0".to_string()));
        params.insert("q", ParamValue::Text("rust".to_string()));
        assert_eq!(url_preview("http://h", route, &params), "http://h/page");

        params.insert("page", ParamValue::Text("2".to_string()));
        assert_eq!(url_preview("http://h", route, &params), "http://h/page?page=2");
    }

    #[test]
    fn test_url_preview_post_has_no_query() {
        let table = routes();
        let route = table.get("/files/{path}").unwrap();
        let mut params = Params::new();
        params.insert("path", ParamValue::Text("a/b".to_string()));
        assert_eq!(url_preview("http://h", route, &params), "http://h/files/");
    }

    #[test]
    fn test_requests_preview_format() {
        let table = routes();
        let route = table.get("/search").unwrap();
        let snippet = requests_preview("http://h", route, &search_params("tokio", "5", false));
        assert_eq!(
            snippet,
            "import requests\n\nrequests.get(\n  \"http://h/search\",\n  {\n    \"q\": \"tokio\",\n    \"exact\": False\n}\n).json()"
        );
    }

    #[test]
    fn test_requests_preview_empty_body() {
        let table = routes();
        let route = table.get("/files/{path}").unwrap();
        let snippet = requests_preview("http://h", route, &Params::new());
        assert_eq!(snippet, "import requests\n\nrequests.post(\n  \"http://h/files/\",\n  {}\n).json()");
    }

    #[test]
    fn test_matches_default_is_loose() {
        assert!(matches_default(Some(&json!(5)), &ParamValue::Text("5".to_string())));
        assert!(matches_default(Some(&json!(2.5)), &ParamValue::Text("2.50".to_string())));
        assert!(matches_default(Some(&json!(true)), &ParamValue::Bool(true)));
        assert!(matches_default(Some(&json!(true)), &ParamValue::Text("true".to_string())));
        assert!(!matches_default(Some(&json!("a")), &ParamValue::Text("b".to_string())));
        assert!(!matches_default(None, &ParamValue::Text("b".to_string())));
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        assert_eq!(pretty_json(&json!({ "a": 1 })), "{\n    \"a\": 1\n}");
    }
}
