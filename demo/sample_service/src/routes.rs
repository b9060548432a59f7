//! Route handlers.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::openapi::openapi_document;

/// 1x1 transparent PNG
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
    0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D,
    0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Empty zip archive (end of central directory record only)
pub const EMPTY_ZIP: &[u8] = &[
    0x50, 0x4B, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// Build the service router
pub fn build_router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi))
        .route("/docs", get(docs))
        .route("/favicon.ico", get(favicon))
        .route("/hello", get(hello))
        .route("/greet", get(greet))
        .route("/add", get(add))
        .route("/html", get(html))
        .route("/json", get(json_document))
        .route("/pixel", get(pixel))
        .route("/archive", get(archive))
        .route("/config.yaml", get(config_yaml))
        .route("/fail", get(fail))
        .route("/fail_verbose", get(fail_verbose))
        .route("/go/*path", get(go))
        .route("/echo", post(echo))
        .route("/upload", post(upload))
        .layer(TraceLayer::new_for_http())
}

/// `{"detail": message}` with the given status
fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

async fn docs() -> Html<String> {
    let document = openapi_document();
    let mut items = String::new();
    if let Some(paths) = document["paths"].as_object() {
        for (path, item) in paths {
            if let Some((method, operation)) = item.as_object().and_then(|ops| ops.iter().next()) {
                let summary = operation["summary"].as_str().unwrap_or_default();
                items.push_str(&format!(
                    "<li><code>{} {}</code> {}</li>",
                    method.to_uppercase(),
                    path,
                    summary
                ));
            }
        }
    }
    Html(format!("<h1>Sample Service</h1><ul>{}</ul>", items))
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn hello() -> &'static str {
    "Hello, world!"
}

#[derive(Debug, Deserialize)]
struct GreetQuery {
    name: Option<String>,
    loud: Option<bool>,
    times: Option<u32>,
}

async fn greet(Query(query): Query<GreetQuery>) -> String {
    let name = query.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "world".to_string());
    let mut line = format!("Hello, {}!", name);
    if query.loud.unwrap_or(false) {
        line = line.to_uppercase();
    }
    vec![line; query.times.unwrap_or(1).max(1) as usize].join("\n")
}

#[derive(Debug, Deserialize)]
struct AddQuery {
    x: Option<f64>,
    y: Option<f64>,
}

async fn add(Query(query): Query<AddQuery>) -> Response {
    match (query.x, query.y) {
        (Some(x), Some(y)) => Json(json!({ "x": x, "y": y, "sum": x + y })).into_response(),
        _ => detail(StatusCode::UNPROCESSABLE_ENTITY, "x and y are required"),
    }
}

async fn html() -> Html<&'static str> {
    Html("<h1>Sample Service</h1><p>This body is <b>HTML</b>.</p>")
}

async fn json_document() -> Json<Value> {
    Json(json!({
        "service": "sample",
        "features": ["text", "json", "image", "download", "redirect", "upload"],
        "nested": { "ok": true }
    }))
}

async fn pixel() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], PIXEL_PNG)
}

async fn archive() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bundle.zip\""),
        ],
        EMPTY_ZIP,
    )
}

async fn config_yaml() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/yaml"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"config.yaml\""),
        ],
        "service: sample\nport: 8080\n",
    )
}

async fn fail() -> Response {
    detail(StatusCode::BAD_REQUEST, "bad input")
}

async fn fail_verbose() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": "bad input", "field": "name" })),
    )
        .into_response()
}

async fn go(Path(path): Path<String>) -> Redirect {
    Redirect::temporary(&format!("/{}", path.trim_matches('/')))
}

async fn echo(body: Bytes) -> Response {
    if body.is_empty() {
        return Json(json!({})).into_response();
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => Json(value).into_response(),
        Err(e) => detail(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)),
    }
}

async fn upload(mut multipart: Multipart) -> Response {
    let mut file: Option<(String, usize)> = None;
    let mut label: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return detail(StatusCode::BAD_REQUEST, e.body_text()),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return detail(StatusCode::BAD_REQUEST, e.body_text()),
        };
        match name.as_str() {
            "file" => file = Some((file_name.unwrap_or_default(), data.len())),
            "label" => label = Some(String::from_utf8_lossy(&data).into_owned()),
            _ => tracing::debug!(field = %name, "Ignoring form field"),
        }
    }

    match file {
        Some((name, size)) => {
            tracing::info!(file = %name, size, "Upload received");
            Json(json!({ "file": name, "size": size, "label": label })).into_response()
        }
        None => detail(StatusCode::BAD_REQUEST, "file is required"),
    }
}
