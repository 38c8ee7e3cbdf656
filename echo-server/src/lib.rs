//! Fixture HTTP server for exercising the client library end-to-end.
//!
//! Serves a body under every content type the decode table recognizes, plus
//! one deliberately unrecognized type, and echoes back what it receives so
//! round-trip tests can compare against the original payload. Stateless.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::RawQuery,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;

pub fn app() -> Router {
    Router::new()
        .route("/echo", post(echo))
        .route("/greet", get(greet))
        .route("/headers", get(headers))
        .route("/query", get(query))
        .route("/xml", get(xml))
        .route("/mystery", get(mystery))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Echo the request body, mirroring the request's Content-Type onto the
/// response (application/octet-stream when the request carried none).
async fn echo(request_headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = request_headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

/// Fixed greeting; axum declares `text/plain; charset=utf-8` for `&str`.
async fn greet() -> &'static str {
    "hello from echo-server"
}

/// The request headers rendered as a JSON object of name → values.
async fn headers(request_headers: HeaderMap) -> Json<BTreeMap<String, Vec<String>>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in request_headers.iter() {
        out.entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }
    Json(out)
}

/// The raw query string exactly as the server received it.
async fn query(RawQuery(raw): RawQuery) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], raw.unwrap_or_default())
}

async fn xml() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        "<greeting><message>hello</message><lang>en</lang></greeting>",
    )
}

/// A body under a content type no decode table should recognize.
async fn mystery() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "xxx")], "mystery payload")
}
