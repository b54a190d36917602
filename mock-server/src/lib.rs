use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw of a request, returned by `/inspect`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub method: String,
    pub path: String,
    pub raw_query: Option<String>,
    pub query: Vec<(String, String)>,
    /// Header names are lowercase; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct SlowParams {
    pub ms: u64,
}

#[derive(Deserialize)]
pub struct LargeParams {
    pub bytes: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/echo", any(echo))
        .route("/bytes", get(latin1))
        .route("/large", get(large))
        .route("/inspect", any(inspect))
        .route("/slow", get(slow))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ping() -> &'static str {
    "pong"
}

async fn echo(body: Bytes) -> Bytes {
    body
}

/// Body that is not valid UTF-8.
async fn latin1() -> Vec<u8> {
    b"caf\xe9".to_vec()
}

async fn large(Query(params): Query<LargeParams>) -> Vec<u8> {
    vec![b'x'; params.bytes]
}

async fn inspect(
    method: Method,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Inspection> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        seen.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    tracing::debug!(%method, path = uri.path(), "inspect");
    Json(Inspection {
        method: method.to_string(),
        path: uri.path().to_string(),
        raw_query,
        query,
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn slow(Query(params): Query<SlowParams>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    "done"
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")),
        Err(_) => (StatusCode::BAD_REQUEST, format!("invalid status {code}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspection_roundtrips_through_json() {
        let inspection = Inspection {
            method: "GET".to_string(),
            path: "/inspect".to_string(),
            raw_query: Some("x=1".to_string()),
            query: vec![("x".to_string(), "1".to_string())],
            headers: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
            body: String::new(),
        };
        let json = serde_json::to_string(&inspection).unwrap();
        let back: Inspection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inspection);
    }

    #[test]
    fn slow_params_require_ms() {
        let result: Result<SlowParams, _> = serde_json::from_str(r#"{}"#);
        assert!(result.is_err());
    }
}
