//! Per-call request description.
//!
//! # Design
//! Callers describe a request through the `RequestDescriptor` trait, either
//! with their own type or with the `Request` builder provided here. The
//! dispatcher never keeps a reference to the descriptor: it copies every
//! field into an immutable `RequestContext` while it holds its guard, and
//! only that snapshot flows into request construction.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::http::HttpMethod;

/// Request payload for POST and PUT.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// String-keyed mapping, sent JSON-encoded.
    Json(Map<String, Value>),
    /// Raw text, sent byte for byte.
    Raw(String),
    #[default]
    Empty,
}

impl Payload {
    /// Bytes to put on the wire.
    pub fn encode(&self) -> Result<Vec<u8>, DispatchError> {
        match self {
            Payload::Json(map) => Ok(serde_json::to_vec(map)?),
            Payload::Raw(text) => Ok(text.as_bytes().to_vec()),
            Payload::Empty => Ok(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Json(map)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.to_string())
    }
}

/// Everything the dispatcher needs to know about one call.
pub trait RequestDescriptor {
    /// Network timeout for this call. `None` defers to the dispatcher's
    /// configured default.
    fn timeout(&self) -> Option<Duration>;

    /// Caller instrumentation flag. Raises the dispatcher's log level for
    /// this call; request construction ignores it.
    fn debug(&self) -> bool;

    fn method(&self) -> HttpMethod;

    fn headers(&self) -> &BTreeMap<String, String>;

    /// Appended verbatim to the dispatcher host.
    fn uri(&self) -> &str;

    fn query(&self) -> &[(String, String)];

    fn body(&self) -> &Payload;
}

/// Builder-style `RequestDescriptor`.
///
/// ```
/// use std::time::Duration;
/// use dispatch_core::{Request, RequestDescriptor};
///
/// let req = Request::get("/ping")
///     .with_query("x", "1")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(req.query(), &[("x".to_string(), "1".to_string())]);
/// assert_eq!(req.timeout(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: HttpMethod,
    uri: String,
    headers: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    body: Payload,
    timeout: Option<Duration>,
    debug: bool,
}

impl Request {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: Payload::Empty,
            timeout: None,
            debug: false,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, uri)
    }

    /// Set a header, replacing any previous value under the same key.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a query parameter. Repeated keys are kept.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON mapping body.
    pub fn with_json(self, map: Map<String, Value>) -> Self {
        self.with_body(Payload::Json(map))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl RequestDescriptor for Request {
    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn query(&self) -> &[(String, String)] {
        &self.query
    }

    fn body(&self) -> &Payload {
        &self.body
    }
}

/// Immutable snapshot of a descriptor, taken once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Payload,
    pub timeout: Option<Duration>,
    pub debug: bool,
}

impl RequestContext {
    pub fn capture<D: RequestDescriptor + ?Sized>(descriptor: &D) -> Self {
        Self {
            method: descriptor.method(),
            uri: descriptor.uri().to_string(),
            headers: descriptor.headers().clone(),
            query: descriptor.query().to_vec(),
            body: descriptor.body().clone(),
            timeout: descriptor.timeout(),
            debug: descriptor.debug(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_payload_encodes_mapping() {
        let map = json!({"a": 1}).as_object().cloned().unwrap();
        let bytes = Payload::Json(map).encode().unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }

    #[test]
    fn raw_payload_is_passed_through() {
        let text = "not {json} \u{e9}";
        let bytes = Payload::from(text).encode().unwrap();
        assert_eq!(bytes, text.as_bytes());
    }

    #[test]
    fn empty_payload_encodes_to_nothing() {
        assert!(Payload::Empty.encode().unwrap().is_empty());
        assert!(Payload::default().is_empty());
    }

    #[test]
    fn builder_keeps_repeated_query_keys_in_order() {
        let req = Request::get("/search")
            .with_query("tag", "a")
            .with_query("tag", "b");
        assert_eq!(
            req.query(),
            &[
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn header_replaces_previous_value() {
        let req = Request::get("/")
            .with_header("X-Id", "1")
            .with_header("X-Id", "2");
        assert_eq!(req.headers().get("X-Id").map(String::as_str), Some("2"));
    }

    #[test]
    fn capture_copies_every_field() {
        let req = Request::put("/items/1")
            .with_header("Accept", "text/plain")
            .with_query("v", "2")
            .with_body("raw")
            .with_timeout(Duration::from_millis(250))
            .with_debug(true);

        let ctx = RequestContext::capture(&req);
        assert_eq!(ctx.method, HttpMethod::Put);
        assert_eq!(ctx.uri, "/items/1");
        assert_eq!(ctx.headers.len(), 1);
        assert_eq!(ctx.query, vec![("v".to_string(), "2".to_string())]);
        assert_eq!(ctx.body, Payload::Raw("raw".to_string()));
        assert_eq!(ctx.timeout, Some(Duration::from_millis(250)));
        assert!(ctx.debug);
    }
}
