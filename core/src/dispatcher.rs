//! Blocking request dispatcher.
//!
//! # Design
//! `Dispatcher` holds only configuration: the host, a default-header map and
//! a default timeout. Each call snapshots its descriptor into a
//! `RequestContext`, builds an `HttpRequest` from it without I/O
//! (`build_request`), then hands the request to the `Transport`.
//!
//! A per-instance guard serializes calls, so at most one round-trip is in
//! flight per dispatcher. Separate dispatchers never contend with each other.
//! Default headers live behind their own `RwLock` and may be changed while
//! calls are running; a call sees the map as it was when the call started
//! building its request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, debug_span, info, warn};

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::{RequestContext, RequestDescriptor};
use crate::transport::{Transport, UreqTransport};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

pub struct Dispatcher {
    host: String,
    default_headers: RwLock<BTreeMap<String, String>>,
    default_timeout: Option<Duration>,
    guard: Mutex<()>,
    transport: Box<dyn Transport>,
}

impl Dispatcher {
    /// Dispatcher over the default blocking transport.
    pub fn new(
        host: impl Into<String>,
        default_headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self::with_transport(host, default_headers, UreqTransport::new())
    }

    pub fn with_transport(
        host: impl Into<String>,
        default_headers: impl IntoIterator<Item = (String, String)>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            host: host.into(),
            default_headers: RwLock::new(default_headers.into_iter().collect()),
            default_timeout: None,
            guard: Mutex::new(()),
            transport: Box::new(transport),
        }
    }

    pub fn from_config(config: &DispatcherConfig) -> Self {
        let transport = UreqTransport::with_limit(config.max_response_bytes);
        Self::with_transport(config.host.clone(), config.default_headers.clone(), transport)
            .with_default_timeout(config.timeout())
    }

    /// Timeout applied to calls whose descriptor has none.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Insert or overwrite a default header. Safe to call while other
    /// threads are dispatching.
    pub fn add_default_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn default_headers(&self) -> BTreeMap<String, String> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issue one request and return the response body as text.
    ///
    /// Non-2xx responses are returned like any other; only construction,
    /// network and body-read failures produce an error.
    pub fn execute<D: RequestDescriptor + ?Sized>(
        &self,
        descriptor: &D,
    ) -> Result<String, DispatchError> {
        self.send(descriptor).map(|response| response.body)
    }

    /// Like `execute`, but keeps the status code and response headers.
    pub fn send<D: RequestDescriptor + ?Sized>(
        &self,
        descriptor: &D,
    ) -> Result<HttpResponse, DispatchError> {
        // The guard protects no data, so a panic in a previous holder
        // leaves nothing to repair.
        let _serial = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let context = RequestContext::capture(descriptor);
        let request = self.build_request(&context)?;

        let span = debug_span!("dispatch", method = %request.method, url = %request.url);
        let _enter = span.enter();

        if context.debug {
            info!(query = ?request.query, headers = ?request.header_names(), "sending request");
        } else {
            debug!(query = ?request.query, "sending request");
        }

        match self.transport.send(&request) {
            Ok(response) => {
                if context.debug {
                    info!(status = response.status, body = %response.body, "received response");
                } else {
                    debug!(status = response.status, bytes = response.body.len(), "received response");
                }
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "request failed");
                Err(err)
            }
        }
    }

    /// Build the wire request for `context` without performing any I/O.
    ///
    /// Default headers are applied first and per-call headers override them
    /// (names compare case-insensitively). POST and PUT always carry
    /// `Content-Type: application/json`, whatever the payload shape, and it
    /// replaces any caller-supplied content type.
    pub fn build_request(&self, context: &RequestContext) -> Result<HttpRequest, DispatchError> {
        let url = format!("{}{}", self.host, context.uri);
        validate_url(&url)?;

        let mut headers: Vec<(String, String)> = Vec::new();
        for (name, value) in self.default_headers().into_iter().chain(context.headers.clone()) {
            set_header(&mut headers, name, value);
        }

        let body = if context.method.has_body() {
            set_header(&mut headers, CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
            Some(context.body.encode()?)
        } else {
            None
        };

        for (name, value) in &headers {
            validate_header(name, value)?;
        }

        Ok(HttpRequest {
            method: context.method,
            url,
            query: context.query.clone(),
            headers,
            body,
            timeout: context.timeout.or(self.default_timeout),
        })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("host", &self.host)
            .field("default_headers", &self.default_headers().into_keys().collect::<Vec<_>>())
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
    headers.push((name, value));
}

fn validate_url(url: &str) -> Result<(), DispatchError> {
    let uri: ureq::http::Uri = url
        .parse()
        .map_err(|_| DispatchError::InvalidUrl(url.to_string()))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(DispatchError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), DispatchError> {
    ureq::http::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        DispatchError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })?;
    ureq::http::HeaderValue::from_str(value).map_err(|e| DispatchError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
