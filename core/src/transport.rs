//! Network execution of prepared requests.
//!
//! # Design
//! `Transport` is the only seam where I/O happens. The dispatcher hands it a
//! fully built `HttpRequest` and gets back an `HttpResponse` whose body has
//! already been drained, so the underlying connection is released before
//! `send` returns on every path. `UreqTransport` is the blocking
//! implementation used in production; tests substitute in-memory transports.

use std::sync::Arc;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::error::DispatchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
///
/// Status codes are never turned into errors: 4xx and 5xx responses come
/// back as data, with their bodies.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_response_bytes: Option<u64>,
}

impl UreqTransport {
    /// Transport that drains response bodies without a size limit.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// `Some(n)` turns bodies longer than `n` bytes into `DispatchError::Read`.
    pub fn with_limit(max_response_bytes: Option<u64>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            max_response_bytes,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(url), request).call(),
            HttpMethod::Delete => prepare(self.agent.delete(url), request).call(),
            HttpMethod::Post => {
                let body = request.body.as_deref().unwrap_or_default();
                prepare(self.agent.post(url), request).send(body)
            }
            HttpMethod::Put => {
                let body = request.body.as_deref().unwrap_or_default();
                prepare(self.agent.put(url), request).send(body)
            }
        };
        let mut response = result.map_err(DispatchError::from_transport)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes.unwrap_or(u64::MAX))
            .read_to_vec()
            .map_err(DispatchError::from_body)?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Apply query parameters, headers and timeout to a ureq builder.
fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .config()
        .timeout_global(normalize_timeout(request.timeout))
        .build()
}

/// Zero means "no timeout", matching the dispatcher's descriptor contract.
pub(crate) fn normalize_timeout(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_unbounded() {
        assert_eq!(normalize_timeout(Some(Duration::ZERO)), None);
        assert_eq!(
            normalize_timeout(Some(Duration::from_secs(2))),
            Some(Duration::from_secs(2))
        );
        assert_eq!(normalize_timeout(None), None);
    }

    #[test]
    fn unreachable_host_fails_after_construction() {
        // Port 9 on loopback (discard) is closed in test environments.
        let transport = UreqTransport::new();
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/".to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: Some(Duration::from_secs(2)),
        };
        let err = transport.send(&request).unwrap_err();
        assert!(!err.is_construction(), "unexpected error: {err}");
    }
}
