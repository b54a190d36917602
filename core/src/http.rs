//! HTTP transport types shared by the dispatcher and its transports.
//!
//! # Design
//! Requests and responses are described as plain data. The dispatcher builds
//! an `HttpRequest` without touching the network and hands it to a
//! `Transport`, which performs the round-trip and returns an `HttpResponse`.
//! Keeping construction pure means everything except the socket I/O can be
//! checked in unit tests.

use std::fmt;
use std::time::Duration;

use crate::error::DispatchError;

/// HTTP verb for a dispatched request.
///
/// The set is closed: a value of this type is always one of the four verbs
/// the dispatcher knows how to send. Numeric codes only appear at the
/// boundary, through [`HttpMethod::from_code`] and `TryFrom<u8>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Post = 1,
    Get = 2,
    Put = 3,
    Delete = 4,
}

impl HttpMethod {
    /// Convert a numeric method code (1 = POST, 2 = GET, 3 = PUT, 4 = DELETE).
    ///
    /// # Panics
    /// Panics on any other value. An unknown code is a programming error in
    /// the caller, not a runtime condition; use `HttpMethod::try_from` where
    /// the code comes from untrusted input.
    pub fn from_code(code: u8) -> Self {
        match Self::try_from(code) {
            Ok(method) => method,
            Err(_) => panic!("specify a valid http method (got code {code})"),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl TryFrom<u8> for HttpMethod {
    type Error = DispatchError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(HttpMethod::Post),
            2 => Ok(HttpMethod::Get),
            3 => Ok(HttpMethod::Put),
            4 => Ok(HttpMethod::Delete),
            other => Err(DispatchError::InvalidMethod(other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing HTTP request described as plain data.
///
/// `url` is the host and URI joined verbatim; `query` pairs are percent-encoded
/// and appended by the transport in insertion order. `body` is `None` for
/// verbs that never carry one and `Some` (possibly empty) for POST and PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Header names only, for logging without leaking credentials.
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Case-insensitive header lookup. Returns the last value set for `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
