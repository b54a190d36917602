//! Error types for the request dispatcher.
//!
//! # Design
//! Every runtime condition is returned as a `DispatchError`. Errors raised
//! while building the request (`InvalidUrl`, `InvalidHeader`, `Encode`) mean
//! nothing was sent. `Timeout` and `Network` come from the round-trip itself,
//! and `Read` from draining the response body. A non-2xx status is not an
//! error: the body is returned like any other.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// `host + uri` does not form a valid URL.
    #[error("invalid url {0:?}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The HTTP stack rejected the request while assembling it.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The JSON payload could not be encoded. The request was not sent.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The per-call timeout expired before the response arrived.
    #[error("request timed out: {0}")]
    Timeout(#[source] ureq::Error),

    /// Connection, DNS, TLS or protocol failure.
    #[error("network error: {0}")]
    Network(#[source] ureq::Error),

    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Read(#[source] ureq::Error),

    /// Numeric method code outside 1..=4.
    #[error("invalid http method code {0}")]
    InvalidMethod(u8),

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DispatchError {
    /// Classify a transport failure raised before the response body was read.
    pub(crate) fn from_transport(err: ureq::Error) -> Self {
        match err {
            ureq::Error::BadUri(uri) => DispatchError::InvalidUrl(uri),
            ureq::Error::Http(e) => DispatchError::InvalidRequest(e.to_string()),
            err if is_timeout(&err) => DispatchError::Timeout(err),
            err => DispatchError::Network(err),
        }
    }

    /// Classify a failure raised while draining the response body.
    pub(crate) fn from_body(err: ureq::Error) -> Self {
        if is_timeout(&err) {
            DispatchError::Timeout(err)
        } else {
            DispatchError::Read(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout(_))
    }

    /// True when the failure happened before anything was written to the
    /// network.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidUrl(_)
                | DispatchError::InvalidHeader { .. }
                | DispatchError::InvalidRequest(_)
                | DispatchError::Encode(_)
                | DispatchError::InvalidMethod(_)
        )
    }
}

fn is_timeout(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(io) => io.kind() == std::io::ErrorKind::TimedOut,
        _ => false,
    }
}
