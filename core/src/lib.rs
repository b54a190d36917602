//! Blocking HTTP request dispatcher.
//!
//! # Overview
//! A `Dispatcher` is bound to one host. Each call takes a declarative
//! `RequestDescriptor` (verb, URI, headers, query pairs, payload, timeout),
//! merges it with the dispatcher's default headers, performs one blocking
//! round-trip and returns the response body as text.
//!
//! # Design
//! - Request construction is pure: `Dispatcher::build_request` turns a
//!   `RequestContext` snapshot into an `HttpRequest` value.
//! - I/O sits behind the `Transport` trait; `UreqTransport` is the default.
//! - Calls on one dispatcher are serialized; separate dispatchers are
//!   independent.
//! - `HttpMethod` and `Payload` are closed enums, so an unknown verb or an
//!   untyped body cannot reach the dispatcher.
//!
//! ```no_run
//! use dispatch_core::{Dispatcher, Request};
//!
//! let dispatcher = Dispatcher::new("http://api.test", []);
//! let body = dispatcher.execute(&Request::get("/ping").with_query("x", "1"))?;
//! assert_eq!(body, "pong");
//! # Ok::<(), dispatch_core::DispatchError>(())
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{Payload, Request, RequestContext, RequestDescriptor};
pub use transport::{Transport, UreqTransport};
