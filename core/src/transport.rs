//! The transport seam: deadline control, wire-level request/response data,
//! and the default `ureq`-backed implementation.
//!
//! # Design
//! `Request::send` hands a fully assembled `TransportRequest` (final URL,
//! headers to install wholesale, materialized body, remaining time budget) to
//! a `Transport`, which owns the actual round trip. The trait keeps the
//! builder deterministic and lets tests substitute a recording transport.
//! Transport failures come back boxed and are surfaced unmodified.

use std::fmt;
use std::io::{Cursor, Read};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::decode::decode_body;
use crate::error::{BoxError, Error};

/// Cancellation/deadline token for a single round trip.
///
/// `Deadline::NONE` means unbounded. An already-expired deadline (for example
/// `Deadline::within(Duration::ZERO)`) makes `Request::send` fail before any
/// network I/O; a live one becomes the transport's in-flight timeout budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline; the round trip may block indefinitely.
    pub const NONE: Deadline = Deadline(None);

    /// Expire at the given instant.
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Expire `duration` from now.
    pub fn within(duration: Duration) -> Self {
        Self(Some(Instant::now() + duration))
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| at <= Instant::now())
    }

    /// Time left until expiry. `None` for an unbounded deadline; zero once
    /// expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// A fully assembled request, ready for a `Transport` to execute.
///
/// The URL already carries the encoded query string, and `headers` is the
/// complete header set — transports install it wholesale, replacing any
/// defaults of their own.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Remaining time budget derived from the caller's `Deadline`.
    pub timeout: Option<Duration>,
}

/// A response as returned by a `Transport`: status, multi-value headers, and
/// a single-consumption body stream.
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The declared content type, or `""` when absent or not valid text.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Consume the response, yielding the body stream.
    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }

    /// Decode the body into `dst` according to the declared content type.
    ///
    /// Consumes the response; the body stream cannot be read again.
    pub fn decode<T>(self, dst: &mut T) -> Result<(), Error>
    where
        T: DeserializeOwned + std::any::Any,
    {
        let content_type = self.content_type().to_string();
        decode_body(&content_type, self.body, dst)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The underlying capability that turns a `TransportRequest` into a network
/// round trip. Implementations are shared across many requests via `Arc`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: TransportRequest) -> Result<HttpResponse, BoxError>;
}

/// Default transport backed by `ureq`.
///
/// Builds a fresh agent per call so the remaining deadline budget can be
/// applied as the global timeout. Non-2xx statuses are returned as data, not
/// errors — status interpretation belongs to the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: TransportRequest) -> Result<HttpResponse, BoxError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.timeout)
            .build()
            .new_agent();

        let mut builder = http::Request::builder()
            .method(request.method)
            .uri(request.url);
        if let Some(headers) = builder.headers_mut() {
            *headers = request.headers;
        }
        let body = request.body.map(|b| b.to_vec()).unwrap_or_default();
        let wire_request = builder.body(body)?;

        let (parts, mut body) = agent.run(wire_request)?.into_parts();
        let bytes = body.read_to_vec()?;
        Ok(HttpResponse::new(parts.status, parts.headers, Cursor::new(bytes)))
    }
}
