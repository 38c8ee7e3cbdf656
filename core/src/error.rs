//! Error types for request building, transport, and response decoding.
//!
//! # Design
//! One variant per failure kind, so callers can branch on them instead of
//! matching message strings. `UnsupportedContentType` carries the offending
//! string verbatim, and `Encode` / `Transport` keep the underlying error as a
//! `source` available for downcasting rather than flattening it to text.

use thiserror::Error;

/// Boxed error used at the transport seam and for caller-supplied encoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by `Client`, `Request`, and the decode entry points.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied body encoder failed.
    #[error("body encoding failed: {0}")]
    Encode(#[source] BoxError),

    /// The request URL could not be parsed or lacks a scheme/host.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Query parameters could not be percent-encoded.
    #[error("query encoding failed: {0}")]
    QueryEncode(#[from] serde_urlencoded::ser::Error),

    /// A configured header name is not a valid HTTP header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// A configured header value is not a valid HTTP header value.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The deadline expired before the request was handed to the transport.
    #[error("deadline expired before the request was sent")]
    DeadlineExpired,

    /// The transport failed to complete the round trip (network, DNS, TLS,
    /// in-flight timeout). Propagated unmodified.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response body is not valid JSON for the destination type.
    #[error("json decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body is not valid XML for the destination type.
    #[error("xml decoding failed: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Reading the response body failed.
    #[error("reading response body failed: {0}")]
    Io(#[from] std::io::Error),

    /// A `text/plain` response was decoded into something other than a
    /// `String`. Carries the actual destination type for diagnostics.
    #[error("expected destination to be String, but got {actual}")]
    DecodeTypeMismatch { actual: &'static str },

    /// The response declared a content type the decode table does not know.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}
