//! Fluent request-building and content-type-driven response decoding on top
//! of a pluggable HTTP transport.
//!
//! # Overview
//! A [`Client`] holds default headers, default query parameters, and a shared
//! [`Transport`]. It stamps out [`Request`] builders that are configured by
//! chaining and executed once; responses can be decoded into a destination
//! value according to their declared content type.
//!
//! # Design
//! - `Client` → `Request` hands over independent snapshots of the default
//!   maps; the transport is shared behind an `Arc`.
//! - The body is an explicit state (empty / materialized bytes / deferred
//!   value-plus-encoder), encoded lazily and at most once.
//! - Response decoding dispatches on the exact content-type string; the table
//!   lives in [`decode`] and is shared by every decode path.
//! - All transport work (connections, TLS, redirects) belongs to the
//!   [`Transport`] implementation; [`UreqTransport`] is the default.

pub mod client;
pub mod content_type;
pub mod decode;
pub mod error;
pub mod request;
pub mod transport;
pub mod values;

pub use client::Client;
pub use decode::{decode_body, strategy_for, DecodeStrategy};
pub use error::{BoxError, Error};
pub use request::{DeferredResponse, Request};
pub use transport::{Deadline, HttpResponse, Transport, TransportRequest, UreqTransport};
pub use values::ValueMap;
