//! Client: default headers/query parameters and the transport handle.
//!
//! # Design
//! A `Client` is configured once with chained setters and then stamps out
//! `Request` values. Each request gets independent clones of the client's
//! header and query maps — mutating one side never leaks into the other —
//! while the transport itself is shared through an `Arc`. Construction and
//! configuration cannot fail.

use std::sync::Arc;

use http::Method;

use crate::request::Request;
use crate::transport::{Transport, UreqTransport};
use crate::values::ValueMap;

/// Produces pre-configured [`Request`] values.
///
/// # Example
///
/// ```no_run
/// use reqchain_core::{Client, Deadline};
///
/// let mut client = Client::default();
/// client.set_header("X-Name", "Alice").add_query("q", "1");
/// let response = client.get("http://localhost:3000/path").send(Deadline::NONE)?;
/// # Ok::<(), reqchain_core::Error>(())
/// ```
pub struct Client {
    transport: Arc<dyn Transport>,
    headers: ValueMap,
    query: ValueMap,
}

impl Client {
    /// Wrap an existing transport. The transport may be shared with other
    /// clients; it is never copied.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            headers: ValueMap::new(),
            query: ValueMap::new(),
        }
    }

    /// Replace all default values for the header `key` with `value`.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(key, value);
        self
    }

    /// Append `value` to the default values for the header `key`.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.add(key, value);
        self
    }

    /// Replace all default values for the query parameter `key` with `value`.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.set(key, value);
        self
    }

    /// Append `value` to the default values for the query parameter `key`.
    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.add(key, value);
        self
    }

    /// Default headers currently configured.
    pub fn headers(&self) -> &ValueMap {
        &self.headers
    }

    /// Default query parameters currently configured.
    pub fn query(&self) -> &ValueMap {
        &self.query
    }

    /// New request seeded with snapshots of the client's current headers and
    /// query parameters. Later mutation of the client does not affect the
    /// request, and vice versa.
    pub fn request(&self, url: impl Into<String>, method: Method) -> Request {
        Request::new(
            Arc::clone(&self.transport),
            url.into(),
            method,
            self.headers.clone(),
            self.query.clone(),
        )
    }

    pub fn get(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::GET)
    }

    pub fn post(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::POST)
    }

    pub fn put(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::PUT)
    }

    pub fn delete(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::DELETE)
    }

    pub fn patch(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::PATCH)
    }

    pub fn head(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::HEAD)
    }

    pub fn options(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::OPTIONS)
    }

    pub fn connect(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::CONNECT)
    }

    pub fn trace(&self, url: impl Into<String>) -> Request {
        self.request(url, Method::TRACE)
    }
}

impl Default for Client {
    /// A client with a default [`UreqTransport`].
    fn default() -> Self {
        Self::new(Arc::new(UreqTransport::new()))
    }
}
