//! The chaining request builder and its terminal send/decode operations.
//!
//! # Design
//! A `Request` accumulates headers, query parameters, and a body through
//! consuming setters, then executes exactly once per `send` call. The body is
//! an explicit tagged state: pre-materialized bytes, a deferred value+encoder
//! thunk, or empty. Encoding runs lazily on the first send and its output is
//! cached, so the encoder fires at most once; a failed encode is not cached
//! and a later send retries it.
//!
//! Configured query parameters are concatenated onto any literal query string
//! already present in the URL (joined with `&`), never merged or deduplicated.
//! Both `send` and `call` share this one semantics.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::transport::{Deadline, HttpResponse, Transport, TransportRequest};
use crate::values::ValueMap;

enum BodyState {
    Empty,
    /// Materialized bytes: set directly or cached from a successful encode.
    /// Never passed through an encoder again.
    Buffered(Bytes),
    /// A structured value captured together with its encoder; runs on the
    /// first send.
    Deferred(Box<dyn Fn() -> Result<Bytes, Error> + Send>),
}

/// A single HTTP exchange under construction.
///
/// Created by [`Client::request`](crate::Client::request) or the verb
/// helpers, configured by chaining, and consumed by [`send`](Request::send),
/// [`call`](Request::call), or [`send_and_decode`](Request::send_and_decode).
#[must_use = "a Request does nothing until it is sent"]
pub struct Request {
    transport: Arc<dyn Transport>,
    url: String,
    method: Method,
    headers: ValueMap,
    query: ValueMap,
    body: BodyState,
}

impl Request {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        url: String,
        method: Method,
        headers: ValueMap,
        query: ValueMap,
    ) -> Self {
        Self {
            transport,
            url,
            method,
            headers,
            query,
            body: BodyState::Empty,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &ValueMap {
        &self.headers
    }

    pub fn query(&self) -> &ValueMap {
        &self.query
    }

    /// Replace all values for the header `key` with `value`.
    pub fn set_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Append `value` to the values for the header `key`.
    pub fn add_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(key, value);
        self
    }

    /// Replace all values for the query parameter `key` with `value`.
    pub fn set_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Append `value` to the values for the query parameter `key`.
    pub fn add_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add(key, value);
        self
    }

    /// Use `bytes` as the request body, bypassing any encoding step.
    pub fn body_bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = BodyState::Buffered(bytes.into());
        self
    }

    /// Use `value` as the request body, encoded by `encode` on first send.
    ///
    /// The encoder runs at most once: its output is cached and reused by any
    /// further send of this request. An encode failure is surfaced as
    /// [`Error::Encode`] with the original error as its source, and nothing
    /// is cached.
    pub fn body_with<T, F, E>(mut self, value: T, encode: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&T) -> Result<Bytes, E> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.body = BodyState::Deferred(Box::new(move || {
            encode(&value).map_err(|e| Error::Encode(Box::new(e)))
        }));
        self
    }

    /// Use `value` as the request body, serialized as JSON on first send.
    pub fn body_json<T>(self, value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.body_with(value, |v| serde_json::to_vec(v).map(Bytes::from))
    }

    /// Resolve the body to bytes: reuse materialized bytes, run a deferred
    /// encoder once (caching on success only), or yield nothing.
    fn resolve_body(&mut self) -> Result<Option<Bytes>, Error> {
        match &self.body {
            BodyState::Empty => Ok(None),
            BodyState::Buffered(bytes) => Ok(Some(bytes.clone())),
            BodyState::Deferred(encode) => {
                let bytes = encode()?;
                self.body = BodyState::Buffered(bytes.clone());
                Ok(Some(bytes))
            }
        }
    }

    /// Combine the URL's literal query string (if any) with the configured
    /// query parameters. Concatenation, not merging: a key present in both
    /// appears twice.
    fn assemble_url(&self) -> Result<String, Error> {
        let uri: Uri = self.url.parse().map_err(|e: http::uri::InvalidUri| Error::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidUrl {
                url: self.url.clone(),
                reason: "missing scheme or host".to_string(),
            });
        }

        let pairs: Vec<(&str, &str)> = self
            .query
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key, v.as_str())))
            .collect();
        let encoded = serde_urlencoded::to_string(pairs)?;
        if encoded.is_empty() {
            return Ok(self.url.clone());
        }
        Ok(match uri.query() {
            None => format!("{}?{}", self.url, encoded),
            Some("") => format!("{}{}", self.url, encoded),
            Some(_) => format!("{}&{}", self.url, encoded),
        })
    }

    /// Convert the accumulated header map into the wire representation that
    /// the transport installs wholesale.
    fn header_map(&self) -> Result<HeaderMap, Error> {
        let mut map = HeaderMap::new();
        for (key, values) in self.headers.iter() {
            let name: HeaderName = key.parse()?;
            for value in values {
                let parsed: HeaderValue = value.parse()?;
                map.append(name.clone(), parsed);
            }
        }
        Ok(map)
    }

    /// Execute the request, returning the transport's response or the first
    /// failing stage's error.
    ///
    /// Pipeline: resolve body → assemble URL and query → convert headers →
    /// check the deadline → hand off to the transport. An already-expired
    /// deadline fails with [`Error::DeadlineExpired`] before any network I/O.
    pub fn send(&mut self, deadline: Deadline) -> Result<HttpResponse, Error> {
        let body = self.resolve_body()?;
        let url = self.assemble_url()?;
        let headers = self.header_map()?;
        if deadline.is_expired() {
            return Err(Error::DeadlineExpired);
        }

        tracing::debug!(method = %self.method, %url, "sending request");
        let request = TransportRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
            timeout: deadline.remaining(),
        };
        self.transport.execute(request).map_err(Error::Transport)
    }

    /// Execute the request, deferring any error into the returned wrapper.
    ///
    /// Same pipeline and query semantics as [`send`](Request::send); useful
    /// when the caller wants to chain straight into
    /// [`DeferredResponse::decode`].
    pub fn call(&mut self, deadline: Deadline) -> DeferredResponse {
        DeferredResponse {
            inner: self.send(deadline),
        }
    }

    /// Execute the request and decode the response body into `dst` according
    /// to its declared content type.
    pub fn send_and_decode<T>(&mut self, deadline: Deadline, dst: &mut T) -> Result<(), Error>
    where
        T: DeserializeOwned + Any,
    {
        let response = self.send(deadline)?;
        response.decode(dst)
    }
}

/// Outcome of [`Request::call`]: a response or a deferred error, at most one
/// of which is meaningful.
#[derive(Debug)]
#[must_use = "a DeferredResponse carries either a response or an error"]
pub struct DeferredResponse {
    inner: Result<HttpResponse, Error>,
}

impl DeferredResponse {
    /// The raw response, or the error captured during execution.
    pub fn result(self) -> Result<HttpResponse, Error> {
        self.inner
    }

    /// Decode the response body into `dst` by declared content type; a
    /// captured execution error short-circuits without touching `dst`.
    pub fn decode<T>(self, dst: &mut T) -> Result<(), Error>
    where
        T: DeserializeOwned + Any,
    {
        self.inner?.decode(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use http::StatusCode;

    use crate::client::Client;
    use crate::error::BoxError;

    /// Records every executed request and replies with a canned response.
    struct MockTransport {
        seen: Mutex<Vec<TransportRequest>>,
        content_type: &'static str,
        body: &'static str,
    }

    impl MockTransport {
        fn new(content_type: &'static str, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                content_type,
                body,
            })
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn execute(&self, request: TransportRequest) -> Result<HttpResponse, BoxError> {
            self.seen.lock().unwrap().push(request);
            let mut headers = HeaderMap::new();
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static(self.content_type),
            );
            Ok(HttpResponse::new(
                StatusCode::OK,
                headers,
                Cursor::new(self.body.as_bytes().to_vec()),
            ))
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn execute(&self, _request: TransportRequest) -> Result<HttpResponse, BoxError> {
            Err("connection refused".into())
        }
    }

    fn client_with(transport: Arc<dyn Transport>) -> Client {
        Client::new(transport)
    }

    #[test]
    fn query_parameters_are_appended_to_a_literal_query() {
        let mock = MockTransport::new("text/plain", "");
        let mut client = client_with(mock.clone());
        client.set_header("X-Name", "Alice").set_query("q", "1");

        client.get("http://host/path?x=2").send(Deadline::NONE).unwrap();

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://host/path?x=2&q=1");
    }

    #[test]
    fn query_parameters_attach_with_question_mark_when_url_has_none() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        client
            .get("http://host/path")
            .add_query("q", "1")
            .add_query("q", "2")
            .send(Deadline::NONE)
            .unwrap();

        assert_eq!(mock.requests()[0].url, "http://host/path?q=1&q=2");
    }

    #[test]
    fn url_without_configured_query_is_untouched() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        client.get("http://host/path?x=2").send(Deadline::NONE).unwrap();

        assert_eq!(mock.requests()[0].url, "http://host/path?x=2");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        client
            .get("http://host/path")
            .set_query("name", "a b&c")
            .send(Deadline::NONE)
            .unwrap();

        assert_eq!(mock.requests()[0].url, "http://host/path?name=a+b%26c");
    }

    #[test]
    fn headers_are_installed_wholesale() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        client
            .get("http://host/")
            .set_header("X-Name", "Alice")
            .add_header("X-Name", "Bob")
            .send(Deadline::NONE)
            .unwrap();

        let headers = mock.requests()[0].headers.clone();
        let values: Vec<&str> = headers
            .get_all("x-name")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["Alice", "Bob"]);
    }

    #[test]
    fn invalid_url_fails_before_the_transport() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        let err = client.get("not a url").send(Deadline::NONE).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }), "{err:?}");
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn relative_url_is_rejected() {
        let client = client_with(MockTransport::new("text/plain", ""));
        let err = client.get("/just/a/path").send(Deadline::NONE).unwrap_err();
        match err {
            Error::InvalidUrl { url, .. } => assert_eq!(url, "/just/a/path"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_header_name_fails_before_the_transport() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        let err = client
            .get("http://host/")
            .set_header("bad header", "v")
            .send(Deadline::NONE)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderName(_)), "{err:?}");
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn expired_deadline_skips_the_transport() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        let err = client
            .get("http://host/")
            .send(Deadline::within(Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExpired), "{err:?}");
        assert!(mock.requests().is_empty(), "no I/O after an expired deadline");
    }

    #[test]
    fn body_bytes_bypass_encoding() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        client
            .post("http://host/")
            .body_bytes(&b"raw payload"[..])
            .send(Deadline::NONE)
            .unwrap();

        assert_eq!(mock.requests()[0].body.as_deref(), Some(&b"raw payload"[..]));
    }

    #[test]
    fn encoder_runs_at_most_once_across_sends() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut request = client.post("http://host/").body_with("payload", move |v: &&str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::convert::Infallible>(Bytes::from(v.as_bytes().to_vec()))
        });

        request.send(Deadline::NONE).unwrap();
        request.send(Deadline::NONE).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let sent = mock.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, sent[1].body);
    }

    #[test]
    fn failed_encode_is_not_cached_and_is_retried() {
        #[derive(Debug, thiserror::Error)]
        #[error("encoder broke")]
        struct BrokenEncoder;

        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut request = client.post("http://host/").body_with((), move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Bytes, _>(BrokenEncoder)
        });

        assert!(matches!(request.send(Deadline::NONE), Err(Error::Encode(_))));
        assert!(matches!(request.send(Deadline::NONE), Err(Error::Encode(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(mock.requests().is_empty(), "encode failures must not reach the transport");
    }

    #[test]
    fn body_json_serializes_lazily() {
        let mock = MockTransport::new("text/plain", "");
        let client = client_with(mock.clone());

        let mut payload = std::collections::BTreeMap::new();
        payload.insert("name", "Alice");
        client
            .post("http://host/")
            .body_json(payload)
            .send(Deadline::NONE)
            .unwrap();

        assert_eq!(
            mock.requests()[0].body.as_deref(),
            Some(&br#"{"name":"Alice"}"#[..])
        );
    }

    #[test]
    fn send_and_decode_populates_the_destination() {
        let mock = MockTransport::new("application/json", r#"{"name":"Alice"}"#);
        let client = client_with(mock);

        let mut dst: std::collections::BTreeMap<String, String> = Default::default();
        client
            .get("http://host/")
            .send_and_decode(Deadline::NONE, &mut dst)
            .unwrap();

        assert_eq!(dst.get("name").map(String::as_str), Some("Alice"));
    }

    #[test]
    fn send_and_decode_surfaces_unsupported_content_type() {
        let mock = MockTransport::new("xxx", "whatever");
        let client = client_with(mock);

        let mut dst = String::new();
        let err = client
            .get("http://host/")
            .send_and_decode(Deadline::NONE, &mut dst)
            .unwrap_err();
        match err {
            Error::UnsupportedContentType(ct) => assert_eq!(ct, "xxx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn call_defers_transport_errors_until_inspected() {
        let client = client_with(Arc::new(FailingTransport));

        let outcome = client.get("http://host/").call(Deadline::NONE);
        let err = outcome.result().unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
    }

    #[test]
    fn deferred_decode_short_circuits_on_a_captured_error() {
        let client = client_with(Arc::new(FailingTransport));

        let mut dst = String::from("untouched");
        let err = client
            .get("http://host/")
            .call(Deadline::NONE)
            .decode(&mut dst)
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert_eq!(dst, "untouched");
    }

    #[test]
    fn call_decodes_on_success() {
        let mock = MockTransport::new("text/plain; charset=utf-8", "hello");
        let client = client_with(mock);

        let mut dst = String::new();
        client
            .get("http://host/")
            .call(Deadline::NONE)
            .decode(&mut dst)
            .unwrap();
        assert_eq!(dst, "hello");
    }
}
