//! Content-type driven response-body decoding.
//!
//! # Design
//! A pure dispatch table from the response's declared content type to a
//! `DecodeStrategy`, then one decode routine per strategy. Matching is exact
//! and case-sensitive: `application/json; charset=utf-8` is its own table
//! entry, never derived by parsing the bare variant. Anything outside the
//! table fails with `Error::UnsupportedContentType` carrying the offending
//! string so callers can branch on it. Decoding consumes the body stream.

use std::any::Any;
use std::io::{BufReader, Read};

use serde::de::DeserializeOwned;

use crate::content_type;
use crate::error::Error;

/// How a response body of a recognized content type is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Structured JSON into any deserializable destination.
    Json,
    /// Structured XML into any deserializable destination.
    Xml,
    /// Whole body as text; destination must concretely be a `String`.
    PlainText,
}

/// Look up the decode strategy for an exact content-type string.
pub fn strategy_for(content_type: &str) -> Option<DecodeStrategy> {
    match content_type {
        content_type::APPLICATION_JSON | content_type::APPLICATION_JSON_UTF8 => {
            Some(DecodeStrategy::Json)
        }
        content_type::APPLICATION_XML
        | content_type::APPLICATION_XML_UTF8
        | content_type::TEXT_XML
        | content_type::TEXT_XML_UTF8 => Some(DecodeStrategy::Xml),
        content_type::TEXT_PLAIN | content_type::TEXT_PLAIN_UTF8 => {
            Some(DecodeStrategy::PlainText)
        }
        _ => None,
    }
}

/// Decode `body` into `dst` according to the declared `content_type`.
///
/// Standalone entry point; `HttpResponse::decode` and
/// `Request::send_and_decode` both funnel through here. The body stream is
/// consumed regardless of outcome and cannot be rewound.
///
/// # Errors
///
/// - `Error::Json` / `Error::Xml` if the body does not match `dst`'s shape.
/// - `Error::DecodeTypeMismatch` if the content type is `text/plain` but
///   `dst` is not a `String`; the error names `dst`'s actual type.
/// - `Error::UnsupportedContentType` for anything outside the table.
pub fn decode_body<T>(content_type: &str, mut body: impl Read, dst: &mut T) -> Result<(), Error>
where
    T: DeserializeOwned + Any,
{
    tracing::debug!(content_type, "decoding response body");
    match strategy_for(content_type) {
        Some(DecodeStrategy::Json) => {
            *dst = serde_json::from_reader(body)?;
            Ok(())
        }
        Some(DecodeStrategy::Xml) => {
            *dst = quick_xml::de::from_reader(BufReader::new(body))?;
            Ok(())
        }
        Some(DecodeStrategy::PlainText) => {
            let mut text = String::new();
            body.read_to_string(&mut text)?;
            let slot = (dst as &mut dyn Any)
                .downcast_mut::<String>()
                .ok_or(Error::DecodeTypeMismatch {
                    actual: std::any::type_name::<T>(),
                })?;
            *slot = text;
            Ok(())
        }
        None => Err(Error::UnsupportedContentType(content_type.to_string())),
    }
}
