//! Recognized content-type strings.
//!
//! The decode table matches these exactly, case- and whitespace-sensitive:
//! a charset-qualified variant is a separate entry, not a parse of the bare
//! one. The last three are defined for callers setting request headers but
//! have no decode branch.

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_XML_UTF8: &str = "application/xml; charset=utf-8";
pub const TEXT_XML: &str = "text/xml";
pub const TEXT_XML_UTF8: &str = "text/xml; charset=utf-8";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
