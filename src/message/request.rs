//! `HttpRequest` value object (§3 `RequestLine` + `HttpMessage`), built with
//! copy-on-modify "with/set/put/remove" methods mirroring the teacher's
//! `Request` builder in `request.rs`.

use crate::message::headers::impl_common_headers;
use crate::message::{Attributes, Entity, Headers};
use crate::method::RequestMethod;
use crate::uri::{InvalidUri, Uri};
use crate::version::HttpVersion;
use std::sync::Arc;

/// `method target version` (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: RequestMethod,
    pub target: String,
    pub version: HttpVersion,
}

impl RequestLine {
    pub fn new(method: RequestMethod, target: impl Into<String>, version: HttpVersion) -> Self {
        RequestLine { method, target: target.into(), version }
    }

    pub fn uri(&self) -> Result<Uri, InvalidUri> {
        Uri::parse(&self.target)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    start_line: RequestLine,
    headers: Headers,
    body: Entity,
    attributes: Attributes,
}

impl HttpRequest {
    pub fn new(start_line: RequestLine) -> Self {
        HttpRequest { start_line, headers: Headers::new(), body: Entity::Empty, attributes: Attributes::new() }
    }

    pub fn method(&self) -> &RequestMethod {
        &self.start_line.method
    }

    pub fn target(&self) -> &str {
        &self.start_line.target
    }

    pub fn version(&self) -> HttpVersion {
        self.start_line.version
    }

    pub fn start_line(&self) -> &RequestLine {
        &self.start_line
    }

    pub fn uri(&self) -> Result<Uri, InvalidUri> {
        self.start_line.uri()
    }

    /// Decoded path (§3 target path matching operates on this, not the raw target).
    pub fn path(&self) -> String {
        self.uri().map(|uri| uri.decoded_path()).unwrap_or_default()
    }

    pub fn raw_query(&self) -> Option<String> {
        self.uri().ok().and_then(|uri| uri.raw_query)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn entity(&self) -> &Entity {
        &self.body
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn with_start_line(&self, start_line: RequestLine) -> Self {
        HttpRequest { start_line, headers: self.headers.clone(), body: self.body.clone(), attributes: self.attributes.clone() }
    }

    pub fn with_headers(&self, headers: Headers) -> Self {
        HttpRequest { start_line: self.start_line.clone(), headers, body: self.body.clone(), attributes: self.attributes.clone() }
    }

    pub fn with_header(&self, name: &str, value: &str) -> Self {
        self.with_headers(self.headers.with_set(name, value))
    }

    /// Alias for `with_header`, used for headers outside the typed-accessor
    /// surface (§4.2 "out of scope for typed accessors" / hop-specific ones
    /// like `Sec-WebSocket-*`).
    pub fn set_header(&self, name: &str, value: &str) -> Self {
        self.with_header(name, value)
    }

    /// Raw header access for names without a typed accessor.
    pub fn header(&self, name: &'static str) -> Result<&str, crate::error::HeaderError> {
        self.headers.get(name).ok_or(crate::error::HeaderError::NotFound(name))
    }

    pub fn with_entity(&self, body: Entity) -> Self {
        HttpRequest { start_line: self.start_line.clone(), headers: self.headers.clone(), body, attributes: self.attributes.clone() }
    }

    pub fn with_attribute(&self, key: &str, value: impl std::any::Any + Send + Sync) -> Self {
        HttpRequest { start_line: self.start_line.clone(), headers: self.headers.clone(), body: self.body.clone(), attributes: self.attributes.with(key, value) }
    }

    /// Body consumed as bytes; see `Entity::into_bytes`.
    pub fn into_body_bytes(self) -> std::io::Result<Vec<u8>> {
        self.body.into_bytes()
    }

    pub fn body_bytes_shared(&self) -> Option<Arc<Vec<u8>>> {
        match &self.body {
            Entity::Bytes(data) => Some(data.clone()),
            _ => None,
        }
    }
}

impl_common_headers!(HttpRequest);

#[cfg(test)]
mod tests {
    use super::*;

    fn get(target: &str) -> HttpRequest {
        HttpRequest::new(RequestLine::new(RequestMethod::Get, target, HttpVersion::Http1_1))
    }

    #[test]
    fn path_is_decoded() {
        let request = get("/a%20b?x=1");
        assert_eq!(request.path(), "/a b");
        assert_eq!(request.raw_query().as_deref(), Some("x=1"));
    }

    #[test]
    fn with_header_is_copy_on_write() {
        let original = get("/");
        let modified = original.with_header("Host", "example.com");
        assert!(!original.has_host());
        assert_eq!(modified.host().unwrap(), "example.com");
    }

    #[test]
    fn attribute_roundtrip_through_with_attribute() {
        let request = get("/").with_attribute("n", 7u32);
        assert_eq!(request.attributes().get::<u32>("n"), Some(&7));
    }
}
