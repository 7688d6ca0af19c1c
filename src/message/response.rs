//! `HttpResponse` value object (§3 `StatusLine` + `HttpMessage`), mirroring
//! the teacher's `Response` builder in `response.rs`.

use crate::message::headers::impl_common_headers;
use crate::message::{Attributes, Entity, Headers};
use crate::version::HttpVersion;

/// `version statusCode reasonPhrase` (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: HttpVersion,
    pub status_code: u16,
    pub reason_phrase: String,
}

impl StatusLine {
    pub fn new(status_code: u16, reason_phrase: impl Into<String>) -> Self {
        StatusLine { version: HttpVersion::Http1_1, status_code, reason_phrase: reason_phrase.into() }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    start_line: StatusLine,
    headers: Headers,
    body: Entity,
    attributes: Attributes,
}

impl HttpResponse {
    pub fn new(start_line: StatusLine) -> Self {
        HttpResponse { start_line, headers: Headers::new(), body: Entity::Empty, attributes: Attributes::new() }
    }

    /// Builds a response with no body and no headers beyond the status line,
    /// the baseline every other constructor (including the fixed 500 used by
    /// `error::default_error_response`) starts from.
    pub fn with_status(status_code: u16, reason_phrase: &str) -> Self {
        HttpResponse::new(StatusLine::new(status_code, reason_phrase))
    }

    pub fn status_code(&self) -> u16 {
        self.start_line.status_code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.start_line.reason_phrase
    }

    pub fn version(&self) -> HttpVersion {
        self.start_line.version
    }

    pub fn start_line(&self) -> &StatusLine {
        &self.start_line
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

    pub fn with_status_line(&self, start_line: StatusLine) -> Self {
        HttpResponse { start_line, headers: self.headers.clone(), body: self.body.clone(), attributes: self.attributes.clone() }
    }

    pub fn with_status_code(&self, status_code: u16, reason_phrase: &str) -> Self {
        self.with_status_line(StatusLine::new(status_code, reason_phrase))
    }

    pub fn with_version(&self, version: HttpVersion) -> Self {
        let mut start_line = self.start_line.clone();
        start_line.version = version;
        self.with_status_line(start_line)
    }

    pub fn with_headers(&self, headers: Headers) -> Self {
        HttpResponse { start_line: self.start_line.clone(), headers, body: self.body.clone(), attributes: self.attributes.clone() }
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

    /// Sets the body and the matching `Content-Length`, the common case for
    /// in-memory bodies (§4 "exactly one Content-Length or Transfer-Encoding").
    pub fn with_body(&self, data: Vec<u8>) -> Self {
        let len = data.len();
        self.with_entity(Entity::bytes(data)).with_header("Content-Length", &len.to_string())
    }

    pub fn with_entity(&self, body: Entity) -> Self {
        HttpResponse { start_line: self.start_line.clone(), headers: self.headers.clone(), body, attributes: self.attributes.clone() }
    }

    pub fn with_attribute(&self, key: &str, value: impl std::any::Any + Send + Sync) -> Self {
        HttpResponse { start_line: self.start_line.clone(), headers: self.headers.clone(), body: self.body.clone(), attributes: self.attributes.with(key, value) }
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code())
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status_code())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }
}

impl_common_headers!(HttpResponse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_status_is_the_minimal_constructor() {
        let response = HttpResponse::with_status(404, "Not Found");
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.reason_phrase(), "Not Found");
        assert!(response.entity().is_empty());
    }

    #[test]
    fn with_body_sets_content_length() {
        let response = HttpResponse::with_status(200, "OK").with_body(b"hello".to_vec());
        assert_eq!(response.content_length().unwrap(), "5");
    }

    #[test]
    fn status_class_predicates() {
        assert!(HttpResponse::with_status(204, "No Content").is_success());
        assert!(HttpResponse::with_status(301, "Moved Permanently").is_redirection());
        assert!(HttpResponse::with_status(404, "Not Found").is_client_error());
        assert!(HttpResponse::with_status(500, "Internal Server Error").is_server_error());
    }
}
