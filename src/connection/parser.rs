//! Request-line, header, and body parsing off a `WireReader` (§4.1),
//! generalizing the teacher's incremental `request_parser::Parser` into a
//! single blocking pass since the connection service reads one full request
//! per loop iteration rather than accumulating bytes across poll wakeups.

use crate::error::ReadError;
use crate::message::{HttpRequest, Headers};
use crate::message::request::RequestLine;
use crate::method::RequestMethod;
use crate::version::HttpVersion;
use crate::wire::WireReader;
use std::io::Read;

/// A body too large to be worth bounding by `Content-Length` alone (chunked
/// bodies don't declare their total length up front).
const MAX_CHUNKED_BODY_LEN: usize = 16 * 1024 * 1024;

pub struct ParsedRequest {
    pub request: HttpRequest,
}

/// Parses one full request, `first_byte` being the byte already consumed by
/// the wait-for-byte liveness probe (§4.5 step 1). The request line is read
/// token-by-token off the wire (`WireReader::read_token`, §4.1) rather than
/// buffered whole and split after the fact.
pub fn parse_request<R: Read>(reader: &mut WireReader<R>, first_byte: u8, buffer_size: usize, header_limit: usize) -> Result<ParsedRequest, ReadError> {
    let (method_rest, _) = reader.read_token(&[b' ']).map_err(|e| e.into_read_error(ReadError::UriTooLong))?;
    let mut method_token = String::new();
    method_token.push(first_byte as char);
    method_token.push_str(&method_rest);
    if method_token.is_empty() {
        return Err(bad_request("missing method"));
    }

    let (target, _) = reader.read_token(&[b' ']).map_err(|e| e.into_read_error(ReadError::UriTooLong))?;
    if target.is_empty() {
        return Err(bad_request("missing request target"));
    }

    let (version_token, terminator) = reader.read_token(&[b'\r', b'\n']).map_err(|e| e.into_read_error(ReadError::UriTooLong))?;
    if version_token.is_empty() {
        return Err(bad_request("missing http version"));
    }
    if terminator == b'\r' {
        // CRLF line ending: consume the LF that follows the CR
        match reader.read_byte() {
            Ok(Some(b'\n')) => {}
            _ => return Err(bad_request("malformed request-line terminator")),
        }
    }

    let method = RequestMethod::parse(&method_token);
    let version = HttpVersion::parse(version_token.as_bytes()).ok_or_else(|| ReadError::BadRequest(format!("unsupported version: {:?}", version_token)))?;

    let headers = read_headers(reader, buffer_size, header_limit)?;

    let start_line = RequestLine::new(method, target, version);
    let request = HttpRequest::new(start_line).with_headers(headers.clone());

    let body = read_body(reader, &headers, buffer_size)?;
    let request = request.with_entity(body);

    Ok(ParsedRequest { request })
}

fn read_headers<R: Read>(reader: &mut WireReader<R>, buffer_size: usize, header_limit: usize) -> Result<Headers, ReadError> {
    let mut collected: Vec<(String, String)> = Vec::new();
    let mut header_count = 0usize;
    let mut header_bytes = 0usize;
    let max_header_bytes = buffer_size * header_limit;

    loop {
        let line = reader.read_line().map_err(|e| e.into_read_error(ReadError::RequestHeaderFieldsTooLarge))?;
        if line.is_empty() {
            break;
        }

        header_bytes += line.len();
        if header_bytes > max_header_bytes {
            return Err(ReadError::RequestHeaderFieldsTooLarge);
        }

        // RFC 7230 §3.2.4 obsolete line folding: a line starting with SP/HTAB
        // continues the previous header's value instead of naming a new one.
        if line.starts_with(' ') || line.starts_with('\t') {
            match collected.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                None => return Err(bad_request("continuation line with no preceding header")),
            }
            continue;
        }

        header_count += 1;
        if header_count > header_limit {
            return Err(ReadError::RequestHeaderFieldsTooLarge);
        }

        let (name, value) = split_header_line(&line)?;
        collected.push((name, value));
    }

    let mut headers = Headers::new();
    for (name, value) in collected {
        headers = headers.with_added(&name, &value);
    }

    Ok(headers)
}

fn split_header_line(line: &str) -> Result<(String, String), ReadError> {
    let idx = line.find(':').ok_or_else(|| bad_request(&format!("malformed header line: {:?}", line)))?;
    let name = line[..idx].trim();
    let value = line[idx + 1..].trim();
    if name.is_empty() || name.contains(' ') {
        return Err(bad_request(&format!("malformed header name: {:?}", name)));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Reads the body per `Transfer-Encoding`/`Content-Length` (§4.1): chunked
/// takes priority, then a declared length, then an empty body.
fn read_body<R: Read>(reader: &mut WireReader<R>, headers: &Headers, buffer_size: usize) -> Result<crate::message::Entity, ReadError> {
    let chunked = headers.get("Transfer-Encoding").map(|v| v.to_ascii_lowercase().contains("chunked")).unwrap_or(false);
    if chunked {
        let body = reader.read_chunked_body(MAX_CHUNKED_BODY_LEN)?;
        return Ok(crate::message::Entity::bytes(body));
    }

    if let Some(len) = headers.get("Content-Length") {
        let len: usize = len.trim().parse().map_err(|_| bad_request(&format!("invalid content-length: {:?}", len)))?;
        if len == 0 {
            return Ok(crate::message::Entity::Empty);
        }
        let _ = buffer_size;
        let body = reader.read_exact_len(len)?;
        return Ok(crate::message::Entity::bytes(body));
    }

    Ok(crate::message::Entity::Empty)
}

fn bad_request(msg: &str) -> ReadError {
    ReadError::BadRequest(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(raw: &[u8]) -> Result<ParsedRequest, ReadError> {
        let mut cursor = Cursor::new(raw.to_vec());
        let mut first = [0u8; 1];
        cursor.read_exact(&mut first).unwrap();
        let mut reader = WireReader::new(cursor, 8192);
        parse_request(&mut reader, first[0], 8192, 100)
    }

    #[test]
    fn parses_a_plain_get() {
        let parsed = parse(b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(parsed.request.method(), &RequestMethod::Get);
        assert_eq!(parsed.request.target(), "/hello");
        assert_eq!(parsed.request.host().unwrap(), "example.com");
        assert!(parsed.request.entity().is_empty());
    }

    #[test]
    fn parses_a_content_length_body() {
        let parsed = parse(b"POST /x HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\n\r\nhello").unwrap();
        assert_eq!(parsed.request.entity().known_len(), Some(5));
    }

    #[test]
    fn parses_a_chunked_body() {
        let parsed = parse(b"POST /x HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n").unwrap();
        let bytes = parsed.request.into_body_bytes().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_unsupported_version() {
        assert!(parse(b"GET / HTTP/2.0\r\n\r\n").is_err());
    }

    #[test]
    fn rejects_malformed_header_line() {
        assert!(parse(b"GET / HTTP/1.1\r\nnotaheader\r\n\r\n").is_err());
    }

    #[test]
    fn folds_obsolete_continuation_lines_into_the_prior_header() {
        let parsed = parse(b"GET /x HTTP/1.1\r\nHost: a\r\nX-Long: one\r\n two\r\n\r\n").unwrap();
        assert_eq!(parsed.request.headers().get("X-Long").unwrap(), "one two");
    }
}
