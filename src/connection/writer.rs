//! Response framing and wire output (§4.5 steps 7 and 10), generalizing the
//! teacher's response-serialization path (old `response.rs`/`connected.rs`)
//! onto the shared `WireWriter`.

use crate::message::{Entity, HttpResponse};
use crate::wire::WireWriter;
use deflate::{deflate_bytes, deflate_bytes_gzip};
use std::io::{Read, Write};
use std::sync::atomic::Ordering;

/// §4.5 step 7: exactly one of `Content-Length`/`Transfer-Encoding` survives.
pub fn prepare_framing(response: HttpResponse) -> HttpResponse {
    if response.has_transfer_encoding() {
        let existing = response.transfer_encoding().unwrap_or_default();
        let already_chunked = existing.split(',').last().map(|token| token.trim().eq_ignore_ascii_case("chunked")).unwrap_or(false);
        let response = if already_chunked {
            response
        } else if existing.is_empty() {
            response.set_transfer_encoding("chunked")
        } else {
            response.set_transfer_encoding(&format!("{}, chunked", existing))
        };
        return response.content_length_removed();
    }

    if response.has_content_length() {
        return response;
    }

    match response.entity().known_len() {
        Some(n) if n > 0 => response.set_content_length(&n.to_string()),
        Some(0) if response.has_content_type() => response.set_content_length("0"),
        _ => response.set_transfer_encoding("chunked"),
    }
}

/// Current time formatted for the `Date` header (RFC 7231 §7.1.1.1).
pub fn now_rfc7231_string() -> String {
    chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Status line reason phrase for statuses this core produces itself; used by
/// `connection::write_error_response` and the default error handler.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Writes the status line, headers, and body to `socket` (§4.5 step 10),
/// chunk-encoding the body when the prepared headers call for it.
pub fn write_response(socket: &mut impl Write, response: &HttpResponse) -> std::io::Result<()> {
    let mut writer = WireWriter::new(socket);
    let start = response.start_line();
    writer.write_line(&format!("{} {} {}", start.version, start.status_code, start.reason_phrase))?;
    for header in response.headers().iter() {
        writer.write_line(&format!("{}: {}", header.name, header.value))?;
    }
    writer.write_line("")?;

    let transfer_encoding = response.transfer_encoding_option().unwrap_or_default().to_ascii_lowercase();
    let chunked = transfer_encoding.contains("chunked");
    let coding = transfer_encoding.split(',').map(str::trim).find(|token| *token == "gzip" || *token == "deflate").map(str::to_string);

    match coding {
        Some(coding) => {
            // the `deflate` crate only compresses whole buffers, so a
            // streaming entity is drained before compression can start
            let raw = match response.entity() {
                Entity::Empty => Vec::new(),
                Entity::Bytes(data) => data.clone(),
                Entity::Reader { reader, closed, .. } => {
                    let mut buf = Vec::new();
                    if let Ok(mut reader_guard) = reader.lock() {
                        reader_guard.read_to_end(&mut buf)?;
                    }
                    closed.store(true, Ordering::SeqCst);
                    buf
                }
            };
            let compressed = if coding == "gzip" { deflate_bytes_gzip(&raw) } else { deflate_bytes(&raw) };
            if chunked {
                writer.write_chunk(&compressed)?;
                writer.write_chunked_end()?;
            } else {
                writer.write_bytes(&compressed)?;
            }
        }
        None => match response.entity() {
            Entity::Empty => {}
            Entity::Bytes(data) => {
                if chunked {
                    writer.write_chunk(data)?;
                    writer.write_chunked_end()?;
                } else {
                    writer.write_bytes(data)?;
                }
            }
            Entity::Reader { reader, closed, .. } => {
                if let Ok(mut reader_guard) = reader.lock() {
                    let mut buf = [0u8; 8192];
                    loop {
                        let read_count = reader_guard.read(&mut buf)?;
                        if read_count == 0 {
                            break;
                        }
                        if chunked {
                            writer.write_chunk(&buf[..read_count])?;
                        } else {
                            writer.write_bytes(&buf[..read_count])?;
                        }
                    }
                }
                if chunked {
                    writer.write_chunked_end()?;
                }
                closed.store(true, Ordering::SeqCst);
            }
        },
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_content_length_for_known_length_body() {
        let response = HttpResponse::with_status(200, "OK").with_entity(Entity::bytes(b"hi".to_vec()));
        let framed = prepare_framing(response);
        assert_eq!(framed.content_length().unwrap(), "2");
        assert!(!framed.has_transfer_encoding());
    }

    #[test]
    fn falls_back_to_chunked_for_unknown_length() {
        let response = HttpResponse::with_status(200, "OK").with_entity(Entity::reader(std::io::Cursor::new(b"x".to_vec()), None));
        let framed = prepare_framing(response);
        assert_eq!(framed.transfer_encoding().unwrap(), "chunked");
        assert!(!framed.has_content_length());
    }

    #[test]
    fn transfer_encoding_wins_over_content_length() {
        let response = HttpResponse::with_status(200, "OK").set_content_length("5").set_transfer_encoding("gzip");
        let framed = prepare_framing(response);
        assert_eq!(framed.transfer_encoding().unwrap(), "gzip, chunked");
        assert!(!framed.has_content_length());
    }

    #[test]
    fn gzip_transfer_encoding_actually_compresses_the_body() {
        let raw = b"hello hello hello hello hello hello hello hello".to_vec();
        let response = HttpResponse::with_status(200, "OK").with_body(raw.clone());
        let framed = prepare_framing(response.set_transfer_encoding("gzip"));

        let mut out = Vec::new();
        write_response(&mut out, &framed).unwrap();

        // a gzip member starts with the magic bytes 0x1f 0x8b, which plain
        // repeated ASCII text never contains on its own
        assert!(out.windows(2).any(|w| w == [0x1f, 0x8b]));
        assert_ne!(out, raw);
    }

    #[test]
    fn writes_status_line_and_headers() {
        let response = HttpResponse::with_status(200, "OK").with_body(b"hi".to_vec());
        let mut out = Vec::new();
        write_response(&mut out, &response).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }
}
