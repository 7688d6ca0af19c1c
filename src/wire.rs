//! Wire-level I/O (§4.1): reads lines and tokens bounded by a rolling buffer,
//! writes lines and chunked bodies. Generalizes the teacher's incremental
//! `request_parser::Parser` (which accumulates bytes across non-blocking
//! reads) into a blocking reader that fills its buffer from the stream
//! directly, since the connection service here is thread-per-connection.

use crate::error::ReadError;
use std::io::{Read, Write};

/// Reads lines/tokens off a blocking stream through a rolling buffer of
/// fixed capacity `buffer_size` (the `B` of §4.1). A single line (request
/// line, or one header line before folding) may not exceed `buffer_size`
/// bytes; exceeding it is `ReadError::UriTooLong` for the request line or
/// `ReadError::RequestHeaderFieldsTooLarge` for headers — the caller picks
/// which by catching `LineTooLong` and mapping it.
pub struct WireReader<R> {
    stream: R,
    buffer_size: usize,
    buf: Vec<u8>,
    pos: usize,
}

/// Raised internally when a line exceeds `buffer_size`; the caller converts
/// this into the status-bearing `ReadError` appropriate to the context.
pub struct LineTooLong;

impl<R: Read> WireReader<R> {
    pub fn new(stream: R, buffer_size: usize) -> Self {
        WireReader { stream, buffer_size, buf: Vec::with_capacity(buffer_size), pos: 0 }
    }

    fn fill_more(&mut self) -> Result<usize, ReadError> {
        if self.pos > 0 && self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        }

        let mut chunk = vec![0u8; self.buffer_size];
        let read_cnt = self.stream.read(&mut chunk)?;
        if read_cnt > 0 {
            self.buf.extend_from_slice(&chunk[..read_cnt]);
        }
        Ok(read_cnt)
    }

    /// Reads exactly one byte, used for the wait-for-byte liveness probe
    /// (§4.5 step 1). Returns `Ok(None)` on a clean EOF.
    pub fn read_byte(&mut self) -> Result<Option<u8>, ReadError> {
        loop {
            if self.pos < self.buf.len() {
                let byte = self.buf[self.pos];
                self.pos += 1;
                return Ok(Some(byte));
            }

            if self.fill_more()? == 0 {
                return Ok(None);
            }
        }
    }

    /// Reads up to (not including) the first byte in `delimiters`, returning
    /// the token and which delimiter stopped it. Used for request-line
    /// tokenization (§4.1), where the stopping byte (space vs. `\r`) tells
    /// the caller whether another token follows or the line just ended.
    pub fn read_token(&mut self, delimiters: &[u8]) -> Result<(String, u8), LineTooLongOrIo> {
        let mut token: Vec<u8> = Vec::new();

        loop {
            while self.pos < self.buf.len() {
                let byte = self.buf[self.pos];
                self.pos += 1;

                if delimiters.contains(&byte) {
                    return Ok((String::from_utf8_lossy(&token).into_owned(), byte));
                }

                token.push(byte);
                if token.len() > self.buffer_size {
                    return Err(LineTooLongOrIo::TooLong);
                }
            }

            if self.fill_more().map_err(LineTooLongOrIo::Io)? == 0 {
                return Err(LineTooLongOrIo::Io(ReadError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed mid-token"))));
            }
        }
    }

    /// Reads up to a CRLF or bare LF terminator, not counting the
    /// terminator itself. Fails with `LineTooLong` if no terminator is
    /// found within `buffer_size` bytes.
    pub fn read_line(&mut self) -> Result<String, LineTooLongOrIo> {
        let mut line: Vec<u8> = Vec::new();

        loop {
            while self.pos < self.buf.len() {
                let byte = self.buf[self.pos];
                self.pos += 1;

                if byte == b'\n' {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Ok(String::from_utf8_lossy(&line).into_owned());
                }

                line.push(byte);
                if line.len() > self.buffer_size {
                    return Err(LineTooLongOrIo::TooLong);
                }
            }

            if self.fill_more().map_err(LineTooLongOrIo::Io)? == 0 {
                if line.is_empty() {
                    return Err(LineTooLongOrIo::Io(ReadError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed"))));
                }
                return Err(LineTooLongOrIo::Io(ReadError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed mid-line"))));
            }
        }
    }

    /// Reads exactly `len` bytes, used for `Content-Length` request bodies.
    pub fn read_exact_len(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let mut result = Vec::with_capacity(len);

        while result.len() < len {
            if self.pos < self.buf.len() {
                let take = std::cmp::min(len - result.len(), self.buf.len() - self.pos);
                result.extend_from_slice(&self.buf[self.pos..self.pos + take]);
                self.pos += take;
                continue;
            }

            if self.fill_more()? == 0 {
                return Err(ReadError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed before body complete")));
            }
        }

        Ok(result)
    }

    /// Reads a `Transfer-Encoding: chunked` body to completion (§4.1), one
    /// `len-in-hex CRLF chunk CRLF` record at a time, stopping at the
    /// zero-length terminator.
    pub fn read_chunked_body(&mut self, max_body_len: usize) -> Result<Vec<u8>, ReadError> {
        let mut body = Vec::new();

        loop {
            let size_line = self.read_line().map_err(|e| e.into_read_error(ReadError::RequestHeaderFieldsTooLarge))?;
            let size_token = size_line.split(';').next().unwrap_or("").trim();
            let chunk_len = usize::from_str_radix(size_token, 16)
                .map_err(|_| ReadError::BadRequest(format!("invalid chunk size: {:?}", size_token)))?;

            if chunk_len == 0 {
                // trailer section: consume until the empty line terminating it (no trailers supported, §1 Non-goals)
                loop {
                    let trailer_line = self.read_line().map_err(|e| e.into_read_error(ReadError::RequestHeaderFieldsTooLarge))?;
                    if trailer_line.is_empty() {
                        break;
                    }
                }
                return Ok(body);
            }

            if body.len() + chunk_len > max_body_len {
                return Err(ReadError::RequestHeaderFieldsTooLarge);
            }

            let chunk = self.read_exact_len(chunk_len)?;
            body.extend_from_slice(&chunk);

            let crlf = self.read_line().map_err(|e| e.into_read_error(ReadError::RequestHeaderFieldsTooLarge))?;
            if !crlf.is_empty() {
                return Err(ReadError::BadRequest("missing chunk terminator".to_string()));
            }
        }
    }
}

pub enum LineTooLongOrIo {
    TooLong,
    Io(ReadError),
}

impl LineTooLongOrIo {
    pub fn into_read_error(self, on_too_long: ReadError) -> ReadError {
        match self {
            LineTooLongOrIo::TooLong => on_too_long,
            LineTooLongOrIo::Io(err) => err,
        }
    }
}

/// Writes status/header lines and chunked bodies to a blocking stream.
pub struct WireWriter<W> {
    stream: W,
}

impl<W: Write> WireWriter<W> {
    pub fn new(stream: W) -> Self {
        WireWriter { stream }
    }

    pub fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\r\n")
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(buf)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }

    /// Writes one chunk: `len-in-hex CRLF chunk CRLF`. A zero-length chunk
    /// is a no-op; call `write_chunked_end` to terminate the body.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        self.write_line(&format!("{:x}", chunk.len()))?;
        self.write_bytes(chunk)?;
        self.write_bytes(b"\r\n")
    }

    pub fn write_chunked_end(&mut self) -> std::io::Result<()> {
        self.write_bytes(b"0\r\n\r\n")
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_lines_with_and_without_cr() {
        let mut reader = WireReader::new(Cursor::new(b"GET / HTTP/1.1\r\nHost: x\n\r\n".to_vec()), 64);
        assert_eq!(reader.read_line().ok().unwrap(), "GET / HTTP/1.1");
        assert_eq!(reader.read_line().ok().unwrap(), "Host: x");
        assert_eq!(reader.read_line().ok().unwrap(), "");
    }

    #[test]
    fn reads_tokens_up_to_a_delimiter() {
        let mut reader = WireReader::new(Cursor::new(b"GET /hello HTTP/1.1\r\n".to_vec()), 64);
        assert_eq!(reader.read_token(&[b' ']).ok().unwrap(), ("GET".to_string(), b' '));
        assert_eq!(reader.read_token(&[b' ']).ok().unwrap(), ("/hello".to_string(), b' '));
        assert_eq!(reader.read_token(&[b'\r', b'\n']).ok().unwrap(), ("HTTP/1.1".to_string(), b'\r'));
    }

    #[test]
    fn line_too_long_is_reported() {
        let long_line = "a".repeat(100);
        let mut reader = WireReader::new(Cursor::new(long_line.into_bytes()), 16);
        assert!(matches!(reader.read_line(), Err(LineTooLongOrIo::TooLong)));
    }

    #[test]
    fn reads_exact_len_across_fills() {
        let mut reader = WireReader::new(Cursor::new(b"0123456789".to_vec()), 4);
        let data = reader.read_exact_len(10).unwrap();
        assert_eq!(data, b"0123456789");
    }

    #[test]
    fn chunked_round_trip() {
        let mut out = Vec::new();
        {
            let mut writer = WireWriter::new(&mut out);
            writer.write_chunk(b"hello ").unwrap();
            writer.write_chunk(b"world").unwrap();
            writer.write_chunked_end().unwrap();
        }

        let mut reader = WireReader::new(Cursor::new(out), 64);
        let body = reader.read_chunked_body(1024).unwrap();
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn read_byte_reports_eof() {
        let mut reader = WireReader::new(Cursor::new(Vec::new()), 4);
        assert_eq!(reader.read_byte().unwrap(), None);
    }
}
