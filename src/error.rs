use crate::message::response::HttpResponse;
use std::fmt;

/// A framing/parsing error produced while reading a request off the wire.
///
/// Each variant carries the status code the connection service must answer
/// with (see spec §7, "Input framing errors").
#[derive(Debug)]
pub enum ReadError {
    /// A request-line token or header line exceeded the buffer (§4.1).
    UriTooLong,
    /// Total header bytes or header count exceeded configured limits.
    RequestHeaderFieldsTooLarge,
    /// Request-line, header grammar, or version grammar was malformed.
    BadRequest(String),
    /// The connection produced no bytes before a read timed out.
    RequestTimeout,
    /// The peer closed the connection or the socket errored outside the cases above.
    Io(std::io::Error),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UriTooLong => write!(f, "request-line token exceeds buffer size"),
            ReadError::RequestHeaderFieldsTooLarge => write!(f, "request headers exceed configured limits"),
            ReadError::BadRequest(reason) => write!(f, "malformed request: {}", reason),
            ReadError::RequestTimeout => write!(f, "timed out waiting for request bytes"),
            ReadError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::WouldBlock || err.kind() == std::io::ErrorKind::TimedOut {
            ReadError::RequestTimeout
        } else {
            ReadError::Io(err)
        }
    }
}

impl ReadError {
    /// Maps a read error to the status it must be answered with, per §7's fixed table.
    pub fn status(&self) -> u16 {
        match self {
            ReadError::UriTooLong => 414,
            ReadError::RequestHeaderFieldsTooLarge => 431,
            ReadError::BadRequest(_) => 400,
            ReadError::RequestTimeout => 408,
            ReadError::Io(_) => 500,
        }
    }
}

/// Sentinel error a handler can return to kill the connection without writing
/// a response (spec §4.5 step 4, §7 "Handler errors").
#[derive(Debug)]
pub struct ResponseAborted;

impl fmt::Display for ResponseAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "response aborted by handler")
    }
}

impl std::error::Error for ResponseAborted {}

/// Error surface for handler/filter execution, routed to the error handler
/// unless it is `Aborted` (propagates and kills the connection).
#[derive(Debug)]
pub enum HandlerError {
    Aborted,
    Timeout,
    Tls(String),
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Aborted => write!(f, "response aborted"),
            HandlerError::Timeout => write!(f, "request timeout"),
            HandlerError::Tls(msg) => write!(f, "tls error: {}", msg),
            HandlerError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Errors raised by the cookie store (§4.3).
#[derive(Debug)]
pub enum CookieError {
    InvalidName(String),
    InvalidValue(String),
    InvalidTarget(String),
    PublicSuffixDomain(String),
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieError::InvalidName(n) => write!(f, "invalid cookie name: {:?}", n),
            CookieError::InvalidValue(v) => write!(f, "invalid cookie value: {:?}", v),
            CookieError::InvalidTarget(t) => write!(f, "invalid cookie target uri: {:?}", t),
            CookieError::PublicSuffixDomain(d) => write!(f, "cookie domain is a public suffix: {:?}", d),
        }
    }
}

impl std::error::Error for CookieError {}

/// Errors raised by typed header accessors (§4.2) when a header is absent or malformed.
#[derive(Debug)]
pub enum HeaderError {
    NotFound(&'static str),
    Malformed(&'static str, String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::NotFound(name) => write!(f, "header not found: {}", name),
            HeaderError::Malformed(name, value) => write!(f, "malformed {} header: {:?}", name, value),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Server-level construction/runtime errors (§7 "Fatal").
#[derive(Debug)]
pub enum ServerError {
    Bind(std::io::Error),
    InvalidConfig(String),
    Tls(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(err) => write!(f, "failed to bind listener: {}", err),
            ServerError::InvalidConfig(reason) => write!(f, "invalid server configuration: {}", reason),
            ServerError::Tls(reason) => write!(f, "tls setup failed: {}", reason),
        }
    }
}

impl std::error::Error for ServerError {}

/// Builds the default `500 Internal Server Error` response used when no
/// user error handler is configured or when a filter itself fails (§7).
pub fn default_error_response() -> HttpResponse {
    HttpResponse::with_status(500, "Internal Server Error")
}
