//! HTTP version grammar primitive (§1). Only `HTTP/1.1` is accepted on a
//! request line per §6; `HTTP/1.0` is modeled so responses can still be
//! phrased in the teacher's historic "Http1_0 closes by default" idiom,
//! even though the connection service never negotiates it as an accepted
//! request version.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http1_0,
    Http1_1,
}

impl HttpVersion {
    pub fn parse(raw: &[u8]) -> Option<HttpVersion> {
        match raw {
            b"HTTP/1.1" => Some(HttpVersion::Http1_1),
            b"HTTP/1.0" => Some(HttpVersion::Http1_0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http1_0 => "HTTP/1.0",
            HttpVersion::Http1_1 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_versions() {
        assert_eq!(HttpVersion::parse(b"HTTP/1.1"), Some(HttpVersion::Http1_1));
        assert_eq!(HttpVersion::parse(b"HTTP/1.0"), Some(HttpVersion::Http1_0));
        assert_eq!(HttpVersion::parse(b"HTTP/2.0"), None);
    }
}
