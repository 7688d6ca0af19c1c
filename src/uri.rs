//! `Uri` grammar primitive (§1). The core only needs enough of RFC 3986 to
//! decode a request target and to normalize a cookie target URI (§4.3);
//! full URI resolution (relative references, userinfo, etc.) is out of scope.

use percent_encoding::percent_decode;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub raw_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUri(pub String);

impl fmt::Display for InvalidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid uri: {}", self.0)
    }
}

impl std::error::Error for InvalidUri {}

impl Uri {
    /// Parses a request-target in origin-form (`/path?query`) or
    /// absolute-form (`http://host/path?query`), per RFC 7230 §5.3.
    pub fn parse(raw: &str) -> Result<Uri, InvalidUri> {
        if raw.starts_with('/') || raw == "*" {
            let (path, raw_query) = split_path_query(raw);
            return Ok(Uri { scheme: None, host: None, port: None, path: path.to_string(), raw_query: raw_query.map(str::to_string) });
        }

        if let Some(scheme_end) = raw.find("://") {
            let scheme = raw[..scheme_end].to_string();
            let rest = &raw[scheme_end + 3..];
            let (authority, path_and_query) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, "/"),
            };

            if authority.is_empty() {
                return Err(InvalidUri(raw.to_string()));
            }

            let (host, port) = split_authority(authority)?;
            let (path, raw_query) = split_path_query(path_and_query);

            return Ok(Uri {
                scheme: Some(scheme),
                host: Some(host),
                port,
                path: path.to_string(),
                raw_query: raw_query.map(str::to_string),
            });
        }

        Err(InvalidUri(raw.to_string()))
    }

    /// URL-decoded path, empty string if the raw bytes are not valid UTF-8.
    pub fn decoded_path(&self) -> String {
        percent_decode(self.path.as_bytes()).decode_utf8().map(|cow| cow.into_owned()).unwrap_or_default()
    }

    /// True if `host` parses as an IPv4 or IPv6 literal (used by cookie
    /// domain-matching to reject `.host` suffix matches against IP literals).
    pub fn host_is_ip_literal(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_ok() || (host.starts_with('[') && host.ends_with(']'))
    }
}

fn split_path_query(raw: &str) -> (&str, Option<&str>) {
    match raw.find('?') {
        Some(idx) => (&raw[..idx], Some(&raw[idx + 1..])),
        None => (raw, None),
    }
}

fn split_authority(authority: &str) -> Result<(String, Option<u16>), InvalidUri> {
    if let Some(idx) = authority.rfind(':') {
        let (host, port) = (&authority[..idx], &authority[idx + 1..]);
        if let Ok(port) = port.parse::<u16>() {
            return Ok((host.to_lowercase(), Some(port)));
        }
    }

    Ok((authority.to_lowercase(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_origin_form() {
        let uri = Uri::parse("/a/b?x=1").unwrap();
        assert_eq!(uri.path, "/a/b");
        assert_eq!(uri.raw_query.as_deref(), Some("x=1"));
        assert!(uri.host.is_none());
    }

    #[test]
    fn parses_absolute_form() {
        let uri = Uri::parse("https://Example.com:8443/p?q=1").unwrap();
        assert_eq!(uri.scheme.as_deref(), Some("https"));
        assert_eq!(uri.host.as_deref(), Some("example.com"));
        assert_eq!(uri.port, Some(8443));
        assert_eq!(uri.path, "/p");
    }

    #[test]
    fn absolute_form_defaults_path() {
        let uri = Uri::parse("https://example.com").unwrap();
        assert_eq!(uri.path, "/");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Uri::parse("not a uri").is_err());
    }

    #[test]
    fn detects_ip_literal() {
        assert!(Uri::host_is_ip_literal("127.0.0.1"));
        assert!(Uri::host_is_ip_literal("[::1]"));
        assert!(!Uri::host_is_ip_literal("example.com"));
    }
}
