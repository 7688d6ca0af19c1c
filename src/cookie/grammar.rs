//! Cookie grammar (§4.3): parsing/formatting `Cookie` and `Set-Cookie`
//! header values. Generalizes the teacher's `parse_cookie`/`Cookie::header_value`
//! pair (old `cookie.rs`) into owned value types so they can live in the
//! client-side store as well as on the wire.

use crate::error::CookieError;
use chrono::{DateTime, Utc};

/// A single `name=value` pair as carried in a request's `Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCookie {
    pub name: String,
    pub value: String,
}

impl PlainCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, CookieError> {
        let name = name.into();
        let value = value.into();
        validate_token(&name).map_err(|_| CookieError::InvalidName(name.clone()))?;
        validate_cookie_value(&value).map_err(|_| CookieError::InvalidValue(value.clone()))?;
        Ok(PlainCookie { name, value })
    }

    /// Parses the full `Cookie` header value: `name=value; name=value`.
    pub fn parse_header(raw: &str) -> Vec<PlainCookie> {
        let mut result = Vec::new();

        for piece in raw.split(';') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }

            match piece.find('=') {
                Some(eq) => {
                    let name = &piece[..eq];
                    let value = &piece[eq + 1..];
                    if !name.is_empty() {
                        result.push(PlainCookie { name: name.to_string(), value: value.to_string() });
                    }
                }
                None => result.push(PlainCookie { name: piece.to_string(), value: String::new() }),
            }
        }

        result
    }

    /// Folds a sequence of cookies into a single `Cookie` header value.
    pub fn format_header(cookies: &[PlainCookie]) -> String {
        cookies.iter().map(|c| format!("{}={}", c.name, c.value)).collect::<Vec<_>>().join("; ")
    }
}

/// A `Set-Cookie` response directive (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, CookieError> {
        let name = name.into();
        let value = value.into();
        validate_token(&name).map_err(|_| CookieError::InvalidName(name.clone()))?;
        validate_cookie_value(&value).map_err(|_| CookieError::InvalidValue(value.clone()))?;
        Ok(SetCookie { name, value, domain: None, path: None, expires: None, max_age: None, secure: false, http_only: false })
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Parses one `Set-Cookie` header value: `name=value; Attr=val; Flag`.
    pub fn parse(raw: &str) -> Result<SetCookie, CookieError> {
        let mut parts = raw.splitn(2, ';');
        let head = parts.next().unwrap_or("").trim();
        let eq = head.find('=').ok_or_else(|| CookieError::InvalidName(head.to_string()))?;
        let name = head[..eq].trim().to_string();
        let value = head[eq + 1..].trim().to_string();
        validate_token(&name).map_err(|_| CookieError::InvalidName(name.clone()))?;

        let mut cookie = SetCookie { name, value, domain: None, path: None, expires: None, max_age: None, secure: false, http_only: false };

        if let Some(tail) = parts.next() {
            for attr in tail.split(';') {
                let attr = attr.trim();
                if attr.is_empty() {
                    continue;
                }

                let (attr_name, attr_value) = match attr.find('=') {
                    Some(eq) => (attr[..eq].trim(), Some(attr[eq + 1..].trim())),
                    None => (attr, None),
                };

                match attr_name.to_ascii_lowercase().as_str() {
                    "domain" => cookie.domain = attr_value.map(|v| v.trim_start_matches('.').to_ascii_lowercase()),
                    "path" => cookie.path = attr_value.map(str::to_string),
                    "expires" => cookie.expires = attr_value.and_then(parse_http_date),
                    "max-age" => cookie.max_age = attr_value.and_then(|v| v.parse::<i64>().ok()),
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {} // unknown attributes are ignored
                }
            }
        }

        Ok(cookie)
    }

    /// Renders this directive as a `Set-Cookie` header value.
    pub fn format(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={}", domain));
        }
        if let Some(path) = &self.path {
            out.push_str(&format!("; Path={}", path));
        }
        if let Some(expires) = &self.expires {
            out.push_str(&format!("; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

fn validate_token(s: &str) -> Result<(), ()> {
    if s.is_empty() {
        return Err(());
    }
    if s.bytes().all(|b| is_token_char(b)) {
        Ok(())
    } else {
        Err(())
    }
}

fn is_token_char(b: u8) -> bool {
    matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
        || b.is_ascii_alphanumeric()
}

fn validate_cookie_value(s: &str) -> Result<(), ()> {
    let unwrapped = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(s);
    if unwrapped.bytes().all(|b| (0x21..=0x7e).contains(&b) && b != b'"' && b != b',' && b != b';' && b != b'\\') {
        Ok(())
    } else {
        Err(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_cookie_header() {
        let cookies = PlainCookie::parse_header("a=1; b=2");
        assert_eq!(cookies, vec![PlainCookie { name: "a".into(), value: "1".into() }, PlainCookie { name: "b".into(), value: "2".into() }]);
    }

    #[test]
    fn formats_request_cookie_header() {
        let cookies = vec![PlainCookie::new("a", "1").unwrap(), PlainCookie::new("b", "2").unwrap()];
        assert_eq!(PlainCookie::format_header(&cookies), "a=1; b=2");
    }

    #[test]
    fn parses_set_cookie_with_attributes() {
        let cookie = SetCookie::parse("a=1; Domain=example.com; Path=/; Secure; HttpOnly").unwrap();
        assert_eq!(cookie.name, "a");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn set_cookie_round_trips_up_to_attribute_order() {
        let cookie = SetCookie::new("a", "1").unwrap().with_domain("example.com").with_path("/").secure();
        let reparsed = SetCookie::parse(&cookie.format()).unwrap();
        assert_eq!(cookie, reparsed);
    }

    #[test]
    fn rejects_invalid_name() {
        assert!(PlainCookie::new("a b", "1").is_err());
    }

    #[test]
    fn domain_attribute_strips_leading_dot() {
        let cookie = SetCookie::parse("a=1; Domain=.example.com").unwrap();
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
    }
}
