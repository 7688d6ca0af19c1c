//! `MediaType` grammar primitive (§1) and the extension-to-media-type map
//! used by the static file handler (§4.6), generalizing the teacher's
//! `mime_type_by_extension` lookup referenced from `static_files.rs`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
    pub params: Vec<(String, String)>,
}

impl MediaType {
    pub fn new(type_: &str, subtype: &str) -> Self {
        MediaType { type_: type_.to_string(), subtype: subtype.to_string(), params: Vec::new() }
    }

    /// Parses a single media-range token such as `text/html; charset=utf-8`.
    pub fn parse(raw: &str) -> Option<MediaType> {
        let mut parts = raw.split(';');
        let essence = parts.next()?.trim();
        let mut slash = essence.splitn(2, '/');
        let type_ = slash.next()?.trim();
        let subtype = slash.next()?.trim();
        if type_.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        for param in parts {
            if let Some(eq) = param.find('=') {
                let name = param[..eq].trim();
                let value = param[eq + 1..].trim().trim_matches('"');
                if !name.is_empty() {
                    params.push((name.to_string(), value.to_string()));
                }
            }
        }

        Some(MediaType { type_: type_.to_string(), subtype: subtype.to_string(), params })
    }

    /// Whether `self` (as found on disk / produced by a handler) satisfies an
    /// `Accept` media-range, e.g. `*/*`, `text/*`, or an exact match.
    pub fn matches_range(&self, range: &MediaType) -> bool {
        (range.type_ == "*" || range.type_.eq_ignore_ascii_case(&self.type_))
            && (range.subtype == "*" || range.subtype.eq_ignore_ascii_case(&self.subtype))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, "; {}={}", name, value)?;
        }
        Ok(())
    }
}

/// Extension (without the leading dot) to media type, default
/// `application/octet-stream` mirroring the teacher's fallback.
pub fn media_type_by_extension(extension: &str) -> MediaType {
    let (type_, subtype) = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => ("text", "html"),
        "css" => ("text", "css"),
        "js" | "mjs" => ("text", "javascript"),
        "json" => ("application", "json"),
        "txt" => ("text", "plain"),
        "xml" => ("application", "xml"),
        "png" => ("image", "png"),
        "jpg" | "jpeg" => ("image", "jpeg"),
        "gif" => ("image", "gif"),
        "svg" => ("image", "svg+xml"),
        "ico" => ("image", "x-icon"),
        "wasm" => ("application", "wasm"),
        "pdf" => ("application", "pdf"),
        "woff" => ("font", "woff"),
        "woff2" => ("font", "woff2"),
        _ => return MediaType::new("application", "octet-stream"),
    };

    MediaType::new(type_, subtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_params() {
        let mt = MediaType::parse("text/html; charset=utf-8").unwrap();
        assert_eq!(mt.type_, "text");
        assert_eq!(mt.subtype, "html");
        assert_eq!(mt.params, vec![("charset".to_string(), "utf-8".to_string())]);
    }

    #[test]
    fn range_matching() {
        let html = MediaType::new("text", "html");
        assert!(html.matches_range(&MediaType::new("*", "*")));
        assert!(html.matches_range(&MediaType::new("text", "*")));
        assert!(!html.matches_range(&MediaType::new("application", "json")));
    }

    #[test]
    fn extension_lookup_defaults() {
        assert_eq!(media_type_by_extension("png").to_string(), "image/png");
        assert_eq!(media_type_by_extension("unknownext").to_string(), "application/octet-stream");
    }
}
