//! Target path grammar, mount paths, and the `Router` that groups targeted
//! handlers under a common prefix (§3 "Target path"/"Mount path", §4.4
//! "Targeted handler"/"Router").

use crate::handler::{coalesce, Outcome, RequestHandler};
use crate::message::attribute_keys;
use crate::method::RequestMethod;
use crate::static_files::StaticFileHandler;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(Option<String>),
}

/// A parsed target path pattern (§3), e.g. `/users/:id` or `/static/*rest`.
#[derive(Debug, Clone)]
pub struct TargetPath {
    segments: Vec<Segment>,
}

impl TargetPath {
    /// Parses `/`, `*`, or `(/segment)+` where a segment is a literal, a
    /// `:name` parameter, or a trailing `*`/`*name` wildcard.
    pub fn parse(pattern: &str) -> TargetPath {
        if pattern == "*" {
            return TargetPath { segments: vec![Segment::Wildcard(None)] };
        }

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|raw| {
                if let Some(name) = raw.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if raw == "*" {
                    Segment::Wildcard(None)
                } else if let Some(name) = raw.strip_prefix('*') {
                    Segment::Wildcard(Some(name.to_string()))
                } else {
                    Segment::Literal(raw.to_string())
                }
            })
            .collect();

        TargetPath { segments }
    }

    /// Matches `path` against this pattern, returning collected parameter
    /// bindings on success (§3: "become attributes of the request").
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        if let [Segment::Wildcard(name)] = self.segments.as_slice() {
            let mut params = HashMap::new();
            if let Some(name) = name {
                params.insert(name.clone(), path.trim_start_matches('/').to_string());
            }
            return Some(params);
        }

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = HashMap::new();
        let mut path_idx = 0;

        for (seg_idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if path_segments.get(path_idx) != Some(&literal.as_str()) {
                        return None;
                    }
                    path_idx += 1;
                }
                Segment::Param(name) => {
                    let value = path_segments.get(path_idx)?;
                    params.insert(name.clone(), value.to_string());
                    path_idx += 1;
                }
                Segment::Wildcard(name) => {
                    debug_assert_eq!(seg_idx, self.segments.len() - 1, "wildcard must be the last segment");
                    let rest = path_segments[path_idx..].join("/");
                    if let Some(name) = name {
                        params.insert(name.clone(), rest);
                    }
                    return Some(params);
                }
            }
        }

        if path_idx == path_segments.len() {
            Some(params)
        } else {
            None
        }
    }
}

/// Normalizes a mount path: `/` stays `/`; otherwise no trailing `/`, no
/// empty segments, no `..` (§3 "Mount path").
pub fn normalize_mount_path(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn mount_path_contains(mount_path: &str, path: &str) -> bool {
    if mount_path == "/" {
        return true;
    }
    path == mount_path || path.starts_with(&format!("{}/", mount_path))
}

/// Wraps a user closure with a `(method, path)` predicate (§4.4 "Targeted
/// handler"). A non-matching request passes through unchanged.
pub struct TargetedHandler {
    methods: Vec<RequestMethod>,
    pattern: TargetPath,
    inner: Arc<dyn RequestHandler>,
}

impl TargetedHandler {
    pub fn new(methods: Vec<RequestMethod>, path: &str, inner: Arc<dyn RequestHandler>) -> Self {
        TargetedHandler { methods, pattern: TargetPath::parse(path), inner }
    }
}

impl RequestHandler for TargetedHandler {
    fn apply(&self, request: crate::message::HttpRequest) -> Outcome {
        if !self.methods.is_empty() && !self.methods.contains(request.method()) {
            return Outcome::Request(request);
        }

        match self.pattern.matches(&request.path()) {
            Some(params) => {
                let request = request.with_attribute(attribute_keys::REQUEST_PARAMETERS, params);
                self.inner.apply(request)
            }
            None => Outcome::Request(request),
        }
    }
}

/// Groups handlers under a mount path `M` (§4.4 "Router"). A request whose
/// decoded path doesn't start with `M` passes through unchanged.
pub struct Router {
    mount_path: String,
    handlers: Vec<Box<dyn RequestHandler>>,
}

impl Router {
    pub fn new(mount_path: &str) -> Self {
        Router { mount_path: normalize_mount_path(mount_path), handlers: Vec::new() }
    }

    fn full_path(&self, path: &str) -> String {
        if self.mount_path == "/" {
            normalize_mount_path(path)
        } else {
            format!("{}{}", self.mount_path, normalize_mount_path(path))
        }
    }

    pub fn route(mut self, methods: &[RequestMethod], path: &str, handler: impl Fn(crate::message::HttpRequest) -> crate::handler::Outcome + Send + Sync + 'static) -> Self {
        let full_path = self.full_path(path);
        self.handlers.push(Box::new(TargetedHandler::new(methods.to_vec(), &full_path, Arc::new(handler))));
        self
    }

    pub fn get(self, path: &str, handler: impl Fn(crate::message::HttpRequest) -> crate::handler::Outcome + Send + Sync + 'static) -> Self {
        self.route(&[RequestMethod::Get], path, handler)
    }

    pub fn post(self, path: &str, handler: impl Fn(crate::message::HttpRequest) -> crate::handler::Outcome + Send + Sync + 'static) -> Self {
        self.route(&[RequestMethod::Post], path, handler)
    }

    pub fn put(self, path: &str, handler: impl Fn(crate::message::HttpRequest) -> crate::handler::Outcome + Send + Sync + 'static) -> Self {
        self.route(&[RequestMethod::Put], path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Fn(crate::message::HttpRequest) -> crate::handler::Outcome + Send + Sync + 'static) -> Self {
        self.route(&[RequestMethod::Delete], path, handler)
    }

    /// Nests `router` as a handler: paths outside its mount path pass through.
    pub fn nest(mut self, router: Router) -> Self {
        self.handlers.push(Box::new(router));
        self
    }

    /// Mounts a single-file static handler at `path` (§4.6).
    pub fn files(mut self, path: &str, file: impl AsRef<Path>) -> Self {
        let full_path = self.full_path(path);
        self.handlers.push(Box::new(StaticFileHandler::single_file(&full_path, file.as_ref().to_path_buf())));
        self
    }

    /// Mounts a static directory at `path` (§4.6).
    pub fn resources(mut self, path: &str, base_dir: impl AsRef<Path>) -> Self {
        let full_path = self.full_path(path);
        self.handlers.push(Box::new(StaticFileHandler::directory(&full_path, base_dir.as_ref().to_path_buf())));
        self
    }
}

impl RequestHandler for Router {
    fn apply(&self, request: crate::message::HttpRequest) -> Outcome {
        if !mount_path_contains(&self.mount_path, &request.path()) {
            return Outcome::Request(request);
        }
        coalesce(&self.handlers, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_param_segments() {
        let pattern = TargetPath::parse("/users/:id");
        let params = pattern.matches("/users/42").unwrap();
        assert_eq!(params.get("id"), Some(&"42".to_string()));
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/42/extra").is_none());
    }

    #[test]
    fn trailing_wildcard_captures_rest() {
        let pattern = TargetPath::parse("/static/*rest");
        let params = pattern.matches("/static/a/b/c").unwrap();
        assert_eq!(params.get("rest"), Some(&"a/b/c".to_string()));
    }

    #[test]
    fn bare_star_matches_anything() {
        let pattern = TargetPath::parse("*");
        assert!(pattern.matches("/anything/at/all").is_some());
    }

    #[test]
    fn mount_path_gate_passes_through_unrelated_paths() {
        let router = Router::new("/api").get("/ping", |req| Outcome::Request(req));
        let request = crate::message::HttpRequest::new(crate::message::request::RequestLine::new(
            RequestMethod::Get,
            "/other",
            crate::version::HttpVersion::Http1_1,
        ));
        assert!(matches!(router.apply(request), Outcome::Request(_)));
    }

    #[test]
    fn normalizes_mount_path() {
        assert_eq!(normalize_mount_path("/a/b/"), "/a/b");
        assert_eq!(normalize_mount_path(""), "/");
        assert_eq!(normalize_mount_path("/"), "/");
    }
}
