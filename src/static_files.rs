//! Static file/resource server (§4.6): a `RequestHandler` that maps a
//! request path to a file under a source directory, generalizing the
//! teacher's always-200 RAM-caching `StaticFiles`/`Builder` design to the
//! spec's conditional-GET (`304`) and `406`/`405` semantics.

use crate::handler::{Outcome, RequestHandler};
use crate::media_type::media_type_by_extension;
use crate::message::{HttpRequest, HttpResponse};
use crate::method::RequestMethod;
use chrono::{DateTime, Utc};
use std::collections::btree_map::BTreeMap;
use std::fs::{read_dir, File, Metadata};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread::{sleep, spawn};
use std::time::{Duration, SystemTime};

/// One cached file's bytes and precomputed response metadata.
#[derive(Clone)]
struct CachedFile {
    raw_data: Arc<Vec<u8>>,
    content_type: String,
    last_modified: SystemTime,
    last_modified_rfc7231: String,
    etag: String,
}

/// Dynamic RAM cache of files under a source directory, periodically
/// refreshed from disk in a background thread (teacher's `StaticFiles`
/// design, `static_files.rs`).
#[derive(Clone)]
struct StaticFiles {
    dir_path: PathBuf,
    cached_files: Arc<RwLock<BTreeMap<String, CachedFile>>>,
    use_last_modified: bool,
    use_etag: bool,
}

impl StaticFiles {
    fn new(dir_path: PathBuf) -> Self {
        let static_files = StaticFiles {
            dir_path,
            cached_files: Arc::new(RwLock::new(BTreeMap::new())),
            use_last_modified: true,
            use_etag: true,
        };

        static_files.update();

        let background = static_files.clone();
        spawn(move || loop {
            sleep(Duration::from_secs(1));
            background.update();
        });

        static_files
    }

    fn update(&self) {
        self.remove_nonexistent();
        self.update_dir("");
    }

    fn update_dir(&self, subdir: &str) {
        let mut cur_dir = self.dir_path.clone();
        if !subdir.is_empty() {
            cur_dir.push(subdir);
        }

        match read_dir(&cur_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    if let Ok(metadata) = entry.metadata() {
                        if let Some(name) = entry.file_name().to_str() {
                            // dotfiles/dot-directories are never served (§4.6: "a regular non-hidden file")
                            if name.starts_with('.') {
                                continue;
                            }
                            let rel = if subdir.is_empty() { name.to_string() } else { format!("{}/{}", subdir, name) };
                            if metadata.is_file() {
                                self.cache_if_stale(&rel, &metadata);
                            } else if metadata.is_dir() {
                                self.update_dir(&rel);
                            }
                        }
                    }
                }
            }
            Err(_) => self.clear(),
        }
    }

    fn cache_if_stale(&self, rel_path: &str, metadata: &Metadata) {
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(_) => return,
        };

        let already_fresh = self.cached_files.read().unwrap().get(rel_path).map(|f| f.last_modified >= modified).unwrap_or(false);
        if already_fresh {
            return;
        }

        if let Ok(mut file) = File::open(self.dir_path.join(rel_path)) {
            let mut raw_data = Vec::new();
            if file.read_to_end(&mut raw_data).is_ok() {
                let extension = Path::new(rel_path).extension().and_then(|e| e.to_str()).unwrap_or("");
                let content_type = media_type_by_extension(extension).to_string();

                let last_modified_rfc7231 = if self.use_last_modified { format_http_date(modified) } else { String::new() };
                let etag = if self.use_etag { format!("{:x}", md5::compute(&raw_data)) } else { String::new() };

                self.cached_files.write().unwrap().insert(
                    rel_path.to_string(),
                    CachedFile { raw_data: Arc::new(raw_data), content_type, last_modified, last_modified_rfc7231, etag },
                );
            }
        }
    }

    fn remove_nonexistent(&self) {
        let missing: Vec<String> = self
            .cached_files
            .read()
            .unwrap()
            .keys()
            .filter(|rel| !self.dir_path.join(rel).exists())
            .cloned()
            .collect();

        if !missing.is_empty() {
            let mut cached_files = self.cached_files.write().unwrap();
            for rel in missing {
                cached_files.remove(&rel);
            }
        }
    }

    fn clear(&self) {
        self.cached_files.write().unwrap().clear();
    }

    fn get(&self, rel_path: &str) -> Option<CachedFile> {
        self.cached_files.read().unwrap().get(rel_path).cloned()
    }
}

fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

enum Source {
    /// A single file registered under its own mount path.
    SingleFile { mount_path: String, file: PathBuf, cache: StaticFiles, name: String },
    /// A directory whose relative path (after stripping the mount path) is
    /// resolved against `cache`.
    Directory { mount_path: String, cache: StaticFiles },
}

/// A `RequestHandler` serving one file or a whole directory (§4.6).
pub struct StaticFileHandler {
    source: Source,
}

impl StaticFileHandler {
    pub fn single_file(mount_path: &str, file: PathBuf) -> Self {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        StaticFileHandler { source: Source::SingleFile { mount_path: mount_path.to_string(), file, cache: StaticFiles::new(dir), name } }
    }

    pub fn directory(mount_path: &str, base_dir: PathBuf) -> Self {
        StaticFileHandler { source: Source::Directory { mount_path: mount_path.to_string(), cache: StaticFiles::new(base_dir) } }
    }

    fn mount_path(&self) -> &str {
        match &self.source {
            Source::SingleFile { mount_path, .. } => mount_path,
            Source::Directory { mount_path, .. } => mount_path,
        }
    }

    /// Resolves the request path against this source, returning the cached
    /// file if the request stays within bounds and the file exists.
    fn resolve(&self, request_path: &str) -> Option<CachedFile> {
        match &self.source {
            Source::SingleFile { mount_path, cache, name, .. } => {
                if request_path != *mount_path {
                    return None;
                }
                cache.get(name)
            }
            Source::Directory { mount_path, cache } => {
                let rel = strip_mount_path(mount_path, request_path)?;
                if rel.split('/').any(|segment| segment == "..") {
                    return None;
                }
                cache.get(&rel)
            }
        }
    }
}

fn strip_mount_path<'a>(mount_path: &str, request_path: &'a str) -> Option<String> {
    let rel = if mount_path == "/" {
        request_path
    } else {
        request_path.strip_prefix(mount_path)?
    };
    Some(rel.trim_start_matches('/').to_string())
}

impl RequestHandler for StaticFileHandler {
    fn apply(&self, request: HttpRequest) -> Outcome {
        let path = request.path();
        let mount_path = self.mount_path();
        let in_scope = path == mount_path || path.starts_with(&format!("{}/", mount_path)) || mount_path == "/";
        if !in_scope {
            return Outcome::Request(request);
        }

        if !matches!(request.method(), RequestMethod::Get | RequestMethod::Head) {
            return Outcome::Response(HttpResponse::with_status(405, "Method Not Allowed").set_allow("GET, HEAD"));
        }

        let cached = match self.resolve(&path) {
            Some(cached) => cached,
            None => return Outcome::Request(request),
        };

        if request.has_accept() {
            if let Some(media_type) = crate::media_type::MediaType::parse(&cached.content_type) {
                let acceptable = request
                    .accept_all()
                    .iter()
                    .flat_map(|value| value.split(','))
                    .filter_map(|r| crate::media_type::MediaType::parse(r.trim()))
                    .any(|range| media_type.matches_range(&range));
                if !acceptable {
                    return Outcome::Response(HttpResponse::with_status(406, "Not Acceptable"));
                }
            }
        }

        if let Some(if_modified_since) = request.if_modified_since_option() {
            if let Ok(since) = DateTime::parse_from_rfc2822(if_modified_since) {
                if let Ok(cached_modified) = DateTime::parse_from_str(&cached.last_modified_rfc7231, "%a, %d %b %Y %H:%M:%S GMT") {
                    if cached_modified <= since {
                        let mut response = HttpResponse::with_status(304, "Not Modified");
                        if !cached.last_modified_rfc7231.is_empty() {
                            response = response.set_last_modified(&cached.last_modified_rfc7231);
                        }
                        return Outcome::Response(response);
                    }
                }
            }
        }

        let mut response = HttpResponse::with_status(200, "OK").set_content_type(&cached.content_type);
        if !cached.last_modified_rfc7231.is_empty() {
            response = response.set_last_modified(&cached.last_modified_rfc7231);
        }
        if !cached.etag.is_empty() {
            response = response.set_etag(&cached.etag);
        }

        if matches!(request.method(), RequestMethod::Head) {
            return Outcome::Response(response.set_content_length(&cached.raw_data.len().to_string()));
        }

        Outcome::Response(response.with_body((*cached.raw_data).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::request::RequestLine;
    use crate::version::HttpVersion;
    use std::io::Write;

    fn get(path: &str) -> HttpRequest {
        HttpRequest::new(RequestLine::new(RequestMethod::Get, path, HttpVersion::Http1_1))
    }

    #[test]
    fn serves_file_from_directory_and_falls_through_on_miss() {
        let dir = std::env::temp_dir().join(format!("webhatch-static-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::File::create(dir.join("a.txt")).unwrap().write_all(b"hello").unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let handler = StaticFileHandler::directory("/files", dir.clone());
        std::thread::sleep(Duration::from_millis(1100));

        match handler.apply(get("/files/a.txt")) {
            Outcome::Response(response) => assert_eq!(response.status_code(), 200),
            Outcome::Request(_) => panic!("expected the file to be served"),
        }

        assert!(matches!(handler.apply(get("/files/missing.txt")), Outcome::Request(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn dotfiles_are_never_served_from_a_directory_mount() {
        let dir = std::env::temp_dir().join(format!("webhatch-static-dotfile-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::File::create(dir.join(".secret")).unwrap().write_all(b"nope").unwrap();
        std::thread::sleep(Duration::from_millis(1100));

        let handler = StaticFileHandler::directory("/files", dir.clone());
        std::thread::sleep(Duration::from_millis(100));

        assert!(matches!(handler.apply(get("/files/.secret")), Outcome::Request(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_non_get_head_with_405() {
        let dir = std::env::temp_dir().join(format!("webhatch-static-405-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let handler = StaticFileHandler::directory("/files", dir.clone());

        let request = HttpRequest::new(RequestLine::new(RequestMethod::Post, "/files/a.txt", HttpVersion::Http1_1));
        match handler.apply(request) {
            Outcome::Response(response) => {
                assert_eq!(response.status_code(), 405);
                assert_eq!(response.allow().unwrap(), "GET, HEAD");
            }
            Outcome::Request(_) => panic!("expected 405"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
