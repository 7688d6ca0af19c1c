//! Client-side cookie store (§4.3), guarded by a mutex exactly as
//! `static_files::StaticFiles` guards its RAM cache with an `RwLock` — here a
//! plain `Mutex` since both reads and writes touch `last_access`.

use crate::cookie::grammar::{PlainCookie, SetCookie};
use crate::cookie::public_suffix::PublicSuffixList;
use crate::error::CookieError;
use crate::uri::Uri;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// One entry in the store (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub host_only: bool,
    pub secure_only: bool,
    pub http_only: bool,
    pub persistent: bool,
    pub creation: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
}

impl PersistentCookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map(|expiry| expiry <= now).unwrap_or(false)
    }
}

pub struct CookieStore {
    entries: Mutex<Vec<PersistentCookie>>,
    public_suffixes: PublicSuffixList,
}

impl CookieStore {
    pub fn new() -> Self {
        CookieStore { entries: Mutex::new(Vec::new()), public_suffixes: PublicSuffixList::default_list() }
    }

    pub fn with_public_suffix_list(public_suffixes: PublicSuffixList) -> Self {
        CookieStore { entries: Mutex::new(Vec::new()), public_suffixes }
    }

    /// Returns cookies applicable to `target_uri`, sorted by descending path
    /// length then ascending creation time (§4.3), touching `last_access`.
    pub fn get(&self, target_uri: &str) -> Result<Vec<PlainCookie>, CookieError> {
        let target = normalize_target(target_uri)?;
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();

        let mut matches: Vec<usize> = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            if entry.is_expired(now) {
                continue;
            }
            if !domain_matches(&entry.domain, entry.host_only, &target.host) {
                continue;
            }
            if !path_matches(&entry.path, &target.path) {
                continue;
            }
            if entry.secure_only && target.scheme != "https" && target.scheme != "wss" {
                continue;
            }
            matches.push(idx);
        }

        matches.sort_by(|&a, &b| entries[b].path.len().cmp(&entries[a].path.len()).then(entries[a].creation.cmp(&entries[b].creation)));

        let result = matches.iter().map(|&idx| PlainCookie { name: entries[idx].name.clone(), value: entries[idx].value.clone() }).collect();

        for &idx in &matches {
            entries[idx].last_access = now;
        }

        Ok(result)
    }

    /// Stores each `SetCookie` against `target_uri`, replacing any entry
    /// sharing `(name, domain, path)` while preserving its original creation
    /// time (§4.3).
    pub fn put(&self, target_uri: &str, set_cookies: &[SetCookie]) -> Result<(), CookieError> {
        let target = normalize_target(target_uri)?;
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();

        for set_cookie in set_cookies {
            let host_only = set_cookie.domain.is_none();
            let domain = set_cookie.domain.clone().unwrap_or_else(|| target.host.clone());

            if self.public_suffixes.is_public_suffix(&domain) {
                return Err(CookieError::PublicSuffixDomain(domain));
            }

            let path = set_cookie.path.clone().unwrap_or_else(|| default_path(&target.path));
            let expiry = set_cookie.max_age.map(|seconds| now + chrono::Duration::seconds(seconds)).or(set_cookie.expires);
            let persistent = set_cookie.max_age.is_some() || set_cookie.expires.is_some();

            let creation = entries
                .iter()
                .find(|e| e.name == set_cookie.name && e.domain == domain && e.path == path)
                .map(|e| e.creation)
                .unwrap_or(now);

            entries.retain(|e| !(e.name == set_cookie.name && e.domain == domain && e.path == path));

            entries.push(PersistentCookie {
                name: set_cookie.name.clone(),
                value: set_cookie.value.clone(),
                domain,
                path,
                host_only,
                secure_only: set_cookie.secure,
                http_only: set_cookie.http_only,
                persistent,
                creation,
                last_access: now,
                expiry,
            });
        }

        Ok(())
    }

    /// Drops expired entries (`expired_only = true`) or every entry.
    pub fn clear(&self, expired_only: bool) {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();
        if expired_only {
            entries.retain(|e| !e.is_expired(now));
        } else {
            entries.clear();
        }
    }

    pub fn list(&self) -> Vec<PersistentCookie> {
        self.entries.lock().unwrap().clone()
    }

    pub fn size(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl Default for CookieStore {
    fn default() -> Self {
        CookieStore::new()
    }
}

struct NormalizedTarget {
    scheme: String,
    host: String,
    path: String,
}

fn normalize_target(target_uri: &str) -> Result<NormalizedTarget, CookieError> {
    let uri = Uri::parse(target_uri).map_err(|_| CookieError::InvalidTarget(target_uri.to_string()))?;
    let scheme = uri.scheme.ok_or_else(|| CookieError::InvalidTarget(target_uri.to_string()))?;
    if !matches!(scheme.as_str(), "http" | "https" | "ws" | "wss") {
        return Err(CookieError::InvalidTarget(target_uri.to_string()));
    }
    let host = uri.host.ok_or_else(|| CookieError::InvalidTarget(target_uri.to_string()))?;
    let path = if uri.path.is_empty() { "/".to_string() } else { uri.path };
    Ok(NormalizedTarget { scheme, host, path })
}

fn default_path(target_path: &str) -> String {
    match target_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => target_path[..idx].to_string(),
    }
}

/// RFC 6265 §5.1.3: equal, or `host` ends with `.domain` and `host` is not an
/// IP literal (a host-only cookie matches exactly, never by suffix).
fn domain_matches(cookie_domain: &str, host_only: bool, host: &str) -> bool {
    if host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }
    if host_only || Uri::host_is_ip_literal(host) {
        return false;
    }
    host.to_ascii_lowercase().ends_with(&format!(".{}", cookie_domain.to_ascii_lowercase()))
}

/// RFC 6265 §5.1.4.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path == request_path {
        return true;
    }
    if request_path.starts_with(cookie_path) {
        if cookie_path.ends_with('/') {
            return true;
        }
        return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_secure_and_domain_scenario() {
        let store = CookieStore::new();
        let set = SetCookie::new("a", "1").unwrap().with_domain("example.com").with_path("/").secure();
        store.put("https://www.example.com/", &[set]).unwrap();

        assert_eq!(store.get("https://www.example.com/p").unwrap(), vec![PlainCookie { name: "a".into(), value: "1".into() }]);
        assert!(store.get("http://www.example.com/p").unwrap().is_empty());
        assert!(store.get("https://evil.com/").unwrap().is_empty());
    }

    #[test]
    fn put_replaces_same_key_and_preserves_creation() {
        let store = CookieStore::new();
        store.put("https://example.com/", &[SetCookie::new("a", "1").unwrap()]).unwrap();
        let first_creation = store.list()[0].creation;

        store.put("https://example.com/", &[SetCookie::new("a", "2").unwrap()]).unwrap();
        let entries = store.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "2");
        assert_eq!(entries[0].creation, first_creation);
    }

    #[test]
    fn rejects_public_suffix_domain() {
        let store = CookieStore::new();
        let set = SetCookie::new("a", "1").unwrap().with_domain("com");
        assert!(matches!(store.put("https://example.com/", &[set]), Err(CookieError::PublicSuffixDomain(_))));
    }

    #[test]
    fn clear_expired_only_keeps_persistent_future_cookies() {
        let store = CookieStore::new();
        store.put("https://example.com/", &[SetCookie::new("fresh", "1").unwrap().with_max_age(3600)]).unwrap();
        store.put("https://example.com/", &[SetCookie::new("stale", "1").unwrap().with_max_age(-1)]).unwrap();

        store.clear(true);
        let names: Vec<String> = store.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["fresh"]);
    }

    #[test]
    fn default_path_takes_directory_of_target_path() {
        assert_eq!(default_path("/a/b/c"), "/a/b");
        assert_eq!(default_path("/"), "/");
    }
}
