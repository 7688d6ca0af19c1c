//! Common pieces of the message model (§3): the ordered, case-insensitive
//! header list, the attribute bag, and the lazy `Entity` body.

pub mod headers;
pub mod request;
pub mod response;

pub use request::HttpRequest;
pub use response::HttpResponse;

use std::any::Any;
use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A single header `(name, value)` pair, preserving the name's original case
/// for canonical output (§3 invariants: "canonical output preserves the
/// last-set case").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header { name: name.into(), value: value.into() }
    }
}

/// Ordered header list with case-insensitive lookups and duplicate-name
/// preservation (needed for `Set-Cookie`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    pub fn new() -> Self {
        Headers { entries: Vec::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First value matching `name`, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|h| h.name.eq_ignore_ascii_case(name)).map(|h| h.value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All values matching `name`, in insertion order (for list headers like
    /// `Set-Cookie` or `Via`).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries.iter().filter(move |h| h.name.eq_ignore_ascii_case(name)).map(|h| h.value.as_str())
    }

    /// Returns a copy with `name` appended (not replacing any existing
    /// value), used for multiply-occurring headers.
    pub fn with_added(&self, name: &str, value: &str) -> Headers {
        let mut entries = self.entries.clone();
        entries.push(Header::new(name, value));
        Headers { entries }
    }

    /// Returns a copy with every prior occurrence of `name` removed and a
    /// single fresh value set, used for single-valued headers.
    pub fn with_set(&self, name: &str, value: &str) -> Headers {
        let mut entries: Vec<Header> = self.entries.iter().filter(|h| !h.name.eq_ignore_ascii_case(name)).cloned().collect();
        entries.push(Header::new(name, value));
        Headers { entries }
    }

    /// Returns a copy with every occurrence of `name` removed.
    pub fn with_removed(&self, name: &str) -> Headers {
        Headers { entries: self.entries.iter().filter(|h| !h.name.eq_ignore_ascii_case(name)).cloned().collect() }
    }
}

/// Out-of-band context attached to a message, never serialized on the wire
/// (§3). The closed set of keys this core uses is listed in SPEC_FULL.md §9.
#[derive(Clone, Default)]
pub struct Attributes {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes { entries: HashMap::new() }
    }

    pub fn with(&self, key: &str, value: impl Any + Send + Sync) -> Attributes {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), Arc::new(value));
        Attributes { entries }
    }

    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Closed set of attribute keys used by the core (§9 design notes).
pub mod attribute_keys {
    pub const SOCKET_ADDR: &str = "socket";
    pub const CORRELATE: &str = "correlate";
    pub const REQUEST_COUNT: &str = "requestCount";
    pub const SERVER: &str = "server";
    pub const LOGGER: &str = "logger";
    pub const REQUEST_PARAMETERS: &str = "request.parameters";
    pub const CONNECTION_UPGRADE: &str = "connection.upgrade";
    pub const RESPONSE_REQUEST: &str = "response.request";
}

/// A lazy byte source attached to a message, optionally length-known
/// (GLOSSARY: "Entity"). Producing one from bytes or a file is the external
/// API's concern (§1); this core only needs to hold, measure, and consume it.
#[derive(Clone)]
pub enum Entity {
    Empty,
    Bytes(Arc<Vec<u8>>),
    Reader { reader: Arc<Mutex<dyn Read + Send>>, len: Option<u64>, closed: Arc<AtomicBool> },
}

impl Entity {
    pub fn bytes(data: Vec<u8>) -> Entity {
        Entity::Bytes(Arc::new(data))
    }

    pub fn reader(reader: impl Read + Send + 'static, len: Option<u64>) -> Entity {
        Entity::Reader { reader: Arc::new(Mutex::new(reader)), len, closed: Arc::new(AtomicBool::new(false)) }
    }

    /// Known length, if any (§3: "optional known length").
    pub fn known_len(&self) -> Option<u64> {
        match self {
            Entity::Empty => Some(0),
            Entity::Bytes(data) => Some(data.len() as u64),
            Entity::Reader { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Entity::Empty) || matches!(self, Entity::Bytes(data) if data.is_empty())
    }

    /// Consumes the entity into a single byte vector. For a `Reader`, reads
    /// it to completion and marks it closed.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            Entity::Empty => Ok(Vec::new()),
            Entity::Bytes(data) => Ok(Arc::try_unwrap(data).unwrap_or_else(|arc| (*arc).clone())),
            Entity::Reader { reader, closed, .. } => {
                let mut buf = Vec::new();
                if let Ok(mut reader) = reader.lock() {
                    reader.read_to_end(&mut buf)?;
                }
                closed.store(true, Ordering::SeqCst);
                Ok(buf)
            }
        }
    }

    /// Closes the underlying stream if not already closed, per §5 "each
    /// response body's stream is closed at most twice". Returns whether this
    /// call performed the close (the second call is a harmless no-op).
    pub fn close(&self) -> bool {
        match self {
            Entity::Reader { closed, .. } => !closed.swap(true, Ordering::SeqCst),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Empty => write!(f, "Entity::Empty"),
            Entity::Bytes(data) => write!(f, "Entity::Bytes({} bytes)", data.len()),
            Entity::Reader { len, .. } => write!(f, "Entity::Reader(len={:?})", len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_case_insensitive_lookup() {
        let headers = Headers::new().with_set("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn with_set_replaces_all_prior_values() {
        let headers = Headers::new().with_added("Via", "1.1 a").with_added("Via", "1.1 b");
        assert_eq!(headers.get_all("via").collect::<Vec<_>>(), vec!["1.1 a", "1.1 b"]);

        let replaced = headers.with_set("Via", "1.1 c");
        assert_eq!(replaced.get_all("via").collect::<Vec<_>>(), vec!["1.1 c"]);
    }

    #[test]
    fn with_removed_drops_all_occurrences() {
        let headers = Headers::new().with_added("X-A", "1").with_added("X-A", "2");
        assert!(headers.with_removed("x-a").is_empty());
    }

    #[test]
    fn attributes_roundtrip() {
        let attrs = Attributes::new().with("n", 42u32);
        assert_eq!(attrs.get::<u32>("n"), Some(&42));
        assert_eq!(attrs.get::<u32>("missing"), None);
    }

    #[test]
    fn entity_known_len() {
        assert_eq!(Entity::Empty.known_len(), Some(0));
        assert_eq!(Entity::bytes(vec![1, 2, 3]).known_len(), Some(3));
    }

    #[test]
    fn entity_reader_close_is_idempotent() {
        let entity = Entity::reader(std::io::Cursor::new(vec![1, 2, 3]), Some(3));
        assert!(entity.close());
        assert!(!entity.close());
    }
}
