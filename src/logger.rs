//! Logging abstraction consumed by the connection service (§9 design notes:
//! "source uses... a `Logger` abstraction").
//!
//! The core only depends on the `Logger` trait; sinks are an external
//! collaborator. `ConsoleLogger` is the default, grounded on the teacher's
//! own `dbg!`-based diagnostics but promoted to a real sink with levels.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Sink for info/warn/error lines, optionally tagged with a correlate id.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, correlate: Option<&str>, message: &str);

    fn info(&self, correlate: Option<&str>, message: &str) {
        self.log(Level::Info, correlate, message);
    }

    fn warn(&self, correlate: Option<&str>, message: &str) {
        self.log(Level::Warn, correlate, message);
    }

    fn error(&self, correlate: Option<&str>, message: &str) {
        self.log(Level::Error, correlate, message);
    }
}

/// Default logger: writes to stderr, one line per call.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, correlate: Option<&str>, message: &str) {
        match correlate {
            Some(correlate) => eprintln!("[{}] [{}] {}", level, correlate, message),
            None => eprintln!("[{}] {}", level, message),
        }
    }
}

/// A logger that discards everything, useful for tests.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _correlate: Option<&str>, _message: &str) {}
}

pub type SharedLogger = Arc<dyn Logger>;

pub fn console_logger() -> SharedLogger {
    Arc::new(ConsoleLogger)
}

/// Opaque per-request token, composed as `(now_ms, service_id, connection_id, request_count)`
/// per the GLOSSARY's "Correlate id". Used only for log correlation, never placed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelateId(String);

impl CorrelateId {
    pub fn new(now_ms: u128, service_id: u64, connection_id: u64, request_count: u64) -> Self {
        CorrelateId(format!("{:x}-{:x}-{:x}-{:x}", now_ms, service_id, connection_id, request_count))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlate_id_format() {
        let id = CorrelateId::new(1, 2, 3, 4);
        assert_eq!(id.as_str(), "1-2-3-4");
    }

    #[test]
    fn null_logger_does_not_panic() {
        let logger = NullLogger;
        logger.info(Some("abc"), "hello");
        logger.error(None, "bye");
    }
}
