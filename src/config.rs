//! Server configuration (§6 table, §9 "Configuration DSL"): a `ServerBuilder`
//! populated by chained setters, mirroring `static_files::Builder`, consumed
//! by value into the server constructor.

use crate::executor::Executor;
use crate::filter::ResponseFilter;
use crate::handler::RequestHandler;
use crate::logger::{console_logger, SharedLogger};
use crate::message::{HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

/// `keep_alive = {timeout, max}` (§6).
#[derive(Debug, Clone, Copy)]
pub struct KeepAliveParameters {
    pub timeout: Duration,
    pub max: u32,
}

/// TLS material for `secure(key, cert)` (§6).
pub struct TlsConfig {
    pub key_path: std::path::PathBuf,
    pub cert_path: std::path::PathBuf,
}

pub type ErrorHandler = Arc<dyn Fn(&dyn std::error::Error, &HttpRequest) -> HttpResponse + Send + Sync>;

/// Immutable, fully resolved server configuration (§6). Constructed only via
/// `ServerBuilder::build`.
pub struct ServerConfig {
    pub backlog_size: u32,
    pub pool_size: usize,
    pub queue_size: usize,
    pub buffer_size: usize,
    pub read_timeout: Duration,
    pub header_limit: usize,
    pub keep_alive: Option<KeepAliveParameters>,
    pub tls: Option<TlsConfig>,
    pub logger: SharedLogger,
    pub error_handler: ErrorHandler,
    pub request_handlers: Arc<Vec<Box<dyn RequestHandler>>>,
    pub response_filters: Arc<Vec<Box<dyn ResponseFilter>>>,
    pub executor: Arc<Executor>,
}

/// Accumulates configuration via chained setters (§9), consumed by
/// `build()` into an immutable `ServerConfig`.
pub struct ServerBuilder {
    backlog_size: u32,
    pool_size: usize,
    queue_size: usize,
    buffer_size: usize,
    read_timeout: Duration,
    header_limit: usize,
    keep_alive: Option<KeepAliveParameters>,
    tls: Option<TlsConfig>,
    logger: SharedLogger,
    error_handler: Option<ErrorHandler>,
    request_handlers: Vec<Box<dyn RequestHandler>>,
    response_filters: Vec<Box<dyn ResponseFilter>>,
    pool_factor: usize,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cpus = num_cpus::get();
        ServerBuilder {
            backlog_size: 50,
            pool_size: cpus,
            queue_size: 4 * cpus,
            buffer_size: 8192,
            read_timeout: Duration::from_millis(5000),
            header_limit: 100,
            keep_alive: None,
            tls: None,
            logger: console_logger(),
            error_handler: None,
            request_handlers: Vec::new(),
            response_filters: Vec::new(),
            pool_factor: 4,
        }
    }

    /// Scales the `keep_alive`/`upgrade`/`encoder` pools relative to
    /// `pool_size` (§5 table).
    pub fn pool_factor(mut self, factor: usize) -> Self {
        self.pool_factor = factor;
        self
    }

    pub fn backlog_size(mut self, size: u32) -> Self {
        self.backlog_size = size;
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn header_limit(mut self, limit: usize) -> Self {
        self.header_limit = limit;
        self
    }

    pub fn keep_alive(mut self, timeout: Duration, max: u32) -> Self {
        self.keep_alive = Some(KeepAliveParameters { timeout, max });
        self
    }

    pub fn secure(mut self, key_path: impl Into<std::path::PathBuf>, cert_path: impl Into<std::path::PathBuf>) -> Self {
        self.tls = Some(TlsConfig { key_path: key_path.into(), cert_path: cert_path.into() });
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn error_handler(mut self, handler: impl Fn(&dyn std::error::Error, &HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.request_handlers.push(Box::new(handler));
        self
    }

    pub fn filter(mut self, filter: impl ResponseFilter + 'static) -> Self {
        self.response_filters.push(Box::new(filter));
        self
    }

    pub fn build(self) -> Result<ServerConfig, crate::error::ServerError> {
        if self.pool_size == 0 {
            return Err(crate::error::ServerError::InvalidConfig("pool_size must be at least 1".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(crate::error::ServerError::InvalidConfig("buffer_size must be at least 1".to_string()));
        }

        Ok(ServerConfig {
            backlog_size: self.backlog_size,
            pool_size: self.pool_size,
            queue_size: self.queue_size,
            buffer_size: self.buffer_size,
            read_timeout: self.read_timeout,
            header_limit: self.header_limit,
            keep_alive: self.keep_alive,
            tls: self.tls,
            logger: self.logger,
            error_handler: self.error_handler.unwrap_or_else(|| Arc::new(|_err, _req| crate::error::default_error_response())),
            request_handlers: Arc::new(self.request_handlers),
            response_filters: Arc::new(self.response_filters),
            executor: Arc::new(Executor::new(self.pool_size, self.pool_factor)),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        ServerBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_configuration_table() {
        let config = ServerBuilder::new().build().unwrap();
        assert_eq!(config.backlog_size, 50);
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.header_limit, 100);
        assert!(config.keep_alive.is_none());
    }

    #[test]
    fn rejects_zero_pool_size() {
        assert!(ServerBuilder::new().pool_size(0).build().is_err());
    }
}
