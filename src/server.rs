//! The accept loop (§5): binds a listener and dispatches each accepted
//! socket to the `service` pool, generalizing the teacher's mio-based
//! `Server`/`Worker` pair (`server.rs`, `worker.rs`) into a blocking,
//! thread-per-connection model (see `connection::serve_connection`).

use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::error::ServerError;
use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A bound, not-yet-running server (§6 "`ServerBuilder`... consumed by value
/// into the server constructor").
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    tls_config: Option<Arc<rustls::ServerConfig>>,
}

impl Server {
    /// Binds `addr` and loads TLS material if `ServerBuilder::secure` was
    /// called (§6). `backlog_size` is carried on `ServerConfig` for parity
    /// with the configuration table but isn't settable through
    /// `std::net::TcpListener`; the platform default backlog applies.
    pub fn bind(addr: SocketAddr, config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).map_err(ServerError::Bind)?;
        let tls_config = match &config.tls {
            Some(tls) => Some(crate::tls::build_server_config(&tls.cert_path, &tls.key_path)?),
            None => None,
        };
        Ok(Server { listener, config: Arc::new(config), tls_config })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop on the calling thread until the listener errors
    /// unrecoverably (§5: "one state machine per accepted socket").
    pub fn run(self) -> std::io::Result<()> {
        let connection_ids = AtomicU64::new(0);

        for accepted in self.listener.incoming() {
            let stream = match accepted {
                Ok(stream) => stream,
                Err(err) => {
                    self.config.logger.error(None, &format!("accept failed: {}", err));
                    continue;
                }
            };

            let _ = stream.set_nodelay(true);
            let peer_addr = match stream.peer_addr() {
                Ok(addr) => addr,
                Err(_) => continue,
            };

            let connection_id = connection_ids.fetch_add(1, Ordering::SeqCst);

            if self.config.executor.service_queue_depth() >= self.config.queue_size {
                reject_with_503(stream, &self.config);
                continue;
            }

            let config = self.config.clone();
            let tls_config = self.tls_config.clone();

            config.executor.service.execute(move || match tls_config {
                Some(tls_config) => serve_connection(crate::tls::TlsStream::accept(stream, tls_config), config, connection_id, peer_addr),
                None => serve_connection(stream, config, connection_id, peer_addr),
            });
        }

        Ok(())
    }
}

/// §4.5.2 rejection policy: answered directly on the accepting thread since
/// the `service` pool is already saturated.
fn reject_with_503(mut stream: impl std::io::Write, config: &Arc<ServerConfig>) {
    config.logger.warn(None, "service pool saturated, rejecting connection with 503");
    let body = b"503 Service Unavailable";
    let response = format!(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        String::from_utf8_lossy(body)
    );
    let _ = stream.write_all(response.as_bytes());
}
