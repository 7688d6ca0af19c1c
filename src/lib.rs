#![forbid(unsafe_code)]

//! Embeddable HTTP/1.1 server engine: wire I/O, a copy-on-modify message
//! model, a handler/filter pipeline, cookies, static files, and the
//! WebSocket upgrade handshake. See the modules under `message` for the
//! request/response types and `config`/`server` for wiring a listener.

pub mod config;
pub mod connection;
pub mod cookie;
pub mod error;
pub mod executor;
pub mod filter;
pub mod handler;
pub mod logger;
pub mod media_type;
pub mod message;
pub mod method;
pub mod router;
pub mod server;
pub mod static_files;
pub mod tls;
pub mod uri;
pub mod version;
pub mod websocket;
pub mod wire;

pub use config::{ServerBuilder, ServerConfig};
pub use handler::{Outcome, RequestHandler};
pub use message::{HttpRequest, HttpResponse};
pub use router::Router;
pub use server::Server;
