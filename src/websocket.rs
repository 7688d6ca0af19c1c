//! WebSocket upgrade handshake (§4.4). Framing and session behavior beyond
//! the handshake are out of scope (§1 Non-goals); this module only produces
//! the `101 Switching Protocols` response and the closure attribute a
//! connection-service hand-off needs, generalizing the teacher's
//! `handshake_response` (old `websocket.rs`) from a raw byte-string builder
//! into a `RequestHandler`.

use crate::handler::{Outcome, RequestHandler};
use crate::message::{attribute_keys, HttpRequest, HttpResponse};
use base64;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

const MAGIC_STRING: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
const SUPPORTED_VERSION: &str = "13";

/// A single-use closure handed to the Upgrade pool once a connection is
/// switched to a raw socket (§3 attribute `connection.upgrade`). Boxed in a
/// `Mutex<Option<_>>` so the attribute bag (`Clone`) can carry it while the
/// connection service still takes it exactly once.
pub struct UpgradeHandoff {
    inner: Mutex<Option<Box<dyn FnOnce(Box<dyn ReadWrite + Send>) + Send>>>,
}

pub trait ReadWrite: Read + Write {}
impl<T: Read + Write> ReadWrite for T {}

impl UpgradeHandoff {
    pub fn new(f: impl FnOnce(Box<dyn ReadWrite + Send>) + Send + 'static) -> Self {
        UpgradeHandoff { inner: Mutex::new(Some(Box::new(f))) }
    }

    /// Takes the closure, consuming it. Returns `None` if already taken.
    pub fn take(&self) -> Option<Box<dyn FnOnce(Box<dyn ReadWrite + Send>) + Send>> {
        self.inner.lock().unwrap().take()
    }
}

/// Computes `Sec-WebSocket-Accept` from a client's `Sec-WebSocket-Key`
/// (§8 invariant: `base64(sha1(key + GUID))`).
pub fn accept_token(sec_websocket_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.input((sec_websocket_key.to_owned() + MAGIC_STRING).as_bytes());
    base64::encode(&hasher.result())
}

/// Builds a `RequestHandler` that upgrades matching requests, invoking
/// `on_upgrade` with the raw socket once the connection service hands it
/// off. Non-matching or malformed upgrade requests pass through or answer
/// `400 Bad Request` respectively; everything else is untouched.
pub fn upgrade_handler(on_upgrade: impl Fn(Box<dyn ReadWrite + Send>) + Send + Sync + 'static) -> impl RequestHandler {
    WebSocketUpgrade { on_upgrade: Arc::new(on_upgrade) }
}

struct WebSocketUpgrade {
    on_upgrade: Arc<dyn Fn(Box<dyn ReadWrite + Send>) + Send + Sync>,
}

impl RequestHandler for WebSocketUpgrade {
    fn apply(&self, request: HttpRequest) -> Outcome {
        let wants_upgrade = request.upgrade_option().map(|v| v.eq_ignore_ascii_case("websocket")).unwrap_or(false);
        if !wants_upgrade {
            return Outcome::Request(request);
        }

        let key = match request.header("Sec-WebSocket-Key") {
            Ok(key) => key.to_string(),
            Err(_) => return Outcome::Response(HttpResponse::with_status(400, "Bad Request")),
        };

        let version_ok = request.header("Sec-WebSocket-Version").map(|v| v == SUPPORTED_VERSION).unwrap_or(false);
        if !version_ok {
            return Outcome::Response(HttpResponse::with_status(400, "Bad Request"));
        }

        let accept = accept_token(&key);
        let on_upgrade = self.on_upgrade.clone();
        let handoff = UpgradeHandoff::new(move |socket| on_upgrade(socket));

        let response = HttpResponse::with_status(101, "Switching Protocols")
            .set_upgrade("websocket")
            .set_connection("Upgrade")
            .set_header("Sec-WebSocket-Accept", &accept)
            .with_attribute(attribute_keys::CONNECTION_UPGRADE, handoff);

        Outcome::Response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_token_matches_known_vector() {
        // the RFC 6455 §1.3 worked example, reused verbatim by the spec's end-to-end scenario
        assert_eq!(accept_token("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }
}
