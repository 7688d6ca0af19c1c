//! Connection service: the central per-socket state machine (§4.5).
//! Generalizes the teacher's per-worker `Connection`/`TcpClient` read loop
//! (old `connection.rs`, `tcp_client.rs`) from a non-blocking, callback-driven
//! design into a blocking, thread-per-connection one, since this core's
//! concurrency model (§5) schedules one state machine per accepted socket
//! onto the `service` pool rather than multiplexing sockets in a reactor.

pub mod parser;
pub mod writer;

use crate::config::ServerConfig;
use crate::connection::parser::{parse_request, ParsedRequest};
use crate::error::{HandlerError, ReadError, ResponseAborted};
use crate::handler::{coalesce, Outcome};
use crate::logger::CorrelateId;
use crate::message::{attribute_keys, HttpRequest, HttpResponse};
use crate::method::RequestMethod;
use crate::version::HttpVersion;
use crate::wire::WireReader;
use std::any::Any;
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What the connection service does with the socket once a response has
/// been written (§4.5 step 11). The upgrade hand-off closure itself travels
/// separately (see `serve_connection`), since `UpgradeHandoff` is single-use
/// and not `Clone`.
pub enum NextState {
    KeepAlive,
    Close,
    Upgrade,
}

/// A socket usable by the connection service: read/write plus a settable
/// read timeout, implemented for both plain `TcpStream` and the TLS stream
/// wrapper in `tls.rs`.
pub trait Socket: Read + Write + Send {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl Socket for std::net::TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::net::TcpStream::set_read_timeout(self, timeout)
    }
}

/// Entry point dispatched onto the `service` pool by the accept loop
/// (`server.rs`). The first wait-for-byte happens inline here, since the
/// calling closure is already running on that pool; every subsequent
/// keep-alive wait is handed off to the `keep_alive` pool instead (§5).
pub fn serve_connection(mut socket: impl Socket + 'static, config: Arc<ServerConfig>, connection_id: u64, peer_addr: SocketAddr) {
    match wait_for_byte(&mut socket, config.read_timeout) {
        Some(first_byte) => process_request(socket, config, connection_id, peer_addr, 1, first_byte),
        None => teardown(socket, &config),
    }
}

/// §4.5 step 1: blocks for exactly one byte under `timeout`, using a
/// throwaway one-byte-buffered reader so any bytes the stream hands back
/// beyond that single byte are never silently dropped (`fill_more` can only
/// ever read as many bytes as the buffer has room for).
fn wait_for_byte<S: Socket>(socket: &mut S, timeout: Duration) -> Option<u8> {
    if socket.set_read_timeout(Some(timeout)).is_err() {
        return None;
    }

    let mut reader = WireReader::new(socket, 1);
    match reader.read_byte() {
        Ok(Some(byte)) => Some(byte),
        _ => None,
    }
}

/// Schedules the next keep-alive wait-for-byte onto the `keep_alive` pool
/// (§5), so an idle connection never occupies a `service` pool thread.
/// Success re-dispatches the actual request handling back onto `service`.
fn schedule_keep_alive_wait(mut socket: impl Socket + 'static, config: Arc<ServerConfig>, connection_id: u64, peer_addr: SocketAddr, request_count: u32) {
    let timeout = config.keep_alive.map(|k| k.timeout).unwrap_or(config.read_timeout);
    let config_for_wait = config.clone();

    config.executor.submit_keep_alive(move || match wait_for_byte(&mut socket, timeout) {
        Some(first_byte) => {
            let config_for_service = config_for_wait.clone();
            config_for_wait.executor.service.execute(move || process_request(socket, config_for_service, connection_id, peer_addr, request_count, first_byte));
        }
        None => teardown(socket, &config_for_wait),
    });
}

/// Parses, dispatches, and frames one request, then hands the written
/// response off to its next state (§4.5 steps 2-12).
fn process_request(mut socket: impl Socket + 'static, config: Arc<ServerConfig>, connection_id: u64, peer_addr: SocketAddr, request_count: u32, first_byte: u8) {
    let mut reader = WireReader::new(&mut socket, config.buffer_size);
    let parsed = match parse_request(&mut reader, first_byte, config.buffer_size, config.header_limit) {
        Ok(parsed) => parsed,
        Err(read_error) => {
            write_error_response(&mut socket, &config, &read_error);
            teardown(socket, &config);
            return;
        }
    };

    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    let correlate_id = CorrelateId::new(now_ms, connection_id, connection_id, request_count as u64);
    let request = attach_request_attributes(parsed.request, &peer_addr, &correlate_id, request_count, &config);

    let response = match run_handlers(&config, &request) {
        Some(response) => response,
        None => {
            // "response aborted"/TLS errors kill the connection without writing anything (§7)
            teardown(socket, &config);
            return;
        }
    };

    let response = response.with_attribute(attribute_keys::RESPONSE_REQUEST, request.clone());
    let response = run_filters(&config, response);

    // taken before the response is framed so the single-use closure
    // survives regardless of what the framing step does to the response
    let handoff = response
        .attributes()
        .get::<crate::websocket::UpgradeHandoff>(attribute_keys::CONNECTION_UPGRADE)
        .and_then(|handoff| handoff.take());
    let upgrading = handoff.is_some();

    let (response, next_state) = prepare_framing_and_connection(response, &request, request_count, &config, upgrading);
    let close_entity = !matches!(next_state, NextState::Upgrade);

    write_via_encoder(socket, response, close_entity, &config, move |socket, write_ok, config| {
        if !write_ok {
            config.logger.warn(None, "write error, closing connection");
            teardown(socket, &config);
            return;
        }

        match next_state {
            NextState::Close => teardown(socket, &config),
            NextState::Upgrade => match handoff {
                Some(handoff) => {
                    let socket: Box<dyn crate::websocket::ReadWrite + Send> = Box::new(socket);
                    config.executor.submit_upgrade(move || handoff(socket));
                }
                None => teardown(socket, &config),
            },
            NextState::KeepAlive => schedule_keep_alive_wait(socket, config, connection_id, peer_addr, request_count + 1),
        }
    });
}

/// Submits the status line/headers/body write to the `encoder` pool (§5),
/// running `on_written` there once the write completes (or fails) with the
/// socket handed back so the caller's next-state decision can use it.
fn write_via_encoder<S, F>(socket: S, response: HttpResponse, close_entity: bool, config: &Arc<ServerConfig>, on_written: F)
where
    S: Socket + 'static,
    F: FnOnce(S, bool, Arc<ServerConfig>) + Send + 'static,
{
    let config = config.clone();
    config.executor.submit_encoder(move || {
        let mut socket = socket;
        let write_ok = crate::connection::writer::write_response(&mut socket, &response).is_ok();
        if close_entity {
            response.entity().close();
        }
        on_written(socket, write_ok, config);
    });
}

/// Submits socket teardown to the `closer` pool (§5); dropping the socket
/// there is enough to release the fd.
fn teardown(socket: impl Socket + 'static, config: &Arc<ServerConfig>) {
    config.executor.submit_closer(move || drop(socket));
}

/// Runs the coalesced handler pipeline, guarding against a panicking
/// handler (§7 "Handler errors"). Returns `None` when the handler signaled
/// (via `ResponseAborted`/`HandlerError::Aborted`/`Tls`) that the
/// connection should close without writing anything; otherwise a response
/// is always produced, routing unexpected panics through the configured
/// error handler.
fn run_handlers(config: &Arc<ServerConfig>, request: &HttpRequest) -> Option<HttpResponse> {
    match catch_unwind(AssertUnwindSafe(|| coalesce(&config.request_handlers, request.clone()))) {
        Ok(Outcome::Response(response)) => Some(response),
        Ok(Outcome::Request(_unhandled)) => Some((config.error_handler)(&ReadError::BadRequest("no handler produced a response".to_string()), request)),
        Err(payload) => handle_handler_panic(payload, config, request),
    }
}

fn handle_handler_panic(payload: Box<dyn Any + Send>, config: &Arc<ServerConfig>, request: &HttpRequest) -> Option<HttpResponse> {
    if payload.downcast_ref::<ResponseAborted>().is_some() {
        config.logger.warn(None, "handler aborted the response, closing without writing one");
        return None;
    }

    if let Some(handler_error) = payload.downcast_ref::<HandlerError>() {
        match handler_error {
            HandlerError::Aborted => {
                config.logger.warn(None, "handler aborted the response, closing without writing one");
                return None;
            }
            HandlerError::Tls(reason) => {
                config.logger.error(None, &format!("tls error propagated from handler, closing: {}", reason));
                return None;
            }
            _ => {}
        }
    }

    let message = panic_message(&payload);
    config.logger.error(None, &format!("handler panicked: {}", message));
    Some((config.error_handler)(&HandlerError::Other(message.into()), request))
}

/// Runs the response filter chain, guarding against a panicking filter
/// (§7 "Filter errors"): synthesizes `500` with `Connection: close` rather
/// than propagating.
fn run_filters(config: &Arc<ServerConfig>, response: HttpResponse) -> HttpResponse {
    match catch_unwind(AssertUnwindSafe(|| crate::filter::chain(&config.response_filters, response))) {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(&payload);
            config.logger.error(None, &format!("filter panicked: {}", message));
            HttpResponse::with_status(500, "Internal Server Error").set_connection("close")
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn attach_request_attributes(request: HttpRequest, peer_addr: &SocketAddr, correlate_id: &CorrelateId, request_count: u32, config: &Arc<ServerConfig>) -> HttpRequest {
    request
        .with_attribute(attribute_keys::SOCKET_ADDR, *peer_addr)
        .with_attribute(attribute_keys::CORRELATE, correlate_id.clone())
        .with_attribute(attribute_keys::REQUEST_COUNT, request_count)
        .with_attribute(attribute_keys::LOGGER, config.logger.clone())
}

fn write_error_response(socket: &mut impl Write, config: &Arc<ServerConfig>, error: &ReadError) {
    let status = error.status();
    config.logger.warn(None, &format!("framing error: {}", error));
    let reason = crate::connection::writer::reason_phrase(status);
    let body = format!("{} {}", status, reason);
    let response = HttpResponse::with_status(status, reason).with_body(body.into_bytes()).set_connection("close");
    let _ = crate::connection::writer::write_response(socket, &response);
}

/// §4.5 steps 7-9: decide framing, apply connection management, stamp Date.
fn prepare_framing_and_connection(response: HttpResponse, request: &HttpRequest, request_count: u32, config: &Arc<ServerConfig>, upgrading: bool) -> (HttpResponse, NextState) {
    let response = crate::connection::writer::prepare_framing(response);
    let response = response.set_date(&crate::connection::writer::now_rfc7231_string());

    if upgrading {
        return (response, NextState::Upgrade);
    }

    let keep_alive = should_keep_alive(request, &response, request_count, config);

    let response = if keep_alive {
        let remaining = config.keep_alive.map(|k| k.max.saturating_sub(request_count - 1)).unwrap_or(0);
        let timeout_secs = config.keep_alive.map(|k| k.timeout.as_secs()).unwrap_or(0);
        response.set_connection("keep-alive").set_keep_alive(&format!("timeout={}, max={}", timeout_secs, remaining))
    } else {
        response.set_connection("close")
    };

    let next_state = if keep_alive { NextState::KeepAlive } else { NextState::Close };
    (response, next_state)
}

/// §4.5.1 connection management policy.
fn should_keep_alive(request: &HttpRequest, response: &HttpResponse, request_count: u32, config: &Arc<ServerConfig>) -> bool {
    let params = match config.keep_alive {
        Some(params) => params,
        None => return false,
    };

    if request_count >= params.max {
        return false;
    }

    let requested = request.connection_option().map(|v| v.to_ascii_lowercase().contains("keep-alive")).unwrap_or(request.version() == HttpVersion::Http1_1);
    if !requested {
        return false;
    }

    let safe_exchange = response.is_success() || (matches!(request.method(), RequestMethod::Get | RequestMethod::Head) && response.is_redirection());
    safe_exchange
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::request::RequestLine;
    use crate::message::HttpRequest;
    use std::sync::Arc;

    fn config_with_keep_alive(max: u32) -> Arc<ServerConfig> {
        Arc::new(
            crate::config::ServerBuilder::new()
                .keep_alive(Duration::from_secs(30), max)
                .build()
                .unwrap(),
        )
    }

    fn get_request() -> HttpRequest {
        HttpRequest::new(RequestLine::new(RequestMethod::Get, "/", HttpVersion::Http1_1)).with_header("Connection", "keep-alive")
    }

    #[test]
    fn keep_alive_stops_at_max_requests() {
        let config = config_with_keep_alive(2);
        let response = HttpResponse::with_status(200, "OK");
        assert!(should_keep_alive(&get_request(), &response, 1, &config));
        assert!(!should_keep_alive(&get_request(), &response, 2, &config));
    }

    #[test]
    fn keep_alive_requires_success_or_safe_redirect() {
        let config = config_with_keep_alive(5);
        let server_error = HttpResponse::with_status(500, "Internal Server Error");
        assert!(!should_keep_alive(&get_request(), &server_error, 1, &config));

        let redirect = HttpResponse::with_status(301, "Moved Permanently");
        assert!(should_keep_alive(&get_request(), &redirect, 1, &config));
    }

    #[test]
    fn keep_alive_disabled_globally_always_closes() {
        let config = Arc::new(crate::config::ServerBuilder::new().build().unwrap());
        let response = HttpResponse::with_status(200, "OK");
        assert!(!should_keep_alive(&get_request(), &response, 1, &config));
    }
}
