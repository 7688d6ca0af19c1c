//! Loopback end-to-end scenarios (SPEC_FULL.md §8) driving a real bound
//! `TcpListener` through `webhatch::Server`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use webhatch::config::ServerBuilder;
use webhatch::cookie::{CookieStore, SetCookie};
use webhatch::handler::Outcome;
use webhatch::message::attribute_keys;
use webhatch::message::HttpResponse;
use webhatch::router::Router;
use webhatch::websocket;

struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

fn send(addr: SocketAddr, raw_request: &str) -> Response {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream.write_all(raw_request.as_bytes()).unwrap();
    read_response(&mut stream)
}

fn read_response(stream: &mut TcpStream) -> Response {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break Some(pos);
        }
    };
    let header_end = header_end.unwrap_or(buf.len());

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status = status_line.split_whitespace().nth(1).and_then(|s| s.parse().ok()).unwrap_or(0);

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let mut body = buf[(header_end + 4).min(buf.len())..].to_vec();
    if let Some(len) = headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(len);
    }

    Response { status, headers, body }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn spawn_server(config: webhatch::config::ServerConfig) -> SocketAddr {
    let server = webhatch::Server::bind("127.0.0.1:0".parse().unwrap(), config).unwrap();
    let addr = server.local_addr().unwrap();
    std::thread::spawn(move || server.run());
    std::thread::sleep(Duration::from_millis(20));
    addr
}

#[test]
fn plain_get_returns_the_registered_body() {
    let router = Router::new("/").get("/hello", |_req| {
        Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/plain").with_body(b"hi".to_vec()))
    });
    let config = ServerBuilder::new().handler(router).build().unwrap();
    let addr = spawn_server(config);

    let response = send(addr, "GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(response.status, 200);
    assert_eq!(response.headers.get("content-length").unwrap(), "2");
    assert_eq!(response.body, b"hi");
    assert_eq!(response.headers.get("connection").unwrap(), "close");
}

#[test]
fn path_parameter_is_extracted_and_bound() {
    let router = Router::new("/").get("/users/:id", |req| {
        let id = req
            .attributes()
            .get::<HashMap<String, String>>(attribute_keys::REQUEST_PARAMETERS)
            .and_then(|params| params.get("id"))
            .cloned()
            .unwrap_or_default();
        Outcome::Response(HttpResponse::with_status(200, "OK").with_body(id.into_bytes()))
    });
    let config = ServerBuilder::new().handler(router).build().unwrap();
    let addr = spawn_server(config);

    let response = send(addr, "GET /users/42 HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"42");
}

#[test]
fn keep_alive_closes_after_the_configured_max() {
    let router = Router::new("/").get("/ping", |_req| Outcome::Response(HttpResponse::with_status(200, "OK").with_body(b"pong".to_vec())));
    let config = ServerBuilder::new().handler(router).keep_alive(Duration::from_secs(30), 2).build().unwrap();
    let addr = spawn_server(config);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

    stream.write_all(b"GET /ping HTTP/1.1\r\nHost: x\r\nConnection: keep-alive\r\n\r\n").unwrap();
    let first = read_response(&mut stream);
    assert_eq!(first.status, 200);
    assert_eq!(first.headers.get("connection").unwrap(), "keep-alive");
    assert!(first.headers.get("keep-alive").unwrap().contains("max=2"));

    stream.write_all(b"GET /ping HTTP/1.1\r\nHost: x\r\nConnection: keep-alive\r\n\r\n").unwrap();
    let second = read_response(&mut stream);
    assert_eq!(second.status, 200);
    assert_eq!(second.headers.get("connection").unwrap(), "close");
}

#[test]
fn static_file_conditional_get_returns_304() {
    let dir = std::env::temp_dir().join(format!("webhatch-it-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.txt"), b"hello").unwrap();

    let router = Router::new("/").resources("/files", &dir);
    let config = ServerBuilder::new().handler(router).build().unwrap();
    let addr = spawn_server(config);

    let first = send(addr, "GET /files/a.txt HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(first.status, 200);
    let last_modified = first.headers.get("last-modified").unwrap().clone();

    let since = chrono::DateTime::parse_from_rfc2822(&last_modified).unwrap() + chrono::Duration::seconds(1);
    let since = since.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

    let request = format!("GET /files/a.txt HTTP/1.1\r\nHost: x\r\nIf-Modified-Since: {}\r\n\r\n", since);
    let second = send(addr, &request);
    assert_eq!(second.status, 304);
    assert!(second.body.is_empty());
    assert_eq!(second.headers.get("last-modified").unwrap(), &last_modified);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cookie_store_respects_domain_and_secure_scoping() {
    let store = CookieStore::new();
    let set_cookie = SetCookie::new("a", "1").unwrap().with_domain("example.com").with_path("/").secure();
    store.put("https://www.example.com/", &[set_cookie]).unwrap();

    let matched = store.get("https://www.example.com/p").unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "a");

    let over_plain = store.get("http://www.example.com/p").unwrap();
    assert!(over_plain.is_empty());

    let wrong_domain = store.get("https://evil.com/").unwrap();
    assert!(wrong_domain.is_empty());
}

#[test]
fn websocket_upgrade_handshake_matches_the_known_vector() {
    let handler = websocket::upgrade_handler(|_socket| {});
    let config = ServerBuilder::new().handler(handler).build().unwrap();
    let addr = spawn_server(config);

    let request = "GET /ws HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";
    let response = send(addr, request);

    assert_eq!(response.status, 101);
    assert_eq!(response.headers.get("sec-websocket-accept").unwrap(), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    assert_eq!(response.headers.get("upgrade").unwrap(), "websocket");
    assert_eq!(response.headers.get("connection").unwrap(), "Upgrade");
}
