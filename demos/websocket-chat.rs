//! Broadcast chat over TLS. As in `websocket-echo.rs`, framing is this demo's
//! own responsibility; here each connected client's raw socket is kept in a
//! shared map (keyed by peer address, the only per-connection identity the
//! library hands to a request handler) so a message from one client can be
//! written out to every other one.

use std::collections::BTreeMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use webhatch::message::attribute_keys;
use webhatch::websocket::{upgrade_handler, ReadWrite};
use webhatch::{HttpResponse, Outcome, RequestHandler, Router, Server, ServerBuilder};

type SharedSocket = Arc<Mutex<Box<dyn ReadWrite + Send>>>;

struct Chat {
    users: RwLock<BTreeMap<SocketAddr, SharedSocket>>,
    messages: Mutex<Vec<String>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let chat = Arc::new(Chat { users: RwLock::new(BTreeMap::new()), messages: Mutex::new(Vec::new()) });

    let router = Router::new("/")
        .get("/", |_req| Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(INDEX_HTML.as_bytes().to_vec())))
        .route(&[webhatch::method::RequestMethod::Get], "/ws", move |request| {
            // A fresh handler per request, since the peer address is only
            // known once the request arrives, not when the router is built.
            let peer_addr = *request.attributes().get::<SocketAddr>(attribute_keys::SOCKET_ADDR).expect("connections always carry their peer address");
            let chat = chat.clone();
            upgrade_handler(move |socket| on_upgrade(socket, peer_addr, &chat)).apply(request)
        });

    let config = ServerBuilder::new()
        .secure("demos/keys/key.pem", "demos/keys/cert.pem")
        .handler(router)
        .build()?;

    let addr = ([0, 0, 0, 0], 8443).into();
    Server::bind(addr, config)?.run()?;

    Ok(())
}

fn on_upgrade(socket: Box<dyn ReadWrite + Send>, peer_addr: SocketAddr, chat: &Arc<Chat>) {
    let socket: SharedSocket = Arc::new(Mutex::new(socket));
    send_history(&socket, chat);
    chat.users.write().unwrap().insert(peer_addr, socket.clone());

    loop {
        let frame = {
            let mut guard = socket.lock().unwrap();
            match read_frame(guard.as_mut()) {
                Ok(Some(frame)) => frame,
                _ => break,
            }
        };

        if frame.opcode == 0x8 {
            break;
        }
        if frame.opcode != 0x1 {
            continue;
        }

        if let Ok(text) = String::from_utf8(frame.payload) {
            broadcast(chat, &text);
        }
    }

    chat.users.write().unwrap().remove(&peer_addr);
}

fn send_history(socket: &SharedSocket, chat: &Arc<Chat>) {
    let messages = chat.messages.lock().unwrap();
    let mut guard = socket.lock().unwrap();
    for message in messages.iter() {
        let _ = write_frame(guard.as_mut(), 0x1, message.as_bytes());
    }
}

fn broadcast(chat: &Arc<Chat>, text: &str) {
    chat.messages.lock().unwrap().push(text.to_string());
    for socket in chat.users.read().unwrap().values() {
        let mut guard = socket.lock().unwrap();
        let _ = write_frame(guard.as_mut(), 0x1, text.as_bytes());
    }
}

struct Frame {
    opcode: u8,
    payload: Vec<u8>,
}

fn read_frame(socket: &mut dyn ReadWrite) -> std::io::Result<Option<Frame>> {
    use std::io::Read;

    let mut header = [0u8; 2];
    if let Err(err) = socket.read_exact(&mut header) {
        return if err.kind() == std::io::ErrorKind::UnexpectedEof { Ok(None) } else { Err(err) };
    }

    let opcode = header[0] & 0x0F;
    let masked = header[1] & 0x80 != 0;
    let mut len = u64::from(header[1] & 0x7F);

    if len == 126 {
        let mut ext = [0u8; 2];
        socket.read_exact(&mut ext)?;
        len = u64::from(u16::from_be_bytes(ext));
    } else if len == 127 {
        let mut ext = [0u8; 8];
        socket.read_exact(&mut ext)?;
        len = u64::from_be_bytes(ext);
    }

    let mut mask = [0u8; 4];
    if masked {
        socket.read_exact(&mut mask)?;
    }

    let mut payload = vec![0u8; len as usize];
    socket.read_exact(&mut payload)?;
    if masked {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= mask[i % 4];
        }
    }

    Ok(Some(Frame { opcode, payload }))
}

fn write_frame(socket: &mut dyn ReadWrite, opcode: u8, payload: &[u8]) -> std::io::Result<()> {
    let mut out = vec![0x80 | opcode];

    if payload.len() < 126 {
        out.push(payload.len() as u8);
    } else if payload.len() <= u16::MAX as usize {
        out.push(126);
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    } else {
        out.push(127);
        out.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    }

    out.extend_from_slice(payload);
    socket.write_all(&out)
}

const INDEX_HTML: &str = r#"
<html>
    <body>
        <script>
            var socket = new WebSocket("wss://127.0.0.1:8443/ws", "chat");

            function sendToServer(data) {
                socket.send(data);
            }

            socket.onmessage = function(event) {
               document.getElementById('fromServer').innerHTML += event.data + '<br>';
            }
        </script>

    	<h3>Websocket chat example</h3>
        <form onsubmit="sendToServer(document.getElementById('text').value); return false;">
            <input type="text" id="text" /> <br>
            <button type="submit">Send</button> <br>
        </form>

        <p id="fromServer"/> </p>
    </body>
</html>
"#;
