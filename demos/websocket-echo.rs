//! The library only performs the WebSocket upgrade handshake (§4.4); framing
//! and session behavior beyond it are explicitly out of scope, so this demo
//! hand-rolls the minimal server-side frame codec an embedding app owns once
//! it takes the raw socket from `UpgradeHandoff`.

use webhatch::websocket::{upgrade_handler, ReadWrite};
use webhatch::{HttpResponse, Outcome, RequestHandler, Router, Server, ServerBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let ws = upgrade_handler(|socket| {
        if let Err(err) = echo_loop(socket) {
            eprintln!("websocket echo session ended: {}", err);
        }
    });

    let router = Router::new("/")
        .get("/", |_req| Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(INDEX_HTML.as_bytes().to_vec())))
        .get("/ws", move |request| ws.apply(request));

    let config = ServerBuilder::new().handler(router).build()?;
    Server::bind(addr, config)?.run()?;

    Ok(())
}

/// Reads client frames and writes each payload straight back, until the
/// client closes or the connection errors.
fn echo_loop(mut socket: Box<dyn ReadWrite + Send>) -> std::io::Result<()> {
    loop {
        let frame = match read_frame(socket.as_mut())? {
            Some(frame) => frame,
            None => return Ok(()),
        };

        match frame.opcode {
            0x8 => return Ok(()),       // close
            0x9 => write_frame(socket.as_mut(), 0xA, &frame.payload)?, // ping -> pong
            _ => write_frame(socket.as_mut(), frame.opcode, &frame.payload)?,
        }
    }
}

struct Frame {
    opcode: u8,
    payload: Vec<u8>,
}

/// Parses one client-to-server frame (RFC 6455 §5.2). Client frames are
/// always masked; `None` means a clean EOF before a new frame started.
fn read_frame(socket: &mut dyn ReadWrite) -> std::io::Result<Option<Frame>> {
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

/// Writes one server-to-client frame. Server frames are never masked.
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
            var socket = new WebSocket("ws://127.0.0.1:8080/ws", "echo");

            function sendToServer(data) {
                socket.send(data);
            }

            socket.onmessage = function(event) {
               document.getElementById('fromServer').innerHTML += event.data + '<br>';
            }
        </script>

    	<h3>Websocket echo example</h3>
        <form onsubmit="sendToServer(document.getElementById('text').value); return false;">
            <input type="text" id="text" /> <br>
            <button type="submit">Send</button> <br>
        </form>

        <p id="fromServer"/> </p>
    </body>
</html>
"#;
