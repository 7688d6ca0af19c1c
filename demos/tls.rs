use webhatch::{HttpResponse, Server, ServerBuilder};

/// This example demonstrates the use of https. Generate a self-signed
/// `demos/keys/key.pem`/`demos/keys/cert.pem` pair before running it, e.g.
/// `openssl req -x509 -newkey rsa:2048 -nodes -keyout demos/keys/key.pem -out demos/keys/cert.pem -days 365`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8443).into();

    let config = ServerBuilder::new()
        .secure("demos/keys/key.pem", "demos/keys/cert.pem")
        .handler(|_request| webhatch::Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/plain; charset=utf-8").with_body(b"Hello world!".to_vec())))
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}
