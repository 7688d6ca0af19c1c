use webhatch::{HttpResponse, Server, ServerBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    // Any request handler may answer or decline (returning `Outcome::Request`
    // to try the next one); this one answers everything.
    let config = ServerBuilder::new()
        .handler(|_request| {
            let body = "Hello world!".as_bytes().to_vec();
            webhatch::Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/plain; charset=utf-8").with_body(body))
        })
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}
